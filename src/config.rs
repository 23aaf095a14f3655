//! Render configuration
//!
//! Options can be set in code through the builder methods or loaded from a
//! TOML file with a `[render]` table:
//!
//! ```toml
//! [render]
//! dev = true
//! hydrate = true
//! serialize_property_attributes = false
//! max_hydration_depth = 32
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Options for the render pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Run attribute validation and report problems to the log sink
    pub dev: bool,
    /// Expand registered custom elements after resolving
    pub hydrate: bool,
    /// Render `.name=${v}` bindings as `.name="v"` instead of nothing
    pub serialize_property_attributes: bool,
    /// Maximum number of nested custom-element expansions on one path
    pub max_hydration_depth: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dev: true,
            hydrate: true,
            serialize_property_attributes: false,
            max_hydration_depth: 32,
        }
    }
}

/// TOML structure for deserializing configuration
#[derive(Deserialize)]
struct TomlConfig {
    render: Option<TomlRender>,
}

#[derive(Deserialize)]
struct TomlRender {
    dev: Option<bool>,
    hydrate: Option<bool>,
    serialize_property_attributes: Option<bool>,
    max_hydration_depth: Option<usize>,
}

impl RenderConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dev(mut self, dev: bool) -> Self {
        self.dev = dev;
        self
    }

    pub fn with_hydrate(mut self, hydrate: bool) -> Self {
        self.hydrate = hydrate;
        self
    }

    pub fn with_serialize_property_attributes(mut self, enabled: bool) -> Self {
        self.serialize_property_attributes = enabled;
        self
    }

    pub fn with_max_hydration_depth(mut self, depth: usize) -> Self {
        self.max_hydration_depth = depth;
        self
    }

    /// Load a configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse a configuration from TOML; missing keys keep their defaults
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(render) = parsed.render {
            if let Some(dev) = render.dev {
                config.dev = dev;
            }
            if let Some(hydrate) = render.hydrate {
                config.hydrate = hydrate;
            }
            if let Some(enabled) = render.serialize_property_attributes {
                config.serialize_property_attributes = enabled;
            }
            if let Some(depth) = render.max_hydration_depth {
                config.max_hydration_depth = depth;
            }
        }

        Ok(config)
    }
}

//! Tagged SSR - tagged-template markup rendered on the server
//!
//! Markup written as string fragments with interpolated values is parsed
//! once into a cached [`Template`], resolved into escaped HTML, and then
//! optionally re-parsed so registered custom elements can be expanded
//! ("hydrated") in place. Live component instances re-render through a
//! batching [`Scheduler`](scheduler::Scheduler).
//!
//! # Example
//!
//! ```rust
//! use tagged_ssr::{html, render, Registry};
//!
//! let page = html!(["<p class=\"", "\">", "</p>"], "greeting", "hi & bye");
//! let out = render(&page, &Registry::new()).unwrap();
//! assert_eq!(out, "<p class=\"greeting\">hi &amp; bye</p>");
//! ```

pub mod config;
pub mod element;
pub mod error;
pub mod html;
pub mod hydrate;
pub mod log;
pub mod resolver;
pub mod scheduler;
pub mod template;
pub mod value;

pub use config::{ConfigError, RenderConfig};
pub use element::{
    types, AttrType, Attrs, ComponentInstance, ElementDefinition, ElementManifest, ManifestError,
    Registry, RenderContext,
};
pub use error::{Location, TemplateError};
pub use log::{LogSink, RecordingSink, TracingSink};
pub use resolver::{directives, resolve_to_string, settle, ResolveError, Resolver};
pub use template::{Part, Template, TemplateCache, TemplateResult, TemplateSource};
pub use value::Value;

use std::rc::Rc;

use thiserror::Error;

/// Errors that can occur during the render pipeline
#[derive(Debug, Error)]
pub enum RenderError {
    /// Error while resolving a template or one of its values
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Too many nested custom elements on one path
    #[error("hydration of <{name}> exceeds the maximum depth of {depth}")]
    HydrationDepth { name: String, depth: usize },
}

impl From<TemplateError> for RenderError {
    fn from(err: TemplateError) -> Self {
        RenderError::Resolve(ResolveError::Template(err))
    }
}

/// The server render pipeline: resolve, then hydrate registered elements
pub struct Renderer<'r> {
    registry: &'r Registry,
    config: RenderConfig,
    sink: Rc<dyn LogSink>,
}

impl<'r> Renderer<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            config: RenderConfig::default(),
            sink: Rc::new(TracingSink),
        }
    }

    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    /// Route validation diagnostics to `sink` instead of `tracing`
    pub fn with_sink(mut self, sink: Rc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render a result to a complete HTML string
    pub fn render(&self, result: &TemplateResult) -> Result<String, RenderError> {
        let markup = Resolver::new(&self.config).resolve(result)?;
        if !self.config.hydrate || self.registry.is_empty() {
            return Ok(markup);
        }

        let mut nodes = html::parse(&markup);
        let expanded = hydrate::hydrate(&mut nodes, self.registry, &self.config, &self.sink)?;
        if expanded == 0 {
            return Ok(markup);
        }
        Ok(html::serialize(&nodes))
    }

    /// Settle every pending value, then render
    pub async fn render_async(&self, result: TemplateResult) -> Result<String, RenderError> {
        let settled = settle(result).await?;
        self.render(&settled)
    }
}

/// Render with the default configuration
///
/// # Example
///
/// ```rust
/// use tagged_ssr::{html, render, Registry, Value};
///
/// let list = html!(["<ul>", "</ul>"], vec![
///     Value::from(html!(["<li>", "</li>"], 1)),
///     Value::from(html!(["<li>", "</li>"], 2)),
/// ]);
/// assert_eq!(render(&list, &Registry::new()).unwrap(), "<ul><li>1</li><li>2</li></ul>");
/// ```
pub fn render(result: &TemplateResult, registry: &Registry) -> Result<String, RenderError> {
    Renderer::new(registry).render(result)
}

/// Render with a custom configuration
///
/// # Example
///
/// ```rust
/// use tagged_ssr::{html, render_with_config, Registry, RenderConfig};
///
/// let config = RenderConfig::new().with_serialize_property_attributes(true);
/// let out = render_with_config(&html!(["<input .value=", ">"], "x"), &Registry::new(), config).unwrap();
/// assert_eq!(out, "<input .value=\"x\">");
/// ```
pub fn render_with_config(
    result: &TemplateResult,
    registry: &Registry,
    config: RenderConfig,
) -> Result<String, RenderError> {
    Renderer::new(registry).with_config(config).render(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn app_item_registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(
            ElementDefinition::new("app-item", |cx| {
                html!(["<span>", "</span>"], cx.attr("meta")["index"].clone())
            })
            .attr("meta", types::object()),
        );
        registry
    }

    fn app_item_page() -> TemplateResult {
        html!(["<app-item meta=\"", "\"></app-item>"], json!({"index": 1}))
    }

    #[test]
    fn test_render_without_registry_is_resolved_markup() {
        let out = render(&app_item_page(), &Registry::new()).unwrap();
        assert_eq!(out, "<app-item meta=\"{'index':1}\"></app-item>");
    }

    #[test]
    fn test_render_hydrates_registered_element() {
        let out = render(&app_item_page(), &app_item_registry()).unwrap();
        assert_eq!(out, "<app-item meta=\"{'index':1}\"><span>1</span></app-item>");
    }

    #[test]
    fn test_hydrate_disabled_in_config() {
        let config = RenderConfig::new().with_hydrate(false);
        let out = render_with_config(&app_item_page(), &app_item_registry(), config).unwrap();
        assert_eq!(out, "<app-item meta=\"{'index':1}\"></app-item>");
    }

    #[test]
    fn test_validation_goes_to_custom_sink() {
        let mut registry = Registry::new();
        registry.register(
            ElementDefinition::new("x-count", |cx| html!(["", ""], cx.attr("n")))
                .attr("n", types::number()),
        );
        let sink = Rc::new(RecordingSink::new());
        let out = Renderer::new(&registry)
            .with_sink(sink.clone())
            .render(&html!(["<x-count n=\"", "\"></x-count>"], "many"))
            .unwrap();
        assert_eq!(out, "<x-count n=\"many\">many</x-count>");
        assert_eq!(
            sink.messages(),
            vec!["'<x-count> n' Expected type 'number' got type 'string'"]
        );
    }

    #[test]
    fn test_render_async_settles_pending_values() {
        let pending = Value::pending(async { Ok::<_, String>(Value::from("later")) });
        let page = html!(["<p>", "</p>"], pending);
        let out = futures::executor::block_on(Renderer::new(&Registry::new()).render_async(page)).unwrap();
        assert_eq!(out, "<p>later</p>");
    }

    #[test]
    fn test_template_error_surfaces_as_render_error() {
        let page = html!(["<input ?disabled=\"", " ", "\">"], true, false);
        let err = render(&page, &Registry::new()).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Resolve(ResolveError::Template(TemplateError::BooleanAttributeExpressions { .. }))
        ));
    }
}

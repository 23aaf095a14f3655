//! Registry of custom element definitions, looked up by tag name

use std::collections::HashMap;
use std::rc::Rc;

use crate::element::ElementDefinition;

#[derive(Debug, Default, Clone)]
pub struct Registry {
    elements: HashMap<String, Rc<ElementDefinition>>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition under its tag name.
    ///
    /// Registering a name that is already present keeps the first definition
    /// and returns `false`.
    pub fn register(&mut self, definition: ElementDefinition) -> bool {
        let name = definition.name().to_string();
        if self.elements.contains_key(&name) {
            tracing::debug!(element = %name, "element already registered, keeping first definition");
            return false;
        }
        self.elements.insert(name, Rc::new(definition));
        true
    }

    /// Look up a definition by tag name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&Rc<ElementDefinition>> {
        match self.elements.get(name) {
            Some(definition) => Some(definition),
            None => self.elements.get(&name.to_ascii_lowercase()),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered tag names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.elements.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

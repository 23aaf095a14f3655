//! Custom element definitions
//!
//! An [`ElementDefinition`] is the registration record for one custom element
//! tag: how its attributes are typed, what state it declares, which fields
//! are computed from that state, and the render function.

pub mod hooks;
pub mod instance;
pub mod manifest;
pub mod registry;
pub mod types;

pub use hooks::{Cleanup, Dispatch, EffectKind, RenderContext, Setter, StateHandle};
pub use instance::ComponentInstance;
pub use manifest::{ElementManifest, ManifestError};
pub use registry::Registry;
pub use types::{AttrType, BasicType, Kind};

use std::fmt;
use std::rc::Rc;

use crate::html::Attributes;
use crate::log::LogSink;
use crate::template::TemplateResult;

/// Parsed attributes or state of an element, keyed by name
pub type Attrs = serde_json::Map<String, serde_json::Value>;

type RenderFn = dyn Fn(&mut RenderContext<'_>) -> TemplateResult;
type ComputeFn = dyn Fn(&[serde_json::Value]) -> serde_json::Value;

/// A declared state field and its initial value
#[derive(Debug, Clone, PartialEq)]
pub struct StateField {
    pub name: String,
    pub default: serde_json::Value,
}

/// A field derived from state on every render
#[derive(Clone)]
pub struct ComputedField {
    pub name: String,
    pub deps: Vec<String>,
    compute: Rc<ComputeFn>,
}

impl ComputedField {
    pub fn compute(&self, inputs: &[serde_json::Value]) -> serde_json::Value {
        (self.compute)(inputs)
    }
}

impl fmt::Debug for ComputedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedField")
            .field("name", &self.name)
            .field("deps", &self.deps)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct ElementDefinition {
    name: String,
    attr_types: Vec<(String, Rc<dyn AttrType>)>,
    state_fields: Vec<StateField>,
    computed_fields: Vec<ComputedField>,
    render: Rc<RenderFn>,
}

impl ElementDefinition {
    pub fn new(
        name: impl Into<String>,
        render: impl Fn(&mut RenderContext<'_>) -> TemplateResult + 'static,
    ) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            attr_types: Vec::new(),
            state_fields: Vec::new(),
            computed_fields: Vec::new(),
            render: Rc::new(render),
        }
    }

    /// Declare a typed attribute
    pub fn attr(mut self, name: impl Into<String>, attr_type: impl AttrType + 'static) -> Self {
        self.attr_types.push((name.into(), Rc::new(attr_type)));
        self
    }

    /// Declare a state field with its initial value
    pub fn state(mut self, name: impl Into<String>, default: impl Into<serde_json::Value>) -> Self {
        self.state_fields.push(StateField {
            name: name.into(),
            default: default.into(),
        });
        self
    }

    /// Declare a field computed from the named state fields
    pub fn computed(
        mut self,
        name: impl Into<String>,
        deps: &[&str],
        compute: impl Fn(&[serde_json::Value]) -> serde_json::Value + 'static,
    ) -> Self {
        self.computed_fields.push(ComputedField {
            name: name.into(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
            compute: Rc::new(compute),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type of `name`, matched case-insensitively
    pub fn attr_type(&self, name: &str) -> Option<(&str, &dyn AttrType)> {
        self.attr_types
            .iter()
            .find(|(declared, _)| declared.eq_ignore_ascii_case(name))
            .map(|(declared, ty)| (declared.as_str(), ty.as_ref()))
    }

    pub fn state_fields(&self) -> &[StateField] {
        &self.state_fields
    }

    pub fn computed_fields(&self) -> &[ComputedField] {
        &self.computed_fields
    }

    pub(crate) fn call_render(&self, cx: &mut RenderContext<'_>) -> TemplateResult {
        (self.render)(cx)
    }

    fn context(&self, attr: &str) -> String {
        format!("<{}> {}", self.name, attr)
    }

    /// Parse and validate one raw attribute. Undeclared attributes stay
    /// strings. Returns the key to store the value under.
    pub fn coerce_attr(
        &self,
        name: &str,
        raw: Option<&str>,
        sink: &dyn LogSink,
    ) -> (String, serde_json::Value) {
        match self.attr_type(name) {
            Some((declared, attr_type)) => {
                let value = attr_type.parse(raw);
                attr_type.validate(&self.context(declared), &value, sink);
                (declared.to_string(), value)
            }
            None => (
                name.to_string(),
                raw.map_or(serde_json::Value::Null, |r| serde_json::Value::String(r.to_string())),
            ),
        }
    }

    /// Coerce every attribute of a parsed tag, then validate the declared
    /// attributes the tag does not carry
    pub fn coerce_attrs(&self, raw: &Attributes, sink: &dyn LogSink) -> Attrs {
        let mut attrs = Attrs::new();
        for (name, value) in raw.iter() {
            let (key, value) = self.coerce_attr(name, Some(value), sink);
            attrs.insert(key, value);
        }
        self.fill_missing_attrs(&mut attrs, sink);
        attrs
    }

    pub(crate) fn fill_missing_attrs(&self, attrs: &mut Attrs, sink: &dyn LogSink) {
        for (declared, attr_type) in &self.attr_types {
            if attrs.contains_key(declared) {
                continue;
            }
            let value = attr_type.parse(None);
            attr_type.validate(&self.context(declared), &value, sink);
            attrs.insert(declared.clone(), value);
        }
    }

    pub(crate) fn initial_state(&self) -> Attrs {
        self.state_fields
            .iter()
            .map(|field| (field.name.clone(), field.default.clone()))
            .collect()
    }
}

impl fmt::Debug for ElementDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attrs: Vec<(&str, &str)> = self
            .attr_types
            .iter()
            .map(|(name, ty)| (name.as_str(), ty.type_name()))
            .collect();
        f.debug_struct("ElementDefinition")
            .field("name", &self.name)
            .field("attr_types", &attrs)
            .field("state_fields", &self.state_fields)
            .field("computed_fields", &self.computed_fields)
            .finish_non_exhaustive()
    }
}

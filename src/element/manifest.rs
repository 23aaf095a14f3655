//! Elements declared in TOML instead of Rust
//!
//! Each `[elements.<tag>]` table holds a template whose `${...}` placeholders
//! name an attribute, optionally followed by a dotted path into its parsed
//! value:
//!
//! ```toml
//! [elements.app-item]
//! template = "<span>${meta.index}</span>"
//! attrs = { meta = "object" }
//! required = ["meta"]
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use serde::Deserialize;
use thiserror::Error;

use crate::element::types::{BasicType, Kind};
use crate::element::{ElementDefinition, Registry, RenderContext};
use crate::error::TemplateError;
use crate::template::{TemplateResult, TemplateSource};
use crate::value::Value;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read element manifest: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse element manifest TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("<{element}> attribute '{attr}' has unknown type '{type_name}'")]
    UnknownType {
        element: String,
        attr: String,
        type_name: String,
    },
    #[error("<{element}> template: {source}")]
    Template {
        element: String,
        source: TemplateError,
    },
}

#[derive(Deserialize)]
struct TomlManifest {
    #[serde(default)]
    elements: BTreeMap<String, TomlElement>,
}

#[derive(Deserialize)]
struct TomlElement {
    template: String,
    #[serde(default)]
    attrs: BTreeMap<String, String>,
    #[serde(default)]
    required: Vec<String>,
}

/// A set of element definitions loaded from TOML
#[derive(Debug, Default)]
pub struct ElementManifest {
    definitions: Vec<ElementDefinition>,
}

impl ElementManifest {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ManifestError> {
        let parsed: TomlManifest = toml::from_str(content)?;
        let definitions = parsed
            .elements
            .into_iter()
            .map(|(name, element)| define(name, element))
            .collect::<Result<_, _>>()?;
        Ok(Self { definitions })
    }

    pub fn definitions(&self) -> &[ElementDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Register every definition. Returns how many names were new.
    pub fn register_all(self, registry: &mut Registry) -> usize {
        self.definitions
            .into_iter()
            .map(|definition| registry.register(definition))
            .filter(|added| *added)
            .count()
    }
}

fn define(name: String, element: TomlElement) -> Result<ElementDefinition, ManifestError> {
    let source = TemplateSource::split(element.template);
    let template = match source.template() {
        Ok(template) => Rc::new(template),
        Err(source) => return Err(ManifestError::Template { element: name, source }),
    };
    let paths: Vec<Vec<String>> = source
        .expressions()
        .into_iter()
        .map(|expr| expr.trim().split('.').map(str::to_string).collect())
        .collect();

    let mut definition = ElementDefinition::new(name.as_str(), move |cx| {
        let values = paths.iter().map(|path| lookup(cx, path)).collect();
        TemplateResult::new(Rc::clone(&template), values)
    });

    for (attr, type_name) in element.attrs {
        let Some(kind) = Kind::from_name(&type_name) else {
            return Err(ManifestError::UnknownType {
                element: name,
                attr,
                type_name,
            });
        };
        let mut attr_type = BasicType::new(kind);
        if element.required.contains(&attr) {
            attr_type = attr_type.required();
        }
        definition = definition.attr(attr, attr_type);
    }
    Ok(definition)
}

/// `meta.items.0.title`: an attribute, then object keys or array indices
fn lookup(cx: &RenderContext<'_>, path: &[String]) -> Value {
    let Some((attr, keys)) = path.split_first() else {
        return Value::Null;
    };
    let mut json = cx.attr(attr);
    for key in keys {
        let next = match key.parse::<usize>() {
            Ok(index) => json.get(index),
            Err(_) => json.get(key.as_str()),
        };
        json = next.cloned().unwrap_or_default();
    }
    Value::from_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html;
    use crate::log::RecordingSink;
    use crate::Renderer;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const MANIFEST: &str = r#"
[elements.app-item]
template = "<span>${meta.index}</span>"
attrs = { meta = "object" }
required = ["meta"]

[elements.todo-row]
template = "<li>${items.1.title}</li>"
attrs = { items = "array" }
"#;

    #[test]
    fn test_manifest_elements_hydrate() {
        let mut registry = Registry::new();
        let added = ElementManifest::from_str(MANIFEST).unwrap().register_all(&mut registry);
        assert_eq!(added, 2);

        let page = html!(["<app-item meta=\"", "\"></app-item>"], json!({"index": 1}));
        assert_eq!(
            Renderer::new(&registry).render(&page).unwrap(),
            "<app-item meta=\"{'index':1}\"><span>1</span></app-item>"
        );

        let rows = html!(["<todo-row items=\"", "\"></todo-row>"], json!([{"title": "a"}, {"title": "b"}]));
        assert_eq!(
            Renderer::new(&registry).render(&rows).unwrap(),
            "<todo-row items=\"[{'title':'a'},{'title':'b'}]\"><li>b</li></todo-row>"
        );
    }

    #[test]
    fn test_required_attribute_is_validated() {
        let mut registry = Registry::new();
        ElementManifest::from_str(MANIFEST).unwrap().register_all(&mut registry);
        let sink = Rc::new(RecordingSink::new());
        let out = Renderer::new(&registry)
            .with_sink(sink.clone())
            .render(&html!(["<app-item></app-item>"]))
            .unwrap();
        assert_eq!(out, "<app-item><span></span></app-item>");
        assert_eq!(sink.messages(), vec!["'<app-item> meta' Field is required"]);
    }

    #[test]
    fn test_unknown_attribute_type() {
        let err = ElementManifest::from_str(
            "[elements.x-a]\ntemplate = \"\"\nattrs = { n = \"integer\" }\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ManifestError::UnknownType { ref attr, ref type_name, .. } if attr == "n" && type_name == "integer"
        ));
    }

    #[test]
    fn test_template_error_names_the_element() {
        let err = ElementManifest::from_str("[elements.x-a]\ntemplate = \"<p>${oops\"\n").unwrap_err();
        assert!(matches!(err, ManifestError::Template { ref element, .. } if element == "x-a"));
    }

    #[test]
    fn test_empty_manifest() {
        assert!(ElementManifest::from_str("").unwrap().is_empty());
    }
}

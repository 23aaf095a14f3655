//! Turn template results into HTML text
//!
//! [`Resolver`] walks a [`TemplateResult`] synchronously, escaping each value
//! for the part it is bound to. Values that are still pending must be awaited
//! first with [`settle`].

pub mod directives;
pub mod escape;

use std::borrow::Cow;

use futures::future::{FutureExt, LocalBoxFuture};
use thiserror::Error;

use crate::config::RenderConfig;
use crate::error::TemplateError;
use crate::template::{AttributePart, Part, TemplateResult};
use crate::value::{json_number, Value};

pub use escape::{escape, EscapeContext};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("unknown part value: {kind} cannot be rendered as {part}")]
    UnknownPartValue { kind: &'static str, part: String },

    #[error("{directive} cannot be used on {part}")]
    IncompatiblePart { directive: &'static str, part: String },

    #[error("template expects {expected} values, got {found}")]
    ValueCount { expected: usize, found: usize },

    #[error("pending value must be settled before synchronous rendering")]
    PendingValue,

    #[error("pending value failed: {message}")]
    PendingFailed { message: String },

    #[error("pending value was already consumed")]
    PendingConsumed,
}

impl ResolveError {
    fn unknown(value: &Value, part: &Part) -> Self {
        ResolveError::UnknownPartValue {
            kind: value.kind(),
            part: part.to_string(),
        }
    }
}

/// What a directive sees: the part it is bound to, and a slot for its result
pub struct PartContext<'a> {
    part: &'a Part,
    value: Option<Value>,
}

impl<'a> PartContext<'a> {
    fn new(part: &'a Part) -> Self {
        Self { part, value: None }
    }

    pub fn part(&self) -> &Part {
        self.part
    }

    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.value = Some(value.into());
    }
}

/// Synchronous value resolver
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'c> {
    config: &'c RenderConfig,
}

impl<'c> Resolver<'c> {
    pub fn new(config: &'c RenderConfig) -> Self {
        Self { config }
    }

    pub fn resolve(&self, result: &TemplateResult) -> Result<String, ResolveError> {
        let mut out = String::new();
        self.write_template(result, &mut out)?;
        Ok(out)
    }

    fn write_template(&self, result: &TemplateResult, out: &mut String) -> Result<(), ResolveError> {
        let template = result.template()?;
        let values = result.values();
        if values.len() != template.slot_count() {
            return Err(ResolveError::ValueCount {
                expected: template.slot_count(),
                found: values.len(),
            });
        }

        let strings = template.strings();
        if let Some(Some(first)) = strings.first() {
            out.push_str(first);
        }

        for (index, part) in template.parts().iter().enumerate() {
            if let Some(part) = part {
                let bound = values
                    .get(index..index + part.segments())
                    .ok_or(ResolveError::ValueCount {
                        expected: index + part.segments(),
                        found: values.len(),
                    })?;
                self.write_part(part, bound, out)?;
            }
            if let Some(Some(string)) = strings.get(index + 1) {
                out.push_str(string);
            }
        }

        Ok(())
    }

    fn write_part(&self, part: &Part, values: &[Value], out: &mut String) -> Result<(), ResolveError> {
        match part {
            Part::Text(text) => {
                let context = EscapeContext::for_text_in(&text.tag_name);
                for value in values {
                    self.write_node(value, part, context, out)?;
                }
                Ok(())
            }
            Part::Attribute(attr) => {
                if let Some(text) = self.attribute_value(attr, part, values)? {
                    write_attribute(out, attr.leading, "", &attr.name, &text);
                }
                Ok(())
            }
            Part::Boolean(attr) => {
                let value = values.first().cloned().unwrap_or_default();
                let value = directive_value(&value, part)?;
                match &*value {
                    Value::Pending(_) => return Err(ResolveError::PendingValue),
                    v if v.is_truthy() => {
                        out.push(attr.leading);
                        out.push_str(&attr.name);
                    }
                    _ => {}
                }
                Ok(())
            }
            Part::Property(attr) => {
                if self.config.serialize_property_attributes {
                    if let Some(text) = self.attribute_value(attr, part, values)? {
                        write_attribute(out, attr.leading, ".", &attr.name, &text);
                    }
                }
                Ok(())
            }
            Part::Event(_) => Ok(()),
        }
    }

    fn write_node(
        &self,
        value: &Value,
        part: &Part,
        context: EscapeContext,
        out: &mut String,
    ) -> Result<(), ResolveError> {
        let value = directive_value(value, part)?;
        match &*value {
            Value::Null | Value::Nothing | Value::Function(_) => {}
            Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                if let Some(text) = value.primitive_string() {
                    out.push_str(&escape(&text, context));
                }
            }
            Value::Raw(markup) => out.push_str(markup),
            Value::Json(json) if json.is_object() => {
                out.push_str(&escape(&json_attribute_text(json), context));
            }
            Value::Json(json) => self.write_node(&Value::from_json(json), part, context, out)?,
            Value::Template(result) => self.write_template(result, out)?,
            Value::List(items) => {
                for item in items {
                    self.write_node(item, part, context, out)?;
                }
            }
            Value::Directive(_) => return Err(ResolveError::unknown(&value, part)),
            Value::Pending(_) => return Err(ResolveError::PendingValue),
        }
        Ok(())
    }

    /// The text between the quotes of an attribute, or `None` when the
    /// attribute must be dropped
    fn attribute_value(
        &self,
        attr: &AttributePart,
        part: &Part,
        values: &[Value],
    ) -> Result<Option<String>, ResolveError> {
        let mut text = String::new();

        for (literal, value) in attr.strings.iter().zip(values) {
            text.push_str(literal);
            let value = directive_value(value, part)?;
            match &*value {
                Value::Nothing | Value::Function(_) => return Ok(None),
                Value::Null => {}
                Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                    if let Some(s) = value.primitive_string() {
                        text.push_str(&escape(&s, EscapeContext::Attribute));
                    }
                }
                Value::Raw(markup) => text.push_str(markup),
                Value::Json(json) if json.is_object() || json.is_array() => {
                    text.push_str(&json_attribute_text(json));
                }
                Value::Json(json) => {
                    if let Some(s) = Value::from_json(json).primitive_string() {
                        text.push_str(&escape(&s, EscapeContext::Attribute));
                    }
                }
                Value::List(_) => match value.to_json() {
                    Some(json) => text.push_str(&json_attribute_text(&json)),
                    None => return Err(ResolveError::unknown(&value, part)),
                },
                Value::Template(_) | Value::Directive(_) => {
                    return Err(ResolveError::unknown(&value, part))
                }
                Value::Pending(_) => return Err(ResolveError::PendingValue),
            }
        }

        if let Some(suffix) = attr.strings.get(values.len()) {
            text.push_str(suffix);
        }
        Ok(Some(text))
    }
}

fn write_attribute(out: &mut String, leading: char, sigil: &str, name: &str, value: &str) {
    out.push(leading);
    out.push_str(sigil);
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(value);
    out.push('"');
}

/// Run a directive against its part and hand back what it produced.
/// Anything else passes through untouched.
fn directive_value<'v>(value: &'v Value, part: &Part) -> Result<Cow<'v, Value>, ResolveError> {
    let Value::Directive(directive) = value else {
        return Ok(Cow::Borrowed(value));
    };

    let mut cx = PartContext::new(part);
    directive.apply(&mut cx)?;
    Ok(Cow::Owned(cx.value.take().unwrap_or_default()))
}

/// JSON text with every `"` turned into `'`, safe inside a double-quoted
/// attribute. Integral floats are written without a fraction (`1`, not `1.0`).
pub fn json_attribute_text(json: &serde_json::Value) -> String {
    let mut json = json.clone();
    drop_integral_fractions(&mut json);
    json.to_string().replace('"', "'")
}

fn drop_integral_fractions(json: &mut serde_json::Value) {
    if json.is_f64() {
        if let Some(n) = json.as_f64() {
            *json = json_number(n);
        }
        return;
    }
    match json {
        serde_json::Value::Array(items) => items.iter_mut().for_each(drop_integral_fractions),
        serde_json::Value::Object(map) => map.values_mut().for_each(drop_integral_fractions),
        _ => {}
    }
}

/// Resolve with the default configuration
pub fn resolve_to_string(result: &TemplateResult) -> Result<String, ResolveError> {
    Resolver::new(&RenderConfig::default()).resolve(result)
}

/// Await every pending value in `result`, depth first in source order.
///
/// Settled values may themselves contain pending values; those are awaited
/// too. The first failure aborts the whole result.
pub fn settle(result: TemplateResult) -> LocalBoxFuture<'static, Result<TemplateResult, ResolveError>> {
    async move {
        let (template, values) = result.into_parts();
        let mut settled = Vec::with_capacity(values.len());
        for value in values {
            settled.push(settle_value(value).await?);
        }
        Ok(TemplateResult::from_parts(template, settled))
    }
    .boxed_local()
}

fn settle_value(value: Value) -> LocalBoxFuture<'static, Result<Value, ResolveError>> {
    async move {
        match value {
            Value::Pending(pending) => {
                let future = pending.take().ok_or(ResolveError::PendingConsumed)?;
                let resolved = future
                    .await
                    .map_err(|message| ResolveError::PendingFailed { message })?;
                settle_value(resolved).await
            }
            Value::Template(result) => Ok(Value::Template(settle(result).await?)),
            Value::List(items) => {
                let mut settled = Vec::with_capacity(items.len());
                for item in items {
                    settled.push(settle_value(item).await?);
                }
                Ok(Value::List(settled))
            }
            other => Ok(other),
        }
    }
    .boxed_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html;
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn resolve(result: &TemplateResult) -> String {
        resolve_to_string(result).unwrap()
    }

    #[test]
    fn test_number_in_text_and_attribute() {
        assert_eq!(resolve(&html!(["", ""], 42)), "42");
        assert_eq!(resolve(&html!(["<div attr=", "></div>"], 42)), "<div attr=\"42\"></div>");
    }

    #[test]
    fn test_null_renders_empty() {
        assert_eq!(resolve(&html!(["<p>", "</p>"], Value::Null)), "<p></p>");
        assert_eq!(resolve(&html!(["<p title=", "></p>"], Value::Null)), "<p title=\"\"></p>");
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(
            resolve(&html!(["<p>", "</p>"], "<b>\"hi\" & 'bye'</b>")),
            "<p>&lt;b&gt;&quot;hi&quot; &amp; &#x27;bye&#x27;&lt;/b&gt;</p>"
        );
    }

    #[test]
    fn test_script_body_escaping() {
        assert_eq!(
            resolve(&html!(["<script>var s = \"", "\";</script>"], "</script><!--")),
            "<script>var s = \"<\\/script>\\x3C!--\";</script>"
        );
    }

    #[test]
    fn test_object_in_attribute_uses_single_quotes() {
        let result = html!(["<x-a attr=\"", "\"></x-a>"], json!({"a": 1, "b": "x"}));
        assert_eq!(resolve(&result), "<x-a attr=\"{'a':1,'b':'x'}\"></x-a>");
    }

    #[test]
    fn test_list_with_nested_template() {
        let result = html!(["", ""], vec![Value::from(1), html!(["a"]).into()]);
        assert_eq!(resolve(&result), "1a");
    }

    #[test]
    fn test_nested_lists_flatten() {
        let inner = Value::List(vec![Value::from("b"), Value::from("c")]);
        let result = html!(["<p>", "</p>"], vec![Value::from("a"), inner]);
        assert_eq!(resolve(&result), "<p>abc</p>");
    }

    #[test]
    fn test_boolean_attribute() {
        assert_eq!(resolve(&html!(["<button ?disabled=", ">"], false)), "<button>");
        assert_eq!(resolve(&html!(["<button ?disabled=", ">"], true)), "<button disabled>");
    }

    #[test]
    fn test_event_attribute_is_inert() {
        let result = html!(["<button @click=", ">go</button>"], Value::function(|_| {}));
        assert_eq!(resolve(&result), "<button>go</button>");
    }

    #[test]
    fn test_property_attribute() {
        let result = html!(["<input .value=", ">"], "x");
        assert_eq!(resolve(&result), "<input>");

        let config = RenderConfig::new().with_serialize_property_attributes(true);
        assert_eq!(
            Resolver::new(&config).resolve(&result).unwrap(),
            "<input .value=\"x\">"
        );
    }

    #[test]
    fn test_quoted_attribute() {
        assert_eq!(
            resolve(&html!(["<div class=\"", "\"></div>"], "a")),
            "<div class=\"a\"></div>"
        );
    }

    #[test]
    fn test_multi_segment_attribute() {
        let result = html!(["<div class=\"a ", " ", " c\">", "</div>"], "b", 1, "t");
        assert_eq!(resolve(&result), "<div class=\"a b 1 c\">t</div>");
    }

    #[test]
    fn test_nothing_and_functions_drop_attributes() {
        assert_eq!(resolve(&html!(["<a href=", ">"], Value::Nothing)), "<a>");
        assert_eq!(resolve(&html!(["<a onclick=", ">"], Value::function(|_| {}))), "<a>");
        assert_eq!(resolve(&html!(["<p>", "</p>"], Value::function(|_| {}))), "<p></p>");
    }

    #[test]
    fn test_integral_floats_in_objects_have_no_fraction() {
        assert_eq!(
            json_attribute_text(&json!({"a": 1.0, "b": [2.0, 0.5], "c": {"d": -3.0}})),
            "{'a':1,'b':[2,0.5],'c':{'d':-3}}"
        );
    }

    #[test]
    fn test_list_in_attribute_goes_through_json() {
        let result = html!(["<x-a items=", "></x-a>"], vec!["a", "b"]);
        assert_eq!(resolve(&result), "<x-a items=\"['a','b']\"></x-a>");
    }

    #[test]
    fn test_template_in_attribute_is_unknown() {
        let result = html!(["<a title=", ">"], html!(["x"]));
        let err = resolve_to_string(&result).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownPartValue { kind: "template result", .. }));
    }

    #[test]
    fn test_object_in_text_is_escaped_json() {
        let result = html!(["<p>", "</p>"], json!({"a": "<"}));
        assert_eq!(resolve(&result), "<p>{&#x27;a&#x27;:&#x27;&lt;&#x27;}</p>");
    }

    #[test]
    fn test_value_count_mismatch() {
        let template = crate::template::Template::parse(&["<p>", "</p>"]).unwrap();
        let result = TemplateResult::new(std::rc::Rc::new(template), vec![]);
        assert!(matches!(
            resolve_to_string(&result),
            Err(ResolveError::ValueCount { expected: 1, found: 0 })
        ));
    }

    #[test]
    fn test_template_error_surfaces() {
        let result = html!(["<a ?x=\"", " ", "\">"], 1, 2);
        assert!(matches!(
            resolve_to_string(&result),
            Err(ResolveError::Template(TemplateError::BooleanAttributeExpressions { .. }))
        ));
    }

    #[test]
    fn test_pending_rejected_synchronously() {
        let pending = Value::pending(async { Ok::<_, String>(Value::from(1)) });
        let result = html!(["<p>", "</p>"], pending);
        assert!(matches!(resolve_to_string(&result), Err(ResolveError::PendingValue)));
    }

    #[test]
    fn test_settle_preserves_order() {
        let inner = Value::pending(async { Ok::<_, String>(Value::from("b")) });
        let nested = Value::pending(async move {
            Ok::<_, String>(Value::from(html!(["[", "]"], inner)))
        });
        let result = html!(["", "", ""], Value::pending(async { Ok::<_, String>(Value::from("a")) }), nested);
        let settled = block_on(settle(result)).unwrap();
        assert_eq!(resolve(&settled), "a[b]");
    }

    #[test]
    fn test_settle_failure_aborts() {
        let result = html!(["<p>", "</p>"], Value::pending(async { Err::<Value, _>("boom") }));
        let err = block_on(settle(result)).unwrap_err();
        assert!(matches!(err, ResolveError::PendingFailed { ref message } if message == "boom"));
    }
}

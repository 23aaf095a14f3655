//! Attribute types: parse raw attribute strings, validate the result

use crate::log::LogSink;
use crate::value::json_number;

/// Coerces one attribute of a custom element.
///
/// `parse` turns the raw attribute text (absent when the attribute is not
/// present) into a JSON value. `validate` reports problems with a parsed
/// value to the sink; it never fails the render.
pub trait AttrType {
    fn type_name(&self) -> &str;

    fn parse(&self, raw: Option<&str>) -> serde_json::Value;

    fn validate(&self, context: &str, value: &serde_json::Value, sink: &dyn LogSink);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl Kind {
    /// The kind called `name`, as written in element manifests
    pub fn from_name(name: &str) -> Option<Kind> {
        match name {
            "string" => Some(Kind::String),
            "number" => Some(Kind::Number),
            "boolean" => Some(Kind::Boolean),
            "object" => Some(Kind::Object),
            "array" => Some(Kind::Array),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Boolean => "boolean",
            Kind::Object => "object",
            Kind::Array => "array",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicType {
    kind: Kind,
    required: bool,
}

pub fn string() -> BasicType {
    BasicType::new(Kind::String)
}

pub fn number() -> BasicType {
    BasicType::new(Kind::Number)
}

pub fn boolean() -> BasicType {
    BasicType::new(Kind::Boolean)
}

pub fn object() -> BasicType {
    BasicType::new(Kind::Object)
}

pub fn array() -> BasicType {
    BasicType::new(Kind::Array)
}

impl BasicType {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            required: false,
        }
    }

    /// Report a missing value
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }
}

/// `typeof` as JavaScript reports it for a JSON value
fn type_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            "object"
        }
    }
}

/// Parse the single-quoted JSON attribute form. Text that is not JSON is
/// kept as a string so validation can report it.
fn parse_json_attribute(raw: &str) -> serde_json::Value {
    serde_json::from_str(&raw.replace('\'', "\""))
        .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

impl AttrType for BasicType {
    fn type_name(&self) -> &str {
        self.kind.name()
    }

    fn parse(&self, raw: Option<&str>) -> serde_json::Value {
        let Some(raw) = raw else {
            return serde_json::Value::Null;
        };

        match self.kind {
            Kind::String => serde_json::Value::String(raw.to_string()),
            Kind::Number => match raw.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => json_number(n),
                _ => serde_json::Value::String(raw.to_string()),
            },
            // presence means true, except for an explicit "false"
            Kind::Boolean => serde_json::Value::Bool(raw != "false"),
            Kind::Object | Kind::Array if raw.trim().is_empty() => serde_json::Value::Null,
            Kind::Object | Kind::Array => parse_json_attribute(raw),
        }
    }

    fn validate(&self, context: &str, value: &serde_json::Value, sink: &dyn LogSink) {
        if value.is_null() {
            if self.required {
                sink.log_error(&format!("'{context}' Field is required"));
            }
            return;
        }

        match self.kind {
            Kind::String | Kind::Number | Kind::Boolean => {
                let expected = self.kind.name();
                let actual = type_of(value);
                if actual != expected {
                    sink.log_error(&format!(
                        "'{context}' Expected type '{expected}' got type '{actual}'"
                    ));
                }
            }
            Kind::Object if !value.is_object() => {
                sink.log_error(&format!(
                    "'{context}' Expected object literal '{{}}' got '{}'",
                    type_of(value)
                ));
            }
            Kind::Array if !value.is_array() => {
                sink.log_error(&format!("Expected Array got {value}"));
            }
            Kind::Object | Kind::Array => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::RecordingSink;
    use serde_json::json;

    #[test]
    fn test_parse_string_and_number() {
        assert_eq!(string().parse(Some("hi")), json!("hi"));
        assert_eq!(number().parse(Some("3")), json!(3));
        assert_eq!(number().parse(Some("1.5")), json!(1.5));
        assert_eq!(number().parse(Some("abc")), json!("abc"));
        assert_eq!(number().parse(None), serde_json::Value::Null);
    }

    #[test]
    fn test_parse_boolean() {
        assert_eq!(boolean().parse(Some("")), json!(true));
        assert_eq!(boolean().parse(Some("false")), json!(false));
        assert_eq!(boolean().parse(None), serde_json::Value::Null);
    }

    #[test]
    fn test_parse_single_quoted_json() {
        assert_eq!(object().parse(Some("{'index':1}")), json!({"index": 1}));
        assert_eq!(array().parse(Some("['a','b']")), json!(["a", "b"]));
        assert_eq!(object().parse(Some("{broken")), json!("{broken"));
    }

    #[test]
    fn test_validation_messages() {
        let sink = RecordingSink::new();
        string().required().validate("<x-a> title", &serde_json::Value::Null, &sink);
        number().validate("<x-a> count", &json!("abc"), &sink);
        object().validate("<x-a> meta", &json!([1]), &sink);
        array().validate("<x-a> items", &json!({"a": 1}), &sink);
        assert_eq!(
            sink.messages(),
            vec![
                "'<x-a> title' Field is required",
                "'<x-a> count' Expected type 'number' got type 'string'",
                "'<x-a> meta' Expected object literal '{}' got 'object'",
                "Expected Array got {\"a\":1}",
            ]
        );
    }

    #[test]
    fn test_valid_values_are_silent() {
        let sink = RecordingSink::new();
        number().required().validate("n", &json!(2), &sink);
        object().validate("o", &json!({}), &sink);
        string().validate("s", &serde_json::Value::Null, &sink);
        assert!(sink.messages().is_empty());
    }
}

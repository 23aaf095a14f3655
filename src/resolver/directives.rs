//! Built-in directives

use crate::resolver::ResolveError;
use crate::template::Part;
use crate::value::{Directive, Value};

/// Emit `markup` verbatim. Only valid in text content.
pub fn unsafe_html(markup: impl Into<String>) -> Value {
    let markup = markup.into();
    Value::Directive(Directive::new(move |cx| {
        if !matches!(cx.part(), Part::Text(_)) {
            return Err(ResolveError::IncompatiblePart {
                directive: "unsafe_html",
                part: cx.part().to_string(),
            });
        }
        cx.set_value(Value::Raw(markup.clone()));
        Ok(())
    }))
}

/// Join the enabled class names with single spaces.
///
/// Only valid as the sole expression of a `class` attribute.
pub fn class_map<I, K>(classes: I) -> Value
where
    I: IntoIterator<Item = (K, bool)>,
    K: Into<String>,
{
    let names: Vec<String> = classes
        .into_iter()
        .filter(|(_, enabled)| *enabled)
        .map(|(name, _)| name.into())
        .collect();

    Value::Directive(Directive::new(move |cx| {
        let valid = matches!(
            cx.part(),
            Part::Attribute(attr) if attr.name == "class" && attr.segments() == 1
        );
        if !valid {
            return Err(ResolveError::IncompatiblePart {
                directive: "class_map",
                part: cx.part().to_string(),
            });
        }
        cx.set_value(names.join(" "));
        Ok(())
    }))
}

/// Drop the attribute when `value` is null, otherwise render it as usual
pub fn if_defined(value: impl Into<Value>) -> Value {
    let value = value.into();
    Value::Directive(Directive::new(move |cx| {
        if matches!(cx.part(), Part::Text(_)) {
            return Err(ResolveError::IncompatiblePart {
                directive: "if_defined",
                part: cx.part().to_string(),
            });
        }
        match &value {
            Value::Null => cx.set_value(Value::Nothing),
            other => cx.set_value(other.clone()),
        }
        Ok(())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html;
    use crate::resolver::resolve_to_string;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unsafe_html_in_text() {
        let result = html!(["<div>", "</div>"], unsafe_html("<b>bold</b>"));
        assert_eq!(resolve_to_string(&result).unwrap(), "<div><b>bold</b></div>");
    }

    #[test]
    fn test_unsafe_html_rejects_attributes() {
        let result = html!(["<div title=", "></div>"], unsafe_html("<b>"));
        let err = resolve_to_string(&result).unwrap_err();
        assert!(matches!(err, ResolveError::IncompatiblePart { directive: "unsafe_html", .. }));
    }

    #[test]
    fn test_class_map() {
        let classes = class_map([("active", true), ("hidden", false), ("large", true)]);
        let result = html!(["<div class=\"", "\"></div>"], classes);
        assert_eq!(
            resolve_to_string(&result).unwrap(),
            "<div class=\"active large\"></div>"
        );
    }

    #[test]
    fn test_class_map_needs_class_attribute() {
        let result = html!(["<div id=", "></div>"], class_map([("a", true)]));
        assert!(resolve_to_string(&result).is_err());

        let mixed = html!(["<div class=\"x ", "\"></div>"], class_map([("a", true)]));
        assert!(resolve_to_string(&mixed).is_ok());

        let merged = html!(
            ["<div class=\"", " ", "\"></div>"],
            class_map([("a", true)]),
            "b"
        );
        assert!(matches!(
            resolve_to_string(&merged),
            Err(ResolveError::IncompatiblePart { directive: "class_map", .. })
        ));
    }

    #[test]
    fn test_if_defined() {
        let missing: Option<&str> = None;
        let result = html!(["<img src=", ">"], if_defined(missing));
        assert_eq!(resolve_to_string(&result).unwrap(), "<img>");

        let result = html!(["<img src=", ">"], if_defined("a.png"));
        assert_eq!(resolve_to_string(&result).unwrap(), "<img src=\"a.png\">");
    }
}

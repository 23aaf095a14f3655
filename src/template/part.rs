//! Parts: the typed placeholders of a parsed template

use std::fmt;

/// An interpolation in text content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPart {
    /// Name of the element the text sits in (empty at top level)
    pub tag_name: String,
}

/// An interpolation inside an attribute value.
///
/// `strings` holds the literal text around the expressions of a quoted value,
/// so an attribute bound to `k` expressions carries `k + 1` strings. Unquoted
/// values bind a single expression with two empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePart {
    /// Attribute name with its sigil removed
    pub name: String,
    pub strings: Vec<String>,
    pub tag_name: String,
    /// Whitespace that separated the attribute from what came before it
    pub leading: char,
}

impl AttributePart {
    /// Number of values this part consumes
    pub fn segments(&self) -> usize {
        self.strings.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Text,
    Attribute,
    Boolean,
    Property,
    Event,
}

impl PartKind {
    fn sigil(self) -> &'static str {
        match self {
            PartKind::Boolean => "?",
            PartKind::Property => ".",
            PartKind::Event => "@",
            PartKind::Text | PartKind::Attribute => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(TextPart),
    /// `name=${v}`
    Attribute(AttributePart),
    /// `?name=${v}`
    Boolean(AttributePart),
    /// `.name=${v}`
    Property(AttributePart),
    /// `@name=${v}`
    Event(AttributePart),
}

impl Part {
    /// Build an attribute-family part from a raw name, dispatching on its sigil
    pub(crate) fn attribute(raw_name: &str, strings: Vec<String>, tag_name: &str, leading: char) -> Self {
        let (kind, name) = match raw_name.as_bytes().first() {
            Some(b'.') => (PartKind::Property, &raw_name[1..]),
            Some(b'@') => (PartKind::Event, &raw_name[1..]),
            Some(b'?') => (PartKind::Boolean, &raw_name[1..]),
            _ => (PartKind::Attribute, raw_name),
        };
        let attr = AttributePart {
            name: name.to_string(),
            strings,
            tag_name: tag_name.to_string(),
            leading,
        };
        match kind {
            PartKind::Property => Part::Property(attr),
            PartKind::Event => Part::Event(attr),
            PartKind::Boolean => Part::Boolean(attr),
            _ => Part::Attribute(attr),
        }
    }

    pub fn kind(&self) -> PartKind {
        match self {
            Part::Text(_) => PartKind::Text,
            Part::Attribute(_) => PartKind::Attribute,
            Part::Boolean(_) => PartKind::Boolean,
            Part::Property(_) => PartKind::Property,
            Part::Event(_) => PartKind::Event,
        }
    }

    pub fn tag_name(&self) -> &str {
        match self {
            Part::Text(text) => &text.tag_name,
            Part::Attribute(attr) | Part::Boolean(attr) | Part::Property(attr) | Part::Event(attr) => {
                &attr.tag_name
            }
        }
    }

    /// The attribute binding, for every kind except text
    pub fn as_attribute(&self) -> Option<&AttributePart> {
        match self {
            Part::Text(_) => None,
            Part::Attribute(attr) | Part::Boolean(attr) | Part::Property(attr) | Part::Event(attr) => {
                Some(attr)
            }
        }
    }

    /// Number of consecutive values this part consumes
    pub fn segments(&self) -> usize {
        self.as_attribute().map_or(1, AttributePart::segments)
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Part::Text(text) if text.tag_name.is_empty() => f.write_str("text"),
            Part::Text(text) => write!(f, "text in <{}>", text.tag_name),
            _ => {
                let attr = self.as_attribute().ok_or(fmt::Error)?;
                write!(
                    f,
                    "attribute `{}{}` on <{}>",
                    self.kind().sigil(),
                    attr.name,
                    attr.tag_name
                )?;
                if attr.segments() > 1 {
                    write!(f, " ({} expressions)", attr.segments())?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigil_dispatch() {
        let strings = || vec![String::new(), String::new()];
        assert_eq!(Part::attribute("@click", strings(), "button", ' ').kind(), PartKind::Event);
        assert_eq!(Part::attribute(".value", strings(), "input", ' ').kind(), PartKind::Property);
        assert_eq!(Part::attribute("?hidden", strings(), "div", ' ').kind(), PartKind::Boolean);
        assert_eq!(Part::attribute("title", strings(), "div", ' ').kind(), PartKind::Attribute);
    }

    #[test]
    fn test_sigil_is_stripped_from_name() {
        let part = Part::attribute("@click", vec![String::new(), String::new()], "button", ' ');
        assert_eq!(part.as_attribute().map(|a| a.name.as_str()), Some("click"));
    }

    #[test]
    fn test_display() {
        let part = Part::attribute(
            "class",
            vec!["a ".into(), " ".into(), " c".into()],
            "div",
            ' ',
        );
        assert_eq!(part.to_string(), "attribute `class` on <div> (2 expressions)");
        assert_eq!(part.segments(), 2);

        let text = Part::Text(TextPart { tag_name: "p".into() });
        assert_eq!(text.to_string(), "text in <p>");
        assert_eq!(text.segments(), 1);
    }
}

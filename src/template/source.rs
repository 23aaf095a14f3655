//! Template text kept outside Rust source, with `${...}` placeholders

use crate::error::{Location, Span, TemplateError};
use crate::template::Template;

/// Template text split at its `${...}` placeholders.
///
/// Placeholders are brace-balanced, so `${ {"index": 1} }` is one
/// placeholder. A `${` that is never closed is reported when the template is
/// parsed; until then the rest of the text counts as literal.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    text: String,
    fragments: Vec<Span>,
    expressions: Vec<Span>,
    unclosed: Option<usize>,
}

impl TemplateSource {
    pub fn split(text: impl Into<String>) -> Self {
        let text = text.into();
        let bytes = text.as_bytes();
        let mut fragments = Vec::new();
        let mut expressions = Vec::new();
        let mut unclosed = None;
        let mut fragment_start = 0;
        let mut i = 0;

        while i + 1 < bytes.len() {
            if !(bytes[i] == b'$' && bytes[i + 1] == b'{') {
                i += 1;
                continue;
            }

            let mut depth = 1;
            let mut end = i + 2;
            while end < bytes.len() && depth > 0 {
                match bytes[end] {
                    b'{' => depth += 1,
                    b'}' => depth -= 1,
                    _ => {}
                }
                end += 1;
            }

            if depth > 0 {
                unclosed = Some(i);
                break;
            }

            fragments.push(fragment_start..i);
            expressions.push(i + 2..end - 1);
            fragment_start = end;
            i = end;
        }

        fragments.push(fragment_start..text.len());

        Self {
            text,
            fragments,
            expressions,
            unclosed,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Static text between placeholders; always one more than the expressions
    pub fn fragments(&self) -> Vec<&str> {
        self.fragments.iter().map(|span| &self.text[span.clone()]).collect()
    }

    /// Placeholder contents, trimmed
    pub fn expressions(&self) -> Vec<&str> {
        self.expressions
            .iter()
            .map(|span| self.text[span.clone()].trim())
            .collect()
    }

    /// Map a fragment-relative location to a byte range in the full text
    pub fn absolute_span(&self, location: &Location) -> Span {
        let base = self
            .fragments
            .get(location.fragment)
            .map_or(0, |span| span.start);
        let end = (base + location.span.end).min(self.text.len());
        let start = (base + location.span.start).min(end);
        start..end
    }

    /// Classify the placeholders of this source
    pub fn template(&self) -> Result<Template, TemplateError> {
        if let Some(offset) = self.unclosed {
            let fragment = self.fragments.len() - 1;
            let base = self.fragments[fragment].start;
            return Err(TemplateError::UnclosedPlaceholder {
                location: Location::new(fragment, offset - base..self.text.len() - base),
            });
        }
        Template::parse(&self.fragments())
    }
}

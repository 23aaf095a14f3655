//! Context-sensitive escaping

use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeContext {
    /// Element text content
    Text,
    /// A double-quoted attribute value
    Attribute,
    /// Body of a `<script>` or `<style>` element
    RawText,
}

impl EscapeContext {
    /// Context for text content inside the element `tag_name`
    pub fn for_text_in(tag_name: &str) -> Self {
        if tag_name.eq_ignore_ascii_case("script") || tag_name.eq_ignore_ascii_case("style") {
            EscapeContext::RawText
        } else {
            EscapeContext::Text
        }
    }
}

pub fn escape(input: &str, context: EscapeContext) -> Cow<'_, str> {
    match context {
        EscapeContext::Text | EscapeContext::Attribute => escape_entities(input),
        EscapeContext::RawText => escape_raw_text(input),
    }
}

fn entity(c: char) -> Option<&'static str> {
    match c {
        '"' => Some("&quot;"),
        '\'' => Some("&#x27;"),
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        _ => None,
    }
}

fn escape_entities(input: &str) -> Cow<'_, str> {
    if !input.chars().any(|c| entity(c).is_some()) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match entity(c) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// `</script` and `</style` become `<\/script` and `<\/style` (case kept),
/// `<!--` becomes `\x3C!--`. Nothing else changes.
fn escape_raw_text(input: &str) -> Cow<'_, str> {
    if !input.contains("</") && !input.contains("<!--") {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len() + 8);
    let mut rest = input;
    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("<!--") {
            out.push_str("\\x3C!--");
            rest = after;
        } else if let Some(name) = closing_raw_text_tag(tail) {
            out.push_str("<\\/");
            out.push_str(name);
            rest = &tail[2 + name.len()..];
        } else {
            out.push('<');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn closing_raw_text_tag(tail: &str) -> Option<&str> {
    let name = tail.strip_prefix("</")?;
    ["script", "style"].into_iter().find_map(|tag| {
        name.get(..tag.len())
            .filter(|candidate| candidate.eq_ignore_ascii_case(tag))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entities() {
        assert_eq!(
            escape(r#"<a href="x">Tom & 'Jerry'</a>"#, EscapeContext::Text),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_plain_text_is_borrowed() {
        assert!(matches!(escape("hello", EscapeContext::Attribute), Cow::Borrowed(_)));
    }

    #[test]
    fn test_raw_text_neutralizes_closing_tags() {
        assert_eq!(
            escape("a</SCRIPT><b>", EscapeContext::RawText),
            "a<\\/SCRIPT><b>"
        );
        assert_eq!(escape("x</style>", EscapeContext::RawText), "x<\\/style>");
        assert_eq!(escape("<!-- c", EscapeContext::RawText), "\\x3C!-- c");
        assert_eq!(escape("a < b && c", EscapeContext::RawText), "a < b && c");
    }

    #[test]
    fn test_context_for_tag() {
        assert_eq!(EscapeContext::for_text_in("script"), EscapeContext::RawText);
        assert_eq!(EscapeContext::for_text_in("STYLE"), EscapeContext::RawText);
        assert_eq!(EscapeContext::for_text_in("div"), EscapeContext::Text);
    }
}

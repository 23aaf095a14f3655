//! Classify the interpolations of a template by scanning its static fragments
//!
//! Each boundary between two fragments is one interpolation. The scanner
//! decides from the text before the boundary whether the interpolation sits
//! in text content or inside an open tag, and in the latter case which
//! attribute it binds to.

use crate::error::{Location, TemplateError};
use crate::template::part::{Part, TextPart};
use crate::template::Template;

/// Where the last tag delimiter of a fragment left us
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagState {
    /// A `<` with no later `>`: byte offset of the `<`
    Open(usize),
    /// A `>` with no later `<`: byte offset of the `>`
    Closed(usize),
    /// No delimiter: the previous context carries over
    Unchanged,
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0C' | '\r')
}

fn is_tag_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

fn is_attribute_name_char(c: char) -> bool {
    !(c <= '\x1F'
        || ('\x7F'..='\u{9F}').contains(&c)
        || matches!(c, ' ' | '"' | '\'' | '>' | '=' | '/'))
}

fn is_unquoted_value_char(c: char) -> bool {
    !(is_space(c) || matches!(c, '"' | '\'' | '`' | '<' | '>' | '='))
}

/// Find the last `<` or `>` outside comments. `in_comment` carries comment
/// state across fragments.
fn scan_tag_state(fragment: &str, in_comment: &mut bool) -> TagState {
    let bytes = fragment.as_bytes();
    let mut state = TagState::Unchanged;
    let mut i = 0;

    while i < bytes.len() {
        if *in_comment {
            if bytes[i..].starts_with(b"-->") {
                *in_comment = false;
                state = TagState::Closed(i + 2);
                i += 3;
            } else {
                i += 1;
            }
            continue;
        }
        if bytes[i..].starts_with(b"<!--") {
            *in_comment = true;
            i += 4;
            continue;
        }
        match bytes[i] {
            b'<' => state = TagState::Open(i),
            b'>' => state = TagState::Closed(i),
            _ => {}
        }
        i += 1;
    }

    state
}

fn tag_name_at(fragment: &str, open: usize) -> String {
    fragment[open + 1..]
        .chars()
        .take_while(|&c| is_tag_name_char(c))
        .collect()
}

/// The attribute an interpolation at the end of `fragment` binds to
#[derive(Debug, PartialEq, Eq)]
struct AttributeMatch<'a> {
    /// Byte offset of the whitespace before the name
    start: usize,
    leading: char,
    name: &'a str,
    /// Everything after the name: `=`, optional spaces, and an opening quote
    suffix: &'a str,
}

impl AttributeMatch<'_> {
    fn quote(&self) -> Option<(usize, char)> {
        self.suffix
            .char_indices()
            .find(|&(_, c)| c == '"' || c == '\'')
    }
}

/// Leftmost match of `ws name ws* = ws* (unquoted | "… | '…)` running to the
/// end of the fragment
fn last_attribute_name(fragment: &str) -> Option<AttributeMatch<'_>> {
    fragment
        .char_indices()
        .filter(|&(_, c)| is_space(c))
        .find_map(|(start, leading)| match_attribute_at(fragment, start, leading))
}

fn match_attribute_at(fragment: &str, start: usize, leading: char) -> Option<AttributeMatch<'_>> {
    let rest = &fragment[start + leading.len_utf8()..];
    let name_len = rest
        .char_indices()
        .find(|&(_, c)| !is_attribute_name_char(c))
        .map_or(rest.len(), |(i, _)| i);
    if name_len == 0 {
        return None;
    }

    let (name, suffix) = rest.split_at(name_len);
    let value = suffix
        .trim_start_matches(is_space)
        .strip_prefix('=')?
        .trim_start_matches(is_space);

    let valid = match value.chars().next() {
        Some(quote @ ('"' | '\'')) => !value[1..].contains(quote),
        _ => value.chars().all(is_unquoted_value_char),
    };

    valid.then_some(AttributeMatch {
        start,
        leading,
        name,
        suffix,
    })
}

impl Template {
    /// Parse static fragments into strings and parts.
    ///
    /// `fragments.len() - 1` interpolations produce exactly that many part
    /// slots. A quoted attribute value spanning `k` interpolations occupies
    /// one part followed by `k - 1` empty slots.
    pub fn parse<S: AsRef<str>>(fragments: &[S]) -> Result<Self, TemplateError> {
        let fragments: Vec<&str> = fragments.iter().map(AsRef::as_ref).collect();
        let slots = fragments.len().saturating_sub(1);

        let mut strings: Vec<Option<String>> = Vec::with_capacity(slots + 1);
        let mut parts: Vec<Option<Part>> = Vec::with_capacity(slots);

        let mut attribute_mode = false;
        let mut in_comment = false;
        let mut tag_name = String::new();
        let mut next = fragments.first().copied().unwrap_or("");
        let mut i = 0;

        while i < slots {
            let string = next;
            next = fragments[i + 1];

            match scan_tag_state(string, &mut in_comment) {
                TagState::Open(at) => {
                    attribute_mode = true;
                    tag_name = tag_name_at(string, at);
                }
                TagState::Closed(at) => {
                    attribute_mode = false;
                    // empty after an end tag or comment
                    if let Some(open) = string[..at].rfind('<') {
                        tag_name = tag_name_at(string, open);
                    }
                }
                TagState::Unchanged => {}
            }
            if in_comment {
                attribute_mode = false;
            }

            if !attribute_mode {
                strings.push(Some(string.to_string()));
                parts.push(Some(Part::Text(TextPart {
                    tag_name: tag_name.clone(),
                })));
                i += 1;
                continue;
            }

            let Some(found) = last_attribute_name(string) else {
                return Err(TemplateError::UnboundTagExpression {
                    tag_name: tag_name.clone(),
                    location: Location::new(i, string.len()..string.len()),
                });
            };

            let mut skip = 0;
            let inner = match found.quote() {
                Some((quote_at, quote)) => {
                    let mut inner = vec![found.suffix[quote_at + 1..].to_string()];
                    loop {
                        let Some(candidate) = fragments.get(i + skip + 1) else {
                            return Err(TemplateError::UnterminatedAttribute {
                                name: found.name.to_string(),
                                location: Location::new(i, found.start + 1..string.len()),
                            });
                        };
                        match candidate.find(quote) {
                            Some(close) => {
                                inner.push(candidate[..close].to_string());
                                next = &candidate[close + 1..];
                                break;
                            }
                            None if i + skip + 2 < fragments.len() => {
                                inner.push(candidate.to_string());
                                skip += 1;
                            }
                            None => {
                                return Err(TemplateError::UnterminatedAttribute {
                                    name: found.name.to_string(),
                                    location: Location::new(i, found.start + 1..string.len()),
                                });
                            }
                        }
                    }
                    inner
                }
                None => vec![String::new(), String::new()],
            };

            if found.name.starts_with('?') && skip > 0 {
                return Err(TemplateError::BooleanAttributeExpressions {
                    name: found.name[1..].to_string(),
                    count: skip + 1,
                    location: Location::new(i, found.start + 1..string.len()),
                });
            }

            strings.push(Some(string[..found.start].to_string()));
            parts.push(Some(Part::attribute(found.name, inner, &tag_name, found.leading)));
            for _ in 0..skip {
                strings.push(None);
                parts.push(None);
            }
            i += skip + 1;
        }

        strings.push(Some(next.to_string()));

        Ok(Template { strings, parts })
    }
}

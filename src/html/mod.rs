//! Lightweight HTML tree used for hydration
//!
//! [`parse`] never fails: malformed markup produces the closest tree it can.
//! [`serialize`] is its structural inverse, so re-parsing serialized output
//! yields the same tree.

pub mod grammar;
pub mod lexer;
mod serialize;
mod tree;

pub use serialize::serialize;
pub use tree::parse;

use std::fmt::Write;

/// Elements that never have children or a closing tag
pub const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Attributes in source order. Inserting an existing name replaces its value
/// in place.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut attrs = Attributes::new();
        for (name, value) in iter {
            attrs.insert(name, value);
        }
        attrs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagNode {
    pub name: String,
    pub attrs: Attributes,
    pub children: Vec<Node>,
    pub void_element: bool,
}

/// Frees descendants from a flat list so dropping a deep tree does not
/// recurse once per level
impl Drop for TagNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(node) = pending.pop() {
            if let Node::Tag(mut tag) = node {
                pending.append(&mut tag.children);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Tag(TagNode),
    Comment(String),
    /// `<!DOCTYPE …>` and similar, stored without the angle brackets
    Declaration(String),
}

/// Indented outline of a tree, one node per line
pub fn outline(nodes: &[Node]) -> String {
    let mut out = String::new();
    let mut stack: Vec<(&Node, usize)> = nodes.iter().rev().map(|node| (node, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        let indent = "  ".repeat(depth);
        let _ = match node {
            Node::Text(content) => writeln!(out, "{indent}text {content:?}"),
            Node::Comment(text) => writeln!(out, "{indent}comment {text:?}"),
            Node::Declaration(text) => writeln!(out, "{indent}declaration {text:?}"),
            Node::Tag(tag) => {
                let _ = write!(out, "{indent}<{}>", tag.name);
                for (name, value) in tag.attrs.iter() {
                    let _ = write!(out, " {name}={value:?}");
                }
                if tag.void_element {
                    out.push_str(" (void)");
                }
                out.push('\n');
                stack.extend(tag.children.iter().rev().map(|child| (child, depth + 1)));
                Ok(())
            }
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_overwrite_in_place() {
        let mut attrs = Attributes::new();
        attrs.insert("a", "1");
        attrs.insert("b", "2");
        attrs.insert("a", "3");
        assert_eq!(attrs.iter().collect::<Vec<_>>(), vec![("a", "3"), ("b", "2")]);
        assert_eq!(attrs.get("a"), Some("3"));
        assert_eq!(attrs.get("c"), None);
    }

    #[test]
    fn test_void_elements() {
        assert!(is_void_element("br"));
        assert!(is_void_element("IMG"));
        assert!(!is_void_element("div"));
    }

    #[test]
    fn test_deeply_nested_tree_serializes_and_drops() {
        const DEPTH: usize = 100_000;
        let html = "<div>".repeat(DEPTH) + "x" + &"</div>".repeat(DEPTH);
        let nodes = parse(&html);
        assert_eq!(serialize(&nodes), html);
        drop(nodes);
    }

    #[test]
    fn test_outline() {
        let nodes = parse("<!DOCTYPE html><ul class=\"x\"><li>a</li><br/><!--c--></ul>");
        insta::assert_snapshot!(outline(&nodes), @r###"
        declaration "!DOCTYPE html"
        <ul> class="x"
          <li>
            text "a"
          <br> (void)
          comment "c"
        "###);
    }
}

//! Build a node tree from markup tokens with an explicit element stack

use logos::Logos;

use crate::html::grammar::parse_attributes;
use crate::html::lexer::MarkupToken;
use crate::html::{is_void_element, Node, TagNode};

/// What the most recent token was, for the whitespace rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Start,
    Open,
    Closed,
}

struct TreeBuilder {
    root: Vec<Node>,
    stack: Vec<TagNode>,
    boundary: Boundary,
    text: String,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            root: Vec::new(),
            stack: Vec::new(),
            boundary: Boundary::Start,
            text: String::new(),
        }
    }

    fn append(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.push(node),
        }
    }

    /// Emit pending text. Text after an open tag (or at the very start) is
    /// kept as is; after anything else, whitespace-only text collapses to one
    /// space and disappears at the edges of the document.
    fn flush_text(&mut self, at_end: bool) {
        if self.text.is_empty() {
            return;
        }
        let content = std::mem::take(&mut self.text);

        if self.boundary == Boundary::Closed && content.chars().all(char::is_whitespace) {
            let at_root_start = self.stack.is_empty() && self.root.is_empty();
            if !at_end && !at_root_start {
                self.append(Node::Text(" ".to_string()));
            }
            return;
        }
        self.append(Node::Text(content));
    }

    fn leaf(&mut self, node: Node) {
        self.flush_text(false);
        self.append(node);
        self.boundary = Boundary::Closed;
    }

    fn open(&mut self, tag: TagNode) {
        self.flush_text(false);
        if tag.void_element {
            self.append(Node::Tag(tag));
            self.boundary = Boundary::Closed;
        } else {
            self.stack.push(tag);
            self.boundary = Boundary::Open;
        }
    }

    /// Pop up to the nearest open element called `name`. A close tag with no
    /// matching element is skipped entirely: pending text and the boundary
    /// stay as if it were absent.
    fn close(&mut self, name: &str) {
        let Some(depth) = self
            .stack
            .iter()
            .rposition(|tag| tag.name.eq_ignore_ascii_case(name))
        else {
            return;
        };

        self.flush_text(false);
        while self.stack.len() > depth {
            if let Some(tag) = self.stack.pop() {
                self.append(Node::Tag(tag));
            }
        }
        self.boundary = Boundary::Closed;
    }

    fn finish(mut self) -> Vec<Node> {
        self.flush_text(true);
        while let Some(tag) = self.stack.pop() {
            self.append(Node::Tag(tag));
        }
        self.root
    }
}

/// Split `<name attrs…>` into a tag node
fn open_tag(slice: &str) -> TagNode {
    let inner = &slice[1..slice.len() - 1];
    let self_closing = inner.ends_with('/');
    let inner = inner.strip_suffix('/').unwrap_or(inner);

    let name_end = inner
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(inner.len());
    let name = &inner[..name_end];

    TagNode {
        name: name.to_string(),
        attrs: parse_attributes(&inner[name_end..]),
        children: Vec::new(),
        void_element: self_closing || is_void_element(name),
    }
}

fn close_tag_name(slice: &str) -> &str {
    slice[2..slice.len() - 1].trim()
}

fn is_raw_text_element(name: &str) -> bool {
    name.eq_ignore_ascii_case("script") || name.eq_ignore_ascii_case("style")
}

/// Parse markup into a list of root nodes
pub fn parse(html: &str) -> Vec<Node> {
    let mut builder = TreeBuilder::new();
    let mut lexer = MarkupToken::lexer(html);

    while let Some(token) = lexer.next() {
        let Ok(token) = token else {
            continue;
        };

        match token {
            MarkupToken::Text(text) => builder.text.push_str(text),
            MarkupToken::Lt => builder.text.push('<'),
            MarkupToken::Comment(body) => builder.leaf(Node::Comment(body.to_string())),
            MarkupToken::Tag(slice) if slice.starts_with("</") => builder.close(close_tag_name(slice)),
            MarkupToken::Tag(slice) if slice.starts_with("<!") => {
                builder.leaf(Node::Declaration(slice[1..slice.len() - 1].to_string()))
            }
            MarkupToken::Tag(slice) => {
                let tag = open_tag(slice);
                let raw_text = !tag.void_element && is_raw_text_element(&tag.name);
                let closing = format!("</{}", tag.name.to_ascii_lowercase());
                builder.open(tag);

                // script and style bodies are text up to their closing tag
                if raw_text {
                    let rest = lexer.remainder();
                    let end = rest.to_ascii_lowercase().find(&closing).unwrap_or(rest.len());
                    if end > 0 {
                        builder.text.push_str(&rest[..end]);
                        lexer.bump(end);
                    }
                }
            }
        }
    }

    builder.finish()
}

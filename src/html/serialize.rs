//! Node tree back to markup

use crate::html::{Node, TagNode};

/// Pending work while writing a tree: a node to emit, or the end tag of an
/// element whose children have been written
enum Frame<'n> {
    Node(&'n Node),
    Close(&'n str),
}

pub fn serialize(nodes: &[Node]) -> String {
    let mut out = String::new();
    let mut stack: Vec<Frame<'_>> = nodes.iter().rev().map(Frame::Node).collect();

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Close(name) => {
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            Frame::Node(Node::Text(content)) => out.push_str(content),
            Frame::Node(Node::Comment(text)) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            Frame::Node(Node::Declaration(text)) => {
                out.push('<');
                out.push_str(text);
                out.push('>');
            }
            Frame::Node(Node::Tag(tag)) => {
                write_open_tag(&mut out, tag);
                if !tag.void_element {
                    stack.push(Frame::Close(&tag.name));
                    stack.extend(tag.children.iter().rev().map(Frame::Node));
                }
            }
        }
    }
    out
}

fn write_open_tag(out: &mut String, tag: &TagNode) {
    out.push('<');
    out.push_str(&tag.name);
    for (name, value) in tag.attrs.iter() {
        out.push(' ');
        out.push_str(name);
        out.push('=');
        write_quoted(out, value);
    }
    out.push_str(if tag.void_element { "/>" } else { ">" });
}

/// Double quotes unless the value contains one; then single quotes, or
/// `&quot;` when both kinds appear
fn write_quoted(out: &mut String, value: &str) {
    match (value.contains('"'), value.contains('\'')) {
        (false, _) => {
            out.push('"');
            out.push_str(value);
            out.push('"');
        }
        (true, false) => {
            out.push('\'');
            out.push_str(value);
            out.push('\'');
        }
        (true, true) => {
            out.push('"');
            out.push_str(&value.replace('"', "&quot;"));
            out.push('"');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::{parse, Attributes};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_void_element_self_closes() {
        let tag = TagNode {
            name: "img".to_string(),
            attrs: [("src".to_string(), "a.png".to_string())].into_iter().collect::<Attributes>(),
            children: Vec::new(),
            void_element: true,
        };
        assert_eq!(serialize(&[Node::Tag(tag)]), "<img src=\"a.png\"/>");
    }

    #[test]
    fn test_bare_attribute_gets_empty_value() {
        assert_eq!(serialize(&parse("<input disabled>")), "<input disabled=\"\"/>");
    }

    #[test]
    fn test_comment_and_text() {
        let nodes = vec![
            Node::Text("a".to_string()),
            Node::Comment(" b ".to_string()),
        ];
        assert_eq!(serialize(&nodes), "a<!-- b -->");
    }

    #[test]
    fn test_quote_choice() {
        assert_eq!(serialize(&parse("<a t='x\"y'></a>")), "<a t='x\"y'></a>");
        assert_eq!(
            serialize(&parse("<a t=\"{'i':1}\"></a>")),
            "<a t=\"{'i':1}\"></a>"
        );
    }
}

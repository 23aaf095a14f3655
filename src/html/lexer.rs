//! Lexers for resolved markup using logos
//!
//! [`MarkupToken`] splits a document into tags, comments and text.
//! [`AttrToken`] splits the inside of one tag into attribute tokens.

use logos::{Lexer, Logos};

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum MarkupToken<'s> {
    /// `<!-- … -->`, carrying the text between the markers. An unterminated
    /// comment runs to the end of input.
    #[token("<!--", comment_body)]
    Comment(&'s str),

    /// A complete open tag, close tag, or declaration
    #[regex(
        r#"<([a-zA-Z0-9\-/]|![^\-'">]|!-[^\-'">])("[^"]*"|'[^']*'|[^'">])*>"#,
        |lex| lex.slice()
    )]
    Tag(&'s str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'s str),

    /// A `<` that does not start a tag
    #[token("<")]
    Lt,
}

fn comment_body<'s>(lex: &mut Lexer<'s, MarkupToken<'s>>) -> &'s str {
    let rest = lex.remainder();
    match rest.find("-->") {
        Some(end) => {
            lex.bump(end + 3);
            &rest[..end]
        }
        None => {
            lex.bump(rest.len());
            rest
        }
    }
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\x0C]+")]
pub enum AttrToken {
    #[token("=")]
    Eq,

    #[regex(r#""[^"]*""#, unquote)]
    #[regex(r#"'[^']*'"#, unquote)]
    Quoted(String),

    #[regex(r#"[^ \t\n\r\x0C"'=<>`]+"#, |lex| lex.slice().to_string())]
    Word(String),
}

fn unquote(lex: &mut Lexer<'_, AttrToken>) -> String {
    let slice = lex.slice();
    slice[1..slice.len() - 1].to_string()
}

/// Tokenize markup, keeping spans
pub fn lex_markup(input: &str) -> impl Iterator<Item = (MarkupToken<'_>, Span)> + '_ {
    MarkupToken::lexer(input)
        .spanned()
        .filter_map(|(tok, span)| tok.ok().map(|t| (t, span)))
}

/// Tokenize the inside of a tag. Stray quote characters are skipped.
pub fn lex_attributes(input: &str) -> impl Iterator<Item = (AttrToken, Span)> + '_ {
    AttrToken::lexer(input)
        .spanned()
        .filter_map(|(tok, span)| tok.ok().map(|t| (t, span)))
}

//! Attribute list grammar using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::html::lexer::{lex_attributes, AttrToken};
use crate::html::Attributes;

/// Parse the inside of a tag (everything after the tag name) into attributes.
///
/// Accepts bare names, `name=value`, `name="value"` and `name='value'`.
/// Tokens that cannot start an attribute are skipped.
pub fn parse_attributes(input: &str) -> Attributes {
    let len = input.len();
    let token_iter = lex_attributes(input).map(|(tok, span)| (tok, span.into()));
    let token_stream = Stream::from_iter(token_iter).map((len..len).into(), |(t, s): (_, _)| (t, s));

    match attribute_list().parse(token_stream).into_result() {
        Ok(pairs) => pairs.into_iter().collect(),
        Err(errs) => {
            tracing::debug!(errors = errs.len(), input, "unparseable attribute list");
            Attributes::new()
        }
    }
}

fn attribute_list<'a, I>() -> impl Parser<'a, I, Vec<(String, String)>, extra::Err<Rich<'a, AttrToken>>> + Clone
where
    I: ValueInput<'a, Token = AttrToken, Span = SimpleSpan>,
{
    let value = select! {
        AttrToken::Quoted(s) => s,
        AttrToken::Word(s) => s,
    };

    let attribute = select! { AttrToken::Word(name) => name }
        .then(just(AttrToken::Eq).ignore_then(value).or_not())
        .map(|(name, value)| Some((name, value.unwrap_or_default())));

    let stray = any().to(None);

    choice((attribute, stray))
        .repeated()
        .collect::<Vec<_>>()
        .map(|items| items.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(input: &str) -> Vec<(String, String)> {
        parse_attributes(input)
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_value_forms() {
        assert_eq!(
            pairs(r#"a=1 b="two words" c='x' d"#),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "two words".to_string()),
                ("c".to_string(), "x".to_string()),
                ("d".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_json_contract_value() {
        assert_eq!(
            pairs(r#"meta="{'index':1}""#),
            vec![("meta".to_string(), "{'index':1}".to_string())]
        );
    }

    #[test]
    fn test_stray_tokens_are_skipped() {
        assert_eq!(
            pairs(r#"= "lonely" ok=1 x="#),
            vec![("ok".to_string(), "1".to_string()), ("x".to_string(), String::new())]
        );
    }

    #[test]
    fn test_repeated_name_overwrites_in_place() {
        assert_eq!(
            pairs("a=1 b=2 a=3"),
            vec![("a".to_string(), "3".to_string()), ("b".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn test_empty() {
        assert!(parse_attributes("  ").is_empty());
    }
}

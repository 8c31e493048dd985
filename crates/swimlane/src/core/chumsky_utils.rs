//! Shared chumsky parser utilities for markup parsing
//!
//! Small combinators reused by the tag parser: whitespace, XML names and
//! quoted attribute values.

use chumsky::prelude::*;

/// Parse optional whitespace including newlines.
///
/// Uses explicit character matching to avoid the "repeated combinator making no progress"
/// issue that can occur with `chumsky::text::whitespace().repeated()`.
pub fn optional_whitespace<'src>() -> impl Parser<'src, &'src str, ()> + Clone {
    one_of(" \t\n\r").repeated().ignored()
}

/// Parse required whitespace (at least one whitespace/newline character).
pub fn whitespace_required<'src>() -> impl Parser<'src, &'src str, ()> + Clone {
    one_of(" \t\n\r").repeated().at_least(1).ignored()
}

/// Parse an XML name, prefix included (`bpmn2:startEvent`, `xmlns:dc`).
pub fn xml_name<'src>() -> impl Parser<'src, &'src str, &'src str> + Clone {
    any()
        .filter(|c: &char| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.'))
        .repeated()
        .at_least(1)
        .to_slice()
}

/// Parse a single- or double-quoted value, returning the raw text between
/// the quotes.
pub fn quoted_value<'src>() -> impl Parser<'src, &'src str, &'src str> + Clone {
    let double = none_of('"')
        .repeated()
        .to_slice()
        .delimited_by(just('"'), just('"'));
    let single = none_of('\'')
        .repeated()
        .to_slice()
        .delimited_by(just('\''), just('\''));
    double.or(single)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_whitespace() {
        let parser = optional_whitespace().then(just("test")).then_ignore(end());
        assert!(parser.parse("test").into_result().is_ok());
        assert!(parser.parse(" test").into_result().is_ok());
        assert!(parser.parse("\ntest").into_result().is_ok());
        assert!(parser.parse("\t\n test").into_result().is_ok());
    }

    #[test]
    fn test_whitespace_required() {
        let parser = just("a")
            .then(whitespace_required())
            .then(just("b"))
            .then_ignore(end());
        assert!(parser.parse("a b").into_result().is_ok());
        assert!(parser.parse("a\r\nb").into_result().is_ok());
        assert!(parser.parse("ab").into_result().is_err());
    }

    #[test]
    fn test_xml_name() {
        let parser = xml_name().then_ignore(end());
        assert_eq!(
            parser.parse("bpmn2:startEvent").into_result().ok(),
            Some("bpmn2:startEvent")
        );
        assert_eq!(
            parser.parse("xml-stylesheet").into_result().ok(),
            Some("xml-stylesheet")
        );
        assert!(parser.parse("").into_result().is_err());
        assert!(parser.parse("a b").into_result().is_err());
    }

    #[test]
    fn test_quoted_value() {
        let parser = quoted_value().then_ignore(end());
        assert_eq!(parser.parse("\"Task 1\"").into_result().ok(), Some("Task 1"));
        assert_eq!(
            parser.parse("'it \"works\"'").into_result().ok(),
            Some("it \"works\"")
        );
        assert_eq!(parser.parse("\"\"").into_result().ok(), Some(""));
        assert!(parser.parse("\"unterminated").into_result().is_err());
    }
}

//! Streaming tag scanner
//!
//! Splits markup into start tags, end tags and text without building a
//! tree. The scanner never fails: anything it cannot read becomes a
//! [`Token::Malformed`] and scanning resumes after it.

use chumsky::prelude::*;
use tracing::trace;

use crate::core::chumsky_utils::{optional_whitespace, quoted_value, whitespace_required, xml_name};

/// One lexical unit of a markup document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// `<name attr="v">` or `<name attr="v"/>`
    Start {
        name: &'a str,
        attrs: Vec<(&'a str, String)>,
        self_closing: bool,
        offset: usize,
    },
    /// `</name>`
    End { name: &'a str },
    /// Non-blank character data, entities unescaped, or CDATA content
    Text(String),
    /// `<?xml ...?>`
    Prolog,
    /// A tag that could not be read
    Malformed { offset: usize },
}

impl<'a> Token<'a> {
    /// Attribute value by local name (`xsi:type` matches `type`)
    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            Token::Start { attrs, .. } => attrs
                .iter()
                .find(|(name, _)| local_name(name) == key)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }
}

/// Strip a namespace prefix: `bpmn2:task` -> `task`
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, local)| local).unwrap_or(name)
}

/// Byte index of the `>` closing the tag that opens at `start`
///
/// Quoted attribute values may contain `>`; a `<` outside quotes means the
/// tag was never closed.
pub fn tag_close(input: &str, start: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in input[start..].char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => return Some(start + i),
            (None, '<') => return None,
            _ => {}
        }
    }
    None
}

type TagHead<'src> = (&'src str, Vec<(&'src str, Option<&'src str>)>, bool);

/// Parser for the inside of a start tag: name, attributes, optional `/`
fn tag_head<'src>() -> impl Parser<'src, &'src str, TagHead<'src>> {
    let value = optional_whitespace()
        .ignore_then(just('='))
        .ignore_then(optional_whitespace())
        .ignore_then(quoted_value());
    let attribute = xml_name().then(value.or_not());

    xml_name()
        .then(
            whitespace_required()
                .ignore_then(attribute)
                .repeated()
                .collect::<Vec<_>>(),
        )
        .then_ignore(optional_whitespace())
        .then(just('/').or_not().map(|slash| slash.is_some()))
        .then_ignore(optional_whitespace())
        .then_ignore(end())
        .map(|((name, attrs), self_closing)| (name, attrs, self_closing))
}

/// Iterator over the tokens of a document
#[derive(Debug, Clone)]
pub struct TagScanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> TagScanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Skip to just past `terminator`, or to the end of input
    fn skip_past(&mut self, terminator: &str) -> Option<&'a str> {
        let rest = &self.input[self.pos..];
        match rest.find(terminator) {
            Some(idx) => {
                let body = &rest[..idx];
                self.pos += idx + terminator.len();
                Some(body)
            }
            None => {
                self.pos = self.input.len();
                None
            }
        }
    }

    fn start_tag(&mut self) -> Token<'a> {
        let offset = self.pos;
        let Some(close) = tag_close(self.input, offset) else {
            // Step over the stray '<' and keep scanning
            self.pos += 1;
            return Token::Malformed { offset };
        };
        let inner = &self.input[offset + 1..close];
        self.pos = close + 1;
        match tag_head().parse(inner).into_result() {
            Ok((name, attrs, self_closing)) => Token::Start {
                name,
                attrs: attrs
                    .into_iter()
                    .map(|(key, value)| {
                        let value = value
                            .map(|v| htmlize::unescape(v).into_owned())
                            .unwrap_or_default();
                        (key, value)
                    })
                    .collect(),
                self_closing,
                offset,
            },
            Err(_) => Token::Malformed { offset },
        }
    }

    fn end_tag(&mut self) -> Token<'a> {
        let offset = self.pos;
        self.pos += 2;
        match self.skip_past(">") {
            Some(body) => {
                let name = body.trim();
                let valid = xml_name().then_ignore(end()).parse(name).into_result().is_ok();
                if valid {
                    Token::End { name }
                } else {
                    Token::Malformed { offset }
                }
            }
            None => Token::Malformed { offset },
        }
    }
}

impl<'a> Iterator for TagScanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            if self.pos >= self.input.len() {
                return None;
            }
            let offset = self.pos;
            let rest = &self.input[self.pos..];

            if !rest.starts_with('<') {
                let len = rest.find('<').unwrap_or(rest.len());
                let text = &rest[..len];
                self.pos += len;
                if text.trim().is_empty() {
                    continue;
                }
                return Some(Token::Text(htmlize::unescape(text.trim()).into_owned()));
            }

            if rest.starts_with("<?") {
                self.pos += 2;
                match self.skip_past("?>") {
                    Some(body) if body.starts_with("xml") && !body.starts_with("xml-") => {
                        return Some(Token::Prolog)
                    }
                    Some(_) => continue,
                    None => return Some(Token::Malformed { offset }),
                }
            }

            if rest.starts_with("<!--") {
                self.pos += 4;
                if self.skip_past("-->").is_none() {
                    trace!(offset, "Unterminated comment");
                }
                continue;
            }

            if rest.starts_with("<![CDATA[") {
                self.pos += 9;
                match self.skip_past("]]>") {
                    Some(body) if body.trim().is_empty() => continue,
                    Some(body) => return Some(Token::Text(body.trim().to_string())),
                    None => return Some(Token::Malformed { offset }),
                }
            }

            if rest.starts_with("<!") {
                // DOCTYPE and other declarations
                self.pos += 2;
                if self.skip_past(">").is_none() {
                    return Some(Token::Malformed { offset });
                }
                continue;
            }

            if rest.starts_with("</") {
                return Some(self.end_tag());
            }

            return Some(self.start_tag());
        }
    }
}

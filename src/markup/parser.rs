//! Markup tokenizer
//!
//! Splits a message into literal text and tags with one combined pattern,
//! strictly left to right. Recognized tags:
//!
//! - `[bold]…[/bold]`, `[italic]…[/italic]`, `[accent]…[/accent]`
//! - `[url]https://example.com[/url]`
//! - `[url=https://example.com]label[/url]` and `[link=https://example.com]label[/link]`
//!
//! Links are matched as a whole (open tag, body, close tag), so their body is
//! never scanned for further tags.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::context::StyleFlag;

/// One lexical piece of a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    Open(StyleFlag),
    Close(StyleFlag),
    Link {
        /// URL as written in the message
        target: &'a str,
        /// Display text, when it differs from the URL
        label: Option<&'a str>,
    },
}

const TAG_PATTERN: &str = concat!(
    r"(?is)",
    r"\[url\](?P<url>.*?)\[/url\]",
    r"|\[url=(?P<uhref>[^\]]+)\](?P<ulabel>.*?)\[/url\]",
    r"|\[link=(?P<lhref>[^\]]+)\](?P<llabel>.*?)\[/link\]",
    r"|\[(?P<close>/)?(?P<tag>bold|italic|accent)\]",
);

fn tag_regex() -> Option<&'static Regex> {
    static TAG_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    TAG_REGEX
        .get_or_init(|| Regex::new(TAG_PATTERN).ok())
        .as_ref()
}

/// Stateless tokenizer for dialog message markup
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkupParser;

impl MarkupParser {
    /// Tokenize `input`. Text outside any recognized tag (including stray
    /// brackets) comes back as `Token::Text`.
    pub fn tokenize(input: &str) -> Vec<Token<'_>> {
        let Some(regex) = tag_regex() else {
            return vec![Token::Text(input)];
        };

        let mut tokens = Vec::new();
        let mut last_end = 0;

        for caps in regex.captures_iter(input) {
            let Some(whole) = caps.get(0) else { continue };
            if whole.start() > last_end {
                tokens.push(Token::Text(&input[last_end..whole.start()]));
            }
            tokens.push(Self::classify(&caps));
            last_end = whole.end();
        }

        if last_end < input.len() {
            tokens.push(Token::Text(&input[last_end..]));
        }
        tokens
    }

    fn classify<'a>(caps: &Captures<'a>) -> Token<'a> {
        if let Some(url) = caps.name("url") {
            return Token::Link {
                target: url.as_str(),
                label: None,
            };
        }
        let href = caps.name("uhref").or_else(|| caps.name("lhref"));
        let label = caps.name("ulabel").or_else(|| caps.name("llabel"));
        if let Some(href) = href {
            return Token::Link {
                target: href.as_str(),
                label: label.map(|l| l.as_str()).filter(|l| !l.is_empty()),
            };
        }

        let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        let flag = caps
            .name("tag")
            .and_then(|t| StyleFlag::from_tag(t.as_str()));
        match flag {
            Some(flag) if caps.name("close").is_some() => Token::Close(flag),
            Some(flag) => Token::Open(flag),
            None => Token::Text(whole),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        assert_eq!(
            MarkupParser::tokenize("no tags here"),
            vec![Token::Text("no tags here")]
        );
        assert!(MarkupParser::tokenize("").is_empty());
    }

    #[test]
    fn test_nested_tags_in_order() {
        let tokens = MarkupParser::tokenize("[accent]A [bold]B[/bold] C[/accent]");
        assert_eq!(
            tokens,
            vec![
                Token::Open(StyleFlag::Accent),
                Token::Text("A "),
                Token::Open(StyleFlag::Bold),
                Token::Text("B"),
                Token::Close(StyleFlag::Bold),
                Token::Text(" C"),
                Token::Close(StyleFlag::Accent),
            ]
        );
    }

    #[test]
    fn test_link_forms() {
        let tokens = MarkupParser::tokenize(
            "See [url]https://a.example[/url] or [link=https://b.example]docs[/link].",
        );
        assert_eq!(
            tokens,
            vec![
                Token::Text("See "),
                Token::Link {
                    target: "https://a.example",
                    label: None
                },
                Token::Text(" or "),
                Token::Link {
                    target: "https://b.example",
                    label: Some("docs")
                },
                Token::Text("."),
            ]
        );
    }

    #[test]
    fn test_link_body_not_scanned() {
        let tokens = MarkupParser::tokenize("[url=https://x.example][bold]hi[/bold][/url]");
        assert_eq!(
            tokens,
            vec![Token::Link {
                target: "https://x.example",
                label: Some("[bold]hi[/bold]")
            }]
        );
    }

    #[test]
    fn test_unknown_tags_are_text() {
        assert_eq!(
            MarkupParser::tokenize("[underline]x[/underline]"),
            vec![Token::Text("[underline]x[/underline]")]
        );
    }

    #[test]
    fn test_case_insensitive_tags() {
        assert_eq!(
            MarkupParser::tokenize("[BOLD]x[/Bold]"),
            vec![
                Token::Open(StyleFlag::Bold),
                Token::Text("x"),
                Token::Close(StyleFlag::Bold),
            ]
        );
    }
}

//! Markup rendering
//!
//! Turns parser tokens into styled runs. Malformed input never fails: stray
//! closing tags are ignored and invalid link targets fall back to plain text.

use serde::Serialize;
use tracing::debug;
use url::Url;

use super::context::{FormattingContext, FormattingContextStack};
use super::parser::{MarkupParser, Token};

/// Styled literal text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextRun {
    pub text: String,
    pub style: FormattingContext,
}

/// Clickable hyperlink
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRun {
    pub text: String,
    pub target: Url,
    pub style: FormattingContext,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Run {
    Text(TextRun),
    Link(LinkRun),
}

impl Run {
    pub fn text(&self) -> &str {
        match self {
            Run::Text(run) => &run.text,
            Run::Link(run) => &run.text,
        }
    }

    pub fn style(&self) -> FormattingContext {
        match self {
            Run::Text(run) => run.style,
            Run::Link(run) => run.style,
        }
    }

    pub fn is_link(&self) -> bool {
        matches!(self, Run::Link(_))
    }
}

/// Shorthand prefixes that get a scheme synthesized
const SHORTHAND_SCHEMES: &[(&str, &str)] = &[("www.", "http://"), ("ftp.", "ftp://")];

/// Explicit URI scheme such as `https:` or `mailto:`. A dotted prefix
/// (`www.contoso.com:8080`) or a port after the colon (`localhost:8080`) is a
/// host, not a scheme.
fn has_scheme(target: &str) -> bool {
    let Some((scheme, rest)) = target.split_once(':') else {
        return false;
    };
    if scheme.contains('.') {
        return false;
    }
    let port = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-'))
}

/// Resolve a link target into an absolute URL, if it is one.
pub fn resolve_link(target: &str) -> Option<Url> {
    let target = target.trim();
    if target.is_empty() || target.chars().any(char::is_whitespace) {
        return None;
    }

    let lower = target.to_ascii_lowercase();
    let shorthand = SHORTHAND_SCHEMES
        .iter()
        .find(|(prefix, _)| lower.starts_with(prefix));
    let candidate = match shorthand {
        Some((_, scheme)) if !target.contains("://") => format!("{scheme}{target}"),
        _ if has_scheme(target) => target.to_string(),
        _ => return None,
    };

    let url = Url::parse(&candidate).ok()?;
    if url.is_special() && url.host_str().map_or(true, str::is_empty) && url.scheme() != "file" {
        return None;
    }
    Some(url)
}

/// Renders dialog message markup into display runs
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkupRenderer;

impl MarkupRenderer {
    pub fn render(message: &str) -> Vec<Run> {
        if message.trim().is_empty() {
            return Vec::new();
        }

        let mut stack = FormattingContextStack::new();
        let mut runs = Vec::new();

        for token in MarkupParser::tokenize(message) {
            match token {
                Token::Text(text) => push_text(&mut runs, text, stack.current()),
                Token::Open(flag) => stack.push(flag),
                Token::Close(flag) => {
                    if !stack.pop(flag) {
                        debug!("Ignoring unmatched closing tag for {:?}", flag);
                    }
                }
                Token::Link { target, label } => {
                    let text = label.unwrap_or(target);
                    match resolve_link(target) {
                        Some(url) => runs.push(Run::Link(LinkRun {
                            text: text.to_string(),
                            target: url,
                            style: stack.current(),
                        })),
                        None => {
                            debug!("Link target {:?} is not a valid URL, rendering as text", target);
                            push_text(&mut runs, text, stack.current());
                        }
                    }
                }
            }
        }

        if !stack.is_empty() {
            debug!("Message ended with {} unclosed formatting tag(s)", stack.depth());
        }
        runs
    }

    /// Concatenated display text, without styling
    pub fn plain_text(message: &str) -> String {
        Self::render(message).iter().map(Run::text).collect()
    }
}

fn push_text(runs: &mut Vec<Run>, text: &str, style: FormattingContext) {
    if text.is_empty() {
        return;
    }
    runs.push(Run::Text(TextRun {
        text: text.to_string(),
        style,
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::context::StyleFlag;

    fn text(text: &str, style: FormattingContext) -> Run {
        Run::Text(TextRun {
            text: text.to_string(),
            style,
        })
    }

    #[test]
    fn test_nested_styles() {
        let accent = FormattingContext::PLAIN.with(StyleFlag::Accent);
        let runs = MarkupRenderer::render("[accent]A [bold]B[/bold] C[/accent]");
        assert_eq!(
            runs,
            vec![
                text("A ", accent),
                text("B", accent.with(StyleFlag::Bold)),
                text(" C", accent),
            ]
        );
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(MarkupRenderer::render("").is_empty());
        assert!(MarkupRenderer::render("  \n\t ").is_empty());
    }

    #[test]
    fn test_lone_closing_tag() {
        let runs = MarkupRenderer::render("before[/bold]after");
        assert_eq!(
            runs,
            vec![
                text("before", FormattingContext::PLAIN),
                text("after", FormattingContext::PLAIN),
            ]
        );
    }

    #[test]
    fn test_crossed_tags_degrade() {
        // [/bold] does not match the italic frame on top, so it is ignored
        let runs = MarkupRenderer::render("[bold]a[italic]b[/bold]c[/italic]d");
        let bold = FormattingContext::PLAIN.with(StyleFlag::Bold);
        let bold_italic = bold.with(StyleFlag::Italic);
        assert_eq!(
            runs,
            vec![
                text("a", bold),
                text("b", bold_italic),
                text("c", bold_italic),
                text("d", bold),
            ]
        );
    }

    #[test]
    fn test_invalid_link_degrades() {
        let runs = MarkupRenderer::render("[url]not a url???[/url]");
        assert_eq!(runs, vec![text("not a url???", FormattingContext::PLAIN)]);
    }

    #[test]
    fn test_link_display_defaults_to_url() {
        let runs = MarkupRenderer::render("Visit [url]https://contoso.example/help[/url]");
        assert_eq!(runs.len(), 2);
        match &runs[1] {
            Run::Link(link) => {
                assert_eq!(link.text, "https://contoso.example/help");
                assert_eq!(link.target.as_str(), "https://contoso.example/help");
            }
            other => panic!("expected link, got {:?}", other),
        }
    }

    #[test]
    fn test_link_run_serializes_target() {
        let runs = MarkupRenderer::render("[link=www.contoso.example/help]Help[/link]");
        let json = serde_json::to_value(&runs[0]).unwrap();
        assert_eq!(json["kind"], "link");
        assert_eq!(json["text"], "Help");
        assert_eq!(json["target"], "http://www.contoso.example/help");
    }

    #[test]
    fn test_link_label_and_style() {
        let runs = MarkupRenderer::render("[bold][link=https://contoso.example]Help[/link][/bold]");
        assert_eq!(runs.len(), 1);
        assert!(runs[0].is_link());
        assert_eq!(runs[0].text(), "Help");
        assert!(runs[0].style().bold);
    }

    #[test]
    fn test_shorthand_schemes() {
        assert_eq!(
            resolve_link("www.contoso.example").map(|u| u.to_string()),
            Some("http://www.contoso.example/".to_string())
        );
        assert_eq!(
            resolve_link("ftp.contoso.example").map(|u| u.scheme().to_string()),
            Some("ftp".to_string())
        );
        assert!(resolve_link("contoso.example").is_none());
        assert!(resolve_link("mailto:help@contoso.example").is_some());
        assert!(resolve_link("https://").is_none());
    }

    #[test]
    fn test_host_with_port_is_not_a_scheme() {
        let url = resolve_link("www.contoso.com:8080/help").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.host_str(), Some("www.contoso.com"));
        assert_eq!(url.port(), Some(8080));
        assert_eq!(url.path(), "/help");

        assert_eq!(resolve_link("ftp.contoso.com:21").unwrap().scheme(), "ftp");
        assert!(resolve_link("localhost:8080").is_none());
        assert!(resolve_link("localhost:8080/status").is_none());
        assert_eq!(
            resolve_link("http://localhost:8080/status").unwrap().port(),
            Some(8080)
        );
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(
            MarkupRenderer::plain_text("[bold]Save[/bold] your [italic]work[/italic]."),
            "Save your work."
        );
    }
}

//! Markdown to HTML rendering for model responses
//!
//! Response text is stored and displayed as HTML. Everything that crosses
//! into a view goes through [`TrustedHtml`], which only a
//! [`MarkdownRenderer`] produces. The default [`HtmlRenderer`] escapes the
//! model output before adding any markup, so raw HTML in a reply is shown
//! as text rather than injected.

use regex::{Captures, Regex};
use std::fmt;
use std::sync::OnceLock;

/// HTML that is safe to inject into a view verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedHtml(String);

impl TrustedHtml {
    /// Borrow the HTML
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the HTML string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TrustedHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Converts markdown text into trusted HTML
pub trait MarkdownRenderer: Send + Sync {
    /// Render `markdown` to HTML
    fn render(&self, markdown: &str) -> TrustedHtml;
}

/// Escape the HTML special characters in `text`
///
/// Quotes are escaped too, so the result is safe inside a quoted attribute.
pub fn escape_html(text: &str) -> String {
    html_escape::encode_quoted_attribute(text).into_owned()
}

/// Build the placeholder body recorded when a completion fails
pub fn error_html(error: &str) -> TrustedHtml {
    TrustedHtml(format!(
        "<p class=\"error\">Error: could not get a response. {}</p>",
        escape_html(error)
    ))
}

/// Block-level markdown renderer built on regular expressions
///
/// Supports fenced code blocks, ATX headings, bullet and numbered lists,
/// block quotes and paragraphs; inline code, bold, italic, strikethrough
/// and links with `http`, `https` or `mailto` targets.
pub struct HtmlRenderer {
    heading: Regex,
    bullet: Regex,
    ordered: Regex,
    quote: Regex,
    inline_code: Regex,
    link: Regex,
    bold: Regex,
    bold_underscore: Regex,
    italic: Regex,
    strike: Regex,
}

enum Block {
    Paragraph(Vec<String>),
    Quote(Vec<String>),
    Bullets(Vec<String>),
    Numbered(Vec<String>),
}

impl HtmlRenderer {
    /// Create a renderer
    pub fn new() -> Self {
        Self {
            heading: Regex::new(r"^(#{1,6})\s+(.+?)\s*#*\s*$").unwrap(),
            bullet: Regex::new(r"^\s*[-*+]\s+(.*)$").unwrap(),
            ordered: Regex::new(r"^\s*\d+[.)]\s+(.*)$").unwrap(),
            quote: Regex::new(r"^\s*>\s?(.*)$").unwrap(),
            inline_code: Regex::new(r"`([^`]+)`").unwrap(),
            link: Regex::new(r"\[([^\]]+)\]\(((?:https?://|mailto:)[^\s)]+)\)").unwrap(),
            bold: Regex::new(r"\*\*(.+?)\*\*").unwrap(),
            bold_underscore: Regex::new(r"__(.+?)__").unwrap(),
            italic: Regex::new(r"\*([^*\s](?:[^*]*[^*\s])?)\*").unwrap(),
            strike: Regex::new(r"~~(.+?)~~").unwrap(),
        }
    }

    fn render_inline(&self, text: &str) -> String {
        let mut codes: Vec<String> = Vec::new();
        let mut links: Vec<String> = Vec::new();
        let escaped = escape_html(text);

        let result = self
            .inline_code
            .replace_all(&escaped, |caps: &Captures| {
                let idx = codes.len();
                codes.push(caps[1].to_string());
                format!("\x00IC{idx}\x00")
            })
            .to_string();

        // Links become placeholders so emphasis never rewrites a URL.
        let result = self
            .link
            .replace_all(&result, |caps: &Captures| {
                let idx = links.len();
                links.push(format!(
                    "<a href=\"{}\">{}</a>",
                    &caps[2],
                    self.emphasize(&caps[1])
                ));
                format!("\x00LK{idx}\x00")
            })
            .to_string();

        let mut result = self.emphasize(&result);

        for (i, link) in links.iter().enumerate() {
            result = result.replace(&format!("\x00LK{i}\x00"), link);
        }
        for (i, code) in codes.iter().enumerate() {
            result = result.replace(&format!("\x00IC{i}\x00"), &format!("<code>{code}</code>"));
        }

        result
    }

    fn emphasize(&self, text: &str) -> String {
        let result = self.bold.replace_all(text, "<strong>$1</strong>");
        let result = self
            .bold_underscore
            .replace_all(&result, "<strong>$1</strong>")
            .to_string();
        let result = self.italic.replace_all(&result, "<em>$1</em>").to_string();
        self.strike.replace_all(&result, "<del>$1</del>").to_string()
    }

    fn flush(&self, block: &mut Option<Block>, out: &mut Vec<String>) {
        let Some(block) = block.take() else {
            return;
        };

        let html = match block {
            Block::Paragraph(lines) => {
                format!("<p>{}</p>", self.render_inline(&lines.join("\n")))
            }
            Block::Quote(lines) => format!(
                "<blockquote><p>{}</p></blockquote>",
                self.render_inline(&lines.join("\n"))
            ),
            Block::Bullets(items) => format!("<ul>{}</ul>", self.list_items(&items)),
            Block::Numbered(items) => format!("<ol>{}</ol>", self.list_items(&items)),
        };
        out.push(html);
    }

    fn list_items(&self, items: &[String]) -> String {
        items
            .iter()
            .map(|item| format!("<li>{}</li>", self.render_inline(item)))
            .collect()
    }
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer for HtmlRenderer {
    fn render(&self, markdown: &str) -> TrustedHtml {
        let normalized = markdown.replace("\r\n", "\n");
        let mut out: Vec<String> = Vec::new();
        let mut block: Option<Block> = None;
        let mut lines = normalized.lines();

        while let Some(line) = lines.next() {
            let trimmed = line.trim_start();

            if let Some(lang) = trimmed.strip_prefix("```") {
                self.flush(&mut block, &mut out);
                let lang = lang.trim();
                let mut code = String::new();
                for code_line in lines.by_ref() {
                    if code_line.trim_start().starts_with("```") {
                        break;
                    }
                    code.push_str(code_line);
                    code.push('\n');
                }
                let class = if lang.is_empty() {
                    String::new()
                } else {
                    format!(" class=\"language-{}\"", escape_html(lang))
                };
                out.push(format!(
                    "<pre><code{}>{}</code></pre>",
                    class,
                    escape_html(&code)
                ));
                continue;
            }

            if trimmed.is_empty() {
                self.flush(&mut block, &mut out);
                continue;
            }

            if let Some(caps) = self.heading.captures(trimmed) {
                self.flush(&mut block, &mut out);
                let level = caps[1].len();
                out.push(format!(
                    "<h{level}>{}</h{level}>",
                    self.render_inline(&caps[2])
                ));
                continue;
            }

            if let Some(caps) = self.bullet.captures(line) {
                let item = caps[1].to_string();
                match &mut block {
                    Some(Block::Bullets(items)) => items.push(item),
                    _ => {
                        self.flush(&mut block, &mut out);
                        block = Some(Block::Bullets(vec![item]));
                    }
                }
                continue;
            }

            if let Some(caps) = self.ordered.captures(line) {
                let item = caps[1].to_string();
                match &mut block {
                    Some(Block::Numbered(items)) => items.push(item),
                    _ => {
                        self.flush(&mut block, &mut out);
                        block = Some(Block::Numbered(vec![item]));
                    }
                }
                continue;
            }

            if let Some(caps) = self.quote.captures(line) {
                let text = caps[1].to_string();
                match &mut block {
                    Some(Block::Quote(lines)) => lines.push(text),
                    _ => {
                        self.flush(&mut block, &mut out);
                        block = Some(Block::Quote(vec![text]));
                    }
                }
                continue;
            }

            match &mut block {
                Some(Block::Paragraph(lines)) => lines.push(trimmed.to_string()),
                // Lazy continuation of the last list item or quote line
                Some(Block::Bullets(items)) | Some(Block::Numbered(items)) => {
                    if let Some(last) = items.last_mut() {
                        last.push(' ');
                        last.push_str(trimmed);
                    }
                }
                Some(Block::Quote(lines)) => lines.push(trimmed.to_string()),
                None => block = Some(Block::Paragraph(vec![trimmed.to_string()])),
            }
        }

        self.flush(&mut block, &mut out);
        TrustedHtml(out.join("\n"))
    }
}

struct TerminalPatterns {
    list_item: Regex,
    line_break: Regex,
    block_end: Regex,
    tag: Regex,
    blank_lines: Regex,
}

fn terminal_patterns() -> &'static TerminalPatterns {
    static PATTERNS: OnceLock<TerminalPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| TerminalPatterns {
        list_item: Regex::new(r"(?i)<li[^>]*>").unwrap(),
        line_break: Regex::new(r"(?i)<br\s*/?>").unwrap(),
        block_end: Regex::new(r"(?i)</(?:p|h[1-6]|pre|blockquote|ul|ol)>").unwrap(),
        tag: Regex::new(r"<[^>]+>").unwrap(),
        blank_lines: Regex::new(r"\n\s*\n\s*\n+").unwrap(),
    })
}

/// Convert rendered HTML into plain text for a terminal
///
/// Block elements become line breaks, list items get a bullet, tags are
/// dropped and entities decoded.
pub fn html_to_terminal(html: &str) -> String {
    let patterns = terminal_patterns();

    let result = patterns.list_item.replace_all(html, "\n  • ");
    let result = patterns.line_break.replace_all(&result, "\n").to_string();
    let result = patterns.block_end.replace_all(&result, "\n").to_string();
    let result = patterns.tag.replace_all(&result, "").to_string();

    let result = html_escape::decode_html_entities(&result).to_string();
    let result = patterns.blank_lines.replace_all(&result, "\n\n");

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(markdown: &str) -> String {
        HtmlRenderer::new().render(markdown).into_string()
    }

    #[test]
    fn test_plain_text_becomes_paragraph() {
        assert_eq!(render("4"), "<p>4</p>");
    }

    #[test]
    fn test_empty_input_renders_nothing() {
        assert_eq!(render(""), "");
        assert_eq!(render("\n\n"), "");
    }

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        assert_eq!(render("one\n\ntwo"), "<p>one</p>\n<p>two</p>");
    }

    #[test]
    fn test_raw_html_is_escaped() {
        assert_eq!(
            render("<script>alert(1)</script>"),
            "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>"
        );
        let quoted = render("say 'hi' and \"bye\"");
        assert!(!quoted.contains('\''));
        assert!(!quoted.contains('"'));
    }

    #[test]
    fn test_headings() {
        assert_eq!(render("# Title"), "<h1>Title</h1>");
        assert_eq!(render("### Sub ###"), "<h3>Sub</h3>");
        assert_eq!(render("#hashtag"), "<p>#hashtag</p>");
    }

    #[test]
    fn test_inline_styles() {
        assert_eq!(
            render("**bold** and *it* and ~~gone~~"),
            "<p><strong>bold</strong> and <em>it</em> and <del>gone</del></p>"
        );
    }

    #[test]
    fn test_inline_code_is_not_styled() {
        assert_eq!(
            render("use `**kwargs` here"),
            "<p>use <code>**kwargs</code> here</p>"
        );
    }

    #[test]
    fn test_links_only_for_safe_schemes() {
        assert_eq!(
            render("[docs](https://example.com/a?b=1)"),
            "<p><a href=\"https://example.com/a?b=1\">docs</a></p>"
        );
        assert_eq!(
            render("[bad](javascript:alert(1))"),
            "<p>[bad](javascript:alert(1))</p>"
        );
    }

    #[test]
    fn test_emphasis_does_not_touch_link_urls() {
        assert_eq!(
            render("[py](https://docs.python.org/3/reference/datamodel.html#object.__init__)"),
            "<p><a href=\"https://docs.python.org/3/reference/datamodel.html#object.__init__\">py</a></p>"
        );
        assert_eq!(
            render("see [**docs**](https://example.com/a*b*c) *now*"),
            "<p>see <a href=\"https://example.com/a*b*c\"><strong>docs</strong></a> <em>now</em></p>"
        );
    }

    #[test]
    fn test_quote_in_link_url_stays_inside_attribute() {
        let html = render("[x](https://example.com/\"onmouseover=alert(1))");
        assert!(!html.contains("\"onmouseover"));
    }

    #[test]
    fn test_fenced_code_block() {
        let html = render("Here:\n```rust\nfn main() { let x = 1 < 2; }\n```\nDone");
        assert_eq!(
            html,
            "<p>Here:</p>\n<pre><code class=\"language-rust\">fn main() { let x = 1 &lt; 2; }\n</code></pre>\n<p>Done</p>"
        );
    }

    #[test]
    fn test_unterminated_fence_runs_to_end() {
        assert_eq!(
            render("```\nline"),
            "<pre><code>line\n</code></pre>"
        );
    }

    #[test]
    fn test_bullet_and_numbered_lists() {
        assert_eq!(
            render("- a\n- b\n\n1. one\n2. two"),
            "<ul><li>a</li><li>b</li></ul>\n<ol><li>one</li><li>two</li></ol>"
        );
    }

    #[test]
    fn test_list_item_continuation() {
        assert_eq!(
            render("- first\n  still first\n- second"),
            "<ul><li>first still first</li><li>second</li></ul>"
        );
    }

    #[test]
    fn test_block_quote() {
        assert_eq!(
            render("> quoted\n> more"),
            "<blockquote><p>quoted\nmore</p></blockquote>"
        );
    }

    #[test]
    fn test_error_html_escapes_message() {
        let html = error_html("bad <gateway>");
        assert!(html.as_str().starts_with("<p class=\"error\">"));
        assert!(html.as_str().contains("bad &lt;gateway&gt;"));
    }

    #[test]
    fn test_html_to_terminal() {
        let html = render("# Hi\n\n- a & b\n- c\n\nend");
        assert_eq!(html_to_terminal(&html), "Hi\n\n  • a & b\n  • c\n\nend");
    }

    #[test]
    fn test_html_to_terminal_plain() {
        assert_eq!(html_to_terminal("<p>4</p>"), "4");
    }

    #[test]
    fn test_html_to_terminal_decodes_named_and_numeric_entities() {
        assert_eq!(
            html_to_terminal("<p>&copy; 2024 &mdash; caf&eacute; &#8212; &#x27;x&#x27;</p>"),
            "© 2024 — café — 'x'"
        );
    }

    #[test]
    fn test_html_to_terminal_round_trips_escaped_reply() {
        let html = render("it's <b> & \"q\"");
        assert_eq!(html_to_terminal(&html), "it's <b> & \"q\"");
    }
}

//! Markdown conversion.
//!
//! Pages are rendered with CommonMark plus GitHub-style tables. Fenced code
//! blocks are part of CommonMark itself. The result is an HTML *fragment*;
//! wrapping it in a full document is the frame's job.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html as md_html};

fn options() -> Options {
    Options::ENABLE_TABLES
}

/// Convert a Markdown document to an HTML fragment.
pub fn to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, options());
    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    md_html::push_html(&mut html, parser);
    html
}

/// Plain text of the first heading of any level, in document order.
///
/// Raw HTML `<h1>`..`<h6>` elements written in the Markdown count as
/// headings too. Only the Markdown body is searched, never the frame, so a
/// frame with its own `<h1>` site banner cannot shadow the article title.
pub fn first_heading(markdown: &str) -> Option<String> {
    let mut capture: Option<Capture> = None;

    for event in Parser::new_ext(markdown, options()) {
        match (&mut capture, event) {
            (None, Event::Start(Tag::Heading { .. })) => {
                capture = Some(Capture::Markdown(String::new()));
            }
            (None, Event::Html(html) | Event::InlineHtml(html)) => {
                if let Some((level, rest)) = open_html_heading(&html) {
                    capture = Some(Capture::Html {
                        close: format!("</h{level}"),
                        raw: rest.to_string(),
                    });
                }
            }
            (Some(Capture::Markdown(buf)), Event::Text(t) | Event::Code(t)) => buf.push_str(&t),
            (Some(Capture::Markdown(buf)), Event::SoftBreak | Event::HardBreak) => buf.push(' '),
            (Some(Capture::Markdown(buf)), Event::End(TagEnd::Heading(_))) => {
                return Some(buf.trim().to_string());
            }
            (Some(Capture::Html { raw, .. }), Event::Html(html) | Event::InlineHtml(html)) => {
                raw.push_str(&html);
            }
            (Some(Capture::Html { raw, .. }), Event::Text(t) | Event::Code(t)) => {
                raw.push_str(&html_escape::encode_text(&*t));
            }
            _ => {}
        }

        if let Some(Capture::Html { close, raw }) = &capture
            && let Some(end) = raw.to_ascii_lowercase().find(close.as_str())
        {
            return Some(plain_text(&raw[..end]));
        }
    }

    match capture {
        Some(Capture::Html { raw, .. }) => Some(plain_text(&raw)).filter(|t| !t.is_empty()),
        _ => None,
    }
}

enum Capture {
    Markdown(String),
    /// Inside a raw HTML heading; `raw` is everything after its start tag.
    Html { close: String, raw: String },
}

/// Find the first `<hN>` start tag in a chunk of raw HTML. Returns the level
/// and the text following the tag.
fn open_html_heading(html: &str) -> Option<(char, &str)> {
    let lower = html.to_ascii_lowercase();
    lower.match_indices("<h").find_map(|(at, _)| {
        let mut tail = lower[at + 2..].chars();
        let level = tail.next().filter(|c| ('1'..='6').contains(c))?;
        let after = tail.next()?;
        if after != '>' && !after.is_ascii_whitespace() {
            return None;
        }
        let open_end = at + html[at..].find('>')? + 1;
        Some((level, &html[open_end..]))
    })
}

/// Strip tags, decode entities, collapse whitespace.
fn plain_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }
    html_escape::decode_html_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_paragraphs_and_emphasis() {
        let html = to_html("Body text with **bold**.");
        assert_eq!(html, "<p>Body text with <strong>bold</strong>.</p>\n");
    }

    #[test]
    fn fenced_code_blocks_are_rendered() {
        let html = to_html("```rust\nfn main() {}\n```\n");
        assert!(html.contains("<pre><code class=\"language-rust\">"));
        assert!(html.contains("fn main() {}"));
    }

    #[test]
    fn tables_are_enabled() {
        let html = to_html("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn links_keep_markdown_targets() {
        // Extension rewriting happens later, on the document.
        let html = to_html("[next](next.md)");
        assert!(html.contains(r#"<a href="next.md">next</a>"#));
    }

    #[test]
    fn first_heading_h1() {
        let md = "# This is a title\n        ## This is another one";
        assert_eq!(first_heading(md).as_deref(), Some("This is a title"));
    }

    #[test]
    fn first_heading_h2_before_h1() {
        let md = "## This is a title\n\n# This is another one";
        assert_eq!(first_heading(md).as_deref(), Some("This is a title"));
    }

    #[test]
    fn first_heading_none() {
        assert_eq!(first_heading("No title"), None);
    }

    #[test]
    fn first_heading_flattens_inline_markup() {
        let md = "Intro paragraph.\n\n### Using `cargo` *well*\n";
        assert_eq!(first_heading(md).as_deref(), Some("Using cargo well"));
    }

    #[test]
    fn first_heading_setext() {
        let md = "Setext Title\n============\n\nBody";
        assert_eq!(first_heading(md).as_deref(), Some("Setext Title"));
    }

    #[test]
    fn first_heading_from_raw_html() {
        let md = "Intro.\n\n<h2>Raw &amp; Ready</h2>\n\n# Later";
        assert_eq!(first_heading(md).as_deref(), Some("Raw & Ready"));
    }

    #[test]
    fn first_heading_from_nested_raw_html() {
        let md = "<div class=\"hero\">\n<h1 class=\"big\">Welcome <em>home</em></h1>\n</div>\n\n## Next";
        assert_eq!(first_heading(md).as_deref(), Some("Welcome home"));
    }

    #[test]
    fn raw_html_without_heading_is_ignored() {
        let md = "<header><hr></header>\n\n## Real title";
        assert_eq!(first_heading(md).as_deref(), Some("Real title"));
    }
}

//! Post-embedding HTML transforms.
//!
//! Each transform is a set of `lol_html` element handlers, so a page can be
//! rewritten in a single streaming pass. [`PageTransforms`] chains them in a
//! fixed order:
//!
//! 1. **Link rewrite**: `a[href]` ending in `.md` → `.html`.
//! 2. **External links**: `a[href]` with a network location that does not
//!    start with the base href gets `target="_blank"`.
//! 3. **Heading anchors**: every `h2` gets a trailing
//!    `<a class="anchor-link" href="#slug" id="slug">&lt;&lt;</a>`.
//! 4. **Title**: every `<title>` text becomes `"{title} - {hostname}"`.
//! 5. **Metadata**: Open Graph / Twitter `<meta>` tags appended to `<head>`.
//!
//! The individual handler builders are public so a transform can also run on
//! its own through [`apply`].

use crate::slug::slugify;
use crate::types::MetaFields;
use crate::urls::{has_network_location, join};
use lol_html::errors::RewritingError;
use lol_html::html_content::{ContentType, EndTag};
use lol_html::{
    ElementContentHandlers, EndTagHandler, RewriteStrSettings, Selector, element, rewrite_str, text,
};
use maud::{Markup, html};
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("document has no <head> element for metadata tags")]
    MissingHead,
    #[error("HTML rewrite error: {0}")]
    Rewrite(#[from] RewritingError),
}

pub type Handler<'h> = (Cow<'static, Selector>, ElementContentHandlers<'h>);

/// Run a set of handlers over a document.
pub fn apply(html: &str, handlers: Vec<Handler<'_>>) -> Result<String, RewritingError> {
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: handlers,
            ..RewriteStrSettings::new()
        },
    )
}

// ============================================================================
// Link rewrite
// ============================================================================

/// `a[href]` ending in `.md` points at the rendered page instead.
pub fn markdown_link_handlers<'h>() -> Vec<Handler<'h>> {
    vec![element!("a[href]", |el| {
        if let Some(href) = el.get_attribute("href")
            && let Some(stem) = href.strip_suffix(".md")
        {
            el.set_attribute("href", &format!("{stem}.html"))?;
        }
        Ok(())
    })]
}

// ============================================================================
// External links
// ============================================================================

/// Whether a link leaves the site: it has a network location and is not
/// under `base_href` (plain string prefix test).
pub fn is_external(href: &str, base_href: &str) -> bool {
    has_network_location(href) && !href.starts_with(base_href)
}

/// Open external links in a new tab.
pub fn external_link_handlers(base_href: &str) -> Vec<Handler<'_>> {
    vec![element!("a[href]", move |el| {
        if let Some(href) = el.get_attribute("href")
            && is_external(&href, base_href)
        {
            el.set_attribute("target", "_blank")?;
        }
        Ok(())
    })]
}

// ============================================================================
// Heading anchors
// ============================================================================

/// The self-link appended to a section heading.
pub fn anchor_markup(slug: &str) -> Markup {
    html! {
        a class="anchor-link" href={ "#" (slug) } id=(slug) { "<<" }
    }
}

/// Append a self-link to every `h2`, keyed by the slug of its text.
pub fn heading_anchor_handlers<'h>() -> Vec<Handler<'h>> {
    let heading_text = Rc::new(RefCell::new(String::new()));
    let on_text = Rc::clone(&heading_text);

    vec![
        element!("h2", move |el| {
            heading_text.borrow_mut().clear();
            let collected = Rc::clone(&heading_text);
            if let Some(handlers) = el.end_tag_handlers() {
                let append_anchor: EndTagHandler<'static> =
                    Box::new(move |end: &mut EndTag<'_>| {
                        let text = html_escape::decode_html_entities(collected.borrow().as_str())
                            .into_owned();
                        let markup = anchor_markup(&slugify(&text));
                        end.before(&markup.into_string(), ContentType::Html);
                        Ok(())
                    });
                handlers.push(append_anchor);
            }
            Ok(())
        }),
        text!("h2", move |chunk| {
            on_text.borrow_mut().push_str(chunk.as_str());
            Ok(())
        }),
    ]
}

// ============================================================================
// Title
// ============================================================================

/// `"{title} - {hostname}"`, or just the title without a hostname.
pub fn page_title(title: &str, hostname: Option<&str>) -> String {
    match hostname.filter(|h| !h.is_empty()) {
        Some(hostname) => format!("{title} - {hostname}"),
        None => title.to_string(),
    }
}

/// Replace the text of every `<title>` element.
pub fn title_handlers<'h>(title: String) -> Vec<Handler<'h>> {
    vec![element!("title", move |el| {
        el.set_inner_content(&title, ContentType::Text);
        Ok(())
    })]
}

// ============================================================================
// Metadata
// ============================================================================

/// `<meta>` tags for every populated field.
///
/// The image is resolved against the base href. Twitter card tags are only
/// emitted when a Twitter handle is configured.
pub fn meta_tags(fields: &MetaFields, base_href: &str) -> Markup {
    let image = fields.image().map(|image| join(base_href, image));
    html! {
        @if let Some(title) = fields.title() {
            meta property="og:title" content=(title);
        }
        @if let Some(description) = fields.description() {
            meta property="og:description" content=(description);
        }
        @if let Some(url) = fields.url() {
            meta property="og:url" content=(url);
        }
        @if let Some(image) = &image {
            meta property="og:image" content=(image);
        }
        @if let Some(handle) = fields.twitter_handle() {
            @if let Some(title) = fields.title() {
                meta property="twitter:title" content=(title);
            }
            @if let Some(description) = fields.description() {
                meta property="twitter:description" content=(description);
            }
            meta property="twitter:site" content=(handle);
            meta property="twitter:creator" content=(handle);
            @if let Some(image) = &image {
                meta property="twitter:image" content=(image);
            }
            meta property="twitter:card" content="summary_large_image";
        }
    }
}

/// Append `tags` to the first `<head>`, recording whether one was seen.
pub fn meta_handlers<'h>(tags: &'h str, head_seen: &'h Cell<bool>) -> Vec<Handler<'h>> {
    vec![element!("head", move |el| {
        if !head_seen.get() {
            el.append(tags, ContentType::Html);
            head_seen.set(true);
        }
        Ok(())
    })]
}

// ============================================================================
// Full page pass
// ============================================================================

/// All page transforms, configured for one page.
#[derive(Debug, Clone, Default)]
pub struct PageTransforms<'a> {
    pub base_href: &'a str,
    pub hostname: Option<&'a str>,
    /// Resolved page title. Title injection is skipped when unset.
    pub title: Option<&'a str>,
    /// Resolved metadata. Metadata injection is skipped when unset.
    pub meta: Option<&'a MetaFields>,
}

impl PageTransforms<'_> {
    /// Run every configured transform over `html` in one pass.
    pub fn run(&self, html: &str) -> Result<String, TransformError> {
        let tags = self
            .meta
            .map(|fields| meta_tags(fields, self.base_href).into_string());
        let head_seen = Cell::new(false);

        let mut handlers: Vec<Handler<'_>> = markdown_link_handlers();
        handlers.extend(external_link_handlers(self.base_href));
        handlers.extend(heading_anchor_handlers());
        if let Some(title) = self.title.filter(|t| !t.is_empty()) {
            handlers.extend(title_handlers(page_title(title, self.hostname)));
        }
        if let Some(tags) = &tags {
            handlers.extend(meta_handlers(tags, &head_seen));
        }

        let output = apply(html, handlers)?;
        if tags.is_some() && !head_seen.get() {
            return Err(TransformError::MissingHead);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://site.dev/";

    fn full_defaults() -> MetaFields {
        MetaFields {
            title: Some("Site".into()),
            image: Some("img/cover.png".into()),
            description: Some("About the site".into()),
            url: Some("https://site.dev/".into()),
            twitter_handle: None,
        }
    }

    // =========================================================================
    // Link rewrite
    // =========================================================================

    #[test]
    fn md_links_become_html() {
        let out = apply(r#"<a href="x.md">x</a>"#, markdown_link_handlers()).unwrap();
        assert_eq!(out, r#"<a href="x.html">x</a>"#);
    }

    #[test]
    fn html_links_unchanged() {
        let html = r#"<a href="x.html">x</a><a href="notes.mdx">n</a>"#;
        assert_eq!(apply(html, markdown_link_handlers()).unwrap(), html);
    }

    #[test]
    fn md_links_keep_directories() {
        let out = apply(r#"<a href="../blog/post.md">p</a>"#, markdown_link_handlers()).unwrap();
        assert_eq!(out, r#"<a href="../blog/post.html">p</a>"#);
    }

    // =========================================================================
    // External links
    // =========================================================================

    #[test]
    fn external_classification() {
        assert!(is_external("https://other.io/x", BASE));
        assert!(!is_external("https://site.dev/about.html", BASE));
        assert!(!is_external("about.html", BASE));
        assert!(!is_external("mailto:me@other.io", BASE));
    }

    #[test]
    fn external_links_open_in_new_tab() {
        let html = r#"<a href="https://other.io/x">o</a><a href="https://site.dev/a.html">s</a><a href="a.html">r</a>"#;
        let out = apply(html, external_link_handlers(BASE)).unwrap();
        assert_eq!(
            out,
            r#"<a href="https://other.io/x" target="_blank">o</a><a href="https://site.dev/a.html">s</a><a href="a.html">r</a>"#
        );
    }

    // =========================================================================
    // Heading anchors
    // =========================================================================

    #[test]
    fn h2_gets_anchor() {
        let out = apply("<h2>Hello World!</h2>", heading_anchor_handlers()).unwrap();
        assert_eq!(
            out,
            r##"<h2>Hello World!<a class="anchor-link" href="#hello-world" id="hello-world">&lt;&lt;</a></h2>"##
        );
    }

    #[test]
    fn anchor_uses_decoded_text() {
        let out = apply("<h2>Rust &amp; Wasm</h2>", heading_anchor_handlers()).unwrap();
        assert!(out.contains(r#"id="rust-wasm""#), "got: {out}");
    }

    #[test]
    fn each_h2_gets_its_own_slug() {
        let out = apply(
            "<h2>One</h2><p>x</p><h2>Two</h2><h3>Three</h3>",
            heading_anchor_handlers(),
        )
        .unwrap();
        assert!(out.contains(r#"id="one""#));
        assert!(out.contains(r#"id="two""#));
        assert!(!out.contains(r#"id="three""#));
    }

    #[test]
    fn duplicate_headings_share_slug() {
        let out = apply("<h2>Notes</h2><h2>Notes</h2>", heading_anchor_handlers()).unwrap();
        assert_eq!(out.matches(r#"id="notes""#).count(), 2);
    }

    // =========================================================================
    // Title
    // =========================================================================

    #[test]
    fn page_title_with_and_without_hostname() {
        assert_eq!(page_title("Post", Some("site.dev")), "Post - site.dev");
        assert_eq!(page_title("Post", None), "Post");
        assert_eq!(page_title("Post", Some("")), "Post");
    }

    #[test]
    fn title_text_is_replaced_and_escaped() {
        let out = apply(
            "<head><title>Frame</title></head>",
            title_handlers("Q&A".to_string()),
        )
        .unwrap();
        assert_eq!(out, "<head><title>Q&amp;A</title></head>");
    }

    #[test]
    fn every_title_element_is_replaced() {
        let html = "<head><title>Frame</title></head><body><svg><title>Logo</title></svg></body>";
        let out = apply(html, title_handlers("Post - site.dev".to_string())).unwrap();
        assert_eq!(out.matches("<title>Post - site.dev</title>").count(), 2);
        assert!(!out.contains("Frame"));
        assert!(!out.contains("Logo"));
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    #[test]
    fn full_default_bundle_emits_four_og_tags() {
        let tags = meta_tags(&full_defaults(), BASE).into_string();
        assert_eq!(tags.matches("<meta ").count(), 4);
        assert!(tags.contains(r#"<meta property="og:title" content="Site">"#));
        assert!(tags.contains(r#"<meta property="og:description" content="About the site">"#));
        assert!(tags.contains(r#"<meta property="og:url" content="https://site.dev/">"#));
        assert!(
            tags.contains(r#"<meta property="og:image" content="https://site.dev/img/cover.png">"#)
        );
    }

    #[test]
    fn empty_fields_are_skipped() {
        let fields = MetaFields {
            title: Some("Only".into()),
            description: Some(String::new()),
            ..Default::default()
        };
        let tags = meta_tags(&fields, BASE).into_string();
        assert_eq!(tags, r#"<meta property="og:title" content="Only">"#);
    }

    #[test]
    fn twitter_tags_need_a_handle() {
        let fields = MetaFields {
            twitter_handle: Some("@site".into()),
            ..full_defaults()
        };
        let tags = meta_tags(&fields, BASE).into_string();
        assert!(tags.contains(r#"<meta property="twitter:site" content="@site">"#));
        assert!(tags.contains(r#"<meta property="twitter:creator" content="@site">"#));
        assert!(tags.contains(r#"<meta property="twitter:card" content="summary_large_image">"#));
        assert!(tags.contains(
            r#"<meta property="twitter:image" content="https://site.dev/img/cover.png">"#
        ));
        assert_eq!(tags.matches("<meta ").count(), 10);
    }

    #[test]
    fn meta_values_are_escaped() {
        let fields = MetaFields {
            title: Some(r#"Say "hi""#.into()),
            ..Default::default()
        };
        let tags = meta_tags(&fields, BASE).into_string();
        assert!(tags.contains("content=\"Say &quot;hi&quot;\""));
    }

    // =========================================================================
    // PageTransforms
    // =========================================================================

    const PAGE: &str = r#"<html><head><title>Frame</title></head><body><div id="main-content"><h2>Intro</h2><p><a href="next.md">next</a> <a href="https://other.io">o</a></p></div></body></html>"#;

    #[test]
    fn run_applies_every_transform() {
        let meta = full_defaults();
        let transforms = PageTransforms {
            base_href: BASE,
            hostname: Some("site.dev"),
            title: Some("Intro page"),
            meta: Some(&meta),
        };
        let out = transforms.run(PAGE).unwrap();

        assert!(out.contains("<title>Intro page - site.dev</title>"));
        assert!(out.contains(r#"<a href="next.html">"#));
        assert!(out.contains(r#"<a href="https://other.io" target="_blank">"#));
        assert!(out.contains(r#"id="intro""#));
        assert!(out.contains(r#"content="https://site.dev/img/cover.png"></head>"#));
        assert_eq!(out.matches("<meta ").count(), 4);
    }

    #[test]
    fn run_without_title_keeps_frame_title() {
        let transforms = PageTransforms {
            base_href: BASE,
            ..Default::default()
        };
        let out = transforms.run(PAGE).unwrap();
        assert!(out.contains("<title>Frame</title>"));
        assert_eq!(out.matches("<meta ").count(), 0);
    }

    #[test]
    fn run_without_head_fails_when_meta_requested() {
        let meta = full_defaults();
        let transforms = PageTransforms {
            base_href: BASE,
            meta: Some(&meta),
            ..Default::default()
        };
        let err = transforms.run("<div><p>no head</p></div>").unwrap_err();
        assert!(matches!(err, TransformError::MissingHead));
    }
}

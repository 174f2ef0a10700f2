//! # markframe
//!
//! A minimal static site generator: Markdown pages rendered into hand-written
//! HTML frames, with Open Graph metadata injected per page.
//!
//! # Architecture: Two-Stage Pipeline
//!
//! ```text
//! 1. Scan      content/   →  BuildPlan   (pages, assets, directories)
//! 2. Generate  BuildPlan  →  public/     (framed HTML + copied assets)
//! ```
//!
//! Each page is rendered independently of every other page. The only shared
//! state is the run-scoped frame cache, so pages render in parallel.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: walks the source tree, applies exclusions, sorts pages from assets |
//! | [`generate`] | Stage 2: renders every page into its frame and copies assets |
//! | [`frame`] | Frame loading, base-path rewrite, run-scoped cache, content embedding |
//! | [`transform`] | Streaming HTML transforms: links, anchors, title, meta tags |
//! | [`markdown`] | Markdown to HTML, first-heading extraction |
//! | [`metadata`] | Per-page metadata resolution: matchers, cover images, field fallback |
//! | [`config`] | JSON/TOML site config loading and validation |
//! | [`types`] | Config value types shared across stages (`MetaFields`, `Matcher`, `FrameRule`) |
//! | [`urls`] | RFC 3986 reference resolution and absolute-URL detection |
//! | [`slug`] | Heading text to URL-safe anchor ids |
//! | [`output`] | CLI output formatting for build events and summaries |
//!
//! # Design Decisions
//!
//! ## Frames Instead of Template Languages
//!
//! A frame is a plain HTML file you can open in a browser. The page content
//! goes into the element with `id="main-content"`; nothing else in the frame is
//! special. There is no template syntax to learn and nothing to escape.
//!
//! ## Streaming Rewrites
//!
//! All HTML manipulation (base-path rewrite, embedding, transforms) goes
//! through `lol_html` selectors rather than a DOM. The frame is never parsed
//! into a tree, and every transform is a small handler that can be tested on
//! its own.
//!
//! ## Metadata Falls Back Per Field
//!
//! A matcher that only knows a page's title still gets the site's default
//! description and image. Fields that end up empty are not emitted at all.

pub mod config;
pub mod frame;
pub mod generate;
pub mod markdown;
pub mod metadata;
pub mod output;
pub mod scan;
pub mod slug;
pub mod transform;
pub mod types;
pub mod urls;

#[cfg(test)]
pub(crate) mod test_helpers;

//! Page metadata resolution.
//!
//! Every rendered page gets a [`MetaFields`] bundle that ends up as Open Graph
//! (and optionally Twitter card) tags in the page's `<head>`. The bundle comes
//! from two layers:
//!
//! ## Default bundle
//!
//! `meta.default` in the site config. Always present (possibly empty).
//!
//! ## Matcher override
//!
//! The first matcher in `meta.matchers` whose glob matches the page's source
//! path decides the override:
//!
//! - **`TAKE_FROM_CONTENT`**: title from the first heading in the Markdown
//!   body, image from the page's cover image (`img-{stem}/cover.{ext}` next to
//!   the source file), url from the base href plus the page's output path.
//! - **`STATIC`**: the fields written in the matcher.
//! - **`USE_DEFAULT`**: no override.
//!
//! ## Resolution
//!
//! Each field is resolved independently. The override wins when it carries a
//! non-empty value, otherwise the default field is used:
//!
//! ```text
//! title: resolve(&[override.title, default.title])
//! image: resolve(&[override.image, default.image])
//! ...
//! ```
//!
//! A page therefore never loses a default field just because its matcher only
//! knows the title.

use crate::types::{Action, Meta, MetaFields, posix_path};
use crate::urls;
use std::path::Path;

/// Extensions accepted for `img-{stem}/cover.{ext}`, lowercase.
pub const COVER_EXTENSIONS: &[&str] = &[
    "tif", "tiff", "jpg", "jpeg", "gif", "png", "eps", "bmp", "ppm", "heif", "avif",
];

/// Resolve a field from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// non-None, non-empty value, unchanged.
pub fn first_populated(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .flatten()
        .find(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Layer `overrides` over `default`, field by field.
pub fn resolve(default: &MetaFields, overrides: Option<&MetaFields>) -> MetaFields {
    let pick = |field: fn(&MetaFields) -> Option<&str>| {
        first_populated(&[overrides.and_then(field), field(default)])
    };
    MetaFields {
        title: pick(MetaFields::title),
        image: pick(MetaFields::image),
        description: pick(MetaFields::description),
        url: pick(MetaFields::url),
        twitter_handle: pick(MetaFields::twitter_handle),
    }
}

/// Result of probing a page's cover image directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverLookup {
    /// Every `cover.{ext}` file found, sorted by file name.
    pub candidates: Vec<String>,
}

impl CoverLookup {
    /// The cover that will be used: the first candidate.
    pub fn chosen(&self) -> Option<&str> {
        self.candidates.first().map(String::as_str)
    }

    /// More than one cover file exists; the first one wins.
    pub fn is_ambiguous(&self) -> bool {
        self.candidates.len() > 1
    }
}

/// Look for `img-{stem}/cover.{ext}` next to a Markdown source file.
///
/// A missing or unreadable image directory simply means "no cover".
/// Extensions compare case-insensitively.
pub fn find_cover_image(source: &Path) -> CoverLookup {
    let Some(dir) = cover_dir(source) else {
        return CoverLookup::default();
    };
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return CoverLookup::default();
    };

    let mut candidates: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| is_cover_name(name))
        .collect();
    candidates.sort();
    CoverLookup { candidates }
}

fn cover_dir(source: &Path) -> Option<std::path::PathBuf> {
    let stem = source.file_stem()?.to_str()?;
    Some(source.with_file_name(format!("img-{stem}")))
}

fn is_cover_name(name: &str) -> bool {
    let Some(ext) = name.strip_prefix("cover.") else {
        return false;
    };
    COVER_EXTENSIONS
        .iter()
        .any(|candidate| ext.eq_ignore_ascii_case(candidate))
}

/// Everything the resolver needs to know about one page.
#[derive(Debug, Clone, Copy)]
pub struct PageFacts<'a> {
    /// Source path as walked (source root joined), used for matching.
    pub source: &'a Path,
    /// Directory of the page relative to the source root (empty at the root).
    pub relative_dir: &'a Path,
    /// First heading of the Markdown body.
    pub heading: Option<&'a str>,
    /// Output path relative to the site root, forward slashes (`blog/a.html`).
    pub output_href: &'a str,
}

/// The resolved bundle for a page, plus what the cover probe saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMeta {
    pub fields: MetaFields,
    /// Only set for `TAKE_FROM_CONTENT` pages.
    pub cover: Option<CoverLookup>,
}

/// Resolve the metadata bundle for one page.
pub fn resolve_page_meta(meta: &Meta, base_href: &str, page: &PageFacts<'_>) -> ResolvedMeta {
    let matched = meta.matcher_for(page.source).map(|m| &m.action);

    match matched {
        Some(Action::TakeFromContent) => {
            let cover = find_cover_image(page.source);
            let image = cover.chosen().and_then(|name| cover_href(page, name));
            let from_content = MetaFields {
                title: page.heading.map(String::from),
                image,
                url: Some(urls::join(base_href, page.output_href)),
                ..Default::default()
            };
            ResolvedMeta {
                fields: resolve(&meta.default, Some(&from_content)),
                cover: Some(cover),
            }
        }
        Some(Action::Static(fields)) => ResolvedMeta {
            fields: resolve(&meta.default, Some(fields)),
            cover: None,
        },
        Some(Action::UseDefault) | None => ResolvedMeta {
            fields: resolve(&meta.default, None),
            cover: None,
        },
    }
}

/// `{relative_dir}/img-{stem}/{cover}`, relative to the source root.
fn cover_href(page: &PageFacts<'_>, cover: &str) -> Option<String> {
    let stem = page.source.file_stem()?.to_str()?;
    let path = page
        .relative_dir
        .join(format!("img-{stem}"))
        .join(cover);
    Some(posix_path(&path))
}

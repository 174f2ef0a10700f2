//! Frame templates: loading, base-path rewriting, caching, and embedding.
//!
//! A frame is a complete HTML document with one designated content holder,
//! the element whose `id` is `main-content` (configurable). Each rendered
//! page is a copy of its frame with the holder's children replaced by the
//! page's HTML.
//!
//! ## Base-path rewrite
//!
//! Frames are written with paths relative to the site root (`style.css`,
//! `img/logo.png`). Pages live at arbitrary depths, so on load every relative
//! `href`/`src` on `a`, `link`, `script`, and `img` is resolved against the
//! configured base href. URLs with a network location are left untouched,
//! which makes the rewrite idempotent on its own output whenever the base
//! href is absolute.
//!
//! ## Caching
//!
//! Frames are loaded and rewritten at most once per run. [`FrameCache`] hands
//! out `Arc<Frame>` clones; embedding produces a new document and never
//! mutates the cached frame. The cache is shared by the parallel page
//! renderers, so population happens under a mutex.

use crate::types::FrameRule;
use crate::urls::{has_network_location, join};
use lol_html::errors::RewritingError;
use lol_html::html_content::{ContentType, Element};
use lol_html::{HandlerResult, RewriteStrSettings, element, rewrite_str};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("frame not found: {0}")]
    FrameNotFound(PathBuf),
    #[error("no frame rule matches {0}")]
    NoFrameForFile(PathBuf),
    #[error("frame {frame} has no element with id=\"{id}\"")]
    MissingContentAnchor { frame: PathBuf, id: String },
    #[error("failed to read frame {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("HTML rewrite error: {0}")]
    Rewrite(#[from] RewritingError),
}

/// A loaded, base-path-rewritten frame document.
#[derive(Debug, PartialEq, Eq)]
pub struct Frame {
    path: PathBuf,
    html: String,
}

impl Frame {
    /// Read a frame from disk and apply the base-path rewrite.
    pub fn load(path: &Path, base_href: &str) -> Result<Self, FrameError> {
        let html = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                FrameError::FrameNotFound(path.to_path_buf())
            } else {
                FrameError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::from_html(path, &html, base_href)
    }

    /// Build a frame from an in-memory document.
    pub fn from_html(path: &Path, html: &str, base_href: &str) -> Result<Self, FrameError> {
        Ok(Self {
            path: path.to_path_buf(),
            html: rewrite_base_path(html, base_href)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Copy the frame with the content holder's children replaced by `content`.
    ///
    /// Only the first element carrying `content_id` is filled.
    pub fn embed(&self, content: &str, content_id: &str) -> Result<String, FrameError> {
        let mut filled = false;
        let selector = format!("#{content_id}");
        let output = rewrite_str(
            &self.html,
            RewriteStrSettings {
                element_content_handlers: vec![element!(selector, |el| {
                    if !filled {
                        el.set_inner_content(content, ContentType::Html);
                        filled = true;
                    }
                    Ok(())
                })],
                ..RewriteStrSettings::new()
            },
        )?;

        if !filled {
            return Err(FrameError::MissingContentAnchor {
                frame: self.path.clone(),
                id: content_id.to_string(),
            });
        }
        Ok(output)
    }
}

/// Resolve relative link targets in a frame against `base_href`.
///
/// ```text
/// <link href="style.css">   →  <link href="https://site.dev/style.css">
/// <a href="https://x.io">   →  unchanged
/// ```
pub fn rewrite_base_path(html: &str, base_href: &str) -> Result<String, RewritingError> {
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("a[href], link[href]", |el| absolutize(el, "href", base_href)),
                element!("script[src], img[src]", |el| absolutize(el, "src", base_href)),
            ],
            ..RewriteStrSettings::new()
        },
    )
}

fn absolutize(el: &mut Element<'_, '_>, attr: &str, base_href: &str) -> HandlerResult {
    if let Some(value) = el.get_attribute(attr)
        && !has_network_location(&value)
    {
        el.set_attribute(attr, &join(base_href, &value))?;
    }
    Ok(())
}

/// The frame path of the first rule matching `path`.
pub fn frame_for<'r>(path: &Path, rules: &'r [FrameRule]) -> Option<&'r Path> {
    rules
        .iter()
        .find(|rule| rule.file.matches(path))
        .map(|rule| rule.frame.as_path())
}

/// Run-scoped frame cache.
///
/// Keyed by the frame path as written in the config.
#[derive(Debug)]
pub struct FrameCache {
    base_href: String,
    frames: Mutex<HashMap<PathBuf, Arc<Frame>>>,
    loads: AtomicUsize,
}

impl FrameCache {
    pub fn new(base_href: impl Into<String>) -> Self {
        Self {
            base_href: base_href.into(),
            frames: Mutex::new(HashMap::new()),
            loads: AtomicUsize::new(0),
        }
    }

    /// The frame for a source file, loading it on first use.
    pub fn resolve_for_file(
        &self,
        path: &Path,
        rules: &[FrameRule],
    ) -> Result<Arc<Frame>, FrameError> {
        let frame_path =
            frame_for(path, rules).ok_or_else(|| FrameError::NoFrameForFile(path.to_path_buf()))?;
        self.get_or_load(frame_path)
    }

    /// Cached frame at `frame_path`, loading and rewriting it on a miss.
    pub fn get_or_load(&self, frame_path: &Path) -> Result<Arc<Frame>, FrameError> {
        let mut frames = self.frames.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(frame) = frames.get(frame_path) {
            return Ok(Arc::clone(frame));
        }

        let frame = Arc::new(Frame::load(frame_path, &self.base_href)?);
        self.loads.fetch_add(1, Ordering::Relaxed);
        frames.insert(frame_path.to_path_buf(), Arc::clone(&frame));
        Ok(frame)
    }

    /// Number of frames read from disk so far.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Shared test utilities for the markframe test suite.
//!
//! Provides a throwaway site on disk plus lookup helpers for its output.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = SiteFixture::new()
//!     .file("index.md", "# Home")
//!     .file("blog/post.md", "# Post");
//! generate::build(&site.config(), None).unwrap();
//!
//! assert!(read_output(&site, "blog/post.html").contains("<title>Post</title>"));
//! ```
//!
//! The default site has a frame at `content/frame.html` with a `<head>`, an
//! `<h1>Site</h1>` banner, and an empty `#main-content` holder. Every `.md`
//! file uses that frame and takes its title from its first heading.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::{ProcessingConfig, SiteConfig, default_content_id, default_exclude};
use crate::scan::SourceFile;
use crate::types::{Action, FilePattern, FrameRule, Matcher, Meta, MetaFields};

pub const BASE_HREF: &str = "https://site.dev/";

pub const DEFAULT_FRAME: &str = r#"<!DOCTYPE html>
<html>
<head><title>Frame</title><link rel="stylesheet" href="style.css"></head>
<body><h1>Site</h1><div id="main-content"></div></body>
</html>
"#;

// =========================================================================
// Fixture setup
// =========================================================================

/// A site under a temp directory: `content/` in, `public/` out.
pub struct SiteFixture {
    tmp: TempDir,
}

impl SiteFixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("content")).unwrap();
        let site = Self { tmp };
        site.frame(DEFAULT_FRAME)
    }

    /// Write a file under the source root, creating parent directories.
    pub fn file(self, relative: &str, contents: &str) -> Self {
        let path = self.source().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        self
    }

    /// Replace the frame document.
    pub fn frame(self, html: &str) -> Self {
        fs::write(self.frame_path(), html).unwrap();
        self
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn source(&self) -> PathBuf {
        self.root().join("content")
    }

    pub fn dest(&self) -> PathBuf {
        self.root().join("public")
    }

    pub fn frame_path(&self) -> PathBuf {
        self.source().join("frame.html")
    }

    /// Config for this site: one `*.md` frame rule, one `TAKE_FROM_CONTENT`
    /// matcher, and an empty default bundle.
    pub fn config(&self) -> SiteConfig {
        SiteConfig {
            source: self.source(),
            destination: self.dest(),
            base_href: BASE_HREF.to_string(),
            hostname: None,
            exclude: default_exclude(),
            content_id: default_content_id(),
            meta: Meta {
                default: MetaFields::default(),
                matchers: vec![Matcher {
                    file: FilePattern::new("*.md").unwrap(),
                    action: Action::TakeFromContent,
                }],
            },
            frames: vec![FrameRule {
                file: FilePattern::new("*.md").unwrap(),
                frame: self.frame_path(),
            }],
            processing: ProcessingConfig::default(),
        }
    }

    /// A source file as the scanner would report it.
    pub fn source_file(&self, relative: &str) -> SourceFile {
        SourceFile {
            source: self.source().join(relative),
            relative: PathBuf::from(relative),
        }
    }
}

// =========================================================================
// Output lookups (panic with a clear message on miss)
// =========================================================================

/// Read a file from the output tree. Panics if missing.
pub fn read_output(site: &SiteFixture, relative: &str) -> String {
    let path = site.dest().join(relative);
    fs::read_to_string(&path).unwrap_or_else(|e| {
        let available: Vec<String> = walkdir::WalkDir::new(site.dest())
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().display().to_string())
            .collect();
        panic!("output '{relative}' not readable ({e}). Available: {available:?}")
    })
}

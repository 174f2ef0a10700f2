//! Source tree scanning.
//!
//! Stage 1 of the build. Walks the source directory and sorts every entry
//! into one of three buckets, producing a [`BuildPlan`] the renderer consumes:
//!
//! ```text
//! content/                   # source root
//! ├── frame.html             # configured frame: skipped
//! ├── index.md               # page    → index.html
//! ├── style.css              # asset   → style.css (byte copy)
//! ├── README.md              # excluded by name
//! ├── ignore/                # excluded directory (whole subtree)
//! └── blog/                  # directory → created in the output
//!     ├── post.md            # page    → blog/post.html
//!     └── img-post/
//!         └── cover.jpg      # asset
//! ```
//!
//! ## Exclusions
//!
//! An entry is skipped when its file name appears in the `exclude` list. For
//! directories the whole subtree is pruned, so the rule effectively applies to
//! every directory component of a path. Configured frame files are skipped as
//! well: they are templates, not content.
//!
//! Entries are visited in file-name order, so plans are deterministic.

use crate::config::SiteConfig;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),
}

/// A file in the source tree, addressed both ways.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path as walked: the source root joined with `relative`.
    pub source: PathBuf,
    /// Path relative to the source root.
    pub relative: PathBuf,
}

impl SourceFile {
    /// Directory of the file relative to the source root (empty at the root).
    pub fn relative_dir(&self) -> &Path {
        self.relative.parent().unwrap_or(Path::new(""))
    }
}

/// Everything the build will do, in walk order.
#[derive(Debug, Default)]
pub struct BuildPlan {
    /// Directories to create in the output, relative to the source root.
    pub directories: Vec<PathBuf>,
    /// Markdown files to render.
    pub pages: Vec<SourceFile>,
    /// Everything else, copied byte-for-byte.
    pub assets: Vec<SourceFile>,
    /// Directories skipped by name, as walked.
    pub excluded_dirs: Vec<PathBuf>,
}

pub fn scan(config: &SiteConfig) -> Result<BuildPlan, ScanError> {
    let root = &config.source;
    if !root.is_dir() {
        return Err(ScanError::SourceNotFound(root.clone()));
    }

    let excluded: HashSet<&str> = config.exclude.iter().map(String::as_str).collect();
    let frames = FrameFiles::new(config.frames.iter().map(|rule| rule.frame.as_path()));

    let mut plan = BuildPlan::default();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let keep = entry.depth() == 0 || !is_excluded(entry, &excluded);
            if !keep && entry.file_type().is_dir() {
                plan.excluded_dirs.push(entry.path().to_path_buf());
            }
            keep
        });

    // Collected first: the filter closure borrows the plan mutably.
    let entries: Vec<DirEntry> = walker.collect::<Result<_, _>>()?;

    for entry in entries {
        if entry.depth() == 0 {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| entry.path().to_path_buf());

        if entry.file_type().is_dir() {
            plan.directories.push(relative);
            continue;
        }
        if frames.contains(entry.path()) {
            continue;
        }

        let file = SourceFile {
            source: entry.path().to_path_buf(),
            relative,
        };
        if is_markdown(&file.source) {
            plan.pages.push(file);
        } else {
            plan.assets.push(file);
        }
    }

    Ok(plan)
}

fn is_excluded(entry: &DirEntry, excluded: &HashSet<&str>) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| excluded.contains(name))
}

pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}

/// `x.md` → `x.html`, keeping the directory.
pub fn output_relative(relative: &Path) -> PathBuf {
    relative.with_extension("html")
}

/// Configured frame paths, compared both as written and canonicalized.
struct FrameFiles {
    as_written: HashSet<PathBuf>,
    canonical: HashSet<PathBuf>,
}

impl FrameFiles {
    fn new<'a>(paths: impl Iterator<Item = &'a Path>) -> Self {
        let mut as_written = HashSet::new();
        let mut canonical = HashSet::new();
        for path in paths {
            as_written.insert(path.to_path_buf());
            if let Ok(c) = path.canonicalize() {
                canonical.insert(c);
            }
        }
        Self {
            as_written,
            canonical,
        }
    }

    fn contains(&self, path: &Path) -> bool {
        self.as_written.contains(path)
            || path
                .canonicalize()
                .is_ok_and(|c| self.canonical.contains(&c))
    }
}

//! Page rendering and site generation.
//!
//! Stage 2 of the build. Consumes the [`BuildPlan`] from the scan stage and
//! produces the output tree.
//!
//! ## Per-page pipeline
//!
//! Each Markdown file goes through the same steps, and the first failure
//! aborts the page (and the run):
//!
//! ```text
//! resolve frame → markdown → embed → resolve metadata → transforms → write
//! ```
//!
//! - **Frame**: first matching frame rule, loaded once per run via
//!   [`FrameCache`] and shared by every page that uses it.
//! - **Markdown**: CommonMark plus tables, rendered to a fragment.
//! - **Embed**: the fragment replaces the children of the frame's content
//!   holder (`#main-content`).
//! - **Metadata**: the first matching matcher decides how the default bundle
//!   is overridden (see [`crate::metadata`]).
//! - **Transforms**: `.md` links, external links, `h2` anchors, `<title>`,
//!   and `<meta>` tags, in one rewriting pass (see [`crate::transform`]).
//!
//! ## Output
//!
//! The output tree mirrors the source tree:
//!
//! ```text
//! public/
//! ├── index.html           # from index.md
//! ├── style.css            # copied
//! └── blog/
//!     ├── post.html        # from blog/post.md
//!     └── img-post/
//!         └── cover.jpg    # copied
//! ```
//!
//! Directories are created up front. Pages render in parallel on the rayon
//! pool; assets are copied afterwards. Progress is reported as
//! [`BuildEvent`]s over an optional channel so the CLI can print while the
//! build runs.

use crate::config::SiteConfig;
use crate::frame::{FrameCache, FrameError};
use crate::markdown;
use crate::metadata::{self, CoverLookup, PageFacts};
use crate::scan::{self, BuildPlan, ScanError, SourceFile};
use crate::transform::{PageTransforms, TransformError};
use crate::types::posix_path;
use rayon::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Failed to render {path}: {source}")]
    Page {
        path: PathBuf,
        #[source]
        source: PageError,
    },
    #[error("Failed to copy {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum PageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Progress reported while a build runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    /// A directory was skipped by the exclusion list.
    DirectoryExcluded { path: PathBuf },
    /// A page was rendered and written.
    PageRendered {
        source: PathBuf,
        output: PathBuf,
        frame: PathBuf,
        title: Option<String>,
    },
    /// An asset was copied verbatim.
    AssetCopied { source: PathBuf, output: PathBuf },
    /// More than one `cover.*` exists for a page; the first one was used.
    CoverImageAmbiguous {
        source: PathBuf,
        candidates: Vec<String>,
    },
}

/// Totals for a finished build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub pages: usize,
    pub assets: usize,
    pub directories: usize,
    pub frames_loaded: usize,
    pub warnings: usize,
}

/// A page rendered in memory, not yet written.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub html: String,
    /// Output path relative to the destination root.
    pub output: PathBuf,
    pub frame: PathBuf,
    pub title: Option<String>,
    /// What the cover probe found, for `TAKE_FROM_CONTENT` pages.
    pub cover: Option<CoverLookup>,
}

/// Renders pages for one site, sharing a frame cache across calls.
pub struct PageRenderer<'a> {
    config: &'a SiteConfig,
    frames: &'a FrameCache,
}

impl<'a> PageRenderer<'a> {
    pub fn new(config: &'a SiteConfig, frames: &'a FrameCache) -> Self {
        Self { config, frames }
    }

    /// Render one Markdown file into its frame.
    pub fn render(&self, page: &SourceFile) -> Result<RenderedPage, PageError> {
        let frame = self
            .frames
            .resolve_for_file(&page.source, &self.config.frames)?;
        let source_text = fs::read_to_string(&page.source)?;

        let body = markdown::to_html(&source_text);
        let embedded = frame.embed(&body, &self.config.content_id)?;

        let heading = markdown::first_heading(&source_text);
        let output = scan::output_relative(&page.relative);
        let output_href = posix_path(&output);
        let resolved = metadata::resolve_page_meta(
            &self.config.meta,
            &self.config.base_href,
            &PageFacts {
                source: &page.source,
                relative_dir: page.relative_dir(),
                heading: heading.as_deref(),
                output_href: &output_href,
            },
        );

        let html = PageTransforms {
            base_href: &self.config.base_href,
            hostname: self.config.hostname.as_deref(),
            title: resolved.fields.title(),
            meta: Some(&resolved.fields),
        }
        .run(&embedded)?;

        Ok(RenderedPage {
            html,
            output,
            frame: frame.path().to_path_buf(),
            title: resolved.fields.title().map(String::from),
            cover: resolved.cover,
        })
    }
}

/// Scan the source tree and render the whole site into the destination.
pub fn build(
    config: &SiteConfig,
    events: Option<Sender<BuildEvent>>,
) -> Result<BuildSummary, GenerateError> {
    let plan = scan::scan(config)?;
    generate(config, &plan, events)
}

/// Render a scanned plan into the destination directory.
pub fn generate(
    config: &SiteConfig,
    plan: &BuildPlan,
    events: Option<Sender<BuildEvent>>,
) -> Result<BuildSummary, GenerateError> {
    let emit = |event: BuildEvent| {
        if let Some(tx) = &events {
            tx.send(event).ok();
        }
    };

    for path in &plan.excluded_dirs {
        emit(BuildEvent::DirectoryExcluded { path: path.clone() });
    }

    let dest = &config.destination;
    fs::create_dir_all(dest)?;
    for dir in &plan.directories {
        fs::create_dir_all(dest.join(dir))?;
    }

    let frames = FrameCache::new(config.base_href.as_str());
    let renderer = PageRenderer::new(config, &frames);

    let warnings: Vec<usize> = plan
        .pages
        .par_iter()
        .map(|page| {
            let rendered = renderer
                .render(page)
                .and_then(|rendered| {
                    fs::write(dest.join(&rendered.output), &rendered.html)?;
                    Ok(rendered)
                })
                .map_err(|source| GenerateError::Page {
                    path: page.source.clone(),
                    source,
                })?;

            let mut warnings = 0;
            if let Some(cover) = &rendered.cover
                && cover.is_ambiguous()
            {
                warnings += 1;
                emit(BuildEvent::CoverImageAmbiguous {
                    source: page.source.clone(),
                    candidates: cover.candidates.clone(),
                });
            }
            emit(BuildEvent::PageRendered {
                source: page.source.clone(),
                output: rendered.output,
                frame: rendered.frame,
                title: rendered.title,
            });
            Ok(warnings)
        })
        .collect::<Result<_, GenerateError>>()?;

    for asset in &plan.assets {
        let output = dest.join(&asset.relative);
        fs::copy(&asset.source, &output).map_err(|source| GenerateError::Copy {
            path: asset.source.clone(),
            source,
        })?;
        emit(BuildEvent::AssetCopied {
            source: asset.source.clone(),
            output: asset.relative.clone(),
        });
    }

    Ok(BuildSummary {
        pages: plan.pages.len(),
        assets: plan.assets.len(),
        directories: plan.directories.len(),
        frames_loaded: frames.loads(),
        warnings: warnings.iter().sum(),
    })
}

/// A page whose frame could not be resolved, found by [`check`].
#[derive(Debug)]
pub struct CheckProblem {
    pub path: PathBuf,
    pub error: FrameError,
}

/// Result of a dry run: what would be built, and what would fail.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub pages: usize,
    pub assets: usize,
    pub frames_loaded: usize,
    pub problems: Vec<CheckProblem>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Scan the site and resolve every page's frame without writing anything.
///
/// Unlike [`build`], every page is checked so all problems are reported at
/// once.
pub fn check(config: &SiteConfig) -> Result<CheckReport, GenerateError> {
    let plan = scan::scan(config)?;
    let frames = FrameCache::new(config.base_href.as_str());

    let mut problems = Vec::new();
    for page in &plan.pages {
        let result = frames
            .resolve_for_file(&page.source, &config.frames)
            .and_then(|frame| frame.embed("", &config.content_id));
        if let Err(error) = result {
            problems.push(CheckProblem {
                path: page.source.clone(),
                error,
            });
        }
    }

    Ok(CheckReport {
        pages: plan.pages.len(),
        assets: plan.assets.len(),
        frames_loaded: frames.loads(),
        problems,
    })
}

//! CLI output formatting for the build and check commands.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Excluded content/ignore
//! index.md → index.html (frame: content/frame.html)
//!     Title: Home
//! Warning: content/post.md has 2 cover images, using cover.jpg
//!     Candidates: cover.jpg, cover.png
//! post.md → post.html (frame: content/frame.html)
//!     Title: Post
//! Copied style.css
//!
//! Generated 2 pages, copied 1 asset, 1 frame loaded, 1 warning
//! ```
//!
//! ## Check
//!
//! ```text
//! 2 pages, 1 asset, 1 frame
//! Error: content/notes.md: no frame rule matches content/notes.md
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::generate::{BuildEvent, BuildSummary, CheckReport};
use crate::types::posix_path;
use std::path::Path;

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

/// Source path shown relative to the source root when possible.
fn display_source(path: &Path, source_root: &Path) -> String {
    posix_path(path.strip_prefix(source_root).unwrap_or(path))
}

// ============================================================================
// Build output
// ============================================================================

/// Format a single build progress event as display lines.
pub fn format_build_event(event: &BuildEvent, source_root: &Path) -> Vec<String> {
    match event {
        BuildEvent::DirectoryExcluded { path } => {
            vec![format!("Excluded {}", posix_path(path))]
        }
        BuildEvent::PageRendered {
            source,
            output,
            frame,
            title,
        } => {
            let mut lines = vec![format!(
                "{} → {} (frame: {})",
                display_source(source, source_root),
                posix_path(output),
                posix_path(frame)
            )];
            if let Some(title) = title {
                lines.push(format!("{}Title: {}", indent(1), title));
            }
            lines
        }
        BuildEvent::AssetCopied { output, .. } => {
            vec![format!("Copied {}", posix_path(output))]
        }
        BuildEvent::CoverImageAmbiguous { source, candidates } => {
            let chosen = candidates.first().map(String::as_str).unwrap_or_default();
            vec![
                format!(
                    "Warning: {} has {} cover images, using {}",
                    posix_path(source),
                    candidates.len(),
                    chosen
                ),
                format!("{}Candidates: {}", indent(1), candidates.join(", ")),
            ]
        }
    }
}

/// Format the closing summary line of a build.
pub fn format_build_summary(summary: &BuildSummary) -> Vec<String> {
    let mut line = format!(
        "Generated {}, copied {}, {} loaded",
        plural(summary.pages, "page", "pages"),
        plural(summary.assets, "asset", "assets"),
        plural(summary.frames_loaded, "frame", "frames"),
    );
    if summary.warnings > 0 {
        line.push_str(&format!(
            ", {}",
            plural(summary.warnings, "warning", "warnings")
        ));
    }
    vec![String::new(), line]
}

pub fn print_build_summary(summary: &BuildSummary) {
    for line in format_build_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format the result of a dry run.
pub fn format_check_report(report: &CheckReport) -> Vec<String> {
    let mut lines = vec![format!(
        "{}, {}, {}",
        plural(report.pages, "page", "pages"),
        plural(report.assets, "asset", "assets"),
        plural(report.frames_loaded, "frame", "frames"),
    )];
    for problem in &report.problems {
        lines.push(format!(
            "Error: {}: {}",
            posix_path(&problem.path),
            problem.error
        ));
    }
    lines
}

pub fn print_check_report(report: &CheckReport) {
    for line in format_check_report(report) {
        println!("{}", line);
    }
}

//! Site configuration module.
//!
//! Handles loading and validating the site config file. One file describes a
//! whole site: where the sources live, where output goes, which frame each
//! page is rendered into, and what social metadata each page carries.
//!
//! ## Formats
//!
//! The format is picked from the file extension:
//!
//! - **`.json`**: camelCase keys (`baseHref`, `contentId`, `maxProcesses`).
//! - **`.toml`**: the same keys, with snake_case spellings also accepted.
//!
//! ## Configuration Options
//!
//! ```json
//! {
//!   "source": "content",
//!   "destination": "public",
//!   "baseHref": "https://example.com/",
//!   "hostname": "example.com",
//!   "exclude": [".git", "ignore", "README.md"],
//!   "contentId": "main-content",
//!   "meta": {
//!     "default": {
//!       "og:title": "Example",
//!       "og:image": "img/social.png",
//!       "og:description": "An example site",
//!       "og:url": "https://example.com/",
//!       "twitter_handle": "@example"
//!     },
//!     "matchers": [
//!       {"file": "*blog/*.md", "action": "TAKE_FROM_CONTENT"},
//!       {"file": "*about.md", "action": "STATIC", "meta": {"og:title": "About"}},
//!       {"file": "*.md", "action": "USE_DEFAULT"}
//!     ]
//!   },
//!   "frames": [
//!     {"file": "*.md", "frame": "content/frame.html"}
//!   ],
//!   "processing": {"maxProcesses": 4}
//! }
//! ```
//!
//! Paths are used as written, so relative paths resolve against the working
//! directory. Matcher and frame patterns are matched against the source path
//! as walked (`content/blog/post.md` for the config above).
//!
//! Unknown keys are rejected to catch typos early.

use crate::types::{FrameRule, Meta};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Unsupported config format (expected .json or .toml): {0}")]
    UnsupportedFormat(PathBuf),
}

/// Site configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SiteConfig {
    /// Directory holding the Markdown sources and assets.
    pub source: PathBuf,
    /// Output directory. Created if missing; existing files are overwritten.
    pub destination: PathBuf,
    /// Base URL every relative frame link and image is resolved against.
    #[serde(alias = "base_href")]
    pub base_href: String,
    /// Appended to page titles as `"{title} - {hostname}"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// File and directory names skipped during the walk.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    /// `id` of the frame element that receives the page content.
    #[serde(default = "default_content_id", alias = "content_id")]
    pub content_id: String,
    /// Social metadata defaults and per-file matchers.
    #[serde(default)]
    pub meta: Meta,
    /// Ordered frame rules; the first matching rule wins.
    pub frames: Vec<FrameRule>,
    /// Parallel rendering settings.
    #[serde(default)]
    pub processing: ProcessingConfig,
}

pub fn default_exclude() -> Vec<String> {
    [".git", "ignore", "README.md"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub fn default_content_id() -> String {
    "main-content".to_string()
}

impl SiteConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_href.trim().is_empty() {
            return Err(ConfigError::Validation("baseHref must not be empty".into()));
        }
        if self.frames.is_empty() {
            return Err(ConfigError::Validation(
                "frames must contain at least one rule".into(),
            ));
        }
        if !is_valid_content_id(&self.content_id) {
            return Err(ConfigError::Validation(format!(
                "contentId `{}` must start with a letter and contain only letters, digits, `-` or `_`",
                self.content_id
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.maxProcesses must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn is_valid_content_id(id: &str) -> bool {
    let mut chars = id.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ProcessingConfig {
    /// Maximum number of pages rendered in parallel.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(alias = "max_processes", skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading and validation
// =============================================================================

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else if ext.eq_ignore_ascii_case("toml") {
            Some(Self::Toml)
        } else {
            None
        }
    }
}

/// Parse config text in the given format, then validate.
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<SiteConfig, ConfigError> {
    let config: SiteConfig = match format {
        ConfigFormat::Json => serde_json::from_str(content)?,
        ConfigFormat::Toml => toml::from_str(content)?,
    };
    config.validate()?;
    Ok(config)
}

/// Load, parse, and validate a config file.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let format = ConfigFormat::from_path(path)
        .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;
    let content = fs::read_to_string(path)?;
    parse_config(&content, format)
}

/// Returns a fully-commented stock `site.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# markframe configuration
# =======================
# Save as site.toml (or translate to site.json) and run:
#   markframe build site.toml
#
# Relative paths resolve against the directory you run markframe from.
# Unknown keys will cause an error.

# Directory holding Markdown sources and assets.
source = "content"

# Output directory. Mirrors the source tree; x.md becomes x.html.
destination = "public"

# Relative links in frames and og:image paths are resolved against this.
base_href = "https://example.com/"

# Appended to page titles: "<title> - <hostname>". Remove to use bare titles.
hostname = "example.com"

# File and directory names that are never rendered or copied.
exclude = [".git", "ignore", "README.md"]

# id of the frame element whose children are replaced by the page content.
content_id = "main-content"

# ---------------------------------------------------------------------------
# Frames: the first rule whose glob matches the source path wins.
# Globs follow shell rules; "*" also matches "/".
# ---------------------------------------------------------------------------
[[frames]]
file = "*.md"
frame = "content/frame.html"

# ---------------------------------------------------------------------------
# Social metadata. Every page gets og: tags for the populated fields below;
# twitter: tags are added when twitter_handle is set.
# ---------------------------------------------------------------------------
[meta.default]
"og:title" = "Example"
"og:image" = "img/social.png"
"og:description" = "An example site"
"og:url" = "https://example.com/"
# twitter_handle = "@example"

# Matchers are checked in order; the first match decides.
#   TAKE_FROM_CONTENT  title from the first heading, image from img-<stem>/cover.*
#   STATIC             the fields given in [meta.matchers.meta]
#   USE_DEFAULT        the default bundle above
[[meta.matchers]]
file = "*blog/*.md"
action = "TAKE_FROM_CONTENT"

[[meta.matchers]]
file = "*about.md"
action = "STATIC"

[meta.matchers.meta]
"og:title" = "About"

[processing]
# Max pages rendered in parallel (omit for auto = CPU cores).
# max_processes = 4
"##
}

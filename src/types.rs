//! Shared configuration value types.
//!
//! These are deserialized straight from the site config file and consumed by
//! the frame resolver, the metadata resolver, and the page renderer. Key
//! names follow the config file format (`og:title`, `TAKE_FROM_CONTENT`), with
//! plain aliases (`title`) accepted for TOML configs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Social metadata bundle (Open Graph + Twitter).
///
/// Every field is optional. Empty strings count as unset, so configs that
/// write `"og:image": ""` behave the same as configs that omit the key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetaFields {
    #[serde(rename = "og:title", alias = "title", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "og:image", alias = "image", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(
        rename = "og:description",
        alias = "description",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(rename = "og:url", alias = "url", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_handle: Option<String>,
}

impl MetaFields {
    pub fn title(&self) -> Option<&str> {
        populated(&self.title)
    }

    pub fn image(&self) -> Option<&str> {
        populated(&self.image)
    }

    pub fn description(&self) -> Option<&str> {
        populated(&self.description)
    }

    pub fn url(&self) -> Option<&str> {
        populated(&self.url)
    }

    pub fn twitter_handle(&self) -> Option<&str> {
        populated(&self.twitter_handle)
    }
}

fn populated(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// A shell-style glob matched against a source file path.
///
/// Semantics follow `fnmatch`: `*` and `?` also match `/`, and matching is
/// case-sensitive. Paths are compared in forward-slash form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FilePattern(glob::Pattern);

impl FilePattern {
    pub fn new(pattern: &str) -> Result<Self, glob::PatternError> {
        glob::Pattern::new(pattern).map(Self)
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.0.matches(&posix_path(path))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for FilePattern {
    type Error = glob::PatternError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<FilePattern> for String {
    fn from(pattern: FilePattern) -> Self {
        pattern.0.as_str().to_string()
    }
}

/// Render a path with forward slashes regardless of platform.
pub fn posix_path(path: &Path) -> String {
    let lossy = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        lossy.into_owned()
    } else {
        lossy.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

/// What a matching [`Matcher`] does to a page's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Title from the page's first heading, image from `img-{stem}/cover.*`.
    TakeFromContent,
    /// Fixed fields from the config, layered over the default bundle.
    Static(MetaFields),
    /// The default bundle, unmodified.
    UseDefault,
}

/// A metadata rule: the first matcher whose pattern matches a page wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MatcherSpec", into = "MatcherSpec")]
pub struct Matcher {
    pub file: FilePattern,
    pub action: Action,
}

/// On-disk shape of a matcher: `{"file": ..., "action": ..., "meta": {...}}`.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct MatcherSpec {
    file: FilePattern,
    action: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    meta: Option<MetaFields>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum ActionKind {
    TakeFromContent,
    Static,
    UseDefault,
}

impl TryFrom<MatcherSpec> for Matcher {
    type Error = String;

    fn try_from(spec: MatcherSpec) -> Result<Self, Self::Error> {
        let action = match (spec.action, spec.meta) {
            (ActionKind::TakeFromContent, _) => Action::TakeFromContent,
            (ActionKind::UseDefault, _) => Action::UseDefault,
            (ActionKind::Static, Some(fields)) => Action::Static(fields),
            (ActionKind::Static, None) => {
                return Err(format!(
                    "meta fields are required for STATIC matcher `{}`",
                    spec.file.as_str()
                ));
            }
        };
        Ok(Matcher {
            file: spec.file,
            action,
        })
    }
}

impl From<Matcher> for MatcherSpec {
    fn from(matcher: Matcher) -> Self {
        let (action, meta) = match matcher.action {
            Action::TakeFromContent => (ActionKind::TakeFromContent, None),
            Action::Static(fields) => (ActionKind::Static, Some(fields)),
            Action::UseDefault => (ActionKind::UseDefault, None),
        };
        MatcherSpec {
            file: matcher.file,
            action,
            meta,
        }
    }
}

/// Default metadata plus the ordered matcher list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Meta {
    pub default: MetaFields,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matchers: Vec<Matcher>,
}

impl Meta {
    /// The first matcher whose pattern matches `path`, if any.
    pub fn matcher_for(&self, path: &Path) -> Option<&Matcher> {
        self.matchers.iter().find(|m| m.file.matches(path))
    }
}

/// Maps source files to the frame template they are rendered into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameRule {
    pub file: FilePattern,
    pub frame: PathBuf,
}

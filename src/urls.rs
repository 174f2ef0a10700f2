//! URL classification and relative-reference resolution.
//!
//! Frames and metadata tags need two operations on URLs:
//!
//! - **Is it absolute?** A URL is absolute when it carries a network location
//!   (`https://host/...` or protocol-relative `//host/...`). Schemes without an
//!   authority (`mailto:`, `tel:`) are *not* absolute in this sense, matching
//!   how the base-path rewrite has always treated them.
//! - **Join against the base href.** Relative references are resolved with the
//!   RFC 3986 §5.2 algorithm. Unlike `Url::join`-style APIs, the base does not
//!   need to be absolute: a base of `/blog/` resolves `img/a.png` to
//!   `/blog/img/a.png`.
//!
//! ```text
//! join("https://site.dev/blog/", "post.html")    → https://site.dev/blog/post.html
//! join("https://site.dev/blog/", "/about.html")  → https://site.dev/about.html
//! join("https://site.dev/blog/", "../img/a.png") → https://site.dev/img/a.png
//! join("https://site.dev/",      "https://x.io") → https://x.io
//! ```

/// The five components of a URI reference (RFC 3986 appendix B).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Reference<'a> {
    scheme: Option<&'a str>,
    authority: Option<&'a str>,
    path: &'a str,
    query: Option<&'a str>,
    fragment: Option<&'a str>,
}

impl<'a> Reference<'a> {
    fn parse(input: &'a str) -> Self {
        let (rest, fragment) = match input.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (input, None),
        };
        let (rest, query) = match rest.split_once('?') {
            Some((rest, query)) => (rest, Some(query)),
            None => (rest, None),
        };
        let (scheme, rest) = match split_scheme(rest) {
            Some((scheme, rest)) => (Some(scheme), rest),
            None => (None, rest),
        };
        let (authority, path) = match rest.strip_prefix("//") {
            Some(after) => {
                let end = after.find('/').unwrap_or(after.len());
                (Some(&after[..end]), &after[end..])
            }
            None => (None, rest),
        };
        Self {
            scheme,
            authority,
            path,
            query,
            fragment,
        }
    }
}

/// Split a leading `scheme:` off, if the prefix is a syntactically valid scheme.
fn split_scheme(input: &str) -> Option<(&str, &str)> {
    let colon = input.find(':')?;
    let candidate = &input[..colon];
    let mut chars = candidate.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }
    Some((candidate, &input[colon + 1..]))
}

/// Whether `url` has a non-empty network location (`//host`).
pub fn has_network_location(url: &str) -> bool {
    Reference::parse(url)
        .authority
        .is_some_and(|authority| !authority.is_empty())
}

/// Resolve `reference` against `base` (RFC 3986 §5.2.2, non-strict).
///
/// An empty base returns the reference unchanged; an empty reference returns
/// the base.
pub fn join(base: &str, reference: &str) -> String {
    if base.is_empty() {
        return reference.to_string();
    }
    if reference.is_empty() {
        return base.to_string();
    }

    let b = Reference::parse(base);
    let mut r = Reference::parse(reference);

    // Non-strict: a reference repeating the base scheme is treated as relative.
    if r.scheme.is_some() && r.scheme == b.scheme && r.authority.is_none() {
        r.scheme = None;
    }

    let path;
    let target = if r.scheme.is_some() {
        path = remove_dot_segments(r.path);
        Target {
            scheme: r.scheme,
            authority: r.authority,
            path: &path,
            query: r.query,
            fragment: r.fragment,
        }
    } else if r.authority.is_some() {
        path = remove_dot_segments(r.path);
        Target {
            scheme: b.scheme,
            authority: r.authority,
            path: &path,
            query: r.query,
            fragment: r.fragment,
        }
    } else if r.path.is_empty() {
        Target {
            scheme: b.scheme,
            authority: b.authority,
            path: b.path,
            query: r.query.or(b.query),
            fragment: r.fragment,
        }
    } else {
        path = if r.path.starts_with('/') {
            remove_dot_segments(r.path)
        } else {
            remove_dot_segments(&merge(&b, r.path))
        };
        Target {
            scheme: b.scheme,
            authority: b.authority,
            path: &path,
            query: r.query,
            fragment: r.fragment,
        }
    };
    target.to_string()
}

struct Target<'a> {
    scheme: Option<&'a str>,
    authority: Option<&'a str>,
    path: &'a str,
    query: Option<&'a str>,
    fragment: Option<&'a str>,
}

impl std::fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(scheme) = self.scheme {
            write!(f, "{scheme}:")?;
        }
        if let Some(authority) = self.authority {
            write!(f, "//{authority}")?;
        }
        f.write_str(self.path)?;
        if let Some(query) = self.query {
            write!(f, "?{query}")?;
        }
        if let Some(fragment) = self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

/// RFC 3986 §5.2.3.
fn merge(base: &Reference<'_>, reference_path: &str) -> String {
    if base.authority.is_some() && base.path.is_empty() {
        return format!("/{reference_path}");
    }
    match base.path.rfind('/') {
        Some(idx) => format!("{}{}", &base.path[..=idx], reference_path),
        None => reference_path.to_string(),
    }
}

/// RFC 3986 §5.2.4, segment-based.
fn remove_dot_segments(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    let absolute = path.starts_with('/');
    let mut output: Vec<&str> = Vec::new();
    let segments: Vec<&str> = path.split('/').collect();
    let last = segments.len() - 1;

    for (idx, segment) in segments.iter().enumerate() {
        // The leading empty segment of an absolute path is re-added below.
        if idx == 0 && absolute {
            continue;
        }
        match *segment {
            "." => {
                if idx == last {
                    output.push("");
                }
            }
            ".." => {
                output.pop();
                if idx == last {
                    output.push("");
                }
            }
            other => output.push(other),
        }
    }

    let joined = output.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // has_network_location
    // =========================================================================

    #[test]
    fn http_urls_have_network_location() {
        assert!(has_network_location("https://example.com"));
        assert!(has_network_location("http://example.com/a/b?c#d"));
    }

    #[test]
    fn protocol_relative_has_network_location() {
        assert!(has_network_location("//cdn.example.com/lib.js"));
    }

    #[test]
    fn relative_paths_have_no_network_location() {
        assert!(!has_network_location("post.html"));
        assert!(!has_network_location("/about.html"));
        assert!(!has_network_location("../img/a.png"));
        assert!(!has_network_location("#section"));
        assert!(!has_network_location(""));
    }

    #[test]
    fn authority_less_schemes_are_not_absolute() {
        assert!(!has_network_location("mailto:me@example.com"));
        assert!(!has_network_location("tel:+123"));
    }

    #[test]
    fn empty_authority_is_not_absolute() {
        assert!(!has_network_location("file:///etc/hosts"));
    }

    // =========================================================================
    // join
    // =========================================================================

    #[test]
    fn join_relative_file_against_directory_base() {
        assert_eq!(
            join("https://site.dev/blog/", "post.html"),
            "https://site.dev/blog/post.html"
        );
    }

    #[test]
    fn join_replaces_last_segment_of_file_base() {
        assert_eq!(
            join("https://site.dev/blog/index.html", "post.html"),
            "https://site.dev/blog/post.html"
        );
    }

    #[test]
    fn join_absolute_path_keeps_authority() {
        assert_eq!(
            join("https://site.dev/blog/", "/about.html"),
            "https://site.dev/about.html"
        );
    }

    #[test]
    fn join_resolves_dot_segments() {
        assert_eq!(
            join("https://site.dev/blog/posts/", "../img/a.png"),
            "https://site.dev/blog/img/a.png"
        );
        assert_eq!(
            join("https://site.dev/blog/", "./style.css"),
            "https://site.dev/blog/style.css"
        );
    }

    #[test]
    fn join_leaves_absolute_reference_alone() {
        assert_eq!(
            join("https://site.dev/", "https://other.io/x"),
            "https://other.io/x"
        );
    }

    #[test]
    fn join_protocol_relative_takes_base_scheme() {
        assert_eq!(
            join("https://site.dev/", "//cdn.io/lib.js"),
            "https://cdn.io/lib.js"
        );
    }

    #[test]
    fn join_authority_only_base() {
        assert_eq!(
            join("https://base.dev", "image/dev.jpg"),
            "https://base.dev/image/dev.jpg"
        );
    }

    #[test]
    fn join_fragment_only() {
        assert_eq!(
            join("https://site.dev/blog/", "#top"),
            "https://site.dev/blog/#top"
        );
    }

    #[test]
    fn join_query_only_replaces_query() {
        assert_eq!(
            join("https://site.dev/a?x=1", "?y=2"),
            "https://site.dev/a?y=2"
        );
    }

    #[test]
    fn join_with_path_only_base() {
        assert_eq!(join("/blog/", "img/a.png"), "/blog/img/a.png");
    }

    #[test]
    fn join_with_bare_host_base() {
        // No scheme, no slash: the base is a single relative segment.
        assert_eq!(join("site.test", "image/dev.jpg"), "image/dev.jpg");
    }

    #[test]
    fn join_empty_inputs() {
        assert_eq!(join("", "a.html"), "a.html");
        assert_eq!(join("https://site.dev/", ""), "https://site.dev/");
    }

    #[test]
    fn join_cannot_climb_above_root() {
        assert_eq!(
            join("https://site.dev/", "../../a.html"),
            "https://site.dev/a.html"
        );
    }

    #[test]
    fn join_mailto_is_untouched() {
        assert_eq!(
            join("https://site.dev/", "mailto:me@site.dev"),
            "mailto:me@site.dev"
        );
    }
}

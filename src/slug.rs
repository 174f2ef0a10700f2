//! Heading slugs for anchor links.
//!
//! Slugs are stable and URL-safe: the text is transliterated to ASCII
//! (`Café` → `cafe`), lowercased, every run of non-alphanumeric characters
//! becomes a single `-`, and leading/trailing dashes are dropped.
//!
//! Identical headings produce identical slugs. There is no de-duplication.

/// Convert heading text to a URL-safe slug.
///
/// ```text
/// "Hello World!"        → "hello-world"
/// "  Rust & WebAssembly" → "rust-webassembly"
/// "Über Straße"         → "uber-strasse"
/// ```
pub fn slugify(text: &str) -> String {
    let ascii = deunicode::deunicode(text);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_is_dropped() {
        assert_eq!(slugify("Hello World!"), "hello-world");
    }

    #[test]
    fn runs_collapse_to_one_dash() {
        assert_eq!(slugify("a  --  b"), "a-b");
        assert_eq!(slugify("Rust & WebAssembly"), "rust-webassembly");
    }

    #[test]
    fn leading_and_trailing_separators_trimmed() {
        assert_eq!(slugify("  --Intro--  "), "intro");
    }

    #[test]
    fn unicode_is_transliterated() {
        assert_eq!(slugify("Über Straße"), "uber-strasse");
        assert_eq!(slugify("Café"), "cafe");
    }

    #[test]
    fn digits_are_kept() {
        assert_eq!(slugify("Step 2: Deploy"), "step-2-deploy");
    }

    #[test]
    fn empty_and_symbol_only() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn same_text_same_slug() {
        assert_eq!(slugify("Notes"), slugify("Notes"));
    }
}

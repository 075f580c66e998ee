use once_cell::sync::Lazy;
use regex::Regex;

static DISALLOWED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s-]").expect("valid slug filter regex"));
static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static HYPHENS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("valid hyphen regex"));

/// Derive a URL-safe identifier from a title.
///
/// Never fails; a title with no usable characters yields an empty slug.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = DISALLOWED_RE.replace_all(lowered.trim(), "");
    let hyphenated = WHITESPACE_RE.replace_all(stripped.trim(), "-");
    let collapsed = HYPHENS_RE.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_punctuation() {
        assert_eq!(slugify("Hello   World!!"), "hello-world");
        assert_eq!(slugify("My Talk!"), "my-talk");
        assert_eq!(slugify("  Rust -- Conf 2026  "), "rust-conf-2026");
    }

    #[test]
    fn drops_edge_hyphens() {
        assert_eq!(slugify("- Intro -"), "intro");
        assert_eq!(slugify("Q&A: Ask me anything ?"), "qa-ask-me-anything");
    }

    #[test]
    fn empty_when_nothing_usable() {
        assert_eq!(slugify("!!! ???"), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn output_alphabet_is_restricted() {
        for title in ["Ünïcode Fest", "C++ & Go\tmeetup", "Tabs\tand\nnewlines"] {
            let slug = slugify(title);
            assert!(slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            assert!(!slug.contains("--"));
            assert!(!slug.starts_with('-') && !slug.ends_with('-'));
        }
    }
}

//! Resolution of user input into a canonical `namespace/name` book identifier

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// Two-segment identifier of one book on the host, e.g. `abcd/efgh`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// The identifier as `namespace/name`
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First path segment
    pub fn namespace(&self) -> &str {
        self.0.split_once('/').map(|(ns, _)| ns).unwrap_or(&self.0)
    }

    /// Second path segment
    pub fn name(&self) -> &str {
        self.0.split_once('/').map(|(_, name)| name).unwrap_or("")
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Identifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        resolve(s)
    }
}

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Literal pattern, cannot fail to compile
    #[allow(clippy::expect_used)]
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9_]+/[A-Za-z0-9_]+)").expect("identifier pattern is valid")
    })
}

/// Resolve a raw identifier or URL into an [`Identifier`]
///
/// Accepts `namespace/name`, a full URL (`https://host/namespace/name/...`),
/// or a URL without protocol (`host/namespace/name`). Anything after the two
/// identifier segments is ignored.
///
/// # Errors
///
/// Returns [`Error::InvalidIdentifier`] if no two non-empty segments can be found.
///
/// # Examples
///
/// ```
/// use flipbook_dl::identifier::resolve;
///
/// let id = resolve("https://online.example.com/abc/def/extra/path").unwrap();
/// assert_eq!(id.as_str(), "abc/def");
///
/// assert!(resolve("abc").is_err());
/// ```
pub fn resolve(input: &str) -> Result<Identifier> {
    let trimmed = input.trim();
    let path = strip_base(trimmed);

    id_pattern()
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| Identifier(m.as_str().to_string()))
        .ok_or_else(|| Error::InvalidIdentifier {
            input: input.to_string(),
        })
}

/// Drop a leading `scheme://host/` or bare `host/` so only the URL path remains
fn strip_base(input: &str) -> &str {
    if let Some((scheme, rest)) = input.split_once("://")
        && !scheme.is_empty()
        && scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
    {
        return rest.split_once('/').map(|(_, path)| path).unwrap_or("");
    }

    // A first segment with a dot is a host name, identifiers are ASCII word characters only
    match input.split_once('/') {
        Some((first, path)) if first.contains('.') => path,
        _ => input,
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_full_url_with_trailing_path() {
        let id = resolve("https://online.example.com/abc/def/extra/path").unwrap();
        assert_eq!(id.as_str(), "abc/def");
        assert_eq!(id.namespace(), "abc");
        assert_eq!(id.name(), "def");
    }

    #[test]
    fn resolves_raw_identifier() {
        assert_eq!(resolve("foo/bar").unwrap().as_str(), "foo/bar");
        assert_eq!(resolve("foo/bar/").unwrap().as_str(), "foo/bar");
        assert_eq!(resolve("  foo/bar\n").unwrap().as_str(), "foo/bar");
    }

    #[test]
    fn resolves_known_host_with_and_without_protocol() {
        for input in [
            "https://online.fliphtml5.com/foo/bar",
            "http://online.fliphtml5.com/foo/bar/",
            "online.fliphtml5.com/foo/bar",
            "https://online.fliphtml5.com/foo/bar/index.html#p=3",
            "http://127.0.0.1:8080/foo/bar",
        ] {
            assert_eq!(resolve(input).unwrap().as_str(), "foo/bar", "input: {input}");
        }
    }

    #[test]
    fn ignores_non_word_suffix_on_second_segment() {
        // Matches the host's own lenience: only the leading ASCII word characters count
        assert_eq!(resolve("abc/def.html").unwrap().as_str(), "abc/def");
    }

    #[test]
    fn rejects_inputs_without_two_segments() {
        for input in [
            "",
            "abc",
            "abc/",
            "/def",
            "//",
            "https://online.example.com/",
            "https://online.example.com/abc",
            "https://online.example.com",
            "online.example.com/abc",
            "ab-c/def",
            "café/bar",
            "日本/語",
            "https://online.example.com/ab٣/cd",
        ] {
            match resolve(input) {
                Err(Error::InvalidIdentifier { input: reported }) => assert_eq!(reported, input),
                other => panic!("expected InvalidIdentifier for {input:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn parses_via_from_str() {
        let id: Identifier = "x1/y_2".parse().unwrap();
        assert_eq!(id.to_string(), "x1/y_2");
    }
}

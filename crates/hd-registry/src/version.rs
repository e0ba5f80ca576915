//! Lexical shapes of version identifiers and page names.
//!
//! A version is four digits, a dot, and one or more digits (`2024.3`).
//! Historical versions live on branches whose name ends in that shape;
//! the suffix becomes the local branch name.

use std::sync::LazyLock;

use regex::Regex;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}\.\d+$").unwrap());

static VERSION_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*(\d{4}\.\d+)$").unwrap());

static PAGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^.+\.html$").unwrap());

/// True if `token` is a version identifier such as `2024.1`.
#[must_use]
pub fn is_version(token: &str) -> bool {
    VERSION_RE.is_match(token)
}

/// True if `token` names an HTML page such as `guide.html`.
#[must_use]
pub fn is_page(token: &str) -> bool {
    PAGE_RE.is_match(token)
}

/// Version carried by a branch name, if it ends in a version.
///
/// `origin/2024.1` and `origin/release-2024.1` both yield `2024.1`.
#[must_use]
pub fn version_suffix(branch: &str) -> Option<&str> {
    VERSION_SUFFIX_RE
        .captures(branch)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

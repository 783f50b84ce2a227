//! Utility functions for common operations.

use regex::Regex;
use std::sync::LazyLock;

/// Characters that cannot appear in a filename on common filesystems.
static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1f]"#).unwrap());

/// Resolves a link found on `base` into an absolute URL.
///
/// Absolute links are returned unchanged. Relative and protocol-relative
/// links are joined against `base`; if `base` itself is not a URL, the
/// link is returned as-is and the fetch will report the problem.
pub fn resolve_url(base: &str, link: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        return link.to_string();
    }

    match url::Url::parse(base).and_then(|b| b.join(link)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => link.to_string(),
    }
}

/// Like [`resolve_url`], but joins against `fallback` when `base` is not
/// an absolute URL.
pub fn resolve_url_or(base: &str, fallback: &str, link: &str) -> String {
    if url::Url::parse(base).is_ok() {
        resolve_url(base, link)
    } else {
        resolve_url(fallback, link)
    }
}

/// Turns a novel title into a safe filename stem.
pub fn sanitize_filename(title: &str) -> String {
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(title.trim(), "_");
    let cleaned = cleaned.trim_matches(|c: char| c == '.' || c.is_whitespace());

    if cleaned.is_empty() {
        "untitled".to_string()
    } else {
        cleaned.to_string()
    }
}

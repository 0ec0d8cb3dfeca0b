//! Reference grammar for planning documents
//!
//! Two textual forms are recognized:
//!
//! - diff-render directive: `render_diffs(file:///path/to/file)`
//! - file link: `[label](file:///path/to/file)`
//!
//! Paths are `file://` URIs; both Unix (`file:///srv/x`) and Windows
//! drive-letter (`file:///C:/x`) forms are accepted.

use std::path::PathBuf;

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;

/// Matches `render_diffs(file:///<path>)`, capturing the path
pub(crate) static RENDER_DIFF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"render_diffs\s*\(\s*file:///([^)]+?)\s*\)").unwrap());

/// Matches `[label](file:///<path>)`, capturing label and path
pub(crate) static FILE_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]*)\]\(file:///([^)]+)\)").unwrap());

/// Normalize a path extracted from a `file:///` URI
///
/// The captured text is percent-decoded directly rather than re-parsed as
/// a URL, so `#` and `?` remain part of the path instead of becoming a
/// fragment or query.
pub fn normalize_uri_path(raw: &str) -> PathBuf {
    let decoded = percent_decode_str(raw).decode_utf8_lossy().into_owned();

    // Windows drive letter (e.g. C:/foo) survives as-is
    if decoded.len() > 1 && decoded.as_bytes()[1] == b':' {
        return PathBuf::from(decoded);
    }

    // Unix path - ensure it starts with /
    if decoded.starts_with('/') {
        PathBuf::from(decoded)
    } else {
        PathBuf::from(format!("/{}", decoded))
    }
}

/// Extract the referenced paths from a document body
///
/// Returns `(diff_paths, link_paths)`: paths named by diff-render
/// directives, and paths named by file links that are not already in the
/// diff list.
pub fn parse_file_links(content: &str) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut diff_paths = Vec::new();
    for caps in RENDER_DIFF_RE.captures_iter(content) {
        diff_paths.push(normalize_uri_path(caps[1].trim()));
    }

    let mut link_paths = Vec::new();
    for caps in FILE_LINK_RE.captures_iter(content) {
        let path = normalize_uri_path(caps[2].trim());
        if !diff_paths.contains(&path) && !link_paths.contains(&path) {
            link_paths.push(path);
        }
    }

    (diff_paths, link_paths)
}

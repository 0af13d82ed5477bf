//! MIME type lookup from file names and URLs.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

/// Type reported when nothing more specific is known.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Type reported for local directories.
pub const DIRECTORY_MIME: &str = "inode/directory";

/// A filename-like run: name characters, a dot, more name characters.
static FILENAME_PATTERN: OnceLock<Regex> = OnceLock::new();

fn filename_pattern() -> &'static Regex {
    FILENAME_PATTERN.get_or_init(|| {
        Regex::new(r"[_\d\w\-\. ]+\.[_\d\w\-\. ]+").expect("filename pattern is a valid regex")
    })
}

/// Derive a MIME type name for a path or URL.
///
/// The last `/`-separated segment is searched for a filename-like substring.
/// If one is found the type comes from that name; otherwise the whole input
/// is treated as a URL (see [`mime_for_url`]).
pub fn mime_for(url: &str) -> String {
    let segment = url.rsplit('/').next().unwrap_or_default();

    if !segment.is_empty() {
        if let Some(m) = filename_pattern().find(segment) {
            tracing::trace!(url, name = m.as_str(), "mime lookup by file name");
            return mime_for_name(m.as_str());
        }
    }

    mime_for_url(url)
}

/// Look up a MIME type from a file name's extension.
pub fn mime_for_name(name: &str) -> String {
    mime_guess::from_path(name)
        .first_raw()
        .unwrap_or(OCTET_STREAM)
        .to_string()
}

/// Look up a MIME type for a URL.
///
/// Scheme, query and fragment are stripped. A local path that names an
/// existing directory is reported as [`DIRECTORY_MIME`]; anything else is
/// looked up by the extension of the URL path.
pub fn mime_for_url(url: &str) -> String {
    let (scheme, rest) = match url.split_once("://") {
        Some((scheme, rest)) => (Some(scheme), rest),
        None => (None, url),
    };

    let rest = rest.split(['?', '#']).next().unwrap_or_default();

    let path = match scheme {
        None => rest,
        Some(s) if s.eq_ignore_ascii_case("file") => rest,
        // Remote URL: drop the authority part.
        Some(_) => rest.find('/').map(|i| &rest[i..]).unwrap_or_default(),
    };

    let is_local = scheme.is_none_or(|s| s.eq_ignore_ascii_case("file"));
    if is_local && !path.is_empty() && Path::new(path).is_dir() {
        return DIRECTORY_MIME.to_string();
    }

    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(OCTET_STREAM)
        .to_string()
}

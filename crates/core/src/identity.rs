//! Derived identifiers for presentations and bookmarks.

use url::Url;

/// Presentation id used when the page path is too short to identify a deck.
pub const UNKNOWN_PRESENTATION: &str = "unknown-presentation";

/// Presentation id reported for the extension's own pages (popup, dashboard).
pub const EXTENSION_CONTEXT: &str = "extension-context";

/// URL schemes of browser extension pages.
const EXTENSION_SCHEMES: &[&str] = &["chrome-extension", "moz-extension", "safari-web-extension"];

/// Derive the presentation id from a page URL.
///
/// The id is the first two non-empty path segments joined by `/`
/// (`https://slides.com/alice/rust-intro#/3` gives `alice/rust-intro`).
/// Input that does not parse as an absolute URL is treated as a bare path.
pub fn presentation_id(page_url: &str) -> String {
    match Url::parse(page_url) {
        Ok(url) if EXTENSION_SCHEMES.contains(&url.scheme()) => EXTENSION_CONTEXT.to_string(),
        Ok(url) => presentation_id_from_path(url.path()),
        Err(_) => {
            let path = page_url.split(['#', '?']).next().unwrap_or_default();
            presentation_id_from_path(path)
        }
    }
}

fn presentation_id_from_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() >= 2 {
        format!("{}/{}", segments[0], segments[1])
    } else {
        UNKNOWN_PRESENTATION.to_string()
    }
}

/// Bookmark identity: `{presentation_id}#{h}/{v}`.
pub fn bookmark_id(presentation_id: &str, h: u32, v: u32) -> String {
    format!("{}#{}/{}", presentation_id, h, v)
}

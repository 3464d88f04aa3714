//! Query highlighting for result previews.

use serde::Serialize;

/// A run of preview text, marked if it matched the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightSegment {
    pub text: String,
    pub matched: bool,
}

impl HighlightSegment {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            matched: false,
        }
    }

    fn matched(text: &str) -> Self {
        Self {
            text: text.to_string(),
            matched: true,
        }
    }
}

/// Split `text` around case-insensitive literal occurrences of `query`.
///
/// Concatenating the segments reproduces `text` exactly.
pub fn highlight(text: &str, query: &str) -> Vec<HighlightSegment> {
    let needle: Vec<char> = query.trim().chars().collect();
    if text.is_empty() {
        return Vec::new();
    }
    if needle.is_empty() {
        return vec![HighlightSegment::plain(text)];
    }

    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut segments = Vec::new();
    let mut plain_start = 0;
    let mut i = 0;

    while i + needle.len() <= chars.len() {
        let hit = needle
            .iter()
            .enumerate()
            .all(|(k, n)| chars_eq(chars[i + k].1, *n));
        if !hit {
            i += 1;
            continue;
        }

        let start = chars[i].0;
        let end = chars.get(i + needle.len()).map_or(text.len(), |(idx, _)| *idx);
        if start > plain_start {
            segments.push(HighlightSegment::plain(&text[plain_start..start]));
        }
        segments.push(HighlightSegment::matched(&text[start..end]));
        plain_start = end;
        i += needle.len();
    }

    if plain_start < text.len() {
        segments.push(HighlightSegment::plain(&text[plain_start..]));
    }
    segments
}

fn chars_eq(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

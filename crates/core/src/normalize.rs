//! Text cleanup for slide content.
//!
//! Handles markup-to-text conversion for code samples (where line structure
//! matters), whitespace collapsing, and length limits for titles.

use regex::Regex;
use std::sync::LazyLock;

/// Regex to collapse runs of spaces and tabs into one.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

/// Line breaks and closing block-level tags that end a visual line.
static BLOCK_BREAK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:div|p|li|tr|h[1-6]|pre|blockquote|table|thead|tbody|ul|ol)\s*>")
        .unwrap()
});

/// Any remaining tag.
static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Numeric character references (`&#39;`, `&#x27;`).
static NUMERIC_ENTITY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").unwrap());

/// Named entities that show up in highlighted code.
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&nbsp;", " "),
    // Must come last so `&amp;lt;` decodes to `&lt;`, not `<`.
    ("&amp;", "&"),
];

/// Convert an HTML fragment to text, keeping its line structure.
///
/// Block-level boundaries become newlines before tags are stripped, so tables
/// and per-line `<div>`s in highlighted code keep one line per row.
pub fn html_to_text(html: &str) -> String {
    let with_breaks = BLOCK_BREAK_REGEX.replace_all(html, "\n");
    let stripped = TAG_REGEX.replace_all(&with_breaks, "");
    let decoded = decode_entities(&stripped);

    decoded
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .trim_matches('\n')
        .trim_end()
        .to_string()
}

/// Decode the HTML entities that survive tag stripping.
pub fn decode_entities(text: &str) -> String {
    let numeric = NUMERIC_ENTITY_REGEX.replace_all(text, |caps: &regex::Captures| {
        let raw = &caps[1];
        let code = match raw.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    let mut result = numeric.into_owned();
    for (entity, replacement) in NAMED_ENTITIES {
        result = result.replace(entity, replacement);
    }
    result
}

/// Collapse whitespace runs within each line and drop blank lines.
pub fn collapse_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| WHITESPACE_COLLAPSE_REGEX.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncate to at most `max_chars` characters, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Turn a presentation title into a file stem.
///
/// Anything other than ASCII letters, digits and CJK ideographs becomes `_`.
pub fn safe_file_stem(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || ('\u{4e00}'..='\u{9fa5}').contains(&c) {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.is_empty() {
        "slides".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text_strips_tags() {
        assert_eq!(
            html_to_text("<span class=\"hljs-keyword\">const</span> x = 1;"),
            "const x = 1;"
        );
    }

    #[test]
    fn test_html_to_text_keeps_table_rows() {
        let html = "<table><tr><td>1</td><td>fn main() {</td></tr>\
                    <tr><td>2</td><td>}</td></tr></table>";
        assert_eq!(html_to_text(html), "1fn main() {\n2}");
    }

    #[test]
    fn test_html_to_text_br_and_divs() {
        assert_eq!(html_to_text("a<br>b<br/>c"), "a\nb\nc");
        assert_eq!(html_to_text("<div>x</div><div>y</div>"), "x\ny");
    }

    #[test]
    fn test_html_to_text_keeps_indentation() {
        assert_eq!(
            html_to_text("def f():\n    return 1\n"),
            "def f():\n    return 1"
        );
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &lt; b &amp;&amp; c &gt; d"), "a < b && c > d");
        assert_eq!(decode_entities("it&#39;s &#x41;"), "it's A");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Hello    world  "), "Hello world");
        assert_eq!(collapse_whitespace("a\n\n\t b"), "a\nb");
    }

    #[test]
    fn test_truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("héllo wörld", 7), "héllo w");
        assert_eq!(truncate_chars("短い", 10), "短い");
    }

    #[test]
    fn test_safe_file_stem() {
        assert_eq!(safe_file_stem("Rust: Intro!"), "Rust__Intro_");
        assert_eq!(safe_file_stem("簡報 2024"), "簡報_2024");
        assert_eq!(safe_file_stem(""), "slides");
    }
}

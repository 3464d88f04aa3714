//! Slide extraction for reveal.js / slides.com pages.
//!
//! Slides live under `.reveal .slides` as `section` elements: top-level
//! sections are horizontal positions, sections nested inside them are the
//! vertical positions of that column.

use crate::document::{SlideDocument, SlideNode};
use slidemark_core::normalize::{collapse_whitespace, html_to_text, truncate_chars};
use slidemark_core::types::UNTITLED_SLIDE;
use slidemark_core::{parse_fragment, SlideBlock, SlideIndex, SlidesDataResponse};

/// Heading selectors tried in order when resolving a slide title.
const TITLE_TAGS: &[&str] = &["h1", "h2", "h3"];

/// Tags that produce header blocks.
const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Class of slides.com content wrappers.
const CONTENT_NODE_CLASS: &str = "sl-block-content";

/// Max characters of block content used as a fallback title.
const FALLBACK_TITLE_CHARS: usize = 50;

/// Classes found on code elements that are not language names.
const NON_LANGUAGE_CLASSES: &[&str] = &[
    "hljs",
    "line-numbers",
    "remove-line-numbers",
    "nohighlight",
    "no-highlight",
    "has-highlights",
    "fragment",
    "current-fragment",
    "visible",
    "code-wrapper",
];

/// Extractor for reveal.js presentation pages.
pub struct SlideExtractor;

impl SlideExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract every slide, in `(h, v)` order.
    ///
    /// A page without a `.reveal .slides` root yields no slides.
    pub fn extract_slides<D: SlideDocument>(&self, document: &D) -> Vec<SlideIndex> {
        let Some(root) = find_slides_root(document.document_element()) else {
            log::debug!("No presentation root found");
            return Vec::new();
        };

        let mut slides = Vec::new();
        let columns = root
            .element_children()
            .into_iter()
            .filter(|n| n.is_tag("section"));

        for (h, column) in columns.enumerate() {
            let nested: Vec<_> = column
                .descendants()
                .into_iter()
                .filter(|n| n.is_tag("section"))
                .collect();

            if nested.is_empty() {
                slides.push(self.parse_slide(column, h as u32, 0));
            } else {
                for (v, section) in nested.into_iter().enumerate() {
                    slides.push(self.parse_slide(section, h as u32, v as u32));
                }
            }
        }

        log::debug!("Extracted {} slides", slides.len());
        slides
    }

    /// Extract the slide currently on screen.
    ///
    /// The host marks both a column and its visible nested slide as
    /// `present`, so the last present, non-hidden section wins. Coordinates
    /// come from the location fragment.
    pub fn extract_current_slide<D: SlideDocument>(
        &self,
        document: &D,
        fragment: &str,
    ) -> Option<SlideIndex> {
        let root = find_slides_root(document.document_element())?;
        let current = root
            .descendants()
            .into_iter()
            .filter(|n| n.is_tag("section") && n.has_class("present") && !is_hidden(*n))
            .last()?;

        let position = parse_fragment(fragment);
        Some(self.parse_slide(current, position.h, position.v))
    }

    /// Build the `GET_SLIDES_DATA` response for a page.
    pub fn slides_data<D: SlideDocument>(&self, document: &D) -> SlidesDataResponse {
        SlidesDataResponse::new(document.title(), &self.extract_slides(document))
    }

    /// Parse one slide container into a [`SlideIndex`].
    pub fn parse_slide<'a, N: SlideNode<'a>>(&self, container: N, h: u32, v: u32) -> SlideIndex {
        let heading_title = resolve_heading_title(container);

        let blocks: Vec<SlideBlock> = content_nodes(container)
            .into_iter()
            .filter_map(|node| classify_node(node, heading_title.as_deref()))
            .collect();

        let title = heading_title
            .or_else(|| {
                blocks
                    .iter()
                    .find(|b| b.is_header())
                    .map(|b| b.content().to_string())
            })
            .or_else(|| {
                blocks
                    .first()
                    .map(|b| single_line(&truncate_chars(b.content(), FALLBACK_TITLE_CHARS)))
            })
            .unwrap_or_else(|| UNTITLED_SLIDE.to_string());

        SlideIndex::new(h, v, title, blocks)
    }
}

impl Default for SlideExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract every slide of a page with the default extractor.
pub fn extract_slides<D: SlideDocument>(document: &D) -> Vec<SlideIndex> {
    SlideExtractor::new().extract_slides(document)
}

/// Extract the visible slide of a page with the default extractor.
pub fn extract_current_slide<D: SlideDocument>(document: &D, fragment: &str) -> Option<SlideIndex> {
    SlideExtractor::new().extract_current_slide(document, fragment)
}

/// The `.slides` element inside `.reveal`.
fn find_slides_root<'a, N: SlideNode<'a>>(document_element: N) -> Option<N> {
    let reveal = document_element.find_self_or_descendant(|n| n.has_class("reveal"))?;
    reveal.find_descendant(|n| n.has_class("slides"))
}

fn is_hidden<'a, N: SlideNode<'a>>(node: N) -> bool {
    node.attribute("hidden").is_some() || node.attribute("aria-hidden") == Some("true")
}

/// Title from the first heading tag (in priority order) with text.
fn resolve_heading_title<'a, N: SlideNode<'a>>(container: N) -> Option<String> {
    TITLE_TAGS.iter().find_map(|tag| {
        container
            .find_descendant(|n| n.is_tag(tag))
            .map(|n| single_line(&n.text_content()))
            .filter(|t| !t.is_empty())
    })
}

/// Nodes holding one unit of content each.
///
/// slides.com wraps every block in `.sl-block-content`; plain reveal.js
/// slides use the section's own children.
fn content_nodes<'a, N: SlideNode<'a>>(container: N) -> Vec<N> {
    let mut wrapped = Vec::new();
    collect_content_wrappers(container, &mut wrapped);
    if !wrapped.is_empty() {
        return wrapped;
    }

    container
        .element_children()
        .into_iter()
        .filter(|n| !n.is_tag("section"))
        .collect()
}

fn collect_content_wrappers<'a, N: SlideNode<'a>>(node: N, out: &mut Vec<N>) {
    for child in node.element_children() {
        if child.is_tag("section") {
            continue;
        }
        if child.has_class(CONTENT_NODE_CLASS) {
            out.push(child);
        } else {
            collect_content_wrappers(child, out);
        }
    }
}

/// Classify a content node. The first matching rule wins.
fn classify_node<'a, N: SlideNode<'a>>(node: N, title: Option<&str>) -> Option<SlideBlock> {
    if let Some(code) = node.find_self_or_descendant(|n| n.is_tag("code")) {
        return code_block(node, code);
    }

    if let Some(list) = node.find_self_or_descendant(|n| n.is_tag("ul") || n.is_tag("ol")) {
        return list_block(list);
    }

    if let Some(heading) = node.find_self_or_descendant(|n| HEADING_TAGS.iter().any(|t| n.is_tag(t))) {
        return header_block(heading);
    }

    let text = collapse_whitespace(&node.text_content());
    if !text.is_empty() {
        if title == Some(text.as_str()) {
            return None;
        }
        return Some(SlideBlock::Text { content: text });
    }

    image_block(node)
}

fn code_block<'a, N: SlideNode<'a>>(node: N, code: N) -> Option<SlideBlock> {
    let content = html_to_text(&code.inner_markup());
    if content.trim().is_empty() {
        return None;
    }

    Some(SlideBlock::Code {
        content,
        lang: code_language(node, code),
    })
}

/// Language from the code element's classes, then from data attributes.
fn code_language<'a, N: SlideNode<'a>>(node: N, code: N) -> String {
    let from_class = code
        .classes()
        .into_iter()
        .map(|c| {
            c.strip_prefix("language-")
                .or_else(|| c.strip_prefix("lang-"))
                .unwrap_or(c)
        })
        .find(|c| !c.is_empty() && !NON_LANGUAGE_CLASSES.iter().any(|known| known == c));

    if let Some(lang) = from_class {
        return lang.to_string();
    }

    let pre = node.find_self_or_descendant(|n| n.is_tag("pre"));
    [Some(code), pre]
        .into_iter()
        .flatten()
        .find_map(|n| n.attribute("data-lang").or_else(|| n.attribute("data-language")))
        .map(|lang| lang.trim().to_string())
        .unwrap_or_default()
}

fn list_block<'a, N: SlideNode<'a>>(list: N) -> Option<SlideBlock> {
    let ordered = list.is_tag("ol");
    let lines: Vec<String> = list
        .element_children()
        .into_iter()
        .filter(|n| n.is_tag("li"))
        .enumerate()
        .filter_map(|(i, item)| {
            let text = single_line(&item.text_content());
            if text.is_empty() {
                return None;
            }
            Some(if ordered {
                format!("{}. {}", i + 1, text)
            } else {
                format!("- {}", text)
            })
        })
        .collect();

    if lines.is_empty() {
        return None;
    }
    Some(SlideBlock::List {
        content: lines.join("\n"),
    })
}

fn header_block<'a, N: SlideNode<'a>>(heading: N) -> Option<SlideBlock> {
    let content = single_line(&heading.text_content());
    if content.is_empty() {
        return None;
    }

    let level = heading
        .tag_name()
        .get(1..)
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|n| (1..=6).contains(n))
        .unwrap_or(2);

    Some(SlideBlock::Header { content, level })
}

fn image_block<'a, N: SlideNode<'a>>(node: N) -> Option<SlideBlock> {
    let img = node.find_self_or_descendant(|n| n.is_tag("img"))?;
    let content = img
        .attribute("alt")
        .map(str::trim)
        .filter(|alt| !alt.is_empty())
        .or_else(|| img.attribute("src").map(str::trim))
        .filter(|c| !c.is_empty())?;

    Some(SlideBlock::Image {
        content: content.to_string(),
    })
}

/// Collapse all whitespace, line breaks included, to single spaces.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

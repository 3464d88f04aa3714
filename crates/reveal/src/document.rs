//! Read-only view of a presentation page.
//!
//! The extractor only needs to enumerate element children, read text,
//! attributes and class lists, so it works against these traits instead of
//! a concrete DOM. [`HtmlDocument`] implements them for parsed HTML.

use scraper::{ElementRef, Html, Node};

/// Elements rendered on their own line.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt",
    "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "ol", "p", "pre", "section", "table", "tr", "ul",
];

/// An element in a presentation page.
///
/// Implemented for cheap copyable handles (`ElementRef`, `&Node`).
pub trait SlideNode<'a>: Copy {
    /// Lowercase tag name.
    fn tag_name(self) -> &'a str;

    /// Child elements in document order (text nodes excluded).
    fn element_children(self) -> Vec<Self>;

    /// Attribute value, if present.
    fn attribute(self, name: &str) -> Option<&'a str>;

    /// Text of all descendant text nodes, with block-level elements on
    /// their own lines.
    fn text_content(self) -> String;

    /// Markup of the element's contents.
    fn inner_markup(self) -> String;

    fn classes(self) -> Vec<&'a str> {
        self.attribute("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    fn has_class(self, class: &str) -> bool {
        self.classes().iter().any(|c| *c == class)
    }

    fn is_tag(self, tag: &str) -> bool {
        self.tag_name().eq_ignore_ascii_case(tag)
    }

    /// All descendant elements in document order, excluding `self`.
    fn descendants(self) -> Vec<Self> {
        let mut out = Vec::new();
        collect_descendants(self, &mut out);
        out
    }

    /// First descendant (document order) matching `predicate`.
    fn find_descendant(self, predicate: impl Fn(Self) -> bool) -> Option<Self> {
        self.descendants().into_iter().find(|n| predicate(*n))
    }

    /// `self` if it matches, otherwise the first matching descendant.
    fn find_self_or_descendant(self, predicate: impl Fn(Self) -> bool) -> Option<Self> {
        if predicate(self) {
            Some(self)
        } else {
            self.find_descendant(predicate)
        }
    }
}

fn collect_descendants<'a, N: SlideNode<'a>>(node: N, out: &mut Vec<N>) {
    for child in node.element_children() {
        out.push(child);
        collect_descendants(child, out);
    }
}

/// A whole presentation page.
pub trait SlideDocument {
    type Node<'a>: SlideNode<'a>
    where
        Self: 'a;

    /// The `<html>` element.
    fn document_element(&self) -> Self::Node<'_>;

    /// The page title.
    fn title(&self) -> String;
}

impl<'a> SlideNode<'a> for ElementRef<'a> {
    fn tag_name(self) -> &'a str {
        self.value().name()
    }

    fn element_children(self) -> Vec<Self> {
        self.children().filter_map(ElementRef::wrap).collect()
    }

    fn attribute(self, name: &str) -> Option<&'a str> {
        self.value().attr(name)
    }

    fn text_content(self) -> String {
        let mut out = String::new();
        push_rendered_text(self, &mut out);
        out.trim_matches('\n').to_string()
    }

    fn inner_markup(self) -> String {
        self.inner_html()
    }
}

fn push_rendered_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = child.value().name();
                let block = BLOCK_TAGS.iter().any(|tag| *tag == name);
                if block {
                    line_break(out);
                }
                push_rendered_text(child, out);
                if block {
                    line_break(out);
                }
            }
            _ => {}
        }
    }
}

fn line_break(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// A presentation page parsed from HTML.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    /// Parse a full HTML document. Malformed markup is repaired, never rejected.
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }
}

impl SlideDocument for HtmlDocument {
    type Node<'a> = ElementRef<'a>;

    fn document_element(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    fn title(&self) -> String {
        self.document_element()
            .find_descendant(|n| n.is_tag("title"))
            .map(|t| t.text_content().trim().to_string())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for HtmlDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlDocument")
            .field("title", &self.title())
            .finish()
    }
}

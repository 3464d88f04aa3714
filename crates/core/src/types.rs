//! Domain types for representing extracted slides, bookmarks and search results.

use serde::{Deserialize, Deserializer, Serialize};

/// Id of the reserved collection every bookmark falls back to.
pub const DEFAULT_COLLECTION_ID: &str = "default";

/// Title used when a slide has no heading and no content.
pub const UNTITLED_SLIDE: &str = "Untitled Slide";

/// Presentation title attached to slides of the page being searched.
pub const CURRENT_PRESENTATION_TITLE: &str = "Current Presentation";

/// One semantic unit of slide content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SlideBlock {
    /// A paragraph of plain text.
    Text { content: String },

    /// A code sample with a best-effort language tag (may be empty).
    Code {
        content: String,
        #[serde(default)]
        lang: String,
    },

    /// A list, already rendered with `"1. "` or `"- "` item prefixes.
    List { content: String },

    /// A heading with depth 1-6.
    Header {
        content: String,
        #[serde(default = "default_header_level")]
        level: u8,
    },

    /// An image, described by its alt text or source.
    Image { content: String },
}

fn default_header_level() -> u8 {
    2
}

impl SlideBlock {
    /// The block's text content.
    pub fn content(&self) -> &str {
        match self {
            SlideBlock::Text { content }
            | SlideBlock::Code { content, .. }
            | SlideBlock::List { content }
            | SlideBlock::Header { content, .. }
            | SlideBlock::Image { content } => content,
        }
    }

    /// Whether this is a code block.
    pub fn is_code(&self) -> bool {
        matches!(self, SlideBlock::Code { .. })
    }

    /// Whether this is a header block.
    pub fn is_header(&self) -> bool {
        matches!(self, SlideBlock::Header { .. })
    }
}

/// Coarse classification of a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideKind {
    /// At least one code block.
    Code,
    /// Anything else.
    #[default]
    Text,
}

// Older stored records used other labels ("mixed", "saved"); read them as text.
impl<'de> Deserialize<'de> for SlideKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(match label.as_str() {
            "code" => SlideKind::Code,
            _ => SlideKind::Text,
        })
    }
}

/// One slide: a leaf position in the horizontal x vertical grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideIndex {
    /// Stable id derived from the coordinates (`slide-{h}-{v}`).
    pub id: String,

    /// Zero-based index of the top-level slide.
    #[serde(default)]
    pub h: u32,

    /// Zero-based index of the nested slide (0 if none).
    #[serde(default)]
    pub v: u32,

    /// Display label `"{h}-{v}"`.
    #[serde(default)]
    pub slide_label: String,

    /// Best-effort single-line title.
    #[serde(default)]
    pub title: String,

    /// Content blocks in document order.
    #[serde(default)]
    pub blocks: Vec<SlideBlock>,

    /// All block contents, space-joined.
    #[serde(default, alias = "content", alias = "contentSnippet")]
    pub search_content: String,

    /// `code` if any block is code.
    #[serde(default, rename = "type")]
    pub kind: SlideKind,
}

impl SlideIndex {
    /// Build a slide from its coordinates, resolved title and blocks.
    ///
    /// Id, label, search content and kind are derived.
    pub fn new(h: u32, v: u32, title: impl Into<String>, blocks: Vec<SlideBlock>) -> Self {
        let search_content = blocks
            .iter()
            .map(SlideBlock::content)
            .collect::<Vec<_>>()
            .join(" ");
        let kind = if blocks.iter().any(SlideBlock::is_code) {
            SlideKind::Code
        } else {
            SlideKind::Text
        };

        Self {
            id: slide_id(h, v),
            h,
            v,
            slide_label: slide_label(h, v),
            title: title.into(),
            blocks,
            search_content,
            kind,
        }
    }

    /// Blocks of the given predicate, for building search fields.
    pub fn blocks_where<'a>(
        &'a self,
        predicate: impl Fn(&SlideBlock) -> bool + 'a,
    ) -> impl Iterator<Item = &'a SlideBlock> + 'a {
        self.blocks.iter().filter(move |b| predicate(b))
    }
}

/// Slide identity: `slide-{h}-{v}`.
pub fn slide_id(h: u32, v: u32) -> String {
    format!("slide-{}-{}", h, v)
}

/// Display label: `{h}-{v}`.
pub fn slide_label(h: u32, v: u32) -> String {
    format!("{}-{}", h, v)
}

/// A persisted, user-saved reference to one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// Snapshot of the slide at save time.
    #[serde(flatten)]
    pub slide: SlideIndex,

    /// Presentation this slide belongs to.
    pub presentation_id: String,

    /// Page title at save time.
    #[serde(default)]
    pub presentation_title: String,

    /// Full page URL at save time.
    #[serde(default)]
    pub url: String,

    /// Owning collection.
    #[serde(default = "default_collection_id")]
    pub collection_id: String,

    /// De-duplication key: `presentationId#h/v`.
    #[serde(default)]
    pub bookmark_id: String,

    /// Capture time, epoch milliseconds.
    #[serde(default)]
    pub created_at: i64,
}

fn default_collection_id() -> String {
    DEFAULT_COLLECTION_ID.to_string()
}

impl Bookmark {
    /// Repair records written before `bookmarkId` existed, whose `id` was the key.
    pub(crate) fn fill_legacy_key(&mut self) {
        if self.bookmark_id.is_empty() {
            self.bookmark_id = self.slide.id.clone();
        }
    }
}

/// A user-defined group of bookmarks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub name: String,
    /// Display color, e.g. `#94a3b8`.
    pub color: String,
    /// Whether its bookmarks show up in cross-presentation search.
    pub show_in_quick_search: bool,
    #[serde(default)]
    pub created_at: i64,
}

impl Collection {
    /// The reserved collection that always exists.
    pub fn default_collection(created_at: i64) -> Self {
        Self {
            id: DEFAULT_COLLECTION_ID.to_string(),
            name: "General".to_string(),
            color: "#94a3b8".to_string(),
            show_in_quick_search: true,
            created_at,
        }
    }

    /// Whether this is the reserved default collection.
    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_COLLECTION_ID
    }
}

/// A slide of the current presentation, as seen by search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSlide {
    #[serde(flatten)]
    pub slide: SlideIndex,
    pub presentation_title: String,
}

/// Where a search result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Local,
    Bookmark,
}

/// A candidate in the search pool. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum SearchResultItem {
    /// A slide extracted from the page being viewed.
    Local(LocalSlide),
    /// A saved bookmark from another presentation.
    Bookmark(Bookmark),
}

impl SearchResultItem {
    /// Wrap a freshly extracted slide.
    pub fn local(slide: SlideIndex) -> Self {
        SearchResultItem::Local(LocalSlide {
            slide,
            presentation_title: CURRENT_PRESENTATION_TITLE.to_string(),
        })
    }

    pub fn source(&self) -> ResultSource {
        match self {
            SearchResultItem::Local(_) => ResultSource::Local,
            SearchResultItem::Bookmark(_) => ResultSource::Bookmark,
        }
    }

    pub fn is_local(&self) -> bool {
        self.source() == ResultSource::Local
    }

    /// The underlying slide snapshot.
    pub fn slide(&self) -> &SlideIndex {
        match self {
            SearchResultItem::Local(local) => &local.slide,
            SearchResultItem::Bookmark(bookmark) => &bookmark.slide,
        }
    }

    /// Result identity: the slide id for local items, the bookmark key otherwise.
    pub fn id(&self) -> &str {
        match self {
            SearchResultItem::Local(local) => &local.slide.id,
            SearchResultItem::Bookmark(bookmark) => &bookmark.bookmark_id,
        }
    }

    pub fn title(&self) -> &str {
        &self.slide().title
    }

    pub fn search_content(&self) -> &str {
        &self.slide().search_content
    }

    pub fn slide_label(&self) -> &str {
        &self.slide().slide_label
    }

    pub fn blocks(&self) -> &[SlideBlock] {
        &self.slide().blocks
    }

    pub fn presentation_title(&self) -> &str {
        match self {
            SearchResultItem::Local(local) => &local.presentation_title,
            SearchResultItem::Bookmark(bookmark) => &bookmark.presentation_title,
        }
    }
}

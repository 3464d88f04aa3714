//! Core domain types, identifiers, navigation tracking, bookmark storage
//! and markdown export for slide bookmarking and search.

pub mod bookmarks;
pub mod error;
pub mod identity;
pub mod markdown;
pub mod messages;
pub mod navigation;
pub mod normalize;
pub mod store;
pub mod types;

pub use bookmarks::{now_millis, BookmarkFilter, BookmarkStore, CollectionDraft, PageContext};
pub use error::{Error, Result};
pub use identity::{bookmark_id, presentation_id};
pub use markdown::MarkdownExporter;
pub use messages::{ExtensionMessage, SlideData, SlidesDataResponse};
pub use navigation::{parse_fragment, NavigationSignal, NavigationTracker, SlidePosition};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use types::{
    Bookmark, Collection, LocalSlide, ResultSource, SearchResultItem, SlideBlock, SlideIndex,
    SlideKind,
};

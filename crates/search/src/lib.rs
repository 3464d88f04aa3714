//! Quick search over the current presentation and saved bookmarks.

pub mod engine;
pub mod highlight;
pub mod index;

pub use engine::{rank, FieldWeights, RankingEngine, SearchHit, SearchOptions};
pub use highlight::{highlight, HighlightSegment};
pub use index::{build_pool, filter_searchable, searchable_bookmarks};

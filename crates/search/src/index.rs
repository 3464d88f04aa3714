//! Search pool construction.
//!
//! The pool is every slide of the page being viewed plus the saved bookmarks
//! of other presentations whose collection opted into quick search.

use slidemark_core::{
    Bookmark, BookmarkStore, Collection, KeyValueStore, SearchResultItem, SlideIndex,
};
use std::collections::HashSet;

/// Build the unranked candidate pool.
///
/// `extract_local` runs only when `active` is true. A store that cannot be
/// read leaves the pool with local slides only.
pub fn build_pool<S: KeyValueStore>(
    active: bool,
    extract_local: impl FnOnce() -> Vec<SlideIndex>,
    store: &BookmarkStore<S>,
    current_presentation_id: &str,
) -> Vec<SearchResultItem> {
    let mut pool: Vec<SearchResultItem> = if active {
        extract_local().into_iter().map(SearchResultItem::local).collect()
    } else {
        Vec::new()
    };
    let local_count = pool.len();

    match searchable_bookmarks(store, current_presentation_id) {
        Ok(bookmarks) => pool.extend(bookmarks.into_iter().map(SearchResultItem::Bookmark)),
        Err(e) => log::warn!("Searching local slides only, bookmarks unavailable: {}", e),
    }

    log::debug!(
        "Search pool: {} local, {} bookmarked",
        local_count,
        pool.len() - local_count
    );
    pool
}

/// Bookmarks eligible for cross-presentation search, read from the store.
pub fn searchable_bookmarks<S: KeyValueStore>(
    store: &BookmarkStore<S>,
    current_presentation_id: &str,
) -> slidemark_core::Result<Vec<Bookmark>> {
    let collections = store.collections()?;
    let bookmarks = store.bookmarks()?;
    Ok(filter_searchable(&collections, bookmarks, current_presentation_id))
}

/// Keep bookmarks in quick-search collections that belong to other presentations.
///
/// The current presentation's own bookmarks are already covered by its
/// local slides.
pub fn filter_searchable(
    collections: &[Collection],
    bookmarks: Vec<Bookmark>,
    current_presentation_id: &str,
) -> Vec<Bookmark> {
    let allowed: HashSet<&str> = collections
        .iter()
        .filter(|c| c.show_in_quick_search)
        .map(|c| c.id.as_str())
        .collect();

    bookmarks
        .into_iter()
        .filter(|b| allowed.contains(b.collection_id.as_str()))
        .filter(|b| b.presentation_id != current_presentation_id)
        .collect()
}

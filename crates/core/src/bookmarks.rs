//! Bookmark and collection management on top of a [`KeyValueStore`].
//!
//! Two keys are used: `collections` (array of [`Collection`]) and `bookmarks`
//! (array of [`Bookmark`]). All mutations take `&mut self`, so writes from one
//! owner are applied one at a time.

use crate::error::{Error, Result};
use crate::identity::{bookmark_id, presentation_id};
use crate::store::{KeyValueStore, WatchId};
use crate::types::{Bookmark, Collection, SlideIndex, DEFAULT_COLLECTION_ID};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Store key holding the collection list.
pub const COLLECTIONS_KEY: &str = "collections";

/// Store key holding the bookmark list.
pub const BOOKMARKS_KEY: &str = "bookmarks";

/// Current time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// The page a slide is being saved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    /// Full page URL, fragment included.
    pub url: String,
    /// Document title.
    pub title: String,
}

impl PageContext {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }

    /// Presentation id derived from the URL path.
    pub fn presentation_id(&self) -> String {
        presentation_id(&self.url)
    }
}

/// User-editable collection fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDraft {
    pub name: String,
    pub color: String,
    pub show_in_quick_search: bool,
}

/// Dashboard listing filter.
#[derive(Debug, Clone, Default)]
pub struct BookmarkFilter {
    /// Restrict to one collection; `None` lists all.
    pub collection_id: Option<String>,
    /// Case-insensitive substring over title, content and presentation title.
    pub query: String,
}

/// Bookmark and collection operations over a key-value store.
pub struct BookmarkStore<S> {
    store: S,
}

impl<S: KeyValueStore> BookmarkStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    // --- Collections ---

    /// All collections. The default collection is always present.
    pub fn collections(&self) -> Result<Vec<Collection>> {
        let mut collections: Vec<Collection> = self.read_list(COLLECTIONS_KEY)?.unwrap_or_default();
        if !collections.iter().any(Collection::is_default) {
            collections.insert(0, Collection::default_collection(0));
        }
        Ok(collections)
    }

    /// Create a collection with a generated id.
    pub fn create_collection(&mut self, draft: CollectionDraft, created_at: i64) -> Result<Collection> {
        let mut collections = self.collections()?;
        let collection = Collection {
            id: uuid::Uuid::new_v4().to_string(),
            name: draft.name,
            color: draft.color,
            show_in_quick_search: draft.show_in_quick_search,
            created_at,
        };
        collections.push(collection.clone());
        self.write_list(COLLECTIONS_KEY, &collections)?;
        log::debug!("Created collection '{}' ({})", collection.name, collection.id);
        Ok(collection)
    }

    /// Change a collection's name, color and search visibility.
    pub fn update_collection(&mut self, id: &str, draft: CollectionDraft) -> Result<Collection> {
        let mut collections = self.collections()?;
        let collection = collections
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::UnknownCollection(id.to_string()))?;

        collection.name = draft.name;
        collection.color = draft.color;
        collection.show_in_quick_search = draft.show_in_quick_search;
        let updated = collection.clone();

        self.write_list(COLLECTIONS_KEY, &collections)?;
        Ok(updated)
    }

    /// Delete a collection, moving its bookmarks to the default collection.
    ///
    /// Returns the number of bookmarks reassigned.
    pub fn delete_collection(&mut self, id: &str) -> Result<usize> {
        if id == DEFAULT_COLLECTION_ID {
            return Err(Error::ReservedCollection);
        }

        let mut collections = self.collections()?;
        let before = collections.len();
        collections.retain(|c| c.id != id);
        if collections.len() == before {
            return Err(Error::UnknownCollection(id.to_string()));
        }

        let mut bookmarks = self.bookmarks()?;
        let mut reassigned = 0;
        for bookmark in bookmarks.iter_mut().filter(|b| b.collection_id == id) {
            bookmark.collection_id = DEFAULT_COLLECTION_ID.to_string();
            reassigned += 1;
        }

        // Bookmarks first: a failed second write must not leave them in a
        // collection that no longer exists.
        self.write_list(BOOKMARKS_KEY, &bookmarks)?;
        self.write_list(COLLECTIONS_KEY, &collections)?;
        log::debug!("Deleted collection {}, reassigned {} bookmarks", id, reassigned);
        Ok(reassigned)
    }

    // --- Bookmarks ---

    /// All bookmarks, most recently saved first.
    pub fn bookmarks(&self) -> Result<Vec<Bookmark>> {
        let mut bookmarks: Vec<Bookmark> = self.read_list(BOOKMARKS_KEY)?.unwrap_or_default();
        for bookmark in &mut bookmarks {
            bookmark.fill_legacy_key();
        }
        Ok(bookmarks)
    }

    /// Look up a bookmark by its `presentationId#h/v` key.
    pub fn find_bookmark(&self, bookmark_id: &str) -> Result<Option<Bookmark>> {
        Ok(self
            .bookmarks()?
            .into_iter()
            .find(|b| b.bookmark_id == bookmark_id))
    }

    /// Bookmarks in one collection, in stored order.
    pub fn bookmarks_in(&self, collection_id: &str) -> Result<Vec<Bookmark>> {
        Ok(self
            .bookmarks()?
            .into_iter()
            .filter(|b| b.collection_id == collection_id)
            .collect())
    }

    /// Save a slide, replacing any bookmark for the same coordinates.
    ///
    /// The saved bookmark goes to the front of the list.
    pub fn save_bookmark(
        &mut self,
        slide: SlideIndex,
        page: &PageContext,
        collection_id: &str,
        created_at: i64,
    ) -> Result<Bookmark> {
        if !self.collections()?.iter().any(|c| c.id == collection_id) {
            return Err(Error::UnknownCollection(collection_id.to_string()));
        }

        let presentation_id = page.presentation_id();
        let bookmark = Bookmark {
            bookmark_id: bookmark_id(&presentation_id, slide.h, slide.v),
            presentation_id,
            presentation_title: page.title.clone(),
            url: page.url.clone(),
            collection_id: collection_id.to_string(),
            created_at,
            slide,
        };

        let mut bookmarks = self.bookmarks()?;
        bookmarks.retain(|b| b.bookmark_id != bookmark.bookmark_id);
        bookmarks.insert(0, bookmark.clone());
        self.write_list(BOOKMARKS_KEY, &bookmarks)?;

        log::debug!("Saved bookmark {}", bookmark.bookmark_id);
        Ok(bookmark)
    }

    /// Remove a bookmark. Returns false if it did not exist.
    pub fn remove_bookmark(&mut self, bookmark_id: &str) -> Result<bool> {
        let mut bookmarks = self.bookmarks()?;
        let before = bookmarks.len();
        bookmarks.retain(|b| b.bookmark_id != bookmark_id);
        if bookmarks.len() == before {
            return Ok(false);
        }
        self.write_list(BOOKMARKS_KEY, &bookmarks)?;
        Ok(true)
    }

    /// Bookmarks matching a dashboard filter, in stored order.
    pub fn filter_bookmarks(&self, filter: &BookmarkFilter) -> Result<Vec<Bookmark>> {
        let query = filter.query.trim().to_lowercase();
        Ok(self
            .bookmarks()?
            .into_iter()
            .filter(|b| match &filter.collection_id {
                Some(id) => &b.collection_id == id,
                None => true,
            })
            .filter(|b| {
                query.is_empty()
                    || b.slide.title.to_lowercase().contains(&query)
                    || b.slide.search_content.to_lowercase().contains(&query)
                    || b.presentation_title.to_lowercase().contains(&query)
            })
            .collect())
    }

    // --- Watching ---

    /// Call `callback` with the new bookmark list after every write.
    pub fn watch_bookmarks(&mut self, mut callback: impl FnMut(Vec<Bookmark>) + 'static) -> WatchId {
        self.store.watch(
            BOOKMARKS_KEY,
            Box::new(move |value| {
                if let Some(mut bookmarks) = decode_list::<Bookmark>(BOOKMARKS_KEY, value) {
                    for bookmark in &mut bookmarks {
                        bookmark.fill_legacy_key();
                    }
                    callback(bookmarks);
                }
            }),
        )
    }

    /// Call `callback` with the new collection list after every write.
    pub fn watch_collections(&mut self, mut callback: impl FnMut(Vec<Collection>) + 'static) -> WatchId {
        self.store.watch(
            COLLECTIONS_KEY,
            Box::new(move |value| {
                if let Some(collections) = decode_list::<Collection>(COLLECTIONS_KEY, value) {
                    callback(collections);
                }
            }),
        )
    }

    pub fn unwatch(&mut self, id: WatchId) -> bool {
        self.store.unwatch(id)
    }

    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Option<Vec<T>>> {
        match self.store.get(key)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    fn write_list<T: Serialize>(&mut self, key: &str, items: &[T]) -> Result<()> {
        let value = serde_json::to_value(items)?;
        self.store.set(key, value)
    }
}

fn decode_list<T: DeserializeOwned>(key: &str, value: &Value) -> Option<Vec<T>> {
    match serde_json::from_value(value.clone()) {
        Ok(items) => Some(items),
        Err(e) => {
            log::warn!("Ignoring unreadable '{}' update: {}", key, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Watcher};
    use crate::types::SlideBlock;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn slide(h: u32, v: u32, title: &str) -> SlideIndex {
        SlideIndex::new(
            h,
            v,
            title,
            vec![SlideBlock::Text {
                content: format!("{} body", title),
            }],
        )
    }

    fn page() -> PageContext {
        PageContext::new("https://slides.com/alice/rust#/1/0", "Rust Talk")
    }

    fn draft(name: &str, show: bool) -> CollectionDraft {
        CollectionDraft {
            name: name.to_string(),
            color: "#ff5733".to_string(),
            show_in_quick_search: show,
        }
    }

    #[test]
    fn test_default_collection_when_never_written() {
        let store = BookmarkStore::new(MemoryStore::new());
        let collections = store.collections().unwrap();
        assert_eq!(collections.len(), 1);
        assert!(collections[0].is_default());
    }

    #[test]
    fn test_save_bookmark_derives_identity() {
        let mut store = BookmarkStore::new(MemoryStore::new());
        let saved = store
            .save_bookmark(slide(1, 0, "Intro"), &page(), DEFAULT_COLLECTION_ID, 42)
            .unwrap();

        assert_eq!(saved.presentation_id, "alice/rust");
        assert_eq!(saved.bookmark_id, "alice/rust#1/0");
        assert_eq!(saved.slide.id, "slide-1-0");
        assert_eq!(saved.presentation_title, "Rust Talk");
        assert_eq!(saved.created_at, 42);
    }

    #[test]
    fn test_upsert_replaces_same_coordinates() {
        let mut store = BookmarkStore::new(MemoryStore::new());
        store
            .save_bookmark(slide(1, 0, "First"), &page(), DEFAULT_COLLECTION_ID, 1)
            .unwrap();
        store
            .save_bookmark(slide(2, 0, "Other"), &page(), DEFAULT_COLLECTION_ID, 2)
            .unwrap();
        store
            .save_bookmark(slide(1, 0, "Second"), &page(), DEFAULT_COLLECTION_ID, 3)
            .unwrap();

        let all = store.bookmarks().unwrap();
        let matching: Vec<_> = all
            .iter()
            .filter(|b| b.bookmark_id == "alice/rust#1/0")
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].slide.title, "Second");
        assert_eq!(matching[0].created_at, 3);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].bookmark_id, "alice/rust#1/0");
    }

    #[test]
    fn test_save_into_unknown_collection_fails() {
        let mut store = BookmarkStore::new(MemoryStore::new());
        let err = store
            .save_bookmark(slide(0, 0, "X"), &page(), "missing", 1)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownCollection(_)));
    }

    #[test]
    fn test_delete_collection_reassigns_to_default() {
        let mut store = BookmarkStore::new(MemoryStore::new());
        let work = store.create_collection(draft("Work", true), 5).unwrap();

        store.save_bookmark(slide(0, 0, "A"), &page(), &work.id, 1).unwrap();
        store.save_bookmark(slide(1, 0, "B"), &page(), &work.id, 2).unwrap();
        store
            .save_bookmark(slide(2, 0, "C"), &page(), DEFAULT_COLLECTION_ID, 3)
            .unwrap();

        assert_eq!(store.bookmarks_in(&work.id).unwrap().len(), 2);
        let reassigned = store.delete_collection(&work.id).unwrap();
        assert_eq!(reassigned, 2);
        assert!(store.bookmarks_in(&work.id).unwrap().is_empty());

        let all = store.bookmarks().unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|b| b.collection_id == DEFAULT_COLLECTION_ID));
        assert!(store.collections().unwrap().iter().all(|c| c.id != work.id));
    }

    /// Memory store that rejects writes to one key.
    struct RejectingStore {
        inner: MemoryStore,
        reject: &'static str,
    }

    impl KeyValueStore for RejectingStore {
        fn get(&self, key: &str) -> Result<Option<Value>> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: Value) -> Result<()> {
            if key == self.reject {
                return Err(Error::StoreUnavailable(format!("write to '{}' rejected", key)));
            }
            self.inner.set(key, value)
        }

        fn watch(&mut self, key: &str, watcher: Watcher) -> WatchId {
            self.inner.watch(key, watcher)
        }

        fn unwatch(&mut self, id: WatchId) -> bool {
            self.inner.unwatch(id)
        }
    }

    #[test]
    fn test_failed_delete_never_orphans_bookmarks() {
        for reject in [BOOKMARKS_KEY, COLLECTIONS_KEY] {
            let mut store = BookmarkStore::new(MemoryStore::new());
            let work = store.create_collection(draft("Work", true), 5).unwrap();
            store.save_bookmark(slide(0, 0, "A"), &page(), &work.id, 1).unwrap();

            let mut store = BookmarkStore::new(RejectingStore {
                inner: store.into_inner(),
                reject,
            });
            assert!(store.delete_collection(&work.id).is_err());

            let collections = store.collections().unwrap();
            for bookmark in store.bookmarks().unwrap() {
                assert!(collections.iter().any(|c| c.id == bookmark.collection_id));
            }
        }
    }

    #[test]
    fn test_default_collection_cannot_be_deleted() {
        let mut store = BookmarkStore::new(MemoryStore::new());
        let err = store.delete_collection(DEFAULT_COLLECTION_ID).unwrap_err();
        assert!(matches!(err, Error::ReservedCollection));
        assert!(matches!(
            store.delete_collection("nope").unwrap_err(),
            Error::UnknownCollection(_)
        ));
    }

    #[test]
    fn test_update_collection() {
        let mut store = BookmarkStore::new(MemoryStore::new());
        let c = store.create_collection(draft("Old", true), 1).unwrap();
        let updated = store.update_collection(&c.id, draft("New", false)).unwrap();

        assert_eq!(updated.name, "New");
        assert!(!updated.show_in_quick_search);
        assert_eq!(updated.created_at, 1);
        assert_eq!(store.collections().unwrap().len(), 2);
    }

    #[test]
    fn test_remove_and_find_bookmark() {
        let mut store = BookmarkStore::new(MemoryStore::new());
        store
            .save_bookmark(slide(3, 1, "Deep"), &page(), DEFAULT_COLLECTION_ID, 1)
            .unwrap();

        assert!(store.find_bookmark("alice/rust#3/1").unwrap().is_some());
        assert!(store.remove_bookmark("alice/rust#3/1").unwrap());
        assert!(!store.remove_bookmark("alice/rust#3/1").unwrap());
        assert!(store.find_bookmark("alice/rust#3/1").unwrap().is_none());
    }

    #[test]
    fn test_filter_bookmarks() {
        let mut store = BookmarkStore::new(MemoryStore::new());
        let work = store.create_collection(draft("Work", true), 1).unwrap();
        store.save_bookmark(slide(0, 0, "Ownership"), &page(), &work.id, 1).unwrap();
        store
            .save_bookmark(slide(1, 0, "Lifetimes"), &page(), DEFAULT_COLLECTION_ID, 2)
            .unwrap();

        let by_collection = store
            .filter_bookmarks(&BookmarkFilter {
                collection_id: Some(work.id.clone()),
                query: String::new(),
            })
            .unwrap();
        assert_eq!(by_collection.len(), 1);

        let by_query = store
            .filter_bookmarks(&BookmarkFilter {
                collection_id: None,
                query: "LIFETIMES body".to_string(),
            })
            .unwrap();
        assert_eq!(by_query.len(), 1);
        assert_eq!(by_query[0].slide.title, "Lifetimes");

        let by_deck = store
            .filter_bookmarks(&BookmarkFilter {
                collection_id: None,
                query: "rust talk".to_string(),
            })
            .unwrap();
        assert_eq!(by_deck.len(), 2);
    }

    #[test]
    fn test_watch_bookmarks() {
        let counts = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&counts);

        let mut store = BookmarkStore::new(MemoryStore::new());
        store.watch_bookmarks(move |list| sink.borrow_mut().push(list.len()));

        store
            .save_bookmark(slide(0, 0, "A"), &page(), DEFAULT_COLLECTION_ID, 1)
            .unwrap();
        store
            .save_bookmark(slide(1, 0, "B"), &page(), DEFAULT_COLLECTION_ID, 2)
            .unwrap();
        store.remove_bookmark("alice/rust#0/0").unwrap();

        assert_eq!(*counts.borrow(), vec![1, 2, 1]);
    }
}

//! WASM-compatible wrapper for slide extraction, search and bookmarking.
//!
//! This crate exposes the pipeline to the extension's JavaScript surfaces
//! (content script, popup and dashboard). Extension storage stays on the
//! JavaScript side: bookmark operations take a [`StoreSnapshot`] of the
//! stored values and return the updated snapshot to be written back.

use serde::{Deserialize, Serialize};
use slidemark_core::bookmarks::{BOOKMARKS_KEY, COLLECTIONS_KEY};
use slidemark_core::{
    parse_fragment, presentation_id, Bookmark, BookmarkStore, Collection, CollectionDraft,
    ExtensionMessage, KeyValueStore, MarkdownExporter, MemoryStore, NavigationSignal,
    NavigationTracker, PageContext, SearchResultItem, SlideIndex, SlidePosition,
    SlidesDataResponse,
};
use slidemark_reveal::{HtmlDocument, SlideExtractor};
use slidemark_search::{build_pool, highlight, RankingEngine};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Stored extension state: the values of the `collections` and `bookmarks` keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub collections: Vec<Collection>,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn from_js<T: for<'de> Deserialize<'de>>(value: JsValue, what: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid {}: {}", what, e)))
}

/// Extract all slides of a page as a `GET_SLIDES_DATA` response.
#[wasm_bindgen]
pub fn extract_slides(html: &str) -> Result<JsValue, JsValue> {
    to_js(&extract_slides_impl(html))
}

fn extract_slides_impl(html: &str) -> SlidesDataResponse {
    SlideExtractor::new().slides_data(&HtmlDocument::parse(html))
}

/// Extract the slide on screen, or `undefined` if none is present.
#[wasm_bindgen]
pub fn extract_current_slide(html: &str, fragment: &str) -> Result<JsValue, JsValue> {
    match extract_current_slide_impl(html, fragment) {
        Some(slide) => to_js(&slide),
        None => Ok(JsValue::UNDEFINED),
    }
}

fn extract_current_slide_impl(html: &str, fragment: &str) -> Option<SlideIndex> {
    SlideExtractor::new().extract_current_slide(&HtmlDocument::parse(html), fragment)
}

/// Build the quick-search pool for a page.
///
/// # Arguments
/// * `html` - Markup of the page being viewed
/// * `active` - Whether the page is a presentation; local slides are extracted only when set
/// * `snapshot` - Stored collections and bookmarks
/// * `page_url` - URL of the page being viewed
#[wasm_bindgen]
pub fn build_search_pool(
    html: &str,
    active: bool,
    snapshot: JsValue,
    page_url: &str,
) -> Result<JsValue, JsValue> {
    let snapshot: StoreSnapshot = from_js(snapshot, "store snapshot")?;
    let pool = build_search_pool_impl(html, active, snapshot, page_url)
        .map_err(|e| JsValue::from_str(&e))?;
    to_js(&pool)
}

fn build_search_pool_impl(
    html: &str,
    active: bool,
    snapshot: StoreSnapshot,
    page_url: &str,
) -> Result<Vec<SearchResultItem>, String> {
    let store = load_store(snapshot)?;
    Ok(build_pool(
        active,
        || SlideExtractor::new().extract_slides(&HtmlDocument::parse(html)),
        &store,
        &presentation_id(page_url),
    ))
}

/// Rank a search pool for a query.
#[wasm_bindgen]
pub fn rank_results(pool: JsValue, query: &str, limit: Option<usize>) -> Result<JsValue, JsValue> {
    let pool: Vec<SearchResultItem> = from_js(pool, "search pool")?;
    to_js(&rank_results_impl(&pool, query, limit))
}

fn rank_results_impl(
    pool: &[SearchResultItem],
    query: &str,
    limit: Option<usize>,
) -> Vec<SearchResultItem> {
    let engine = match limit {
        Some(limit) => RankingEngine::new().with_limit(limit),
        None => RankingEngine::new(),
    };
    engine.rank(pool, query)
}

/// Split preview text into highlighted and plain segments.
#[wasm_bindgen]
pub fn highlight_text(text: &str, query: &str) -> Result<JsValue, JsValue> {
    to_js(&highlight(text, query))
}

/// Render a `GET_SLIDES_DATA` response as markdown.
#[wasm_bindgen]
pub fn export_markdown(data: JsValue) -> Result<String, JsValue> {
    let data: SlidesDataResponse = from_js(data, "slides data")?;
    Ok(MarkdownExporter::new().export(&data))
}

/// Presentation id for a page URL.
#[wasm_bindgen(js_name = presentationId)]
pub fn presentation_id_js(page_url: &str) -> String {
    presentation_id(page_url)
}

/// Slide position of a location fragment.
#[wasm_bindgen]
pub fn slide_position(fragment: &str) -> Result<JsValue, JsValue> {
    to_js(&parse_fragment(fragment))
}

/// Message asking the presentation page to show a slide.
#[wasm_bindgen]
pub fn jump_message(h: u32, v: u32) -> Result<JsValue, JsValue> {
    to_js(&ExtensionMessage::jump_to(SlidePosition::new(h, v)))
}

/// Current-slide tracker for the content script.
///
/// The script listens for the events named by [`SlideTracker::events`],
/// waits for the fragment to settle, then calls `handle`. Subscribers only
/// hear about positions that differ from the last one.
#[wasm_bindgen]
pub struct SlideTracker {
    inner: NavigationTracker,
}

#[wasm_bindgen]
impl SlideTracker {
    #[wasm_bindgen(constructor)]
    pub fn new(initial_fragment: &str) -> SlideTracker {
        SlideTracker {
            inner: NavigationTracker::new(initial_fragment),
        }
    }

    /// DOM events to listen for.
    pub fn events(navigation_api_available: bool) -> Result<JsValue, JsValue> {
        to_js(&navigation_events(navigation_api_available))
    }

    /// The last published position.
    pub fn current(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.current())
    }

    /// Call `callback` with each new position.
    pub fn subscribe(&mut self, callback: js_sys::Function) {
        self.inner.subscribe(move |position| {
            let Ok(value) = serde_wasm_bindgen::to_value(&position) else {
                return;
            };
            if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                log::warn!("Slide change listener failed: {:?}", e);
            }
        });
    }

    /// Re-read the fragment after `event`; returns the new position, or
    /// `undefined` if it did not change.
    pub fn handle(&mut self, event: &str, fragment: &str) -> Result<JsValue, JsValue> {
        match handle_navigation_impl(&mut self.inner, event, fragment)
            .map_err(|e| JsValue::from_str(&e))?
        {
            Some(position) => to_js(&position),
            None => Ok(JsValue::UNDEFINED),
        }
    }
}

fn navigation_events(navigation_api_available: bool) -> Vec<&'static str> {
    NavigationSignal::subscriptions(navigation_api_available)
        .iter()
        .map(|signal| signal.event_name())
        .collect()
}

fn handle_navigation_impl(
    tracker: &mut NavigationTracker,
    event: &str,
    fragment: &str,
) -> Result<Option<SlidePosition>, String> {
    let signal = NavigationSignal::from_event_name(event).map_err(|e| e.user_message())?;
    Ok(tracker.handle(signal, fragment))
}

/// Save a slide as a bookmark and return the updated snapshot.
#[wasm_bindgen]
pub fn save_bookmark(
    snapshot: JsValue,
    slide: JsValue,
    page_url: &str,
    page_title: &str,
    collection_id: &str,
) -> Result<JsValue, JsValue> {
    let snapshot: StoreSnapshot = from_js(snapshot, "store snapshot")?;
    let slide: SlideIndex = from_js(slide, "slide")?;
    let page = PageContext::new(page_url, page_title);
    let updated = save_bookmark_impl(snapshot, slide, &page, collection_id, now())
        .map_err(|e| JsValue::from_str(&e))?;
    to_js(&updated)
}

fn save_bookmark_impl(
    snapshot: StoreSnapshot,
    slide: SlideIndex,
    page: &PageContext,
    collection_id: &str,
    created_at: i64,
) -> Result<StoreSnapshot, String> {
    let mut store = load_store(snapshot)?;
    store
        .save_bookmark(slide, page, collection_id, created_at)
        .map_err(|e| e.user_message())?;
    take_snapshot(&store)
}

/// Remove a bookmark and return the updated snapshot.
#[wasm_bindgen]
pub fn remove_bookmark(snapshot: JsValue, bookmark_id: &str) -> Result<JsValue, JsValue> {
    let snapshot: StoreSnapshot = from_js(snapshot, "store snapshot")?;
    let mut store = load_store(snapshot).map_err(|e| JsValue::from_str(&e))?;
    store
        .remove_bookmark(bookmark_id)
        .map_err(|e| JsValue::from_str(&e.user_message()))?;
    to_js(&take_snapshot(&store).map_err(|e| JsValue::from_str(&e))?)
}

/// Create a collection and return the updated snapshot.
#[wasm_bindgen]
pub fn create_collection(
    snapshot: JsValue,
    name: &str,
    color: &str,
    show_in_quick_search: bool,
) -> Result<JsValue, JsValue> {
    let snapshot: StoreSnapshot = from_js(snapshot, "store snapshot")?;
    let mut store = load_store(snapshot).map_err(|e| JsValue::from_str(&e))?;
    let draft = CollectionDraft {
        name: name.to_string(),
        color: color.to_string(),
        show_in_quick_search,
    };
    store
        .create_collection(draft, now())
        .map_err(|e| JsValue::from_str(&e.user_message()))?;
    to_js(&take_snapshot(&store).map_err(|e| JsValue::from_str(&e))?)
}

/// Delete a collection, moving its bookmarks to General, and return the updated snapshot.
#[wasm_bindgen]
pub fn delete_collection(snapshot: JsValue, collection_id: &str) -> Result<JsValue, JsValue> {
    let snapshot: StoreSnapshot = from_js(snapshot, "store snapshot")?;
    let updated =
        delete_collection_impl(snapshot, collection_id).map_err(|e| JsValue::from_str(&e))?;
    to_js(&updated)
}

fn delete_collection_impl(snapshot: StoreSnapshot, collection_id: &str) -> Result<StoreSnapshot, String> {
    let mut store = load_store(snapshot)?;
    store
        .delete_collection(collection_id)
        .map_err(|e| e.user_message())?;
    take_snapshot(&store)
}

/// Seed an in-memory store from a snapshot.
fn load_store(snapshot: StoreSnapshot) -> Result<BookmarkStore<MemoryStore>, String> {
    let mut memory = MemoryStore::new();
    if !snapshot.collections.is_empty() {
        let value = serde_json::to_value(&snapshot.collections).map_err(|e| e.to_string())?;
        memory.set(COLLECTIONS_KEY, value).map_err(|e| e.to_string())?;
    }
    let value = serde_json::to_value(&snapshot.bookmarks).map_err(|e| e.to_string())?;
    memory.set(BOOKMARKS_KEY, value).map_err(|e| e.to_string())?;
    Ok(BookmarkStore::new(memory))
}

fn take_snapshot(store: &BookmarkStore<MemoryStore>) -> Result<StoreSnapshot, String> {
    Ok(StoreSnapshot {
        collections: store.collections().map_err(|e| e.to_string())?,
        bookmarks: store.bookmarks().map_err(|e| e.to_string())?,
    })
}

/// Epoch milliseconds from the JavaScript clock.
fn now() -> i64 {
    js_sys::Date::now() as i64
}

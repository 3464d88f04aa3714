//! Key-value storage backends.
//!
//! Bookmark state lives in an opaque store of JSON values keyed by string,
//! mirroring the browser's extension storage. Watchers registered on a key
//! are called after every write to that key made through the same store.

use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Handle returned by [`KeyValueStore::watch`].
pub type WatchId = u64;

/// Callback invoked with the new value of a watched key.
pub type Watcher = Box<dyn FnMut(&Value)>;

/// A string-keyed store of JSON values.
pub trait KeyValueStore {
    /// Read a key. `None` if it was never written.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write a key and notify its watchers.
    fn set(&mut self, key: &str, value: Value) -> Result<()>;

    /// Register a watcher for a key.
    fn watch(&mut self, key: &str, watcher: Watcher) -> WatchId;

    /// Remove a watcher. Returns false if it was not registered.
    fn unwatch(&mut self, id: WatchId) -> bool;
}

/// Watcher bookkeeping shared by the backends.
#[derive(Default)]
struct Watchers {
    next_id: WatchId,
    entries: Vec<(WatchId, String, Watcher)>,
}

impl Watchers {
    fn add(&mut self, key: &str, watcher: Watcher) -> WatchId {
        self.next_id += 1;
        self.entries.push((self.next_id, key.to_string(), watcher));
        self.next_id
    }

    fn remove(&mut self, id: WatchId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _, _)| *entry_id != id);
        self.entries.len() != before
    }

    fn notify(&mut self, key: &str, value: &Value) {
        for (_, watched_key, watcher) in &mut self.entries {
            if watched_key == key {
                watcher(value);
            }
        }
    }
}

/// In-process store, used by tests and by hosts that own their own persistence.
#[derive(Default)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
    watchers: Watchers,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value.clone());
        self.watchers.notify(key, &value);
        Ok(())
    }

    fn watch(&mut self, key: &str, watcher: Watcher) -> WatchId {
        self.watchers.add(key, watcher)
    }

    fn unwatch(&mut self, id: WatchId) -> bool {
        self.watchers.remove(id)
    }
}

/// Store persisted as a single pretty-printed JSON object on disk.
pub struct JsonFileStore {
    path: PathBuf,
    watchers: Watchers,
}

impl JsonFileStore {
    /// Open a store at `path`. The file is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            watchers: Watchers::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let bytes = fs::read(&self.path)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }

        match serde_json::from_slice(&bytes)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::StoreUnavailable(format!(
                "{} does not hold a JSON object (found {})",
                self.path.display(),
                json_kind(&other)
            ))),
        }
    }

    fn write_all(&self, map: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(map)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_all()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let mut map = self.read_all()?;
        map.insert(key.to_string(), value.clone());
        self.write_all(&map)?;
        log::debug!("Wrote key '{}' to {}", key, self.path.display());
        self.watchers.notify(key, &value);
        Ok(())
    }

    fn watch(&mut self, key: &str, watcher: Watcher) -> WatchId {
        self.watchers.add(key, watcher)
    }

    fn unwatch(&mut self, id: WatchId) -> bool {
        self.watchers.remove(id)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn temp_store_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("slidemark-store-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_memory_store_get_set() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("bookmarks").unwrap(), None);

        store.set("bookmarks", json!([1, 2])).unwrap();
        assert_eq!(store.get("bookmarks").unwrap(), Some(json!([1, 2])));
    }

    #[test]
    fn test_watchers_only_see_their_key() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut store = MemoryStore::new();
        let id = store.watch("collections", Box::new(move |v| sink.borrow_mut().push(v.clone())));

        store.set("bookmarks", json!([])).unwrap();
        store.set("collections", json!(["a"])).unwrap();
        assert!(store.unwatch(id));
        assert!(!store.unwatch(id));
        store.set("collections", json!(["b"])).unwrap();

        assert_eq!(*seen.borrow(), vec![json!(["a"])]);
    }

    #[test]
    fn test_file_store_round_trip() {
        let path = temp_store_path("round-trip.json");
        let _ = fs::remove_file(&path);

        let mut store = JsonFileStore::open(&path);
        assert_eq!(store.get("bookmarks").unwrap(), None);
        store.set("bookmarks", json!([{"x": 1}])).unwrap();
        store.set("collections", json!([])).unwrap();

        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.get("bookmarks").unwrap(), Some(json!([{"x": 1}])));
        assert_eq!(reopened.get("collections").unwrap(), Some(json!([])));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_store_rejects_non_object() {
        let path = temp_store_path("not-object.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "[1, 2, 3]").unwrap();

        let store = JsonFileStore::open(&path);
        let err = store.get("bookmarks").unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));

        let _ = fs::remove_file(&path);
    }
}

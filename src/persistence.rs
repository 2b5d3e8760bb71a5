//! Mirrors canvas state into a browser-style key-value store and rebuilds
//! it on load.
//!
//! Reads are defensive: malformed or partial records fall back to defaults
//! rather than failing the load. Writes are best-effort: failures are logged
//! and the in-memory store stays authoritative.

use crate::config::CanvasConfig;
use crate::content::ContentHistory;
use crate::error::StorageError;
use crate::history::History;
use crate::item::{CanvasItem, ItemKind, ItemType};
use crate::store::{next_z_after, CanvasSnapshot, CanvasStore};
use crate::viewport::Viewport;
use serde::Serialize;
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

pub type StorageResult<T> = Result<T, StorageError>;

/// String key-value backend, shaped after `window.localStorage`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// `window.localStorage`.
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    pub fn open() -> StorageResult<Self> {
        let window = web_sys::window().ok_or_else(|| StorageError::Unavailable("no window".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".to_string()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::Read(format!("{}: {:?}", key, e)))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::Write(format!("{}: {:?}", key, e)))
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::Write(format!("{}: {:?}", key, e)))
    }
}

/// In-memory backend for tests and for sessions without `localStorage`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
    fail_writes: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following `set` fail, as a full quota would.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.value(key))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.fail_writes.get() {
            return Err(StorageError::Write(format!("{}: quota exceeded", key)));
        }
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

#[derive(Serialize)]
struct PersistedHistory<'a> {
    history: &'a [CanvasSnapshot],
    index: usize,
}

fn read(kv: &dyn KeyValueStore, key: &str) -> Option<String> {
    match kv.get(key) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("storage: {}", e);
            None
        }
    }
}

fn write<T: Serialize + ?Sized>(kv: &dyn KeyValueStore, key: &str, value: &T) -> bool {
    match serde_json::to_string(value) {
        Ok(json) => write_json(kv, key, &json),
        Err(e) => {
            log::warn!("storage: {}", StorageError::Serialization(e.to_string()));
            false
        }
    }
}

fn write_json(kv: &dyn KeyValueStore, key: &str, json: &str) -> bool {
    match kv.set(key, json) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("storage: {}", e);
            false
        }
    }
}

/// Rebuilds the store from whatever is persisted under `config`'s keys.
/// A valid persisted history wins over the loose items and viewport.
pub fn load_canvas(kv: &dyn KeyValueStore, config: CanvasConfig) -> CanvasStore {
    let history = read(kv, &config.history_key()).and_then(|raw| parse_history(&raw, config.max_history));
    if let Some(history) = history {
        log::info!("storage: restored {} history entries", history.len());
        return CanvasStore::from_history(history, config);
    }

    let items = read(kv, &config.items_key())
        .map(|raw| parse_items(&raw))
        .unwrap_or_default();
    let viewport = read(kv, &config.viewport_key())
        .and_then(|raw| parse_viewport(&raw))
        .unwrap_or_default();
    CanvasStore::from_state(items, viewport, config)
}

pub fn load_content(kv: &dyn KeyValueStore, config: &CanvasConfig) -> ContentHistory {
    let Some(raw) = read(kv, &config.content_key()) else {
        return ContentHistory::default();
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        log::warn!("storage: ignoring malformed content history: {}", e);
        ContentHistory::default()
    })
}

/// Parses a persisted item array, repairing what it can and dropping the rest.
pub fn parse_items(raw: &str) -> Vec<CanvasItem> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => reconcile_items(value),
        Err(e) => {
            log::warn!("storage: ignoring malformed items: {}", e);
            Vec::new()
        }
    }
}

pub fn parse_viewport(raw: &str) -> Option<Viewport> {
    match serde_json::from_str::<Viewport>(raw) {
        Ok(viewport) => Some(viewport.sanitized()),
        Err(e) => {
            log::warn!("storage: ignoring malformed viewport: {}", e);
            None
        }
    }
}

/// Parses `{ history: [snapshot], index }`. `None` unless the array is
/// non-empty, every entry is an object and `index` points into it.
pub fn parse_history(raw: &str, max_size: usize) -> Option<History<CanvasSnapshot>> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("storage: ignoring malformed history: {}", e);
            return None;
        }
    };
    let entries = value.get("history")?.as_array()?;
    let index = usize::try_from(value.get("index")?.as_u64()?).ok()?;
    let snapshots = entries
        .iter()
        .map(reconcile_snapshot)
        .collect::<Option<Vec<_>>>()?;

    let history = History::from_parts(snapshots, index, max_size);
    if history.is_none() {
        log::warn!("storage: history index {} out of range, ignoring log", index);
    }
    history
}

fn reconcile_snapshot(value: &Value) -> Option<CanvasSnapshot> {
    let entry = value.as_object()?;
    let items = entry.get("items").cloned().map(reconcile_items).unwrap_or_default();
    let viewport = entry
        .get("viewport")
        .and_then(|v| serde_json::from_value::<Viewport>(v.clone()).ok())
        .map(Viewport::sanitized)
        .unwrap_or_default();
    let stored_next = entry.get("nextZIndex").and_then(Value::as_i64).unwrap_or(1);
    Some(CanvasSnapshot {
        next_z_index: stored_next.max(next_z_after(&items)),
        items,
        viewport,
    })
}

fn reconcile_items(value: Value) -> Vec<CanvasItem> {
    let Value::Array(records) = value else {
        log::warn!("storage: expected an item array, ignoring");
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(records.len());
    for record in records {
        let Some(mut item) = reconcile_item(record) else {
            continue;
        };
        if item.id.is_empty() || seen.contains(&item.id) {
            let fresh = uuid::Uuid::new_v4().to_string();
            log::warn!("storage: reassigning missing or duplicate id `{}` to {}", item.id, fresh);
            item.id = fresh;
        }
        seen.insert(item.id.clone());
        items.push(item);
    }
    items
}

/// Fills fields missing from a legacy or partial record with the defaults
/// for its type, then decodes it. Records without a known type are dropped.
fn reconcile_item(record: Value) -> Option<CanvasItem> {
    let Value::Object(mut fields) = record else {
        log::warn!("storage: dropping non-object item record");
        return None;
    };
    let Some(item_type) = fields.get("type").and_then(Value::as_str).and_then(ItemType::from_tag) else {
        log::warn!("storage: dropping item record with unknown type {:?}", fields.get("type"));
        return None;
    };

    // Geometry depends on the decoded variant, so size is filled after decoding.
    for (key, default) in type_defaults(item_type) {
        if key == "width" || key == "height" {
            continue;
        }
        match fields.get(&key) {
            Some(value) if !value.is_null() => {}
            _ => {
                fields.insert(key, default);
            }
        }
    }

    match serde_json::from_value::<CanvasItem>(Value::Object(fields)) {
        Ok(mut item) => {
            let (width, height) = item.kind.default_size();
            item.width.get_or_insert(width);
            item.height.get_or_insert(height);
            Some(item)
        }
        Err(e) => {
            log::warn!("storage: dropping unreadable {} item: {}", item_type.tag(), e);
            None
        }
    }
}

fn type_defaults(item_type: ItemType) -> Map<String, Value> {
    let template = CanvasItem::new(String::new(), 0.0, 0.0, 0, ItemKind::defaults(item_type));
    match serde_json::to_value(template) {
        Ok(Value::Object(fields)) => fields,
        _ => Map::new(),
    }
}

pub fn save_items(kv: &dyn KeyValueStore, config: &CanvasConfig, items: &[CanvasItem]) -> bool {
    write(kv, &config.items_key(), items)
}

pub fn save_viewport(kv: &dyn KeyValueStore, config: &CanvasConfig, viewport: &Viewport) -> bool {
    write(kv, &config.viewport_key(), viewport)
}

pub fn save_history(kv: &dyn KeyValueStore, config: &CanvasConfig, history: &History<CanvasSnapshot>) -> bool {
    write(
        kv,
        &config.history_key(),
        &PersistedHistory {
            history: history.entries(),
            index: history.index(),
        },
    )
}

pub fn save_content(kv: &dyn KeyValueStore, config: &CanvasConfig, content: &ContentHistory) -> bool {
    write(kv, &config.content_key(), content)
}

/// Writes only the slices that changed since the last successful save.
#[derive(Debug, Default)]
pub struct Autosaver {
    items: Option<String>,
    viewport: Option<String>,
    history_revision: Option<u64>,
}

impl Autosaver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many keys were written.
    pub fn save(&mut self, kv: &dyn KeyValueStore, store: &CanvasStore) -> usize {
        let config = store.config();
        let mut written = 0;

        if let Ok(json) = serde_json::to_string(store.items()) {
            if self.items.as_deref() != Some(json.as_str()) && write_json(kv, &config.items_key(), &json) {
                self.items = Some(json);
                written += 1;
            }
        }
        if let Ok(json) = serde_json::to_string(store.viewport()) {
            if self.viewport.as_deref() != Some(json.as_str()) && write_json(kv, &config.viewport_key(), &json) {
                self.viewport = Some(json);
                written += 1;
            }
        }
        let revision = store.history().revision();
        if self.history_revision != Some(revision) && save_history(kv, config, store.history()) {
            self.history_revision = Some(revision);
            written += 1;
        }
        written
    }
}

//! The generated-content history list. It is owned outside the canvas;
//! canvas items only point into it by id.

use crate::item::CanvasItem;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentEntry {
    pub id: String,
    pub title: String,
    pub body: String,
    pub platform: String,
    pub created_at: String,
}

/// Read access to the content list, as the canvas renderer needs it.
pub trait ContentLookup {
    fn content_entry(&self, id: &str) -> Option<&ContentEntry>;
}

/// The entry a `historyItem` canvas item points at. `None` for other item
/// types and for dangling references.
pub fn resolve_history_item<'a, L: ContentLookup + ?Sized>(item: &CanvasItem, lookup: &'a L) -> Option<&'a ContentEntry> {
    lookup.content_entry(item.history_item_id()?)
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct ContentHistory {
    entries: Vec<ContentEntry>,
}

impl ContentHistory {
    pub fn new(entries: Vec<ContentEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ContentEntry] {
        &self.entries
    }

    pub fn push(&mut self, entry: ContentEntry) {
        self.entries.retain(|e| e.id != entry.id);
        self.entries.push(entry);
    }

    pub fn remove(&mut self, id: &str) -> Option<ContentEntry> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(index))
    }
}

impl ContentLookup for ContentHistory {
    fn content_entry(&self, id: &str) -> Option<&ContentEntry> {
        self.entries.iter().find(|e| e.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> ContentEntry {
        ContentEntry {
            id: id.to_string(),
            title: format!("Post {}", id),
            body: "Body".to_string(),
            platform: "linkedin".to_string(),
            created_at: "2024-05-01T10:00:00Z".to_string(),
        }
    }

    #[test]
    fn lookup_finds_by_id() {
        let history = ContentHistory::new(vec![entry("a"), entry("b")]);
        assert_eq!(history.content_entry("b").map(|e| e.title.as_str()), Some("Post b"));
        assert!(history.content_entry("zzz").is_none());
    }

    #[test]
    fn push_replaces_same_id() {
        let mut history = ContentHistory::default();
        history.push(entry("a"));
        let mut updated = entry("a");
        updated.body = "Edited".to_string();
        history.push(updated);
        assert_eq!(history.entries().len(), 1);
        assert_eq!(history.entries()[0].body, "Edited");
    }

    #[test]
    fn remove_returns_entry() {
        let mut history = ContentHistory::new(vec![entry("a")]);
        assert_eq!(history.remove("a").map(|e| e.id), Some("a".to_string()));
        assert!(history.remove("a").is_none());
    }

    #[test]
    fn resolves_only_live_references() {
        use crate::item::{HistoryReference, ItemKind, ItemType};

        let history = ContentHistory::new(vec![entry("a")]);
        let reference = |id: &str| {
            CanvasItem::new(
                "c".to_string(),
                0.0,
                0.0,
                1,
                ItemKind::HistoryItem(HistoryReference {
                    history_item_id: id.to_string(),
                }),
            )
        };
        assert_eq!(resolve_history_item(&reference("a"), &history).map(|e| e.id.as_str()), Some("a"));
        assert!(resolve_history_item(&reference("gone"), &history).is_none());

        let note = CanvasItem::new("n".to_string(), 0.0, 0.0, 1, ItemKind::defaults(ItemType::StickyNote));
        assert!(resolve_history_item(&note, &history).is_none());
    }

    #[test]
    fn serializes_as_plain_array() {
        let history = ContentHistory::new(vec![entry("a")]);
        let json = serde_json::to_value(&history).unwrap();
        assert!(json.is_array());
    }
}

//! The single owner of canvas state. The UI layer reaches items, viewport
//! and history only through the operations here.

use crate::config::CanvasConfig;
use crate::error::{CanvasError, GenerationError};
use crate::generation::{GeneratedImage, ImageRequest, RequestGate, RequestTicket};
use crate::history::History;
use crate::interaction::{drag_position, resize_bounds, resize_floor, HitTarget, Interaction, PointerButton};
use crate::item::{CanvasItem, ImageItem, ItemKind, ItemPatch, ItemType, DEFAULT_ITEM_X, DEFAULT_ITEM_Y};
use crate::viewport::{Point, Viewport, ZoomDirection};
use serde::{Deserialize, Serialize};

pub const DUPLICATE_OFFSET: f64 = 20.0;

/// Full copy of the undoable state.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSnapshot {
    pub items: Vec<CanvasItem>,
    pub next_z_index: i64,
    pub viewport: Viewport,
}

impl Default for CanvasSnapshot {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_z_index: 1,
            viewport: Viewport::default(),
        }
    }
}

/// Caller-supplied values merged over a new item's defaults.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemOverrides {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub patches: Vec<ItemPatch>,
}

impl ItemOverrides {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_patch(mut self, patch: ItemPatch) -> Self {
        self.patches.push(patch);
        self
    }
}

/// `1 + max(zIndex)`, or `1` for an empty canvas.
pub fn next_z_after(items: &[CanvasItem]) -> i64 {
    items.iter().map(|i| i.z_index).max().map_or(1, |z| z + 1)
}

#[derive(Clone, Debug)]
pub struct CanvasStore {
    items: Vec<CanvasItem>,
    next_z_index: i64,
    viewport: Viewport,
    history: History<CanvasSnapshot>,
    selected: Option<String>,
    interaction: Interaction,
    image_gate: RequestGate,
    config: CanvasConfig,
}

impl CanvasStore {
    pub fn new(config: CanvasConfig) -> Self {
        Self::from_state(Vec::new(), Viewport::default(), config)
    }

    /// Starts from loose state, seeding a single-entry history with it.
    pub fn from_state(items: Vec<CanvasItem>, viewport: Viewport, config: CanvasConfig) -> Self {
        let snapshot = CanvasSnapshot {
            next_z_index: next_z_after(&items),
            items,
            viewport,
        };
        let history = History::with_initial(snapshot.clone(), config.max_history);
        Self::from_parts(snapshot, history, config)
    }

    /// Starts from a restored history; the live state is its current entry.
    pub fn from_history(history: History<CanvasSnapshot>, config: CanvasConfig) -> Self {
        match history.current().cloned() {
            Some(snapshot) => Self::from_parts(snapshot, history, config),
            None => Self::new(config),
        }
    }

    fn from_parts(snapshot: CanvasSnapshot, history: History<CanvasSnapshot>, config: CanvasConfig) -> Self {
        Self {
            next_z_index: snapshot.next_z_index.max(next_z_after(&snapshot.items)),
            items: snapshot.items,
            viewport: snapshot.viewport,
            history,
            selected: None,
            interaction: Interaction::Idle,
            image_gate: RequestGate::default(),
            config,
        }
    }

    pub fn items(&self) -> &[CanvasItem] {
        &self.items
    }

    /// Items sorted bottom to top.
    pub fn items_in_draw_order(&self) -> Vec<&CanvasItem> {
        let mut ordered: Vec<&CanvasItem> = self.items.iter().collect();
        ordered.sort_by_key(|i| i.z_index);
        ordered
    }

    pub fn item(&self, id: &str) -> Option<&CanvasItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn next_z_index(&self) -> i64 {
        self.next_z_index
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn history(&self) -> &History<CanvasSnapshot> {
        &self.history
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_item(&self) -> Option<&CanvasItem> {
        self.selected.as_deref().and_then(|id| self.item(id))
    }

    /// Selects an existing item or clears the selection. Unknown ids are ignored.
    pub fn select(&mut self, id: Option<&str>) -> bool {
        match id {
            Some(id) if self.item(id).is_some() => {
                self.selected = Some(id.to_string());
                true
            }
            Some(_) => false,
            None => {
                self.selected = None;
                true
            }
        }
    }

    pub fn snapshot(&self) -> CanvasSnapshot {
        CanvasSnapshot {
            items: self.items.clone(),
            next_z_index: self.next_z_index,
            viewport: self.viewport,
        }
    }

    fn restore(&mut self, snapshot: CanvasSnapshot) {
        self.items = snapshot.items;
        self.next_z_index = snapshot.next_z_index;
        self.viewport = snapshot.viewport;
        self.selected = None;
        self.interaction = Interaction::Idle;
    }

    /// Pushes the live state onto the history log.
    pub fn commit(&mut self) {
        self.history.commit(self.snapshot());
        log::debug!(
            "history: commit, entry {} of {}",
            self.history.index() + 1,
            self.history.len()
        );
    }

    /// Commits only when the live state differs from the current entry.
    pub fn commit_if_changed(&mut self) -> bool {
        let snapshot = self.snapshot();
        if self.history.current() == Some(&snapshot) {
            return false;
        }
        self.history.commit(snapshot);
        true
    }

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(snapshot);
        log::debug!("history: undo to entry {}", self.history.index() + 1);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(snapshot);
        log::debug!("history: redo to entry {}", self.history.index() + 1);
        true
    }

    /// Adds an item of `item_type` with default payload and geometry, then
    /// commits. Returns the new id.
    pub fn add_item(&mut self, item_type: ItemType, overrides: ItemOverrides) -> Result<String, CanvasError> {
        self.add_item_from(ItemKind::defaults(item_type), overrides)
    }

    /// Like [`add_item`](Self::add_item) with a prepared payload.
    pub fn add_item_from(&mut self, kind: ItemKind, overrides: ItemOverrides) -> Result<String, CanvasError> {
        let id = uuid::Uuid::new_v4().to_string();
        let mut item = CanvasItem::new(id, DEFAULT_ITEM_X, DEFAULT_ITEM_Y, self.next_z_index, kind);

        if overrides.x.is_some() || overrides.y.is_some() {
            item.apply(ItemPatch::Move {
                x: overrides.x.unwrap_or(item.x),
                y: overrides.y.unwrap_or(item.y),
            })?;
        }
        let initial_size = item.size();
        for patch in overrides.patches {
            item.apply(patch)?;
        }
        // A variant patch brings its own default geometry unless a patch resized.
        let (width, height) = if item.size() == initial_size {
            item.kind.default_size()
        } else {
            item.size()
        };
        item.apply(ItemPatch::Resize {
            width: overrides.width.unwrap_or(width),
            height: overrides.height.unwrap_or(height),
        })?;

        Ok(self.insert(item))
    }

    fn insert(&mut self, mut item: CanvasItem) -> String {
        item.z_index = self.next_z_index;
        self.next_z_index += 1;
        let id = item.id.clone();
        log::debug!("canvas: added {} {}", item.item_type().tag(), id);
        self.items.push(item);
        self.commit();
        id
    }

    pub fn update_item(&mut self, id: &str, patch: ItemPatch) -> Result<(), CanvasError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| CanvasError::ItemNotFound(id.to_string()))?;
        item.apply(patch)?;
        self.commit();
        Ok(())
    }

    pub fn remove_item(&mut self, id: &str) -> Result<CanvasItem, CanvasError> {
        let index = self
            .items
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| CanvasError::ItemNotFound(id.to_string()))?;
        let removed = self.items.remove(index);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        if self.interaction.item_id() == Some(id) {
            self.interaction = Interaction::Idle;
        }
        self.commit();
        Ok(removed)
    }

    pub fn bring_to_front(&mut self, id: &str) -> Result<(), CanvasError> {
        self.raise(id)?;
        self.commit();
        Ok(())
    }

    fn raise(&mut self, id: &str) -> Result<(), CanvasError> {
        let z = self.next_z_index;
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| CanvasError::ItemNotFound(id.to_string()))?;
        item.z_index = z;
        self.next_z_index += 1;
        Ok(())
    }

    /// Copies an item under a fresh id, offset down and right, on top.
    pub fn duplicate_item(&mut self, id: &str) -> Result<String, CanvasError> {
        let mut copy = self
            .item(id)
            .cloned()
            .ok_or_else(|| CanvasError::ItemNotFound(id.to_string()))?;
        copy.id = uuid::Uuid::new_v4().to_string();
        copy.x += DUPLICATE_OFFSET;
        copy.y += DUPLICATE_OFFSET;
        Ok(self.insert(copy))
    }

    /// Removes every item. Kept in history, so it can be undone.
    pub fn clear(&mut self) -> bool {
        if self.items.is_empty() {
            return false;
        }
        self.items.clear();
        self.selected = None;
        self.interaction = Interaction::Idle;
        self.commit();
        true
    }

    /// Drops canvas items pointing at a deleted content entry.
    pub fn remove_history_references(&mut self, history_item_id: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|i| i.history_item_id() != Some(history_item_id));
        let removed = before - self.items.len();
        if removed > 0 {
            if let Some(selected) = self.selected.as_deref() {
                if !self.items.iter().any(|i| i.id == selected) {
                    self.selected = None;
                }
            }
            log::debug!("canvas: removed {} references to {}", removed, history_item_id);
            self.commit();
        }
        removed
    }

    /// Pans by a screen-space delta as one discrete, committed step.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        self.viewport.pan_by(dx, dy);
        self.commit();
    }

    /// Zooms toward the centre of a `width` x `height` view and commits.
    pub fn zoom_button(&mut self, direction: ZoomDirection, width: f64, height: f64) -> bool {
        let center = Point::new(width / 2.0, height / 2.0);
        let changed = self
            .viewport
            .zoom_at(center, direction, self.config.button_zoom_factor);
        if changed {
            self.commit();
        }
        changed
    }

    /// Zooms toward the cursor without committing; callers coalesce wheel
    /// ticks and finish with [`commit_if_changed`](Self::commit_if_changed).
    pub fn wheel(&mut self, screen: Point, delta_y: f64) -> bool {
        if delta_y == 0.0 {
            return false;
        }
        self.viewport.zoom_at(
            screen,
            ZoomDirection::from_wheel_delta(delta_y),
            self.config.wheel_zoom_factor,
        )
    }

    pub fn reset_view(&mut self) -> bool {
        if self.viewport == Viewport::default() {
            return false;
        }
        self.viewport = Viewport::default();
        self.commit();
        true
    }

    /// Topmost thing under a screen point. Resize handles are only offered
    /// on the selected item.
    pub fn hit_test(&self, screen: Point) -> HitTarget {
        let p = self.viewport.to_canvas(screen);
        if let Some(selected) = self.selected_item() {
            let handle_size = self.config.resize_handle_size / self.viewport.zoom;
            if let Some(handle) = selected.resize_handle_at(p, handle_size) {
                return HitTarget::ResizeHandle(selected.id.clone(), handle);
            }
        }
        self.items
            .iter()
            .filter(|i| i.contains_point(p))
            .max_by_key(|i| i.z_index)
            .map_or(HitTarget::Background, |i| HitTarget::Item(i.id.clone()))
    }

    pub fn hover_cursor(&self, screen: Point) -> &'static str {
        if let Some(cursor) = self.interaction.cursor() {
            return cursor;
        }
        match self.hit_test(screen) {
            HitTarget::ResizeHandle(_, handle) => handle.cursor(),
            HitTarget::Item(_) => "move",
            HitTarget::Background => "default",
        }
    }

    pub fn pointer_down_at(&mut self, screen: Point, button: PointerButton) -> bool {
        let target = self.hit_test(screen);
        self.pointer_down(screen, button, target)
    }

    /// Starts a gesture from `Idle`. Returns whether one started.
    pub fn pointer_down(&mut self, screen: Point, button: PointerButton, target: HitTarget) -> bool {
        if !self.interaction.is_idle() {
            return false;
        }

        match (button, target) {
            (PointerButton::Primary, HitTarget::Item(id)) => {
                let Some(item) = self.item(&id) else {
                    return false;
                };
                let grab_offset = self.viewport.to_canvas(screen) - item.position();
                self.selected = Some(id.clone());
                if self.raise(&id).is_err() {
                    return false;
                }
                self.interaction = Interaction::Dragging {
                    item_id: id,
                    grab_offset,
                    moved: false,
                };
                true
            }
            (PointerButton::Primary, HitTarget::ResizeHandle(id, handle)) => {
                let Some(item) = self.item(&id) else {
                    return false;
                };
                let initial = item.bounds();
                let (min_width, min_height) = resize_floor(item, &self.config);
                self.selected = Some(id.clone());
                if self.raise(&id).is_err() {
                    return false;
                }
                self.interaction = Interaction::Resizing {
                    item_id: id,
                    handle,
                    initial_mouse: screen,
                    initial,
                    min_width,
                    min_height,
                    moved: false,
                };
                true
            }
            (PointerButton::Primary, HitTarget::Background) => {
                self.selected = None;
                false
            }
            (PointerButton::Secondary, HitTarget::Background) => {
                self.interaction = Interaction::Panning {
                    last: screen,
                    moved: false,
                };
                true
            }
            _ => false,
        }
    }

    /// Applies the active gesture for a pointer at `screen`. Returns whether
    /// anything moved.
    pub fn pointer_move(&mut self, screen: Point) -> bool {
        match &mut self.interaction {
            Interaction::Idle => false,
            Interaction::Dragging {
                item_id,
                grab_offset,
                moved,
            } => {
                let pos = drag_position(&self.viewport, screen, *grab_offset);
                let Some(item) = self.items.iter_mut().find(|i| i.id == *item_id) else {
                    return false;
                };
                if item.x == pos.x && item.y == pos.y {
                    return false;
                }
                item.x = pos.x;
                item.y = pos.y;
                *moved = true;
                true
            }
            Interaction::Resizing {
                item_id,
                handle,
                initial_mouse,
                initial,
                min_width,
                min_height,
                moved,
            } => {
                let delta = (screen - *initial_mouse).scale(1.0 / self.viewport.zoom);
                let bounds = resize_bounds(*handle, *initial, delta, *min_width, *min_height);
                let Some(item) = self.items.iter_mut().find(|i| i.id == *item_id) else {
                    return false;
                };
                if item.bounds() == bounds {
                    return false;
                }
                item.x = bounds.x;
                item.y = bounds.y;
                item.width = Some(bounds.width);
                item.height = Some(bounds.height);
                *moved = true;
                true
            }
            Interaction::Panning { last, moved } => {
                let delta = screen - *last;
                *last = screen;
                if delta.x == 0.0 && delta.y == 0.0 {
                    return false;
                }
                self.viewport.pan_by(delta.x, delta.y);
                *moved = true;
                true
            }
        }
    }

    /// Ends the gesture; commits once if it changed anything.
    pub fn pointer_up(&mut self) -> bool {
        let moved = self.interaction.has_moved();
        self.interaction = Interaction::Idle;
        if moved {
            self.commit();
        }
        moved
    }

    pub fn begin_image_request(&mut self) -> RequestTicket {
        self.image_gate.begin()
    }

    pub fn cancel_image_requests(&mut self) {
        self.image_gate.cancel();
    }

    pub fn is_current_image_request(&self, ticket: RequestTicket) -> bool {
        self.image_gate.is_current(ticket)
    }

    /// Applies a finished generation if its ticket is still the latest.
    /// Fills `target` when it is an image item, otherwise adds a new one.
    pub fn apply_generated_image(
        &mut self,
        ticket: RequestTicket,
        request: &ImageRequest,
        target: Option<&str>,
        image: GeneratedImage,
    ) -> Result<String, GenerationError> {
        if !self.image_gate.is_current(ticket) {
            log::info!("generation: dropping stale image response {:?}", ticket);
            return Err(GenerationError::Superseded);
        }

        let existing = target.and_then(|id| {
            self.items
                .iter_mut()
                .find(|i| i.id == id && matches!(i.kind, ItemKind::Image(_)))
        });
        if let Some(item) = existing {
            if let ItemKind::Image(img) = &mut item.kind {
                img.base64_data = image.base64_data;
                img.mime_type = image.mime_type;
                img.prompt = Some(request.prompt.clone());
            }
            let id = item.id.clone();
            self.commit();
            return Ok(id);
        }

        let (width, height) = request.aspect_ratio.item_size();
        let kind = ItemKind::Image(ImageItem {
            base64_data: image.base64_data,
            mime_type: image.mime_type,
            prompt: Some(request.prompt.clone()),
        });
        let mut item = CanvasItem::new(uuid::Uuid::new_v4().to_string(), DEFAULT_ITEM_X, DEFAULT_ITEM_Y, 0, kind);
        item.width = Some(width);
        item.height = Some(height);
        Ok(self.insert(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::AspectRatio;
    use crate::item::{HistoryReference, ResizeHandle};

    fn store() -> CanvasStore {
        CanvasStore::new(CanvasConfig::default())
    }

    fn note_at(store: &mut CanvasStore, x: f64, y: f64) -> String {
        store
            .add_item(ItemType::StickyNote, ItemOverrides::at(x, y))
            .unwrap()
    }

    mod item_tests {
        use super::*;

        #[test]
        fn add_assigns_fresh_id_and_z() {
            let mut s = store();
            let a = note_at(&mut s, 0.0, 0.0);
            let b = note_at(&mut s, 10.0, 10.0);
            assert_ne!(a, b);
            assert_eq!(s.item(&a).unwrap().z_index, 1);
            assert_eq!(s.item(&b).unwrap().z_index, 2);
            assert_eq!(s.next_z_index(), 3);
        }

        #[test]
        fn add_uses_default_position_and_size() {
            let mut s = store();
            let id = s.add_item(ItemType::StickyNote, ItemOverrides::default()).unwrap();
            let item = s.item(&id).unwrap();
            assert_eq!((item.x, item.y), (DEFAULT_ITEM_X, DEFAULT_ITEM_Y));
            assert_eq!(item.size(), (150.0, 100.0));
        }

        #[test]
        fn add_applies_overrides() {
            let mut s = store();
            let overrides = ItemOverrides::at(5.0, 6.0)
                .with_size(300.0, 40.0)
                .with_patch(ItemPatch::Content("Hook".to_string()));
            let id = s.add_item(ItemType::Text, overrides).unwrap();
            let item = s.item(&id).unwrap();
            assert_eq!(item.bounds(), crate::viewport::Rect::new(5.0, 6.0, 300.0, 40.0));
            assert_eq!(item.kind.editable_text(), Some("Hook"));
        }

        #[test]
        fn add_with_mismatched_patch_adds_nothing() {
            let mut s = store();
            let result = s.add_item(
                ItemType::Text,
                ItemOverrides::default().with_patch(ItemPatch::FillColor("#fff".to_string())),
            );
            assert!(result.is_err());
            assert!(s.items().is_empty());
            assert_eq!(s.next_z_index(), 1);
            assert_eq!(s.history().len(), 1);
        }

        #[test]
        fn update_touches_only_target() {
            let mut s = store();
            let a = note_at(&mut s, 0.0, 0.0);
            let b = note_at(&mut s, 50.0, 50.0);
            let b_before = s.item(&b).cloned();
            s.update_item(&a, ItemPatch::Content("changed".to_string())).unwrap();
            assert_eq!(s.item(&a).unwrap().kind.editable_text(), Some("changed"));
            assert_eq!(s.item(&b).cloned(), b_before);
        }

        #[test]
        fn update_unknown_id_errors_without_commit() {
            let mut s = store();
            let len = s.history().len();
            let err = s.update_item("missing", ItemPatch::Move { x: 0.0, y: 0.0 }).unwrap_err();
            assert_eq!(err, CanvasError::ItemNotFound("missing".to_string()));
            assert_eq!(s.history().len(), len);
        }

        #[test]
        fn stale_ids_error_without_commit() {
            let mut s = store();
            let id = note_at(&mut s, 0.0, 0.0);
            s.remove_item(&id).unwrap();
            let len = s.history().len();
            let missing = CanvasError::ItemNotFound(id.clone());
            assert_eq!(s.remove_item(&id).unwrap_err(), missing);
            assert_eq!(s.bring_to_front(&id).unwrap_err(), missing);
            assert_eq!(s.duplicate_item(&id).unwrap_err(), missing);
            assert_eq!(s.history().len(), len);
        }

        #[test]
        fn remove_clears_selection() {
            let mut s = store();
            let id = note_at(&mut s, 0.0, 0.0);
            s.select(Some(&id));
            s.remove_item(&id).unwrap();
            assert_eq!(s.selected(), None);
            assert!(s.items().is_empty());
        }

        #[test]
        fn bring_to_front_outranks_everything() {
            let mut s = store();
            let a = note_at(&mut s, 0.0, 0.0);
            let _b = note_at(&mut s, 0.0, 0.0);
            s.bring_to_front(&a).unwrap();
            let max = s.items().iter().map(|i| i.z_index).max().unwrap();
            assert_eq!(s.item(&a).unwrap().z_index, max);
            assert_eq!(s.next_z_index(), max + 1);
        }

        #[test]
        fn z_order_monotonic_over_mixed_operations() {
            let mut s = store();
            let mut ids = Vec::new();
            let mut issued = Vec::new();
            for i in 0..10 {
                if i % 3 == 2 {
                    let id: &String = &ids[i / 2];
                    s.bring_to_front(id).unwrap();
                    issued.push(s.item(id).unwrap().z_index);
                } else {
                    let id = note_at(&mut s, 0.0, 0.0);
                    issued.push(s.item(&id).unwrap().z_index);
                    ids.push(id);
                }
                let max = s.items().iter().map(|i| i.z_index).max().unwrap();
                assert_eq!(s.next_z_index(), max + 1);
            }
            assert!(issued.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn duplicate_offsets_and_raises() {
            let mut s = store();
            let a = note_at(&mut s, 10.0, 10.0);
            let copy = s.duplicate_item(&a).unwrap();
            let original = s.item(&a).unwrap();
            let dup = s.item(&copy).unwrap();
            assert_ne!(copy, a);
            assert_eq!((dup.x, dup.y), (30.0, 30.0));
            assert!(dup.z_index > original.z_index);
        }

        #[test]
        fn clear_is_undoable() {
            let mut s = store();
            note_at(&mut s, 0.0, 0.0);
            assert!(s.clear());
            assert!(s.items().is_empty());
            assert!(s.undo());
            assert_eq!(s.items().len(), 1);
            assert!(!store().clear());
        }
    }

    mod history_tests {
        use super::*;

        #[test]
        fn undo_restores_previous_state_and_clears_selection() {
            let mut s = store();
            let id = note_at(&mut s, 0.0, 0.0);
            let s0 = s.snapshot();
            s.update_item(&id, ItemPatch::Move { x: 40.0, y: 0.0 }).unwrap();
            let s1 = s.snapshot();
            s.select(Some(&id));

            assert!(s.undo());
            assert_eq!(s.snapshot(), s0);
            assert_eq!(s.selected(), None);
            assert!(s.redo());
            assert_eq!(s.snapshot(), s1);
        }

        #[test]
        fn undo_at_start_is_noop() {
            let mut s = store();
            assert!(!s.undo());
            assert!(!s.redo());
        }

        #[test]
        fn history_is_capped() {
            let config = CanvasConfig::default();
            let max = config.max_history;
            let mut s = CanvasStore::new(config);
            for i in 0..(max + 5) {
                note_at(&mut s, i as f64, 0.0);
                assert!(s.history().len() <= max);
            }
            assert_eq!(s.history().len(), max);
            assert_eq!(s.history().index(), max - 1);
            assert_eq!(s.history().current().unwrap().items.len(), max + 5);
        }

        #[test]
        fn commit_if_changed_skips_identical_state() {
            let mut s = store();
            assert!(!s.commit_if_changed());
            s.wheel(Point::new(10.0, 10.0), -1.0);
            assert!(s.commit_if_changed());
            assert!(!s.commit_if_changed());
        }
    }

    mod viewport_tests {
        use super::*;

        #[test]
        fn wheel_does_not_commit() {
            let mut s = store();
            let len = s.history().len();
            assert!(s.wheel(Point::new(100.0, 100.0), -120.0));
            assert!((s.viewport().zoom - 1.1).abs() < 1e-9);
            assert_eq!(s.history().len(), len);
        }

        #[test]
        fn zoom_button_twice_from_center() {
            let mut s = store();
            let center = Point::new(400.0, 300.0);
            let canvas_before = s.viewport().to_canvas(center);
            s.zoom_button(ZoomDirection::In, 800.0, 600.0);
            s.zoom_button(ZoomDirection::In, 800.0, 600.0);
            assert!((s.viewport().zoom - 1.44).abs() < 1e-9);
            let back = s.viewport().to_screen(canvas_before);
            assert!((back.x - 400.0).abs() < 1e-9);
            assert!((back.y - 300.0).abs() < 1e-9);
            assert_eq!(s.history().len(), 3);
        }

        #[test]
        fn zoom_button_at_limit_does_not_commit() {
            let mut s = CanvasStore::from_state(
                Vec::new(),
                Viewport { offset: Point::default(), zoom: 5.0 },
                CanvasConfig::default(),
            );
            assert!(!s.zoom_button(ZoomDirection::In, 800.0, 600.0));
            assert_eq!(s.history().len(), 1);
        }

        #[test]
        fn reset_view_commits_once() {
            let mut s = store();
            assert!(!s.reset_view());
            s.pan_by(10.0, 10.0);
            assert!(s.reset_view());
            assert_eq!(*s.viewport(), Viewport::default());
            assert_eq!(s.history().len(), 3);
        }
    }

    mod interaction_tests {
        use super::*;

        #[test]
        fn hit_test_prefers_topmost() {
            let mut s = store();
            let bottom = note_at(&mut s, 0.0, 0.0);
            let top = note_at(&mut s, 50.0, 50.0);
            assert_eq!(s.hit_test(Point::new(60.0, 60.0)), HitTarget::Item(top.clone()));
            assert_eq!(s.hit_test(Point::new(10.0, 10.0)), HitTarget::Item(bottom.clone()));
            s.bring_to_front(&bottom).unwrap();
            assert_eq!(s.hit_test(Point::new(60.0, 60.0)), HitTarget::Item(bottom));
            assert_eq!(s.hit_test(Point::new(900.0, 900.0)), HitTarget::Background);
        }

        #[test]
        fn handles_only_on_selected_item() {
            let mut s = store();
            let id = note_at(&mut s, 0.0, 0.0);
            assert_eq!(s.hit_test(Point::new(150.0, 100.0)), HitTarget::Item(id.clone()));
            s.select(Some(&id));
            assert_eq!(
                s.hit_test(Point::new(150.0, 100.0)),
                HitTarget::ResizeHandle(id, ResizeHandle::BottomRight)
            );
        }

        #[test]
        fn drag_moves_item_and_commits_once() {
            let mut s = store();
            let id = note_at(&mut s, 100.0, 100.0);
            let len = s.history().len();

            assert!(s.pointer_down_at(Point::new(110.0, 120.0), PointerButton::Primary));
            assert_eq!(s.selected(), Some(id.as_str()));
            for step in 1..=5 {
                s.pointer_move(Point::new(110.0 + step as f64 * 10.0, 120.0));
            }
            assert_eq!(s.history().len(), len);
            assert!(s.pointer_up());
            assert_eq!(s.history().len(), len + 1);
            assert_eq!(s.item(&id).unwrap().position(), Point::new(150.0, 100.0));
            assert!(s.interaction().is_idle());
        }

        #[test]
        fn drag_raises_item_on_pick_up() {
            let mut s = store();
            let a = note_at(&mut s, 0.0, 0.0);
            let _b = note_at(&mut s, 200.0, 200.0);
            s.pointer_down_at(Point::new(5.0, 5.0), PointerButton::Primary);
            let max = s.items().iter().map(|i| i.z_index).max().unwrap();
            assert_eq!(s.item(&a).unwrap().z_index, max);
        }

        #[test]
        fn click_without_move_does_not_commit() {
            let mut s = store();
            let id = note_at(&mut s, 0.0, 0.0);
            let len = s.history().len();
            s.pointer_down_at(Point::new(5.0, 5.0), PointerButton::Primary);
            assert!(!s.pointer_up());
            assert_eq!(s.history().len(), len);
            assert_eq!(s.selected(), Some(id.as_str()));
        }

        #[test]
        fn click_on_background_clears_selection() {
            let mut s = store();
            let id = note_at(&mut s, 0.0, 0.0);
            s.select(Some(&id));
            assert!(!s.pointer_down_at(Point::new(700.0, 700.0), PointerButton::Primary));
            s.pointer_up();
            assert_eq!(s.selected(), None);
        }

        #[test]
        fn drag_at_zoom_uses_canvas_units() {
            let mut s = CanvasStore::from_state(
                Vec::new(),
                Viewport { offset: Point::new(20.0, 10.0), zoom: 2.0 },
                CanvasConfig::default(),
            );
            let id = note_at(&mut s, 100.0, 100.0);
            let start = s.viewport().to_screen(Point::new(110.0, 110.0));
            s.pointer_down_at(start, PointerButton::Primary);
            s.pointer_move(Point::new(start.x + 50.0, start.y));
            s.pointer_up();
            assert_eq!(s.item(&id).unwrap().position(), Point::new(125.0, 100.0));
        }

        #[test]
        fn resize_scales_delta_by_zoom_and_floors() {
            let mut s = CanvasStore::from_state(
                Vec::new(),
                Viewport { offset: Point::default(), zoom: 2.0 },
                CanvasConfig::default(),
            );
            let id = note_at(&mut s, 0.0, 0.0);
            s.select(Some(&id));
            let corner = s.viewport().to_screen(Point::new(150.0, 100.0));
            assert!(s.pointer_down_at(corner, PointerButton::Primary));
            assert!(matches!(s.interaction(), Interaction::Resizing { .. }));

            s.pointer_move(Point::new(corner.x + 40.0, corner.y + 20.0));
            assert_eq!(s.item(&id).unwrap().size(), (170.0, 110.0));

            s.pointer_move(Point::new(corner.x - 1000.0, corner.y - 1000.0));
            assert_eq!(s.item(&id).unwrap().size(), (50.0, 30.0));
            assert!(s.pointer_up());
        }

        #[test]
        fn resizing_a_line_keeps_it_thin() {
            let mut s = store();
            let id = s
                .add_item(
                    ItemType::Shape,
                    ItemOverrides::at(0.0, 0.0).with_patch(ItemPatch::ShapeVariant(crate::item::ShapeVariant::Line)),
                )
                .unwrap();
            assert_eq!(s.item(&id).unwrap().size(), (200.0, 4.0));
            s.select(Some(&id));
            s.pointer_down(
                Point::new(200.0, 4.0),
                PointerButton::Primary,
                HitTarget::ResizeHandle(id.clone(), ResizeHandle::BottomRight),
            );
            s.pointer_move(Point::new(250.0, 0.0));
            assert_eq!(s.item(&id).unwrap().size(), (250.0, 2.0));
        }

        #[test]
        fn right_drag_on_background_pans() {
            let mut s = store();
            let len = s.history().len();
            assert!(s.pointer_down_at(Point::new(300.0, 300.0), PointerButton::Secondary));
            s.pointer_move(Point::new(320.0, 290.0));
            s.pointer_move(Point::new(350.0, 280.0));
            assert!(s.pointer_up());
            assert_eq!(s.viewport().offset, Point::new(50.0, -20.0));
            assert_eq!(s.history().len(), len + 1);
        }

        #[test]
        fn right_click_without_move_does_not_commit() {
            let mut s = store();
            s.pointer_down_at(Point::new(300.0, 300.0), PointerButton::Secondary);
            assert!(!s.pointer_up());
            assert_eq!(s.history().len(), 1);
        }

        #[test]
        fn new_gesture_requires_idle() {
            let mut s = store();
            note_at(&mut s, 0.0, 0.0);
            assert!(s.pointer_down_at(Point::new(5.0, 5.0), PointerButton::Primary));
            assert!(!s.pointer_down_at(Point::new(700.0, 700.0), PointerButton::Secondary));
            assert!(matches!(s.interaction(), Interaction::Dragging { .. }));
        }

        #[test]
        fn removing_dragged_item_ends_gesture() {
            let mut s = store();
            let id = note_at(&mut s, 0.0, 0.0);
            s.pointer_down_at(Point::new(5.0, 5.0), PointerButton::Primary);
            s.remove_item(&id).unwrap();
            assert!(s.interaction().is_idle());
            assert!(!s.pointer_move(Point::new(50.0, 50.0)));
        }

        #[test]
        fn hover_cursor_reflects_target() {
            let mut s = store();
            let id = note_at(&mut s, 0.0, 0.0);
            assert_eq!(s.hover_cursor(Point::new(50.0, 50.0)), "move");
            assert_eq!(s.hover_cursor(Point::new(500.0, 500.0)), "default");
            s.select(Some(&id));
            assert_eq!(s.hover_cursor(Point::new(150.0, 100.0)), "nwse-resize");
        }
    }

    mod reference_tests {
        use super::*;

        #[test]
        fn deleting_history_entry_removes_references() {
            let mut s = store();
            let kept = note_at(&mut s, 0.0, 0.0);
            let reference = s
                .add_item_from(
                    ItemKind::HistoryItem(HistoryReference {
                        history_item_id: "post-1".to_string(),
                    }),
                    ItemOverrides::default(),
                )
                .unwrap();
            s.select(Some(&reference));
            let len = s.history().len();

            assert_eq!(s.remove_history_references("post-1"), 1);
            assert!(s.item(&reference).is_none());
            assert!(s.item(&kept).is_some());
            assert_eq!(s.selected(), None);
            assert_eq!(s.history().len(), len + 1);

            assert_eq!(s.remove_history_references("post-1"), 0);
            assert_eq!(s.history().len(), len + 1);
        }
    }

    mod generation_tests {
        use super::*;

        fn request() -> ImageRequest {
            ImageRequest {
                prompt: "a lighthouse".to_string(),
                negative_prompt: None,
                aspect_ratio: AspectRatio::Wide,
            }
        }

        fn image(tag: &str) -> GeneratedImage {
            GeneratedImage {
                base64_data: tag.to_string(),
                mime_type: "image/jpeg".to_string(),
            }
        }

        #[test]
        fn latest_response_adds_image_item() {
            let mut s = store();
            let ticket = s.begin_image_request();
            let id = s.apply_generated_image(ticket, &request(), None, image("AAA")).unwrap();
            let item = s.item(&id).unwrap();
            assert_eq!(item.size(), (480.0, 270.0));
            let ItemKind::Image(img) = &item.kind else { panic!("expected image") };
            assert_eq!(img.base64_data, "AAA");
            assert_eq!(img.prompt.as_deref(), Some("a lighthouse"));
        }

        #[test]
        fn stale_response_is_dropped() {
            let mut s = store();
            let first = s.begin_image_request();
            let second = s.begin_image_request();
            assert_eq!(
                s.apply_generated_image(first, &request(), None, image("OLD")),
                Err(GenerationError::Superseded)
            );
            assert!(s.items().is_empty());
            assert!(s.apply_generated_image(second, &request(), None, image("NEW")).is_ok());
            assert_eq!(s.items().len(), 1);
        }

        #[test]
        fn response_fills_target_image() {
            let mut s = store();
            let target = s.add_item(ItemType::Image, ItemOverrides::default()).unwrap();
            let ticket = s.begin_image_request();
            let id = s
                .apply_generated_image(ticket, &request(), Some(&target), image("BBB"))
                .unwrap();
            assert_eq!(id, target);
            assert_eq!(s.items().len(), 1);
            let ItemKind::Image(img) = &s.item(&target).unwrap().kind else { panic!("expected image") };
            assert_eq!(img.mime_type, "image/jpeg");
        }

        #[test]
        fn cancel_drops_in_flight_response() {
            let mut s = store();
            let ticket = s.begin_image_request();
            s.cancel_image_requests();
            assert!(s.apply_generated_image(ticket, &request(), None, image("X")).is_err());
        }
    }
}

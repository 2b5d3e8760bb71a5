//! Integration tests: end-to-end gestures on the canvas store.
//!
//! Drives the store the way the UI does (pointer down/move/up, toolbar
//! zoom, keyboard undo/redo) and checks item geometry and history cursor.

use pretty_assertions::assert_eq;
use studio_canvas::interaction::PointerButton;
use studio_canvas::item::ItemPatch;
use studio_canvas::viewport::ZoomDirection;
use studio_canvas::{CanvasConfig, CanvasStore, ItemOverrides, ItemType, Point, Viewport};

fn store_at_zoom(zoom: f64) -> CanvasStore {
    let viewport = Viewport {
        offset: Point::new(0.0, 0.0),
        zoom,
    };
    CanvasStore::from_state(Vec::new(), viewport, CanvasConfig::default())
}

/// Commits made since the store was created; the first history entry is
/// the baseline it started from.
fn commits(store: &CanvasStore) -> usize {
    store.history().len() - 1
}

// ─── Drag, undo, redo ───────────────────────────────────────────────────

#[test]
fn sticky_note_drag_at_zoom_two_then_undo_redo() {
    let mut store = store_at_zoom(2.0);
    let id = store.add_item(ItemType::StickyNote, ItemOverrides::default()).unwrap();
    assert_eq!(commits(&store), 1);
    assert_eq!(store.item(&id).unwrap().size(), (150.0, 100.0));

    let original_x = store.item(&id).unwrap().x;
    let grab = store.viewport().to_screen(store.item(&id).unwrap().position()) + Point::new(10.0, 10.0);

    assert!(store.pointer_down_at(grab, PointerButton::Primary));
    assert!(store.pointer_move(grab + Point::new(25.0, 0.0)));
    assert!(store.pointer_move(grab + Point::new(50.0, 0.0)));
    assert_eq!(commits(&store), 1, "no commit while the drag is in flight");
    assert!(store.pointer_up());

    assert_eq!(commits(&store), 2);
    let moved_x = store.item(&id).unwrap().x;
    assert_eq!(moved_x, original_x + 25.0);
    let index_after_drag = store.history().index();

    assert!(store.undo());
    assert_eq!(store.item(&id).unwrap().x, original_x);
    assert_eq!(store.history().index(), index_after_drag - 1);
    assert_eq!(store.selected(), None);

    assert!(store.redo());
    assert_eq!(store.item(&id).unwrap().x, moved_x);
    assert_eq!(store.history().index(), index_after_drag);
}

#[test]
fn click_without_movement_selects_but_does_not_commit() {
    let mut store = store_at_zoom(1.0);
    let id = store.add_item(ItemType::Text, ItemOverrides::at(0.0, 0.0)).unwrap();
    let before = commits(&store);

    store.pointer_down_at(Point::new(5.0, 5.0), PointerButton::Primary);
    store.pointer_up();
    assert_eq!(store.selected(), Some(id.as_str()));
    assert_eq!(commits(&store), before);

    store.pointer_down_at(Point::new(900.0, 900.0), PointerButton::Primary);
    store.pointer_up();
    assert_eq!(store.selected(), None);
}

#[test]
fn right_drag_on_background_pans_once() {
    let mut store = store_at_zoom(1.0);
    let start = Point::new(300.0, 300.0);
    assert!(store.pointer_down_at(start, PointerButton::Secondary));
    store.pointer_move(start + Point::new(10.0, 0.0));
    store.pointer_move(start + Point::new(40.0, -20.0));
    store.pointer_up();

    assert_eq!(store.viewport().offset, Point::new(40.0, -20.0));
    assert_eq!(commits(&store), 1);
}

// ─── Zoom ───────────────────────────────────────────────────────────────

#[test]
fn button_zoom_twice_keeps_center_fixed() {
    let mut store = store_at_zoom(1.0);
    let center = Point::new(400.0, 300.0);
    let under_center = store.viewport().to_canvas(center);

    assert!(store.zoom_button(ZoomDirection::In, 800.0, 600.0));
    assert!(store.zoom_button(ZoomDirection::In, 800.0, 600.0));

    assert!((store.viewport().zoom - 1.44).abs() < 1e-9);
    let back = store.viewport().to_screen(under_center);
    assert!((back.x - center.x).abs() < 1e-9);
    assert!((back.y - center.y).abs() < 1e-9);
    assert_eq!(commits(&store), 2);
}

#[test]
fn zoom_stops_at_upper_clamp() {
    let mut store = store_at_zoom(4.9);
    assert!(store.zoom_button(ZoomDirection::In, 800.0, 600.0));
    assert_eq!(store.viewport().zoom, 5.0);
    assert!(!store.zoom_button(ZoomDirection::In, 800.0, 600.0));
}

#[test]
fn wheel_ticks_coalesce_into_one_commit() {
    let mut store = store_at_zoom(1.0);
    let cursor = Point::new(120.0, 80.0);
    for _ in 0..4 {
        assert!(store.wheel(cursor, -100.0));
    }
    assert_eq!(commits(&store), 0);
    assert!(store.commit_if_changed());
    assert!(!store.commit_if_changed());
    assert_eq!(commits(&store), 1);
}

// ─── Z order and history cap ────────────────────────────────────────────

#[test]
fn next_z_stays_above_every_item() {
    let mut store = store_at_zoom(1.0);
    let mut issued = Vec::new();
    for i in 0..5 {
        let id = store.add_item(ItemType::Shape, ItemOverrides::at(i as f64 * 10.0, 0.0)).unwrap();
        issued.push(store.item(&id).unwrap().z_index);
    }
    let (first, third) = (store.items()[0].id.clone(), store.items()[2].id.clone());
    store.bring_to_front(&first).unwrap();
    store.bring_to_front(&third).unwrap();

    let max_z = store.items().iter().map(|i| i.z_index).max().unwrap();
    assert_eq!(store.next_z_index(), max_z + 1);
    assert!(issued.iter().all(|z| *z < store.next_z_index()));
}

#[test]
fn history_keeps_only_the_newest_entries() {
    let config = CanvasConfig::default();
    let max = config.max_history;
    let mut store = CanvasStore::new(config);
    let id = store.add_item(ItemType::Text, ItemOverrides::default()).unwrap();

    for n in 0..max + 5 {
        store.update_item(&id, ItemPatch::Content(format!("rev {}", n))).unwrap();
    }

    assert_eq!(store.history().len(), max);
    assert_eq!(store.history().index(), max - 1);
    let newest = store.history().entries().last().unwrap();
    assert_eq!(
        newest.items[0].kind.editable_text(),
        Some(format!("rev {}", max + 4).as_str())
    );
    let oldest = store.history().entries().first().unwrap();
    assert_eq!(oldest.items[0].kind.editable_text(), Some("rev 5"));
}

//! Pointer gesture state: which exclusive interaction is in progress and the
//! geometry it starts from.

use crate::config::CanvasConfig;
use crate::item::{CanvasItem, ItemKind, ResizeHandle};
use crate::viewport::{Point, Rect, Viewport};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

impl PointerButton {
    /// Maps `MouseEvent.button` values.
    pub fn from_dom(button: i16) -> Option<Self> {
        match button {
            0 => Some(PointerButton::Primary),
            1 => Some(PointerButton::Middle),
            2 => Some(PointerButton::Secondary),
            _ => None,
        }
    }
}

/// What a pointer press landed on.
#[derive(Clone, Debug, PartialEq)]
pub enum HitTarget {
    Background,
    Item(String),
    ResizeHandle(String, ResizeHandle),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Interaction {
    #[default]
    Idle,
    Dragging {
        item_id: String,
        grab_offset: Point,
        moved: bool,
    },
    Resizing {
        item_id: String,
        handle: ResizeHandle,
        initial_mouse: Point,
        initial: Rect,
        min_width: f64,
        min_height: f64,
        moved: bool,
    },
    Panning {
        last: Point,
        moved: bool,
    },
}

impl Interaction {
    pub fn is_idle(&self) -> bool {
        matches!(self, Interaction::Idle)
    }

    pub fn item_id(&self) -> Option<&str> {
        match self {
            Interaction::Dragging { item_id, .. } | Interaction::Resizing { item_id, .. } => Some(item_id),
            _ => None,
        }
    }

    pub fn has_moved(&self) -> bool {
        match self {
            Interaction::Idle => false,
            Interaction::Dragging { moved, .. }
            | Interaction::Resizing { moved, .. }
            | Interaction::Panning { moved, .. } => *moved,
        }
    }

    pub fn cursor(&self) -> Option<&'static str> {
        match self {
            Interaction::Idle => None,
            Interaction::Dragging { .. } => Some("grabbing"),
            Interaction::Resizing { handle, .. } => Some(handle.cursor()),
            Interaction::Panning { .. } => Some("move"),
        }
    }
}

/// Minimum width and height an item may be resized to.
pub fn resize_floor(item: &CanvasItem, config: &CanvasConfig) -> (f64, f64) {
    if matches!(item.kind, ItemKind::Image(_)) {
        (config.min_image_size, config.min_image_size)
    } else if item.is_line(config.line_mode_threshold) {
        (config.min_item_width, config.line_min_height)
    } else {
        (config.min_item_width, config.min_item_height)
    }
}

/// Canvas position of a dragged item: the pointer in canvas space minus
/// the offset at which it was grabbed.
pub fn drag_position(viewport: &Viewport, mouse: Point, grab_offset: Point) -> Point {
    viewport.to_canvas(mouse) - grab_offset
}

/// New bounds for a resize gesture. `delta` is already in canvas units.
/// The corner opposite `handle` stays fixed.
pub fn resize_bounds(handle: ResizeHandle, initial: Rect, delta: Point, min_width: f64, min_height: f64) -> Rect {
    let grow_x = matches!(handle, ResizeHandle::TopRight | ResizeHandle::BottomRight);
    let grow_y = matches!(handle, ResizeHandle::BottomLeft | ResizeHandle::BottomRight);

    let width = if grow_x {
        initial.width + delta.x
    } else {
        initial.width - delta.x
    }
    .max(min_width);
    let height = if grow_y {
        initial.height + delta.y
    } else {
        initial.height - delta.y
    }
    .max(min_height);

    let x = if grow_x { initial.x } else { initial.x + (initial.width - width) };
    let y = if grow_y { initial.y } else { initial.y + (initial.height - height) };

    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemType, ShapeItem, ShapeVariant};

    fn item(kind: ItemKind) -> CanvasItem {
        CanvasItem::new("i".to_string(), 0.0, 0.0, 1, kind)
    }

    mod floor_tests {
        use super::*;

        #[test]
        fn general_items_use_configured_minimum() {
            let config = CanvasConfig::default();
            let note = item(ItemKind::defaults(ItemType::StickyNote));
            assert_eq!(resize_floor(&note, &config), (50.0, 30.0));
        }

        #[test]
        fn images_floor_higher() {
            let config = CanvasConfig::default();
            let image = item(ItemKind::defaults(ItemType::Image));
            assert_eq!(resize_floor(&image, &config), (100.0, 100.0));
        }

        #[test]
        fn line_shapes_keep_thin_height() {
            let config = CanvasConfig::default();
            let line = item(ItemKind::Shape(ShapeItem {
                shape_variant: ShapeVariant::Line,
                ..ShapeItem::default()
            }));
            assert_eq!(resize_floor(&line, &config), (50.0, 2.0));
        }
    }

    mod drag_tests {
        use super::*;

        #[test]
        fn drag_position_is_zoom_independent() {
            let grab = Point::new(10.0, 5.0);
            for zoom in [0.5, 1.0, 2.0, 4.0] {
                let vp = Viewport { offset: Point::new(30.0, -20.0), zoom };
                let mouse = Point::new(400.0, 250.0);
                let expected = vp.to_canvas(mouse) - grab;
                assert_eq!(drag_position(&vp, mouse, grab), expected);
            }
        }
    }

    mod resize_tests {
        use super::*;

        const INITIAL: Rect = Rect::new(100.0, 100.0, 200.0, 100.0);

        #[test]
        fn bottom_right_grows_with_delta() {
            let r = resize_bounds(ResizeHandle::BottomRight, INITIAL, Point::new(30.0, 20.0), 50.0, 30.0);
            assert_eq!(r, Rect::new(100.0, 100.0, 230.0, 120.0));
        }

        #[test]
        fn bottom_right_respects_floor() {
            let r = resize_bounds(ResizeHandle::BottomRight, INITIAL, Point::new(-500.0, -500.0), 50.0, 30.0);
            assert_eq!(r, Rect::new(100.0, 100.0, 50.0, 30.0));
        }

        #[test]
        fn top_left_keeps_bottom_right_fixed() {
            let r = resize_bounds(ResizeHandle::TopLeft, INITIAL, Point::new(20.0, 10.0), 50.0, 30.0);
            assert_eq!(r, Rect::new(120.0, 110.0, 180.0, 90.0));
            assert_eq!(r.x + r.width, 300.0);
            assert_eq!(r.y + r.height, 200.0);
        }

        #[test]
        fn top_left_floor_pins_origin() {
            let r = resize_bounds(ResizeHandle::TopLeft, INITIAL, Point::new(1000.0, 1000.0), 50.0, 30.0);
            assert_eq!(r, Rect::new(250.0, 170.0, 50.0, 30.0));
        }

        #[test]
        fn top_right_and_bottom_left_mirror_one_axis() {
            let tr = resize_bounds(ResizeHandle::TopRight, INITIAL, Point::new(10.0, 10.0), 50.0, 30.0);
            assert_eq!(tr, Rect::new(100.0, 110.0, 210.0, 90.0));
            let bl = resize_bounds(ResizeHandle::BottomLeft, INITIAL, Point::new(10.0, 10.0), 50.0, 30.0);
            assert_eq!(bl, Rect::new(110.0, 100.0, 190.0, 110.0));
        }

        #[test]
        fn line_height_floor_of_two() {
            let line = Rect::new(0.0, 0.0, 200.0, 4.0);
            let r = resize_bounds(ResizeHandle::BottomRight, line, Point::new(0.0, -10.0), 50.0, 2.0);
            assert_eq!(r.height, 2.0);
        }
    }

    mod state_tests {
        use super::*;

        #[test]
        fn idle_has_no_target() {
            let state = Interaction::default();
            assert!(state.is_idle());
            assert_eq!(state.item_id(), None);
            assert!(!state.has_moved());
            assert_eq!(state.cursor(), None);
        }

        #[test]
        fn dragging_reports_item() {
            let state = Interaction::Dragging {
                item_id: "a".to_string(),
                grab_offset: Point::default(),
                moved: true,
            };
            assert_eq!(state.item_id(), Some("a"));
            assert!(state.has_moved());
        }

        #[test]
        fn dom_buttons() {
            assert_eq!(PointerButton::from_dom(0), Some(PointerButton::Primary));
            assert_eq!(PointerButton::from_dom(2), Some(PointerButton::Secondary));
            assert_eq!(PointerButton::from_dom(7), None);
        }
    }
}

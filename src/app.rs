use crate::canvas::{get_canvas_context, render_canvas, ImageCache};
use crate::components::{ContentPanel, ExportModal, ImageModal, ItemEditor, PropertyPanel, Toolbar};
use crate::config::CanvasConfig;
use crate::content::ContentHistory;
use crate::interaction::{HitTarget, PointerButton};
use crate::item::{ItemKind, ItemType};
use crate::persistence::{load_canvas, load_content, save_content, Autosaver, KeyValueStore, LocalStorage, MemoryStore};
use crate::store::{CanvasStore, ItemOverrides};
use crate::viewport::{Point, ZoomDirection};
use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::rc::Rc;
use web_sys::HtmlCanvasElement;

const WHEEL_SETTLE_MS: u32 = 250;

/// Which item the image-generation modal fills. `None` adds a new image.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImageModalState {
    pub target: Option<String>,
}

/// Shared reactive handles, provided once by [`App`].
#[derive(Clone, Copy)]
pub struct CanvasCtx {
    pub store: RwSignal<CanvasStore>,
    pub content: RwSignal<ContentHistory>,
    pub editing_item: RwSignal<Option<String>>,
    pub image_modal: RwSignal<Option<ImageModalState>>,
    pub export_open: RwSignal<bool>,
    pub canvas_ref: NodeRef<leptos::html::Canvas>,
}

impl CanvasCtx {
    /// Current canvas element size in CSS pixels.
    pub fn viewport_size(&self) -> (f64, f64) {
        self.canvas_ref
            .get_untracked()
            .map(|canvas| {
                let rect = canvas.get_bounding_client_rect();
                (rect.width(), rect.height())
            })
            .unwrap_or((800.0, 600.0))
    }

    /// Adds an item centred in the visible area, selects it and returns its id.
    pub fn add_centered(&self, kind: ItemKind) -> Option<String> {
        let (width, height) = self.viewport_size();
        let center = self
            .store
            .with_untracked(|s| s.viewport().to_canvas(Point::new(width / 2.0, height / 2.0)));
        let (w, h) = kind.default_size();
        let overrides = ItemOverrides::at(center.x - w / 2.0, center.y - h / 2.0);
        let result = self.store.try_update(|s| {
            let id = s.add_item_from(kind, overrides)?;
            s.select(Some(&id));
            Ok::<_, crate::error::CanvasError>(id)
        })?;
        match result {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!("canvas: add failed: {}", e);
                None
            }
        }
    }

    pub fn delete_content_entry(&self, id: &str) {
        self.content.update(|c| {
            c.remove(id);
        });
        self.store.maybe_update(|s| s.remove_history_references(id) > 0);
    }
}

fn open_storage() -> Box<dyn KeyValueStore> {
    match LocalStorage::open() {
        Ok(storage) => Box::new(storage),
        Err(e) => {
            log::warn!("storage: {}, keeping this session in memory", e);
            Box::new(MemoryStore::new())
        }
    }
}

fn pointer_position(canvas: &HtmlCanvasElement, ev: &web_sys::MouseEvent) -> Point {
    let rect = canvas.get_bounding_client_rect();
    Point::new(ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top())
}

#[component]
pub fn App() -> impl IntoView {
    let kv: Rc<dyn KeyValueStore> = Rc::from(open_storage());
    let config = CanvasConfig::default();
    let content_config = config.clone();

    let ctx = CanvasCtx {
        content: RwSignal::new(load_content(kv.as_ref(), &config)),
        store: RwSignal::new(load_canvas(kv.as_ref(), config)),
        editing_item: RwSignal::new(None),
        image_modal: RwSignal::new(None),
        export_open: RwSignal::new(false),
        canvas_ref: NodeRef::new(),
    };
    provide_context(ctx);

    let store = ctx.store;
    let canvas_ref = ctx.canvas_ref;
    let (cursor_style, set_cursor_style) = signal("default");
    let (image_load_trigger, set_image_load_trigger) = signal(0u32);
    let wheel_seq = StoredValue::new(0u64);
    let image_cache = ImageCache::default();

    // Persist every change; the autosaver skips slices that did not change.
    Effect::new({
        let kv = kv.clone();
        let mut saver = Autosaver::new();
        move || {
            store.with(|s| saver.save(kv.as_ref(), s));
        }
    });

    Effect::new({
        let kv = kv.clone();
        move || {
            ctx.content.with(|c| save_content(kv.as_ref(), &content_config, c));
        }
    });

    Effect::new(move || {
        let _ = image_load_trigger.get();
        let editing = ctx.editing_item.get();

        let Some(canvas) = canvas_ref.get() else {
            return;
        };
        let canvas_el: &HtmlCanvasElement = &canvas;

        let rect = canvas_el.get_bounding_client_rect();
        let display_width = rect.width() as u32;
        let display_height = rect.height() as u32;
        if canvas_el.width() != display_width {
            canvas_el.set_width(display_width);
        }
        if canvas_el.height() != display_height {
            canvas_el.set_height(display_height);
        }

        if let Ok(ctx2d) = get_canvas_context(canvas_el) {
            let redraw = move || set_image_load_trigger.update(|n| *n = n.wrapping_add(1));
            store.with(|s| {
                image_cache.retain_ids(s.items());
                ctx.content.with(|content| {
                    render_canvas(&ctx2d, canvas_el, s, content, editing.as_deref(), &image_cache, redraw)
                });
            });
        }
    });

    let on_mouse_down = move |ev: web_sys::MouseEvent| {
        if ctx.editing_item.get_untracked().is_some() {
            return;
        }
        let Some(canvas) = canvas_ref.get_untracked() else {
            return;
        };
        let _ = canvas.focus();
        let Some(button) = PointerButton::from_dom(ev.button()) else {
            return;
        };
        if button == PointerButton::Secondary {
            ev.prevent_default();
        }
        let p = pointer_position(&canvas, &ev);
        store.update(|s| {
            s.pointer_down_at(p, button);
        });
    };

    let on_mouse_move = move |ev: web_sys::MouseEvent| {
        let Some(canvas) = canvas_ref.get_untracked() else {
            return;
        };
        let p = pointer_position(&canvas, &ev);
        store.maybe_update(|s| s.pointer_move(p));
        set_cursor_style.set(store.with_untracked(|s| s.hover_cursor(p)));
    };

    let on_mouse_up = move |_ev: web_sys::MouseEvent| {
        if store.with_untracked(|s| !s.interaction().is_idle()) {
            store.update(|s| {
                s.pointer_up();
            });
        }
    };

    let on_wheel = move |ev: web_sys::WheelEvent| {
        ev.prevent_default();
        let Some(canvas) = canvas_ref.get_untracked() else {
            return;
        };
        let p = pointer_position(&canvas, &ev);
        let zoomed = store
            .try_maybe_update(|s| {
                let changed = s.wheel(p, ev.delta_y());
                (changed, changed)
            })
            .unwrap_or(false);
        if !zoomed {
            return;
        }

        wheel_seq.update_value(|n| *n += 1);
        let seq = wheel_seq.get_value();
        spawn_local(async move {
            TimeoutFuture::new(WHEEL_SETTLE_MS).await;
            if wheel_seq.get_value() == seq {
                store.maybe_update(|s| s.commit_if_changed());
            }
        });
    };

    let on_double_click = move |ev: web_sys::MouseEvent| {
        let Some(canvas) = canvas_ref.get_untracked() else {
            return;
        };
        let p = pointer_position(&canvas, &ev);
        match store.with_untracked(|s| s.hit_test(p)) {
            HitTarget::Item(id) => {
                let kind = store.with_untracked(|s| s.item(&id).map(|i| i.kind.clone()));
                match kind {
                    Some(ItemKind::Image(_)) => ctx.image_modal.set(Some(ImageModalState { target: Some(id) })),
                    Some(kind) if kind.editable_text().is_some() => ctx.editing_item.set(Some(id)),
                    _ => {}
                }
            }
            HitTarget::Background => {
                let at = store.with_untracked(|s| s.viewport().to_canvas(p));
                let (w, h) = ItemKind::defaults(ItemType::StickyNote).default_size();
                let added = store.try_update(|s| {
                    let id = s.add_item(ItemType::StickyNote, ItemOverrides::at(at.x - w / 2.0, at.y - h / 2.0));
                    if let Ok(id) = &id {
                        s.select(Some(id));
                    }
                    id
                });
                if let Some(Ok(id)) = added {
                    ctx.editing_item.set(Some(id));
                }
            }
            HitTarget::ResizeHandle(..) => {}
        }
    };

    let on_keydown = move |ev: web_sys::KeyboardEvent| {
        if ctx.editing_item.get_untracked().is_some() {
            return;
        }
        let key = ev.key();
        let modifier = ev.ctrl_key() || ev.meta_key();
        let selected = store.with_untracked(|s| s.selected().map(str::to_string));

        match key.as_str() {
            "z" | "Z" if modifier => {
                ev.prevent_default();
                if ev.shift_key() {
                    store.maybe_update(|s| s.redo());
                } else {
                    store.maybe_update(|s| s.undo());
                }
            }
            "y" | "Y" if modifier => {
                ev.prevent_default();
                store.maybe_update(|s| s.redo());
            }
            "d" | "D" if modifier => {
                ev.prevent_default();
                if let Some(id) = selected {
                    store.update(|s| {
                        match s.duplicate_item(&id) {
                            Ok(copy) => {
                                s.select(Some(&copy));
                            }
                            Err(e) => log::warn!("canvas: duplicate failed: {}", e),
                        }
                    });
                }
            }
            "Backspace" | "Delete" => {
                if let Some(id) = selected {
                    store.update(|s| {
                        if let Err(e) = s.remove_item(&id) {
                            log::warn!("canvas: delete failed: {}", e);
                        }
                    });
                }
            }
            "]" => {
                if let Some(id) = selected {
                    store.update(|s| {
                        if let Err(e) = s.bring_to_front(&id) {
                            log::warn!("canvas: bring to front failed: {}", e);
                        }
                    });
                }
            }
            "+" | "=" => {
                let (w, h) = ctx.viewport_size();
                store.maybe_update(|s| s.zoom_button(ZoomDirection::In, w, h));
            }
            "-" | "_" => {
                let (w, h) = ctx.viewport_size();
                store.maybe_update(|s| s.zoom_button(ZoomDirection::Out, w, h));
            }
            "Escape" => {
                store.update(|s| {
                    s.select(None);
                });
                ctx.editing_item.set(None);
                ctx.image_modal.set(None);
                ctx.export_open.set(false);
            }
            _ => {}
        }
    };

    view! {
        <div style="width: 100vw; height: 100vh; overflow: hidden; background: #f8fafc; position: relative; \
                    font-family: Inter, system-ui, sans-serif;">
            <canvas
                node_ref=canvas_ref
                tabindex="0"
                style=move || format!("width: 100%; height: 100%; display: block; cursor: {}; outline: none;", cursor_style.get())
                on:mousedown=on_mouse_down
                on:mousemove=on_mouse_move
                on:mouseup=on_mouse_up
                on:mouseleave=on_mouse_up
                on:wheel=on_wheel
                on:dblclick=on_double_click
                on:keydown=on_keydown
                on:contextmenu=move |ev: web_sys::MouseEvent| ev.prevent_default()
            />
            <ItemEditor />
            <Toolbar />
            <PropertyPanel />
            <ContentPanel />
            <ImageModal />
            <ExportModal />
            <div style="position: fixed; bottom: 12px; left: 12px; color: #6b7280; font-size: 11px;">
                {move || format!("{:.0}%", store.with(|s| s.viewport().zoom) * 100.0)}
                "  ·  dbl-click add/edit  ·  right-drag pan  ·  wheel zoom  ·  ctrl+z / ctrl+shift+z  ·  del delete"
            </div>
        </div>
    }
}

use crate::app::{CanvasCtx, ImageModalState};
use crate::item::{ItemKind, ItemType};
use crate::viewport::ZoomDirection;
use leptos::prelude::*;

const BUTTON: &str = "background: #ffffff; color: #1f2937; border: 1px solid #d1d5db; border-radius: 6px; \
                      padding: 6px 10px; cursor: pointer; font-family: inherit; font-size: 12px;";
const DIVIDER: &str = "width: 1px; align-self: stretch; background: #e5e7eb; margin: 0 4px;";

/// Item types offered as "add" buttons. Images go through the generation
/// modal and history items through the content panel.
const ADDABLE: [ItemType; 10] = [
    ItemType::StickyNote,
    ItemType::Text,
    ItemType::Shape,
    ItemType::MindMapNode,
    ItemType::KanbanCard,
    ItemType::Table,
    ItemType::Chart,
    ItemType::Connector,
    ItemType::Frame,
    ItemType::Comment,
];

#[component]
pub fn Toolbar() -> impl IntoView {
    let ctx = expect_context::<CanvasCtx>();
    let store = ctx.store;

    let can_undo = move || store.with(|s| s.history().can_undo());
    let can_redo = move || store.with(|s| s.history().can_redo());
    let has_selection = move || store.with(|s| s.selected().is_some());
    let is_empty = move || store.with(|s| s.items().is_empty());

    let with_selected = move |f: fn(&mut crate::store::CanvasStore, &str)| {
        if let Some(id) = store.with_untracked(|s| s.selected().map(str::to_string)) {
            store.update(|s| f(s, &id));
        }
    };

    let zoom = move |direction: ZoomDirection| {
        let (w, h) = ctx.viewport_size();
        store.maybe_update(|s| s.zoom_button(direction, w, h));
    };

    let add_buttons = ADDABLE
        .into_iter()
        .map(|item_type| {
            view! {
                <button
                    style=BUTTON
                    title=format!("Add {}", item_type.label().to_lowercase())
                    on:click=move |_| {
                        ctx.add_centered(ItemKind::defaults(item_type));
                    }
                >
                    {item_type.label()}
                </button>
            }
        })
        .collect_view();

    view! {
        <div style="position: fixed; top: 12px; left: 50%; transform: translateX(-50%); \
                    display: flex; flex-wrap: wrap; gap: 4px; max-width: 90vw; padding: 8px; \
                    background: rgba(255,255,255,0.95); border: 1px solid #e5e7eb; border-radius: 10px; \
                    box-shadow: 0 4px 16px rgba(15,23,42,0.08); z-index: 100;">
            {add_buttons}
            <button
                style=BUTTON
                on:click=move |_| ctx.image_modal.set(Some(ImageModalState::default()))
            >
                "Generate image"
            </button>
            <div style=DIVIDER />
            <button style=BUTTON disabled=move || !can_undo() on:click=move |_| store.maybe_update(|s| s.undo())>
                "Undo"
            </button>
            <button style=BUTTON disabled=move || !can_redo() on:click=move |_| store.maybe_update(|s| s.redo())>
                "Redo"
            </button>
            <div style=DIVIDER />
            <button style=BUTTON on:click=move |_| zoom(ZoomDirection::Out)>"−"</button>
            <button style=BUTTON on:click=move |_| { store.maybe_update(|s| s.reset_view()); }>"Reset view"</button>
            <button style=BUTTON on:click=move |_| zoom(ZoomDirection::In)>"+"</button>
            <div style=DIVIDER />
            <button
                style=BUTTON
                disabled=move || !has_selection()
                on:click=move |_| with_selected(|s, id| {
                    match s.duplicate_item(id) {
                        Ok(copy) => {
                            s.select(Some(&copy));
                        }
                        Err(e) => log::warn!("canvas: duplicate failed: {}", e),
                    }
                })
            >
                "Duplicate"
            </button>
            <button
                style=BUTTON
                disabled=move || !has_selection()
                on:click=move |_| with_selected(|s, id| {
                    if let Err(e) = s.bring_to_front(id) {
                        log::warn!("canvas: bring to front failed: {}", e);
                    }
                })
            >
                "Bring to front"
            </button>
            <button
                style=BUTTON
                disabled=move || !has_selection()
                on:click=move |_| {
                    if let Some(id) = store.with_untracked(|s| s.selected().map(str::to_string)) {
                        if ctx.editing_item.get_untracked().as_deref() == Some(id.as_str()) {
                            ctx.editing_item.set(None);
                        }
                        store.update(|s| {
                            if let Err(e) = s.remove_item(&id) {
                                log::warn!("canvas: delete failed: {}", e);
                            }
                        });
                    }
                }
            >
                "Delete"
            </button>
            <button
                style=BUTTON
                disabled=is_empty
                on:click=move |_| {
                    ctx.editing_item.set(None);
                    store.maybe_update(|s| s.clear());
                }
            >
                "Clear"
            </button>
            <div style=DIVIDER />
            <button style=BUTTON on:click=move |_| ctx.export_open.set(true)>"Export"</button>
        </div>
    }
}

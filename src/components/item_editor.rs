use crate::app::CanvasCtx;
use crate::item::ItemPatch;
use leptos::prelude::*;
use wasm_bindgen::JsCast;

fn commit_text(ctx: CanvasCtx, item_id: &str, ev: &web_sys::Event) {
    let Some(textarea) = ev
        .target()
        .and_then(|t| t.dyn_into::<web_sys::HtmlTextAreaElement>().ok())
    else {
        return;
    };
    let new_text = textarea.value();
    let unchanged = ctx.store.with_untracked(|s| {
        s.item(item_id)
            .and_then(|i| i.kind.editable_text())
            .map(|current| current == new_text)
            .unwrap_or(true)
    });
    if !unchanged {
        ctx.store.update(|s| {
            if let Err(e) = s.update_item(item_id, ItemPatch::Content(new_text)) {
                log::warn!("editor: {}", e);
            }
        });
    }
}

/// Text overlay positioned over the item being edited.
#[component]
pub fn ItemEditor() -> impl IntoView {
    let ctx = expect_context::<CanvasCtx>();

    move || {
        let item_id = ctx.editing_item.get()?;
        let (bounds, zoom, initial_text, font_size) = ctx.store.with(|s| {
            let item = s.item(&item_id)?;
            let text = item.kind.editable_text()?.to_string();
            let viewport = s.viewport();
            let origin = viewport.to_screen(item.position());
            let (w, h) = item.size();
            let font = item.kind.text().map(|t| t.style.font_size).unwrap_or(14.0);
            Some(((origin.x, origin.y, w * viewport.zoom, h * viewport.zoom), viewport.zoom, text, font))
        })?;
        let (screen_x, screen_y, screen_w, screen_h) = bounds;
        let font_px = (font_size * zoom).max(8.0);

        let id_for_blur = item_id.clone();
        let on_blur = move |ev: web_sys::FocusEvent| {
            if ctx.editing_item.get_untracked().as_deref() == Some(id_for_blur.as_str()) {
                commit_text(ctx, &id_for_blur, &ev);
                ctx.editing_item.set(None);
            }
        };

        let id_for_keydown = item_id.clone();
        let on_keydown = move |ev: web_sys::KeyboardEvent| {
            ev.stop_propagation();
            let save = ev.key() == "Escape" || (ev.key() == "Enter" && (ev.ctrl_key() || ev.meta_key()));
            if save {
                ev.prevent_default();
                commit_text(ctx, &id_for_keydown, &ev);
                ctx.editing_item.set(None);
            }
        };

        Some(view! {
            <textarea
                autofocus=true
                style=format!(
                    "position: absolute; left: {}px; top: {}px; width: {}px; height: {}px; \
                     font-size: {}px; background: rgba(255,255,255,0.96); resize: none; \
                     color: #111827; border: 2px solid #6366f1; border-radius: 6px; outline: none; \
                     box-sizing: border-box; font-family: inherit; padding: 8px; z-index: 50;",
                    screen_x, screen_y, screen_w.max(60.0), screen_h.max(32.0), font_px
                )
                on:blur=on_blur
                on:keydown=on_keydown
            >{initial_text}</textarea>
        })
    }
}

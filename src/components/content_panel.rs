use crate::app::CanvasCtx;
use crate::content::ContentEntry;
use crate::item::{HistoryReference, ItemKind};
use leptos::prelude::*;

const BUTTON: &str = "background: transparent; color: #4f46e5; border: 1px solid #c7d2fe; border-radius: 4px; \
                      padding: 2px 8px; cursor: pointer; font-family: inherit; font-size: 11px;";

fn now_iso() -> String {
    js_sys::Date::new_0().to_iso_string().into()
}

/// Generated-content list; entries can be placed on the canvas as
/// `historyItem` cards.
#[component]
pub fn ContentPanel() -> impl IntoView {
    let ctx = expect_context::<CanvasCtx>();
    let (open, set_open) = signal(false);
    let (draft_title, set_draft_title) = signal(String::new());
    let (draft_body, set_draft_body) = signal(String::new());

    let add_entry = move |_: web_sys::MouseEvent| {
        let title = draft_title.get_untracked().trim().to_string();
        let body = draft_body.get_untracked();
        if title.is_empty() && body.trim().is_empty() {
            return;
        }
        ctx.content.update(|c| {
            c.push(ContentEntry {
                id: uuid::Uuid::new_v4().to_string(),
                title: if title.is_empty() { "Untitled".to_string() } else { title },
                body,
                platform: "canvas".to_string(),
                created_at: now_iso(),
            })
        });
        set_draft_title.set(String::new());
        set_draft_body.set(String::new());
    };

    let entries = move || {
        let list = ctx.content.with(|c| c.entries().to_vec());
        if list.is_empty() {
            return view! { <div style="font-size: 12px; color: #9ca3af;">"Nothing generated yet"</div> }.into_any();
        }
        list.into_iter()
            .rev()
            .map(|entry| {
                let place_id = entry.id.clone();
                let delete_id = entry.id.clone();
                view! {
                    <div style="border-bottom: 1px solid #f3f4f6; padding: 6px 0;">
                        <div style="font-size: 12px; font-weight: 600;">{entry.title}</div>
                        <div style="font-size: 10px; color: #9ca3af;">{entry.platform} " · " {entry.created_at}</div>
                        <div style="display: flex; gap: 4px; margin-top: 4px;">
                            <button
                                style=BUTTON
                                on:click=move |_| {
                                    ctx.add_centered(ItemKind::HistoryItem(HistoryReference {
                                        history_item_id: place_id.clone(),
                                    }));
                                }
                            >
                                "Place"
                            </button>
                            <button style=BUTTON on:click=move |_| ctx.delete_content_entry(&delete_id)>
                                "Delete"
                            </button>
                        </div>
                    </div>
                }
            })
            .collect_view()
            .into_any()
    };

    view! {
        <div
            style="position: fixed; bottom: 36px; right: 12px; width: 260px; padding: 10px; \
                   background: rgba(255,255,255,0.97); border: 1px solid #e5e7eb; border-radius: 10px; \
                   box-shadow: 0 4px 16px rgba(15,23,42,0.08); z-index: 80; font-size: 12px;"
            on:mousedown=move |ev: web_sys::MouseEvent| ev.stop_propagation()
        >
            <div
                style="display: flex; justify-content: space-between; cursor: pointer; font-weight: 600;"
                on:click=move |_| set_open.update(|o| *o = !*o)
            >
                "Content history"
                <span>{move || ctx.content.with(|c| c.entries().len())}</span>
            </div>
            <Show when=move || open.get()>
                <div style="max-height: 240px; overflow-y: auto; margin: 8px 0;">{entries}</div>
                <input
                    type="text"
                    placeholder="Title"
                    style="width: 100%; box-sizing: border-box; margin-bottom: 4px; font-size: 12px;"
                    prop:value=move || draft_title.get()
                    on:input=move |ev| set_draft_title.set(event_target_value(&ev))
                />
                <textarea
                    placeholder="Body"
                    style="width: 100%; box-sizing: border-box; height: 60px; font-size: 12px; resize: vertical;"
                    prop:value=move || draft_body.get()
                    on:input=move |ev| set_draft_body.set(event_target_value(&ev))
                />
                <button style=BUTTON on:click=add_entry>"Add entry"</button>
            </Show>
        </div>
    }
}

use crate::app::CanvasCtx;
use crate::export::{render_html, to_markdown};
use leptos::prelude::*;

/// Markdown export of the whole canvas, previewed as HTML.
#[component]
pub fn ExportModal() -> impl IntoView {
    let ctx = expect_context::<CanvasCtx>();

    let markdown = Memo::new(move |_| {
        if !ctx.export_open.get() {
            return String::new();
        }
        ctx.store.with(|s| ctx.content.with(|c| to_markdown(s.items(), c)))
    });

    view! {
        <Show when=move || ctx.export_open.get()>
            <div
                style="position: fixed; inset: 0; background: rgba(15,23,42,0.45); \
                       display: flex; align-items: center; justify-content: center; z-index: 1000;"
                on:click=move |_| ctx.export_open.set(false)
            >
                <div
                    style="width: 90vw; max-width: 760px; height: 80vh; background: #ffffff; \
                           border-radius: 12px; padding: 24px; display: flex; flex-direction: column; \
                           font-size: 14px; line-height: 1.6; color: #111827; \
                           box-shadow: 0 20px 50px rgba(15,23,42,0.25);"
                    on:click=move |ev: web_sys::MouseEvent| ev.stop_propagation()
                    on:mousedown=move |ev: web_sys::MouseEvent| ev.stop_propagation()
                >
                    <div
                        style="margin-bottom: 16px; padding-bottom: 12px; border-bottom: 1px solid #e5e7eb; \
                               display: flex; justify-content: space-between; align-items: center; gap: 8px;"
                    >
                        <span style="font-weight: 600;">"Export"</span>
                        <div style="display: flex; gap: 8px;">
                            <a
                                style="background: #4f46e5; color: #ffffff; border-radius: 6px; padding: 6px 14px; \
                                       text-decoration: none; font-size: 12px; font-weight: 600;"
                                download="canvas.md"
                                href=move || {
                                    let encoded: String = js_sys::encode_uri_component(&markdown.get()).into();
                                    format!("data:text/markdown;charset=utf-8,{}", encoded)
                                }
                            >
                                "Download .md"
                            </a>
                            <button
                                style="background: transparent; border: 1px solid #d1d5db; border-radius: 6px; \
                                       padding: 6px 14px; cursor: pointer; font-size: 12px;"
                                on:click=move |_| ctx.export_open.set(false)
                            >
                                "Close"
                            </button>
                        </div>
                    </div>
                    <div style="flex: 1; overflow-y: auto; min-height: 0;">
                        {move || {
                            let md = markdown.get();
                            if md.is_empty() {
                                view! { <p style="color: #9ca3af;">"The canvas has nothing to export yet."</p> }.into_any()
                            } else {
                                view! { <div inner_html=render_html(&md) /> }.into_any()
                            }
                        }}
                    </div>
                </div>
            </div>
        </Show>
    }
}

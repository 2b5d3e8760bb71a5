use crate::app::CanvasCtx;
use crate::generation::{AspectRatio, ImageGenerator, ImageRequest, UnconfiguredGenerator};
use leptos::prelude::*;
use leptos::task::spawn_local;

#[component]
pub fn ImageModal() -> impl IntoView {
    let ctx = expect_context::<CanvasCtx>();
    let store = ctx.store;
    let (prompt, set_prompt) = signal(String::new());
    let (negative, set_negative) = signal(String::new());
    let (aspect, set_aspect) = signal(AspectRatio::default());
    let (busy, set_busy) = signal(false);
    let (error, set_error) = signal(None::<String>);

    let close = move || {
        store.update_untracked(|s| s.cancel_image_requests());
        set_busy.set(false);
        set_error.set(None);
        ctx.image_modal.set(None);
    };

    let generate = move |_: web_sys::MouseEvent| {
        let text = prompt.get_untracked().trim().to_string();
        if text.is_empty() {
            set_error.set(Some("Describe the image first".to_string()));
            return;
        }
        let target = ctx.image_modal.get_untracked().and_then(|m| m.target);
        let negative_prompt = Some(negative.get_untracked().trim().to_string()).filter(|s| !s.is_empty());
        let request = ImageRequest {
            prompt: text,
            negative_prompt,
            aspect_ratio: aspect.get_untracked(),
        };
        let Some(ticket) = store.try_update_untracked(|s| s.begin_image_request()) else {
            return;
        };
        set_busy.set(true);
        set_error.set(None);

        spawn_local(async move {
            let result = UnconfiguredGenerator.generate(request.clone()).await;
            let outcome = match result {
                Ok(image) => store
                    .try_update(|s| s.apply_generated_image(ticket, &request, target.as_deref(), image))
                    .map(|r| r.map(|_| ())),
                Err(e) => Some(Err(e)),
            };
            // A superseded or cancelled request has nothing left to report.
            if !store.with_untracked(|s| s.is_current_image_request(ticket)) {
                return;
            }
            set_busy.set(false);
            match outcome {
                Some(Ok(())) => {
                    ctx.image_modal.set(None);
                    set_prompt.set(String::new());
                    set_negative.set(String::new());
                }
                Some(Err(e)) => {
                    log::warn!("generation: {}", e);
                    set_error.set(Some(e.to_string()));
                }
                None => {}
            }
        });
    };

    let ratio_options = move || {
        AspectRatio::ALL
            .into_iter()
            .map(|ratio| {
                view! {
                    <option value=ratio.as_str() selected=move || aspect.get() == ratio>{ratio.as_str()}</option>
                }
            })
            .collect_view()
    };

    view! {
        <Show when=move || ctx.image_modal.with(Option::is_some)>
            <div
                style="position: fixed; inset: 0; background: rgba(15,23,42,0.45); \
                       display: flex; align-items: center; justify-content: center; z-index: 1000;"
                on:click=move |_| close()
            >
                <div
                    style="width: 420px; background: #ffffff; border-radius: 12px; padding: 20px; \
                           display: flex; flex-direction: column; gap: 10px; font-size: 13px; \
                           box-shadow: 0 20px 50px rgba(15,23,42,0.25);"
                    on:click=move |ev: web_sys::MouseEvent| ev.stop_propagation()
                    on:mousedown=move |ev: web_sys::MouseEvent| ev.stop_propagation()
                    on:keydown=move |ev: web_sys::KeyboardEvent| ev.stop_propagation()
                >
                    <div style="font-weight: 600; font-size: 15px;">
                        {move || {
                            if ctx.image_modal.with(|m| m.as_ref().and_then(|m| m.target.as_ref()).is_some()) {
                                "Regenerate image"
                            } else {
                                "Generate image"
                            }
                        }}
                    </div>
                    <textarea
                        placeholder="Prompt"
                        style="height: 80px; resize: vertical; font-family: inherit; padding: 6px;"
                        prop:value=move || prompt.get()
                        on:input=move |ev| set_prompt.set(event_target_value(&ev))
                    />
                    <input
                        type="text"
                        placeholder="Negative prompt (optional)"
                        style="font-family: inherit; padding: 6px;"
                        prop:value=move || negative.get()
                        on:input=move |ev| set_negative.set(event_target_value(&ev))
                    />
                    <label style="display: flex; gap: 8px; align-items: center;">
                        "Aspect ratio"
                        <select on:change=move |ev| {
                            if let Some(ratio) = AspectRatio::parse(&event_target_value(&ev)) {
                                set_aspect.set(ratio);
                            }
                        }>
                            {ratio_options}
                        </select>
                    </label>
                    {move || error.get().map(|e| view! { <div style="color: #b91c1c; font-size: 12px;">{e}</div> })}
                    <div style="display: flex; justify-content: flex-end; gap: 8px;">
                        <button
                            style="background: transparent; border: 1px solid #d1d5db; border-radius: 6px; \
                                   padding: 6px 14px; cursor: pointer;"
                            on:click=move |_| close()
                        >
                            "Cancel"
                        </button>
                        <button
                            style="background: #4f46e5; color: #ffffff; border: none; border-radius: 6px; \
                                   padding: 6px 14px; cursor: pointer; font-weight: 600;"
                            disabled=move || busy.get()
                            on:click=generate
                        >
                            {move || if busy.get() { "Generating…" } else { "Generate" }}
                        </button>
                    </div>
                </div>
            </div>
        </Show>
    }
}

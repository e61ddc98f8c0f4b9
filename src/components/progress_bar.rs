use leptos::*;

/// Loading banner for a case: phase label plus a 0–100 bar while the
/// pipeline runs, replaced by an explicit failure message if any stage
/// errors out. Hidden once the scene is built.
#[component]
pub fn ProgressBar(
    phase_label: ReadSignal<&'static str>,
    percent: ReadSignal<u8>,
    error: ReadSignal<Option<String>>,
    built: ReadSignal<bool>,
) -> impl IntoView {
    view! {
        <Show when=move || !built.get() || error.get().is_some()>
            {move || match error.get() {
                Some(message) => view! {
                    <div class="load-error" role="alert">
                        <p>"Could not load this case: " {message}</p>
                        <p class="hint">"Reload the page to try again."</p>
                    </div>
                }
                .into_view(),
                None => view! {
                    <div class="load-progress" attr:data-percent=move || percent.get()>
                        <span class="phase">{move || phase_label.get()}</span>
                        <div class="bar">
                            <div
                                class="bar-fill"
                                style:width=move || format!("{}%", percent.get())
                            ></div>
                        </div>
                        <span class="value">{move || format!("{}%", percent.get())}</span>
                    </div>
                }
                .into_view(),
            }}
        </Show>
    }
}

use leptos::*;

use crate::scene::ViewMode;

#[component]
pub fn ModeToggle(mode: ReadSignal<ViewMode>, on_select: Callback<ViewMode>) -> impl IntoView {
    let button = move |target: ViewMode, label: &'static str| {
        view! {
            <button
                class:active=move || mode.get() == target
                on:click=move |_| on_select.call(target)
            >
                {label}
            </button>
        }
    };

    view! {
        <div class="mode-toggle">
            {button(ViewMode::FullField, "Full field")}
            {button(ViewMode::Planes, "Slice planes")}
            {button(ViewMode::Streams, "Streamlines")}
        </div>
    }
}

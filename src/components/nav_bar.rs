use leptos::*;
use leptos_router::{use_location, A};

use crate::ThemeContext;

#[component]
pub fn NavBar() -> impl IntoView {
    let ThemeContext { theme, set_theme } = expect_context::<ThemeContext>();
    let location = use_location();
    let pathname = move || location.pathname.get();

    let link_class = move |href: &'static str| {
        let current = pathname();
        if current == href || (href != "/" && current.starts_with(href)) {
            "nav-link active"
        } else {
            "nav-link"
        }
    };

    view! {
        <nav class="site-nav">
            <div class="site-nav-inner">
                <A href="/" class="nav-brand">"romview"</A>
                <div class="nav-links">
                    <A href="/" class=move || link_class("/")>"Cases"</A>
                    <A href="/about" class=move || link_class("/about")>"About"</A>
                    <button
                        class="theme-toggle"
                        on:click=move |_| set_theme.set(theme.get().toggled())
                    >
                        {move || if theme.get().is_dark() { "Light mode" } else { "Dark mode" }}
                    </button>
                </div>
            </div>
        </nav>
    }
}

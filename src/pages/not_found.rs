use leptos::*;
use leptos_router::A;

#[component]
pub fn NotFoundPage() -> impl IntoView {
    view! {
        <main class="container about-page">
            <header>
                <h1>"404"</h1>
                <p class="tagline">"No such page or case"</p>
            </header>

            <nav class="back-nav">
                <A href="/">"< Back to the cases"</A>
            </nav>
        </main>
    }
}

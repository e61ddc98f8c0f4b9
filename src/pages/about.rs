use leptos::*;
use leptos_router::A;

#[component]
pub fn AboutPage() -> impl IntoView {
    view! {
        <main class="container about-page">
            <header>
                <h1>"romview"</h1>
                <p class="tagline">"About this project"</p>
            </header>

            <nav class="back-nav">
                <A href="/">"< Back to the cases"</A>
            </nav>

            <section class="about-section">
                <h2>"What you are looking at"</h2>
                <p>
                    "Full computational fluid dynamics runs take hours on a cluster. The "
                    "cases here were solved ahead of time and compressed into small "
                    "reduced-order models: a handful of velocity, pressure, and eddy-viscosity "
                    "modes plus the projected operators that couple them. Recombining those "
                    "modes for a new inlet velocity or temperature takes milliseconds, which "
                    "is why the sliders feel instant."
                </p>
            </section>

            <section class="about-section">
                <h2>"How it works"</h2>
                <p>
                    "Everything runs client-side in your browser. Picking a case downloads "
                    "its dataset archive, decodes the mode matrices off the main thread, and "
                    "hands them to an in-browser solver. Dragging a slider re-solves the "
                    "small reduced system and redraws the field, slice planes, or "
                    "streamlines. No servers, no cookies; the only thing stored locally is "
                    "your theme and slider positions."
                </p>
                <p>
                    "Head back to the " <A href="/">"case list"</A> " to explore."
                </p>
            </section>

            <nav class="back-nav bottom">
                <A href="/">"< Back to the cases"</A>
            </nav>
        </main>
    }
}

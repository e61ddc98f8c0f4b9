pub mod cases;
pub mod components;
pub mod debounce;
pub mod fetch;
pub mod haptics;
pub mod pages;
pub mod rom;
pub mod scene;
pub mod storage;

use components::{CaseCatalog, CaseView, NavBar};
use leptos::*;
use leptos_router::*;
use pages::{AboutPage, NotFoundPage};
use storage::Theme;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

/// Theme signals shared through context: the navbar toggles, the case view
/// restyles its scene, and the root effect persists the choice.
#[derive(Clone, Copy)]
pub struct ThemeContext {
    pub theme: ReadSignal<Theme>,
    pub set_theme: WriteSignal<Theme>,
}

/// Workaround for Leptos 0.6 router not re-rendering on browser back/forward.
///
/// On `popstate`, the router updates its internal location signal but doesn't
/// always trigger the `<Routes>` component to re-evaluate which view to show.
/// Forcing a full reload re-initializes the WASM app at the correct URL; the
/// theme and slider positions survive via localStorage, and the active case's
/// native resources are torn down with the page.
fn setup_popstate_reload() {
    let closure = Closure::wrap(Box::new(move |_: web_sys::Event| {
        if let Some(window) = web_sys::window() {
            let _ = window.location().reload();
        }
    }) as Box<dyn Fn(web_sys::Event)>);

    if let Some(window) = web_sys::window() {
        let _ = window.add_event_listener_with_callback(
            "popstate",
            closure.as_ref().unchecked_ref(),
        );
    }
    closure.forget();
}

/// Root component with routing
#[component]
fn Root() -> impl IntoView {
    view! {
        <ErrorBoundary fallback=|errors| view! {
            <main class="container">
                <div class="error-container">
                    <h2>"Something went wrong"</h2>
                    <p>"The viewer hit an unrecoverable error. Reloading starts a fresh session."</p>
                    <ul>
                        {move || errors.get()
                            .into_iter()
                            .map(|(_, e)| view! { <li>{e.to_string()}</li> })
                            .collect_view()
                        }
                    </ul>
                    <button on:click=move |_| {
                        if let Some(window) = web_sys::window() {
                            let _ = window.location().reload();
                        }
                    }>"Reload"</button>
                </div>
            </main>
        }>
            <RootInner/>
        </ErrorBoundary>
    }
}

/// Inner root that initializes the theme and routes.
/// Wrapped by ErrorBoundary so initialization panics are caught.
#[component]
fn RootInner() -> impl IntoView {
    let (theme, set_theme) = create_signal(storage::load_theme());
    provide_context(ThemeContext { theme, set_theme });

    // Reflect the theme on the document and persist every change.
    create_effect(move |_| {
        let theme = theme.get();
        storage::apply_theme_class(theme);
        storage::save_theme(theme);
    });

    view! {
        <Router>
            <NavBar/>
            <Routes>
                <Route path="/" view=CaseCatalog/>
                <Route path="/case/:slug" view=CaseView/>
                <Route path="/about" view=AboutPage/>
                <Route path="/*" view=NotFoundPage/>
            </Routes>
        </Router>
    }
}

/// Mount the application to the DOM
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    setup_popstate_reload();
    mount_to_body(Root);
}

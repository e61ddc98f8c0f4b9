use leptos::*;
use leptos_router::A;

use crate::cases::{CaseDescriptor, CASES};
use crate::rom::events::Stabilization;

fn case_meta(case: &CaseDescriptor) -> String {
    let dims = if case.three_dimensional { "3-D" } else { "2-D" };
    let stab = match case.stabilization {
        Stabilization::Supremizer => "supremizer stabilization",
        Stabilization::Ppe => "pressure-Poisson stabilization",
    };
    format!("{dims} / {stab}")
}

/// Landing page: one card per case, linking into the viewer. Cases whose
/// dataset has not shipped yet are listed but not navigable.
#[component]
pub fn CaseCatalog() -> impl IntoView {
    view! {
        <main class="container catalog-page">
            <header>
                <h1>"romview"</h1>
                <p class="tagline">
                    "Explore precomputed reduced-order CFD results, entirely in your browser"
                </p>
            </header>

            <div class="case-grid">
                {CASES
                    .iter()
                    .map(|case| {
                        let title = if case.ready {
                            view! {
                                <A href=format!("/case/{}", case.slug) class="case-link">
                                    <h2>{case.title}</h2>
                                </A>
                            }
                            .into_view()
                        } else {
                            view! {
                                <h2>{case.title}</h2>
                                <span class="badge">"coming soon"</span>
                            }
                            .into_view()
                        };
                        view! {
                            <div class="case-card" class:pending=!case.ready>
                                {title}
                                <p class="case-meta">{case_meta(case)}</p>
                            </div>
                        }
                    })
                    .collect_view()}
            </div>
        </main>
    }
}

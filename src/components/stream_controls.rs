use leptos::*;

use crate::cases::CaseDescriptor;
use crate::debounce::Debouncer;
use crate::haptics::vibrate_tick;
use crate::rom::session::StreamSeed;

#[component]
fn SeedSlider(
    label: &'static str,
    min: f64,
    max: f64,
    step: f64,
    value: Signal<f64>,
    on_input: Callback<f64>,
) -> impl IntoView {
    view! {
        <div class="control-group">
            <label>{label} ": " {move || format!("{:.3}", value.get())}</label>
            <input
                type="range"
                min=min
                max=max
                step=step
                prop:value=move || value.get()
                on:input=move |ev| {
                    if let Ok(v) = event_target_value(&ev).parse::<f64>() {
                        on_input.call(v);
                    }
                }
            />
        </div>
    }
}

/// Streamline probe panel: seed sphere position and size plus propagation
/// length. Every slider funnels the whole seed through one debouncer, since
/// each change invalidates the same traced surface.
#[component]
pub fn StreamControls(
    case: &'static CaseDescriptor,
    seed: ReadSignal<StreamSeed>,
    set_seed: WriteSignal<StreamSeed>,
    debounce: Debouncer<StreamSeed>,
) -> impl IntoView {
    // Seed position ranges over the same extent as the slice planes; the
    // radius and propagation scales derive from that extent.
    let extent = (case.plane_x.max - case.plane_x.min)
        .max(case.plane_y.max - case.plane_y.min)
        .max(case.plane_z.max - case.plane_z.min);

    let update = move |debounce: Debouncer<StreamSeed>, apply: fn(&mut StreamSeed, f64)| {
        Callback::new(move |v: f64| {
            let mut next = seed.get_untracked();
            apply(&mut next, v);
            set_seed.set(next);
            vibrate_tick();
            debounce.call(next);
        })
    };

    view! {
        <section class="control-panel">
            <h3>"Streamlines"</h3>
            <SeedSlider
                label="Seed x"
                min=case.plane_x.min
                max=case.plane_x.max
                step=case.plane_x.step
                value=Signal::derive(move || seed.get().x)
                on_input=update(debounce.clone(), |s, v| s.x = v)
            />
            <SeedSlider
                label="Seed y"
                min=case.plane_y.min
                max=case.plane_y.max
                step=case.plane_y.step
                value=Signal::derive(move || seed.get().y)
                on_input=update(debounce.clone(), |s, v| s.y = v)
            />
            <SeedSlider
                label="Seed z"
                min=case.plane_z.min
                max=case.plane_z.max
                step=case.plane_z.step
                value=Signal::derive(move || seed.get().z)
                on_input=update(debounce.clone(), |s, v| s.z = v)
            />
            <SeedSlider
                label="Seed radius"
                min=extent / 200.0
                max=extent / 2.0
                step=extent / 200.0
                value=Signal::derive(move || seed.get().radius)
                on_input=update(debounce.clone(), |s, v| s.radius = v)
            />
            <SeedSlider
                label="Propagation"
                min=extent / 20.0
                max=extent * 10.0
                step=extent / 100.0
                value=Signal::derive(move || seed.get().propagation)
                on_input=update(debounce, |s, v| s.propagation = v)
            />
        </section>
    }
}

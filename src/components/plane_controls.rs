use leptos::*;

use crate::cases::{CaseDescriptor, ParamRange};
use crate::debounce::Debouncer;
use crate::haptics::vibrate_tick;
use crate::scene::Axis;

/// One slice plane: a visibility checkbox (applied immediately) and an
/// offset slider (debounced, since drags arrive as event bursts).
#[component]
fn PlaneRow(
    axis: Axis,
    label: &'static str,
    range: ParamRange,
    offset: ReadSignal<f64>,
    set_offset: WriteSignal<f64>,
    shown: ReadSignal<bool>,
    set_shown: WriteSignal<bool>,
    debounce: Debouncer<(Axis, f64)>,
    on_toggle: Callback<(Axis, bool)>,
) -> impl IntoView {
    view! {
        <div class="control-group plane-row">
            <label>
                <input
                    type="checkbox"
                    prop:checked=move || shown.get()
                    on:change=move |ev| {
                        let checked = event_target_checked(&ev);
                        set_shown.set(checked);
                        on_toggle.call((axis, checked));
                    }
                />
                {label} " plane: " {move || format!("{:+.3}", offset.get())}
            </label>
            <input
                type="range"
                min=range.min
                max=range.max
                step=range.step
                prop:value=move || offset.get()
                on:input=move |ev| {
                    if let Ok(v) = event_target_value(&ev).parse::<f64>() {
                        set_offset.set(range.clamp(v));
                        vibrate_tick();
                        debounce.call((axis, range.clamp(v)));
                    }
                }
            />
        </div>
    }
}

#[component]
pub fn PlaneControls(
    case: &'static CaseDescriptor,
    offset_x: ReadSignal<f64>,
    set_offset_x: WriteSignal<f64>,
    offset_y: ReadSignal<f64>,
    set_offset_y: WriteSignal<f64>,
    offset_z: ReadSignal<f64>,
    set_offset_z: WriteSignal<f64>,
    shown_x: ReadSignal<bool>,
    set_shown_x: WriteSignal<bool>,
    shown_y: ReadSignal<bool>,
    set_shown_y: WriteSignal<bool>,
    shown_z: ReadSignal<bool>,
    set_shown_z: WriteSignal<bool>,
    debounce: Debouncer<(Axis, f64)>,
    on_toggle: Callback<(Axis, bool)>,
) -> impl IntoView {
    view! {
        <section class="control-panel">
            <h3>"Slice planes"</h3>
            <PlaneRow
                axis=Axis::X
                label="X"
                range=case.plane_x
                offset=offset_x
                set_offset=set_offset_x
                shown=shown_x
                set_shown=set_shown_x
                debounce=debounce.clone()
                on_toggle=on_toggle
            />
            <PlaneRow
                axis=Axis::Y
                label="Y"
                range=case.plane_y
                offset=offset_y
                set_offset=set_offset_y
                shown=shown_y
                set_shown=set_shown_y
                debounce=debounce.clone()
                on_toggle=on_toggle
            />
            <PlaneRow
                axis=Axis::Z
                label="Z"
                range=case.plane_z
                offset=offset_z
                set_offset=set_offset_z
                shown=shown_z
                set_shown=set_shown_z
                debounce=debounce
                on_toggle=on_toggle
            />
        </section>
    }
}

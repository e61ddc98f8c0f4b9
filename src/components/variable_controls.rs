use std::cell::RefCell;
use std::rc::Rc;

use leptos::*;

use crate::cases::{CaseDescriptor, ParamRange};
use crate::debounce::{Debouncer, StepperGate};
use crate::haptics::vibrate_tick;

fn precision(step: f64) -> usize {
    if step >= 1.0 {
        0
    } else if step >= 0.1 {
        1
    } else if step >= 0.01 {
        2
    } else {
        3
    }
}

/// One boundary parameter: a slider for drags plus -/+ steppers for exact
/// increments. Stepper presses go through the shared gate, so a press is
/// ignored until the previous one has been solved and drawn.
#[component]
fn ParamControl(
    label: &'static str,
    unit: &'static str,
    range: ParamRange,
    value: ReadSignal<f64>,
    set_value: WriteSignal<f64>,
    gate: Rc<RefCell<StepperGate>>,
    debounce: Debouncer<()>,
) -> impl IntoView {
    let prec = precision(range.step);

    let slide = {
        let debounce = debounce.clone();
        move |ev: web_sys::Event| {
            if let Ok(v) = event_target_value(&ev).parse::<f64>() {
                set_value.set(range.clamp(v));
                vibrate_tick();
                debounce.call(());
            }
        }
    };

    let press = Rc::new(move |delta: f64| {
        {
            let mut gate = gate.borrow_mut();
            if !gate.request() {
                return;
            }
            gate.begin();
        }
        set_value.set(range.clamp(value.get_untracked() + delta));
        vibrate_tick();
        debounce.call(());
    });
    let press_minus = Rc::clone(&press);

    view! {
        <div class="control-group">
            <label>
                {label} ": " {move || format!("{:.prec$} {unit}", value.get(), prec = prec)}
            </label>
            <div class="stepper-row">
                <button class="stepper" on:click=move |_| press_minus(-range.step)>"-"</button>
                <input
                    type="range"
                    min=range.min
                    max=range.max
                    step=range.step
                    prop:value=move || value.get()
                    on:input=slide
                />
                <button class="stepper" on:click=move |_| press(range.step)>"+"</button>
            </div>
        </div>
    }
}

/// Boundary-condition panel. Parameters whose range collapses to a single
/// value are fixed for the case and get no control. All inputs share one
/// debouncer, so a drag across several sliders still resolves to a single
/// solve.
#[component]
pub fn VariableControls(
    case: &'static CaseDescriptor,
    temperature: ReadSignal<f64>,
    set_temperature: WriteSignal<f64>,
    velocity_x: ReadSignal<f64>,
    set_velocity_x: WriteSignal<f64>,
    velocity_y: ReadSignal<f64>,
    set_velocity_y: WriteSignal<f64>,
    angle: ReadSignal<f64>,
    set_angle: WriteSignal<f64>,
    /// Owned by the case view, which returns it to `Idle` once the
    /// debounced apply has gone through.
    gate: Rc<RefCell<StepperGate>>,
    debounce: Debouncer<()>,
) -> impl IntoView {
    let adjustable = |range: &ParamRange| range.min < range.max;

    view! {
        <section class="control-panel">
            <h3>"Boundary conditions"</h3>
            {adjustable(&case.temperature)
                .then(|| view! {
                    <ParamControl
                        label="Temperature"
                        unit="°C"
                        range=case.temperature
                        value=temperature
                        set_value=set_temperature
                        gate=Rc::clone(&gate)
                        debounce=debounce.clone()
                    />
                })}
            {adjustable(&case.velocity_x)
                .then(|| view! {
                    <ParamControl
                        label="Inlet velocity x"
                        unit="m/s"
                        range=case.velocity_x
                        value=velocity_x
                        set_value=set_velocity_x
                        gate=Rc::clone(&gate)
                        debounce=debounce.clone()
                    />
                })}
            {adjustable(&case.velocity_y)
                .then(|| view! {
                    <ParamControl
                        label="Inlet velocity y"
                        unit="m/s"
                        range=case.velocity_y
                        value=velocity_y
                        set_value=set_velocity_y
                        gate=Rc::clone(&gate)
                        debounce=debounce.clone()
                    />
                })}
            {case.angle.map(|range| view! {
                <ParamControl
                    label="Inflow angle"
                    unit="deg"
                    range=range
                    value=angle
                    set_value=set_angle
                    gate=Rc::clone(&gate)
                    debounce=debounce.clone()
                />
            })}
        </section>
    }
}

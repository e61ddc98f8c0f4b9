use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::mpsc;
use futures::StreamExt;
use leptos::*;
use leptos_router::use_params_map;
use wasm_bindgen_futures::spawn_local;

use crate::cases::{self, CaseDescriptor};
use crate::components::{
    ModeToggle, PlaneControls, ProgressBar, StreamControls, VariableControls,
};
use crate::debounce::{Debouncer, StepperGate};
use crate::fetch::fetch_archive;
use crate::pages::NotFoundPage;
use crate::rom::basis::{AssemblyStatus, BasisAssembly};
use crate::rom::bindings::JsRomSolver;
use crate::rom::error::{RomError, RomResult};
use crate::rom::events::{Phase, Stabilization};
use crate::rom::pipeline;
use crate::rom::session::{build_session, BoundaryParams, RomSession, StreamSeed};
use crate::scene::{Axis, JsSceneRenderer, SceneController, ViewMode};
use crate::storage::{self, StoredCaseParams};
use crate::ThemeContext;

type SessionSlot = Rc<RefCell<Option<RomSession>>>;
type SceneSlot = Rc<RefCell<Option<SceneController<JsSceneRenderer>>>>;

/// Route entry point: resolves `:slug` against the catalog and mounts the
/// explorer for it.
#[component]
pub fn CaseView() -> impl IntoView {
    let params = use_params_map();
    let slug = params
        .with_untracked(|p| p.get("slug").cloned())
        .unwrap_or_default();

    match cases::find(&slug) {
        Some(case) if case.ready => view! { <CaseExplorer case=case/> }.into_view(),
        Some(case) => view! {
            <main class="container case-page">
                <h1>{case.title}</h1>
                <p class="tagline">"This dataset has not been published yet."</p>
            </main>
        }
        .into_view(),
        None => view! { <NotFoundPage/> }.into_view(),
    }
}

/// The live viewer for one case. Owns the whole chain: archive download,
/// decode pipeline, solver session, scene controller, and the debounced
/// control wiring. Everything is torn down on navigation via `on_cleanup`.
#[component]
fn CaseExplorer(case: &'static CaseDescriptor) -> impl IntoView {
    let ThemeContext { theme, .. } = expect_context::<ThemeContext>();

    let (phase_label, set_phase_label) = create_signal(Phase::Download.label());
    let (percent, set_percent) = create_signal(0u8);
    let (error, set_error) = create_signal(Option::<String>::None);
    let (built, set_built) = create_signal(false);

    // Boundary parameters start from the last visit when one is stored.
    let init = storage::load_case_params(case.slug)
        .map(|p| p.clamped(case))
        .unwrap_or(StoredCaseParams {
            temperature: case.temperature.initial,
            velocity_x: case.velocity_x.initial,
            velocity_y: case.velocity_y.initial,
            angle: case.angle.map(|range| range.initial),
        });
    let (temperature, set_temperature) = create_signal(init.temperature);
    let (velocity_x, set_velocity_x) = create_signal(init.velocity_x);
    let (velocity_y, set_velocity_y) = create_signal(init.velocity_y);
    let (angle, set_angle) = create_signal(init.angle.unwrap_or(0.0));

    let (mode, set_mode) = create_signal(ViewMode::FullField);
    let (offset_x, set_offset_x) = create_signal(case.plane_x.initial);
    let (offset_y, set_offset_y) = create_signal(case.plane_y.initial);
    let (offset_z, set_offset_z) = create_signal(case.plane_z.initial);
    let (shown_x, set_shown_x) = create_signal(true);
    let (shown_y, set_shown_y) = create_signal(true);
    let (shown_z, set_shown_z) = create_signal(true);
    let (seed, set_seed) = create_signal(case.seed);

    let session: SessionSlot = Rc::new(RefCell::new(None));
    let scene: SceneSlot = Rc::new(RefCell::new(None));

    let report = move |err: RomError| set_error.set(Some(err.to_string()));

    let current_params = move || BoundaryParams {
        velocity: [
            velocity_x.get_untracked(),
            velocity_y.get_untracked(),
            0.0,
        ],
        temperature: temperature.get_untracked(),
        angle: case.angle.map(|_| angle.get_untracked()),
    };

    create_effect(move |_| {
        storage::save_case_params(
            case.slug,
            &StoredCaseParams {
                temperature: temperature.get(),
                velocity_x: velocity_x.get(),
                velocity_y: velocity_y.get(),
                angle: case.angle.map(|_| angle.get()),
            },
        );
    });

    // Download, decode, and bring the session plus scene up. Runs once per
    // mount; any failure lands in the error signal and stops the chain.
    {
        let session = Rc::clone(&session);
        let scene = Rc::clone(&scene);
        spawn_local(async move {
            let bytes = match fetch_archive(case.archive_url, move |p| set_percent.set(p)).await {
                Ok(bytes) => bytes,
                Err(err) => return report(err),
            };

            set_phase_label.set(Phase::Decode.label());
            set_percent.set(0);

            let (tx, mut rx) = mpsc::unbounded();
            spawn_local(pipeline::run(bytes, case.stabilization, tx));

            let mut assembly = BasisAssembly::new(case.stabilization);
            while let Some(event) = rx.next().await {
                match assembly.apply(event) {
                    Ok(AssemblyStatus::Progress(phase, percent)) => {
                        set_phase_label.set(phase.label());
                        set_percent.set(percent);
                    }
                    Ok(AssemblyStatus::Pending) => {}
                    Ok(AssemblyStatus::Complete) => break,
                    Ok(AssemblyStatus::Failed(err)) | Err(err) => return report(err),
                }
            }
            if !assembly.is_complete() {
                return report(RomError::protocol("event stream ended before initialization"));
            }

            set_phase_label.set(Phase::SceneBuild.label());
            let solver = Box::new(JsRomSolver::create(matches!(
                case.stabilization,
                Stabilization::Supremizer
            )));
            let mut rom = match build_session(&assembly, solver, case.n_bc, case.viscosity) {
                Ok(rom) => rom,
                Err(err) => return report(err),
            };

            let mut controller = SceneController::new(
                JsSceneRenderer::attach("scene-view"),
                [case.plane_x.initial, case.plane_y.initial, case.plane_z.initial],
                case.seed,
            );
            controller.begin_loading();
            let Some(grid) = assembly.grid() else {
                return report(RomError::protocol("mesh missing after initialization"));
            };
            if let Err(err) = controller.build(&mut rom, grid, assembly.surface(), current_params())
            {
                return report(err);
            }
            if let Err(err) = controller.set_theme(theme.get_untracked()) {
                return report(err);
            }

            session.replace(Some(rom));
            scene.replace(Some(controller));
            set_percent.set(100);
            set_built.set(true);
        });
    }

    // Scene restyling follows the navbar toggle once the scene exists.
    {
        let scene = Rc::clone(&scene);
        create_effect(move |_| {
            let theme = theme.get();
            if let Some(controller) = scene.borrow_mut().as_mut() {
                if let Err(err) = controller.set_theme(theme) {
                    report(err);
                }
            }
        });
    }

    // Every control path funnels through here; a no-op before the scene is
    // built, an error report otherwise.
    let drive: Rc<
        dyn Fn(&dyn Fn(&mut SceneController<JsSceneRenderer>, &mut RomSession) -> RomResult<()>),
    > = {
        let session = Rc::clone(&session);
        let scene = Rc::clone(&scene);
        Rc::new(move |op| {
            let mut scene = scene.borrow_mut();
            let mut session = session.borrow_mut();
            if let (Some(scene), Some(session)) = (scene.as_mut(), session.as_mut()) {
                if let Err(err) = op(scene, session) {
                    report(err);
                }
            }
        })
    };

    let stepper_gate = Rc::new(RefCell::new(StepperGate::new()));
    let apply_variables = {
        let drive = Rc::clone(&drive);
        let gate = Rc::clone(&stepper_gate);
        Debouncer::new(case.debounce_ms, move |_: ()| {
            drive(&|scene, session| scene.apply(session, current_params()));
            gate.borrow_mut().finish();
        })
    };

    let move_plane = {
        let drive = Rc::clone(&drive);
        Debouncer::new(case.debounce_ms, move |(axis, offset): (Axis, f64)| {
            drive(&move |scene, session| scene.set_plane_offset(session, axis, offset));
        })
    };

    let move_seed = {
        let drive = Rc::clone(&drive);
        Debouncer::new(case.debounce_ms, move |seed: StreamSeed| {
            drive(&move |scene, session| scene.set_seed(session, seed));
        })
    };

    let toggle_plane = {
        let drive = Rc::clone(&drive);
        Callback::new(move |(axis, shown): (Axis, bool)| {
            drive(&move |scene, session| scene.set_plane_visible(session, axis, shown));
        })
    };

    let select_mode = {
        let drive = Rc::clone(&drive);
        Callback::new(move |next: ViewMode| {
            set_mode.set(next);
            drive(&move |scene, session| scene.set_mode(session, next));
        })
    };

    {
        let session = Rc::clone(&session);
        let scene = Rc::clone(&scene);
        on_cleanup(move || {
            if let Some(mut controller) = scene.borrow_mut().take() {
                controller.dispose();
            }
            if let Some(mut rom) = session.borrow_mut().take() {
                rom.dispose();
            }
        });
    }

    view! {
        <main class="container case-page">
            <header>
                <h1>{case.title}</h1>
            </header>

            <ProgressBar phase_label=phase_label percent=percent error=error built=built/>

            <div class="case-layout" class:hidden=move || !built.get()>
                <div id="scene-view" class="scene-view"></div>
                <aside class="case-controls">
                    <ModeToggle mode=mode on_select=select_mode/>
                    <VariableControls
                        case=case
                        temperature=temperature
                        set_temperature=set_temperature
                        velocity_x=velocity_x
                        set_velocity_x=set_velocity_x
                        velocity_y=velocity_y
                        set_velocity_y=set_velocity_y
                        angle=angle
                        set_angle=set_angle
                        gate=Rc::clone(&stepper_gate)
                        debounce=apply_variables.clone()
                    />
                    <Show when=move || mode.get() == ViewMode::Planes>
                        <PlaneControls
                            case=case
                            offset_x=offset_x
                            set_offset_x=set_offset_x
                            offset_y=offset_y
                            set_offset_y=set_offset_y
                            offset_z=offset_z
                            set_offset_z=set_offset_z
                            shown_x=shown_x
                            set_shown_x=set_shown_x
                            shown_y=shown_y
                            set_shown_y=set_shown_y
                            shown_z=shown_z
                            set_shown_z=set_shown_z
                            debounce=move_plane.clone()
                            on_toggle=toggle_plane
                        />
                    </Show>
                    <Show when=move || mode.get() == ViewMode::Streams>
                        <StreamControls
                            case=case
                            seed=seed
                            set_seed=set_seed
                            debounce=move_seed.clone()
                        />
                    </Show>
                </aside>
            </div>
        </main>
    }
}

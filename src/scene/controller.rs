use crate::rom::error::{RomError, RomResult};
use crate::rom::session::{BoundaryParams, RomSession, StreamSeed};
use crate::scene::renderer::{SceneRenderer, SurfaceKind, ALL_SURFACES};
use crate::storage::Theme;

/// Scene lifecycle. `Built` is only reached after the mesh is in the
/// renderer and an initial solve has populated at least one surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenePhase {
    Empty,
    Loading,
    Built,
}

/// Mutually exclusive view modes. Switching modes flips visibility but
/// keeps every surface's data alive, so switching back is cheap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    FullField,
    Planes,
    Streams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Union of scalar ranges: min of mins, max of maxes. `None` inputs (empty
/// surfaces) contribute nothing.
pub fn unified_range<I>(ranges: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = Option<(f64, f64)>>,
{
    ranges
        .into_iter()
        .flatten()
        .reduce(|(lo, hi), (min, max)| (lo.min(min), hi.max(max)))
}

fn slot(kind: SurfaceKind) -> usize {
    match kind {
        SurfaceKind::FullField => 0,
        SurfaceKind::PlaneX => 1,
        SurfaceKind::PlaneY => 2,
        SurfaceKind::PlaneZ => 3,
        SurfaceKind::Streamlines => 4,
    }
}

/// Owns the render view and decides what to recompute when inputs change.
///
/// All mutation paths funnel into [`SceneController::refresh`]: regenerate
/// what is stale, push one unified color range, then issue exactly one
/// render call. A partially updated scene is never presented.
pub struct SceneController<R: SceneRenderer> {
    renderer: Option<R>,
    phase: ScenePhase,
    mode: ViewMode,
    plane_offsets: [f64; 3],
    plane_visible: [bool; 3],
    seed: StreamSeed,
    /// Last pushed scalar range per surface; `None` until first generated.
    cached_range: [Option<Option<(f64, f64)>>; 5],
    dirty: [bool; 5],
    range: Option<(f64, f64)>,
}

impl<R: SceneRenderer> SceneController<R> {
    pub fn new(renderer: R, plane_offsets: [f64; 3], seed: StreamSeed) -> Self {
        SceneController {
            renderer: Some(renderer),
            phase: ScenePhase::Empty,
            mode: ViewMode::FullField,
            plane_offsets,
            plane_visible: [true, true, true],
            seed,
            cached_range: [None; 5],
            dirty: [false; 5],
            range: None,
        }
    }

    pub fn phase(&self) -> ScenePhase {
        self.phase
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn color_range(&self) -> Option<(f64, f64)> {
        self.range
    }

    pub fn begin_loading(&mut self) {
        if self.phase == ScenePhase::Empty {
            self.phase = ScenePhase::Loading;
        }
    }

    /// Construct geometry from the decoded meshes and draw the first field.
    pub fn build(
        &mut self,
        session: &mut RomSession,
        grid: &[u8],
        surface: Option<&[u8]>,
        params: BoundaryParams,
    ) -> RomResult<()> {
        if self.phase == ScenePhase::Built {
            return Err(RomError::Scene {
                what: "scene already built".into(),
            });
        }
        self.renderer_mut()?.build_scene(grid, surface)?;
        session.solve(params)?;
        self.dirty = [true; 5];
        self.refresh(session)?;
        self.phase = ScenePhase::Built;
        Ok(())
    }

    /// Entry point for boundary-parameter changes (the debounced slider
    /// path). Re-solves only when the parameter vector actually moved, then
    /// refreshes every visible surface from the new field.
    pub fn apply(&mut self, session: &mut RomSession, params: BoundaryParams) -> RomResult<()> {
        self.require_built()?;
        if session.last_params() != Some(params) {
            session.solve(params)?;
            self.dirty = [true; 5];
        }
        self.refresh(session)
    }

    pub fn set_mode(&mut self, session: &mut RomSession, mode: ViewMode) -> RomResult<()> {
        self.require_built()?;
        if self.mode == mode {
            return Ok(());
        }
        self.mode = mode;
        self.refresh(session)
    }

    pub fn set_plane_visible(
        &mut self,
        session: &mut RomSession,
        axis: Axis,
        visible: bool,
    ) -> RomResult<()> {
        self.require_built()?;
        self.plane_visible[axis as usize] = visible;
        self.refresh(session)
    }

    /// Move one slice plane. Only that plane's surface is stale.
    pub fn set_plane_offset(
        &mut self,
        session: &mut RomSession,
        axis: Axis,
        offset: f64,
    ) -> RomResult<()> {
        self.require_built()?;
        self.plane_offsets[axis as usize] = offset;
        self.dirty[slot(plane_kind(axis))] = true;
        self.refresh(session)
    }

    pub fn set_seed(&mut self, session: &mut RomSession, seed: StreamSeed) -> RomResult<()> {
        self.require_built()?;
        self.seed = seed;
        self.dirty[slot(SurfaceKind::Streamlines)] = true;
        self.refresh(session)
    }

    /// Colors and text styling only; geometry and field data are untouched.
    pub fn set_theme(&mut self, theme: Theme) -> RomResult<()> {
        let renderer = self.renderer_mut()?;
        renderer.apply_theme(theme);
        renderer.render();
        Ok(())
    }

    /// Release the native render view. Exactly once; later calls no-op.
    pub fn dispose(&mut self) {
        if let Some(mut renderer) = self.renderer.take() {
            renderer.release();
        }
        self.phase = ScenePhase::Empty;
    }

    fn visible(&self, kind: SurfaceKind) -> bool {
        match (self.mode, kind) {
            (ViewMode::FullField, SurfaceKind::FullField) => true,
            (ViewMode::Streams, SurfaceKind::Streamlines) => true,
            (ViewMode::Planes, SurfaceKind::PlaneX) => self.plane_visible[0],
            (ViewMode::Planes, SurfaceKind::PlaneY) => self.plane_visible[1],
            (ViewMode::Planes, SurfaceKind::PlaneZ) => self.plane_visible[2],
            _ => false,
        }
    }

    /// Regenerate stale or never-built visible surfaces, recompute the
    /// shared color range over the visible set, then render once.
    fn refresh(&mut self, session: &mut RomSession) -> RomResult<()> {
        let mut visible = [false; 5];
        for kind in ALL_SURFACES {
            visible[slot(kind)] = self.visible(kind);
        }

        for kind in ALL_SURFACES {
            let i = slot(kind);
            if !visible[i] {
                continue;
            }
            if self.dirty[i] || self.cached_range[i].is_none() {
                let surface = generate(session, kind, self.plane_offsets, &self.seed)?;
                let range = surface.range();
                self.renderer_mut()?.update_surface(kind, &surface)?;
                self.cached_range[i] = Some(range);
                self.dirty[i] = false;
            }
        }

        self.range = unified_range(
            ALL_SURFACES
                .iter()
                .filter(|kind| visible[slot(**kind)])
                .map(|kind| self.cached_range[slot(*kind)].flatten()),
        );

        let range = self.range;
        let renderer = self.renderer_mut()?;
        for kind in ALL_SURFACES {
            renderer.set_visibility(kind, visible[slot(kind)]);
        }
        if let Some((min, max)) = range {
            renderer.set_color_range(min, max);
        }
        renderer.render();
        Ok(())
    }

    fn require_built(&self) -> RomResult<()> {
        if self.phase == ScenePhase::Built {
            Ok(())
        } else {
            Err(RomError::Scene {
                what: "scene not built yet".into(),
            })
        }
    }

    fn renderer_mut(&mut self) -> RomResult<&mut R> {
        self.renderer.as_mut().ok_or_else(|| RomError::Scene {
            what: "render view used after dispose".into(),
        })
    }
}

impl<R: SceneRenderer> Drop for SceneController<R> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn plane_kind(axis: Axis) -> SurfaceKind {
    match axis {
        Axis::X => SurfaceKind::PlaneX,
        Axis::Y => SurfaceKind::PlaneY,
        Axis::Z => SurfaceKind::PlaneZ,
    }
}

fn generate(
    session: &mut RomSession,
    kind: SurfaceKind,
    plane_offsets: [f64; 3],
    seed: &StreamSeed,
) -> RomResult<crate::rom::session::SurfaceField> {
    match kind {
        SurfaceKind::FullField => session.full_field(),
        SurfaceKind::PlaneX => session.plane_x(plane_offsets[0]),
        SurfaceKind::PlaneY => session.plane_y(plane_offsets[1]),
        SurfaceKind::PlaneZ => session.plane_z(plane_offsets[2]),
        SurfaceKind::Streamlines => session.streamlines(seed),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::rom::session::fakes::{build_test_session, RecordingSolver, SolverLog};
    use crate::rom::session::SurfaceField;

    #[derive(Default)]
    struct RenderLog {
        renders: usize,
        updates: Vec<SurfaceKind>,
        ranges: Vec<(f64, f64)>,
        releases: usize,
        fail_updates: bool,
    }

    struct RecordingRenderer {
        log: Rc<RefCell<RenderLog>>,
    }

    impl SceneRenderer for RecordingRenderer {
        fn build_scene(&mut self, _grid: &[u8], _surface: Option<&[u8]>) -> RomResult<()> {
            Ok(())
        }

        fn update_surface(&mut self, kind: SurfaceKind, _surface: &SurfaceField) -> RomResult<()> {
            if self.log.borrow().fail_updates {
                return Err(RomError::Scene {
                    what: "injected update failure".into(),
                });
            }
            self.log.borrow_mut().updates.push(kind);
            Ok(())
        }

        fn set_visibility(&mut self, _kind: SurfaceKind, _visible: bool) {}

        fn set_color_range(&mut self, min: f64, max: f64) {
            self.log.borrow_mut().ranges.push((min, max));
        }

        fn apply_theme(&mut self, _theme: Theme) {}

        fn render(&mut self) {
            self.log.borrow_mut().renders += 1;
        }

        fn release(&mut self) {
            self.log.borrow_mut().releases += 1;
        }
    }

    fn seed() -> StreamSeed {
        StreamSeed {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            radius: 0.1,
            propagation: 10.0,
        }
    }

    fn params(vx: f64) -> BoundaryParams {
        BoundaryParams {
            velocity: [vx, 0.0, 0.0],
            temperature: 20.0,
            angle: None,
        }
    }

    fn rig(
        plane_scalars: [Vec<f64>; 3],
    ) -> (
        SceneController<RecordingRenderer>,
        crate::rom::session::RomSession,
        Rc<RefCell<RenderLog>>,
        Rc<RefCell<SolverLog>>,
    ) {
        let solver_log = Rc::new(RefCell::new(SolverLog::default()));
        let mut solver = RecordingSolver::new(solver_log.clone());
        solver.plane_scalars = plane_scalars;
        let session = build_test_session(solver);
        let render_log = Rc::new(RefCell::new(RenderLog::default()));
        let renderer = RecordingRenderer {
            log: render_log.clone(),
        };
        let controller = SceneController::new(renderer, [0.5, 0.5, 0.5], seed());
        (controller, session, render_log, solver_log)
    }

    fn built_rig(
        plane_scalars: [Vec<f64>; 3],
    ) -> (
        SceneController<RecordingRenderer>,
        crate::rom::session::RomSession,
        Rc<RefCell<RenderLog>>,
        Rc<RefCell<SolverLog>>,
    ) {
        let (mut controller, mut session, render_log, solver_log) = rig(plane_scalars);
        controller.begin_loading();
        controller
            .build(&mut session, b"<vtu/>", None, params(1.0))
            .unwrap();
        (controller, session, render_log, solver_log)
    }

    #[test]
    fn test_phases_empty_loading_built() {
        let (mut controller, mut session, _, _) = rig(Default::default());
        assert_eq!(controller.phase(), ScenePhase::Empty);
        controller.begin_loading();
        assert_eq!(controller.phase(), ScenePhase::Loading);
        controller
            .build(&mut session, b"<vtu/>", None, params(1.0))
            .unwrap();
        assert_eq!(controller.phase(), ScenePhase::Built);
    }

    #[test]
    fn test_apply_before_build_rejected() {
        let (mut controller, mut session, _, _) = rig(Default::default());
        let err = controller.apply(&mut session, params(1.0)).unwrap_err();
        assert!(matches!(err, RomError::Scene { .. }));
    }

    #[test]
    fn test_single_render_per_apply() {
        let (mut controller, mut session, render_log, _) = built_rig(Default::default());
        let before = render_log.borrow().renders;
        controller.apply(&mut session, params(2.0)).unwrap();
        assert_eq!(render_log.borrow().renders, before + 1);
    }

    #[test]
    fn test_color_range_unions_only_visible_planes() {
        let (mut controller, mut session, render_log, _) = built_rig([
            vec![0.0, 5.0],
            vec![2.0, 9.0],
            vec![1.0, 3.0],
        ]);
        controller.set_mode(&mut session, ViewMode::Planes).unwrap();
        assert_eq!(controller.color_range(), Some((0.0, 9.0)));

        controller
            .set_plane_visible(&mut session, Axis::Y, false)
            .unwrap();
        assert_eq!(controller.color_range(), Some((0.0, 5.0)));
        assert_eq!(*render_log.borrow().ranges.last().unwrap(), (0.0, 5.0));

        controller
            .set_plane_visible(&mut session, Axis::Y, true)
            .unwrap();
        assert_eq!(controller.color_range(), Some((0.0, 9.0)));
    }

    #[test]
    fn test_mode_toggle_without_param_change_does_not_resolve() {
        let (mut controller, mut session, _, solver_log) = built_rig(Default::default());
        controller.set_mode(&mut session, ViewMode::Planes).unwrap();
        controller.set_mode(&mut session, ViewMode::FullField).unwrap();
        controller.set_mode(&mut session, ViewMode::Planes).unwrap();
        let solves = solver_log
            .borrow()
            .calls
            .iter()
            .filter(|c| *c == "solve")
            .count();
        assert_eq!(solves, 1, "only the initial build may solve");
    }

    #[test]
    fn test_mode_toggle_back_reuses_cached_surfaces() {
        let (mut controller, mut session, render_log, _) = built_rig(Default::default());
        controller.set_mode(&mut session, ViewMode::Planes).unwrap();
        let updates_after_first = render_log.borrow().updates.len();
        controller.set_mode(&mut session, ViewMode::FullField).unwrap();
        controller.set_mode(&mut session, ViewMode::Planes).unwrap();
        assert_eq!(
            render_log.borrow().updates.len(),
            updates_after_first,
            "toggling back must not regenerate surfaces"
        );
    }

    #[test]
    fn test_plane_drag_regenerates_only_that_plane() {
        let (mut controller, mut session, render_log, _) = built_rig(Default::default());
        controller.set_mode(&mut session, ViewMode::Planes).unwrap();
        render_log.borrow_mut().updates.clear();
        controller
            .set_plane_offset(&mut session, Axis::Y, 0.7)
            .unwrap();
        assert_eq!(render_log.borrow().updates, vec![SurfaceKind::PlaneY]);
    }

    #[test]
    fn test_failed_surface_update_aborts_without_render() {
        let (mut controller, mut session, render_log, _) = built_rig(Default::default());
        let renders_before = render_log.borrow().renders;
        render_log.borrow_mut().fail_updates = true;
        let err = controller.apply(&mut session, params(3.0)).unwrap_err();
        assert!(matches!(err, RomError::Scene { .. }));
        assert_eq!(
            render_log.borrow().renders,
            renders_before,
            "a partial update must never be presented"
        );
    }

    #[test]
    fn test_dispose_releases_view_exactly_once() {
        let (mut controller, _session, render_log, _) = built_rig(Default::default());
        controller.dispose();
        controller.dispose();
        drop(controller);
        assert_eq!(render_log.borrow().releases, 1);
    }

    #[test]
    fn test_unified_range_policy() {
        let ranges = [Some((0.0, 5.0)), Some((2.0, 9.0)), Some((1.0, 3.0))];
        assert_eq!(unified_range(ranges), Some((0.0, 9.0)));
        assert_eq!(
            unified_range([Some((0.0, 5.0)), Some((1.0, 3.0))]),
            Some((0.0, 5.0))
        );
        assert_eq!(unified_range([None, Some((1.0, 3.0))]), Some((1.0, 3.0)));
        assert_eq!(unified_range::<[Option<(f64, f64)>; 0]>([]), None);
    }
}

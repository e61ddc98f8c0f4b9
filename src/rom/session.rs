use crate::rom::basis::BasisAssembly;
use crate::rom::error::{RomError, RomResult};
use crate::rom::events::{BasisCounts, CoreMatrices};
use crate::rom::matrix::Matrix;

/// Quadratic temperature → kinematic-viscosity fit baked into each case:
/// `ν(T) = a0 + a1·T + a2·T²`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViscosityFit {
    pub a0: f64,
    pub a1: f64,
    pub a2: f64,
}

impl ViscosityFit {
    pub fn nu(&self, temperature: f64) -> f64 {
        self.a0 + self.a1 * temperature + self.a2 * temperature * temperature
    }
}

/// Boundary parameter vector for one online query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryParams {
    pub velocity: [f64; 3],
    pub temperature: f64,
    /// Inflow angle in degrees, only for cases that expose it.
    pub angle: Option<f64>,
}

/// Streamline probe geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamSeed {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub radius: f64,
    pub propagation: f64,
}

/// A probe surface extracted from the reconstructed field: serialized
/// geometry the renderer deserializes in place, plus the scalar array used
/// for coloring.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceField {
    pub geometry: Vec<u8>,
    pub scalars: Vec<f64>,
}

impl SurfaceField {
    /// Min/max of the scalar array; `None` for an empty surface.
    pub fn range(&self) -> Option<(f64, f64)> {
        let mut iter = self.scalars.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

/// The opaque numerical solver. The production implementation is a
/// WebAssembly-side binding to the compiled reduced-order library; tests use
/// instrumented fakes. Not assumed thread-safe: every call happens on the UI
/// side.
///
/// Call order during construction is fixed (counts → core matrices → modes →
/// per-index terms → turbulence closure → grid → preprocess) and enforced by
/// [`build_session`]; after `preprocess` only the online queries are used.
/// `release` frees the native allocation and must run exactly once.
pub trait RomSolver {
    fn set_counts(&mut self, counts: BasisCounts, n_bc: usize) -> RomResult<()>;
    fn load_core(&mut self, core: &CoreMatrices) -> RomResult<()>;
    fn load_modes(&mut self, modes: &Matrix) -> RomResult<()>;
    fn load_convective(
        &mut self,
        index: usize,
        ct1: &Matrix,
        ct2: &Matrix,
        c: &Matrix,
    ) -> RomResult<()>;
    fn load_gradient(&mut self, index: usize, g: &Matrix) -> RomResult<()>;
    fn load_weights(&mut self, index: usize, weights: &Matrix) -> RomResult<()>;
    fn load_regression(&mut self, mu: &Matrix, coeff_l2: &Matrix) -> RomResult<()>;
    fn load_grid(&mut self, vtu: &[u8]) -> RomResult<()>;
    fn preprocess(&mut self) -> RomResult<()>;

    /// Compute reduced coefficients for one boundary-parameter point.
    fn solve(&mut self, nu: f64, velocity: [f64; 3], angle: Option<f64>) -> RomResult<()>;
    /// Expand the current coefficients to a full field, 3 components per
    /// mesh point, ordered by point index.
    fn reconstruct(&mut self) -> RomResult<Vec<f64>>;

    fn plane_x(&mut self, offset: f64) -> RomResult<SurfaceField>;
    fn plane_y(&mut self, offset: f64) -> RomResult<SurfaceField>;
    fn plane_z(&mut self, offset: f64) -> RomResult<SurfaceField>;
    fn streamlines(&mut self, seed: &StreamSeed) -> RomResult<SurfaceField>;
    fn full_field(&mut self) -> RomResult<SurfaceField>;

    fn release(&mut self);
}

/// Releases a partially constructed solver if the build fails midway, so a
/// decode error during loading never leaks the native allocation.
struct BuildGuard {
    solver: Option<Box<dyn RomSolver>>,
}

impl BuildGuard {
    fn solver(&mut self) -> RomResult<&mut (dyn RomSolver + 'static)> {
        self.solver
            .as_deref_mut()
            .ok_or_else(|| RomError::protocol("solver guard empty"))
    }

    fn disarm(mut self) -> RomResult<Box<dyn RomSolver>> {
        self.solver
            .take()
            .ok_or_else(|| RomError::protocol("solver guard empty"))
    }
}

impl Drop for BuildGuard {
    fn drop(&mut self) {
        if let Some(mut solver) = self.solver.take() {
            solver.release();
        }
    }
}

/// Feed a completed [`BasisAssembly`] into a solver in the required call
/// order and return the live session. The assembly must be complete; the
/// solver is released on any failure.
pub fn build_session(
    assembly: &BasisAssembly,
    solver: Box<dyn RomSolver>,
    n_bc: usize,
    viscosity: ViscosityFit,
) -> RomResult<RomSession> {
    let mut guard = BuildGuard { solver: Some(solver) };
    let counts = assembly
        .counts()
        .filter(|_| assembly.is_complete())
        .ok_or_else(|| RomError::protocol("session build from incomplete basis set"))?;
    {
        let s = guard.solver()?;
        s.set_counts(counts, n_bc)?;
        s.load_core(assembly.core().ok_or_else(missing)?)?;
        s.load_modes(assembly.modes().ok_or_else(missing)?)?;
        for i in 0..counts.n_phi_u {
            let (ct1, ct2, c) = assembly.indexed(i).ok_or_else(missing)?;
            s.load_convective(i, ct1, ct2, c)?;
        }
        for i in 0..counts.n_phi_p {
            if let Some(g) = assembly.gradient(i) {
                s.load_gradient(i, g)?;
            }
        }
        for i in 0..counts.n_phi_nut {
            s.load_weights(i, assembly.weight(i).ok_or_else(missing)?)?;
        }
        if let Some((mu, coeff_l2)) = assembly.rbf() {
            s.load_regression(mu, coeff_l2)?;
        }
        s.load_grid(assembly.grid().ok_or_else(missing)?)?;
        s.preprocess()?;
    }

    Ok(RomSession {
        solver: Some(guard.disarm()?),
        viscosity,
        params: None,
        field_len: 0,
    })
}

fn missing() -> RomError {
    RomError::protocol("assembly reported complete but an artifact is absent")
}

/// A live ROM session: the opaque solver plus the current online state.
/// One per active case view; [`RomSession::dispose`] (or drop) releases the
/// native solver exactly once.
pub struct RomSession {
    solver: Option<Box<dyn RomSolver>>,
    viscosity: ViscosityFit,
    params: Option<BoundaryParams>,
    field_len: usize,
}

impl RomSession {
    /// Solve for a parameter point and reconstruct the field. Returns the
    /// reconstructed field length (3 per mesh point). Skips the solver
    /// round-trip entirely when the parameters are unchanged.
    pub fn solve(&mut self, params: BoundaryParams) -> RomResult<usize> {
        if self.params == Some(params) && self.field_len > 0 {
            return Ok(self.field_len);
        }
        let nu = self.viscosity.nu(params.temperature);
        let solver = self.solver_mut()?;
        solver.solve(nu, params.velocity, params.angle)?;
        let field = solver.reconstruct()?;
        self.field_len = field.len();
        self.params = Some(params);
        Ok(self.field_len)
    }

    pub fn last_params(&self) -> Option<BoundaryParams> {
        self.params
    }

    pub fn plane_x(&mut self, offset: f64) -> RomResult<SurfaceField> {
        self.solver_mut()?.plane_x(offset)
    }

    pub fn plane_y(&mut self, offset: f64) -> RomResult<SurfaceField> {
        self.solver_mut()?.plane_y(offset)
    }

    pub fn plane_z(&mut self, offset: f64) -> RomResult<SurfaceField> {
        self.solver_mut()?.plane_z(offset)
    }

    pub fn streamlines(&mut self, seed: &StreamSeed) -> RomResult<SurfaceField> {
        self.solver_mut()?.streamlines(seed)
    }

    pub fn full_field(&mut self) -> RomResult<SurfaceField> {
        self.solver_mut()?.full_field()
    }

    /// Release the native solver. Safe to call once; later calls are no-ops
    /// by construction (the handle is gone).
    pub fn dispose(&mut self) {
        if let Some(mut solver) = self.solver.take() {
            solver.release();
        }
    }

    fn solver_mut(&mut self) -> RomResult<&mut (dyn RomSolver + 'static)> {
        self.solver
            .as_deref_mut()
            .ok_or_else(|| RomError::protocol("session used after dispose"))
    }
}

impl Drop for RomSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Shared instrumentation for fake solvers.
    #[derive(Default)]
    pub struct SolverLog {
        pub calls: Vec<String>,
        pub releases: usize,
    }

    /// Records every lifecycle call; optionally fails at a named step to
    /// exercise the mid-build guard. Plane scalars can be pinned so scene
    /// tests control each probe's color range.
    pub struct RecordingSolver {
        pub log: Rc<RefCell<SolverLog>>,
        pub fail_at: Option<&'static str>,
        pub modes: Matrix,
        pub coeffs: Vec<f64>,
        pub plane_scalars: [Vec<f64>; 3],
    }

    impl RecordingSolver {
        pub fn new(log: Rc<RefCell<SolverLog>>) -> Self {
            RecordingSolver {
                log,
                fail_at: None,
                modes: Matrix::empty(),
                coeffs: Vec::new(),
                plane_scalars: [Vec::new(), Vec::new(), Vec::new()],
            }
        }

        fn step(&mut self, name: &'static str) -> RomResult<()> {
            self.log.borrow_mut().calls.push(name.to_string());
            if self.fail_at == Some(name) {
                Err(RomError::protocol(format!("injected failure at {name}")))
            } else {
                Ok(())
            }
        }

        fn surface(&self, tag: u8) -> SurfaceField {
            SurfaceField {
                geometry: vec![tag],
                scalars: self.coeffs.clone(),
            }
        }
    }

    impl RomSolver for RecordingSolver {
        fn set_counts(&mut self, _counts: BasisCounts, _n_bc: usize) -> RomResult<()> {
            self.step("set_counts")
        }

        fn load_core(&mut self, _core: &CoreMatrices) -> RomResult<()> {
            self.step("load_core")
        }

        fn load_modes(&mut self, modes: &Matrix) -> RomResult<()> {
            self.modes = modes.clone();
            self.step("load_modes")
        }

        fn load_convective(
            &mut self,
            _index: usize,
            _ct1: &Matrix,
            _ct2: &Matrix,
            _c: &Matrix,
        ) -> RomResult<()> {
            self.step("load_convective")
        }

        fn load_gradient(&mut self, _index: usize, _g: &Matrix) -> RomResult<()> {
            self.step("load_gradient")
        }

        fn load_weights(&mut self, _index: usize, _weights: &Matrix) -> RomResult<()> {
            self.step("load_weights")
        }

        fn load_regression(&mut self, _mu: &Matrix, _coeff_l2: &Matrix) -> RomResult<()> {
            self.step("load_regression")
        }

        fn load_grid(&mut self, _vtu: &[u8]) -> RomResult<()> {
            self.step("load_grid")
        }

        fn preprocess(&mut self) -> RomResult<()> {
            self.step("preprocess")
        }

        fn solve(&mut self, nu: f64, velocity: [f64; 3], angle: Option<f64>) -> RomResult<()> {
            self.step("solve")?;
            // A deliberately simple reduced solve: each coefficient is a
            // distinct linear blend of the inputs so parameter changes are
            // observable in the reconstruction.
            let angle = angle.unwrap_or(0.0);
            self.coeffs = (0..self.modes.cols().max(1))
                .map(|i| {
                    let k = (i + 1) as f64;
                    nu + k * velocity[0] + 0.5 * k * velocity[1] + 0.25 * velocity[2] + 0.1 * angle
                })
                .collect();
            Ok(())
        }

        fn reconstruct(&mut self) -> RomResult<Vec<f64>> {
            self.step("reconstruct")?;
            if self.modes.is_empty() {
                return Ok(self.coeffs.clone());
            }
            // field = modes · coeffs, one value per velocity dof.
            let mut field = vec![0.0; self.modes.rows()];
            for (j, coeff) in self.coeffs.iter().enumerate() {
                for (i, out) in field.iter_mut().enumerate() {
                    *out += self.modes.get(i, j) * coeff;
                }
            }
            Ok(field)
        }

        fn plane_x(&mut self, _offset: f64) -> RomResult<SurfaceField> {
            self.log.borrow_mut().calls.push("plane_x".into());
            let mut surface = self.surface(b'x');
            if !self.plane_scalars[0].is_empty() {
                surface.scalars = self.plane_scalars[0].clone();
            }
            Ok(surface)
        }

        fn plane_y(&mut self, _offset: f64) -> RomResult<SurfaceField> {
            self.log.borrow_mut().calls.push("plane_y".into());
            let mut surface = self.surface(b'y');
            if !self.plane_scalars[1].is_empty() {
                surface.scalars = self.plane_scalars[1].clone();
            }
            Ok(surface)
        }

        fn plane_z(&mut self, _offset: f64) -> RomResult<SurfaceField> {
            self.log.borrow_mut().calls.push("plane_z".into());
            let mut surface = self.surface(b'z');
            if !self.plane_scalars[2].is_empty() {
                surface.scalars = self.plane_scalars[2].clone();
            }
            Ok(surface)
        }

        fn streamlines(&mut self, _seed: &StreamSeed) -> RomResult<SurfaceField> {
            self.log.borrow_mut().calls.push("streamlines".into());
            Ok(self.surface(b's'))
        }

        fn full_field(&mut self) -> RomResult<SurfaceField> {
            self.log.borrow_mut().calls.push("full_field".into());
            Ok(self.surface(b'f'))
        }

        fn release(&mut self) {
            self.log.borrow_mut().releases += 1;
        }
    }

    /// Build a live session over a minimal complete basis set, for tests
    /// that exercise the layers above the session.
    pub fn build_test_session(solver: RecordingSolver) -> RomSession {
        use crate::rom::basis::BasisAssembly;
        use crate::rom::events::{Coupling, PipelineEvent, Stabilization};

        let one = || Matrix::parse("1\n", "m.txt").unwrap();
        let mut a = BasisAssembly::new(Stabilization::Supremizer);
        a.apply(PipelineEvent::Constructor(BasisCounts {
            n_phi_u: 1,
            n_phi_p: 1,
            n_phi_nut: 0,
            n_runs: 1,
        }))
        .unwrap();
        a.apply(PipelineEvent::Matrices(CoreMatrices {
            coupling: Coupling::Supremizer { p: one() },
            k: one(),
            b: one(),
        }))
        .unwrap();
        a.apply(PipelineEvent::Modes(one())).unwrap();
        a.apply(PipelineEvent::Grid(b"<vtu/>".to_vec())).unwrap();
        a.apply(PipelineEvent::Ct1 { index: 0, matrix: one() }).unwrap();
        a.apply(PipelineEvent::Ct2 { index: 0, matrix: one() }).unwrap();
        a.apply(PipelineEvent::C { index: 0, matrix: one() }).unwrap();

        let fit = ViscosityFit { a0: 1e-5, a1: 0.0, a2: 0.0 };
        build_session(&a, Box::new(solver), 2, fit).unwrap()
    }
}

//! Binding to the browser-side compiled reduced-order library. The solver
//! lives behind a `romSolver` JS namespace and deals in raw handles; this
//! module is the only place that namespace is spoken.

use js_sys::{Float64Array, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;

use crate::rom::error::{RomError, RomResult};
use crate::rom::events::{BasisCounts, CoreMatrices, Coupling};
use crate::rom::matrix::Matrix;
use crate::rom::session::{RomSolver, StreamSeed, SurfaceField};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = romSolver, js_name = create)]
    fn solver_create(supremizer: bool) -> u32;
    #[wasm_bindgen(js_namespace = romSolver, js_name = setCounts)]
    fn solver_set_counts(h: u32, n_u: u32, n_p: u32, n_nut: u32, n_runs: u32, n_bc: u32) -> bool;
    #[wasm_bindgen(js_namespace = romSolver, js_name = loadMatrix)]
    fn solver_load_matrix(h: u32, name: &str, index: i32, rows: u32, cols: u32, data: &[f64])
        -> bool;
    #[wasm_bindgen(js_namespace = romSolver, js_name = loadGrid)]
    fn solver_load_grid(h: u32, vtu: &[u8]) -> bool;
    #[wasm_bindgen(js_namespace = romSolver, js_name = preprocess)]
    fn solver_preprocess(h: u32) -> bool;
    #[wasm_bindgen(js_namespace = romSolver, js_name = solve)]
    fn solver_solve(h: u32, nu: f64, vx: f64, vy: f64, vz: f64, angle: f64, has_angle: bool)
        -> bool;
    #[wasm_bindgen(js_namespace = romSolver, js_name = reconstruct)]
    fn solver_reconstruct(h: u32) -> Vec<f64>;
    #[wasm_bindgen(js_namespace = romSolver, js_name = extractSurface)]
    fn solver_extract_surface(h: u32, kind: &str, params: &[f64]) -> JsValue;
    #[wasm_bindgen(js_namespace = romSolver, js_name = release)]
    fn solver_release(h: u32);
}

/// One native solver instance. Matrices cross the boundary in the
/// column-major flattening the library expects.
pub struct JsRomSolver {
    handle: u32,
}

impl JsRomSolver {
    pub fn create(supremizer: bool) -> Self {
        JsRomSolver {
            handle: solver_create(supremizer),
        }
    }

    fn load(&self, name: &str, index: i32, matrix: &Matrix) -> RomResult<()> {
        let data = matrix.column_major();
        if solver_load_matrix(
            self.handle,
            name,
            index,
            matrix.rows() as u32,
            matrix.cols() as u32,
            &data,
        ) {
            Ok(())
        } else {
            Err(RomError::protocol(format!("solver rejected matrix {name}[{index}]")))
        }
    }

    fn extract(&self, kind: &str, params: &[f64]) -> RomResult<SurfaceField> {
        let value = solver_extract_surface(self.handle, kind, params);
        let field = |key: &str| {
            Reflect::get(&value, &key.into())
                .ok()
                .filter(|v| !v.is_undefined())
                .ok_or_else(|| RomError::protocol(format!("surface {kind} missing {key}")))
        };
        Ok(SurfaceField {
            geometry: Uint8Array::new(&field("geometry")?).to_vec(),
            scalars: Float64Array::new(&field("scalars")?).to_vec(),
        })
    }

    fn check(ok: bool, what: &str) -> RomResult<()> {
        if ok {
            Ok(())
        } else {
            Err(RomError::protocol(format!("solver rejected {what}")))
        }
    }
}

impl RomSolver for JsRomSolver {
    fn set_counts(&mut self, counts: BasisCounts, n_bc: usize) -> RomResult<()> {
        Self::check(
            solver_set_counts(
                self.handle,
                counts.n_phi_u as u32,
                counts.n_phi_p as u32,
                counts.n_phi_nut as u32,
                counts.n_runs as u32,
                n_bc as u32,
            ),
            "mode counts",
        )
    }

    fn load_core(&mut self, core: &CoreMatrices) -> RomResult<()> {
        match &core.coupling {
            Coupling::Supremizer { p } => self.load("P", -1, p)?,
            Coupling::Ppe { d, bc3 } => {
                self.load("D", -1, d)?;
                self.load("BC3", -1, bc3)?;
            }
        }
        self.load("K", -1, &core.k)?;
        self.load("B", -1, &core.b)
    }

    fn load_modes(&mut self, modes: &Matrix) -> RomResult<()> {
        self.load("modes", -1, modes)
    }

    fn load_convective(
        &mut self,
        index: usize,
        ct1: &Matrix,
        ct2: &Matrix,
        c: &Matrix,
    ) -> RomResult<()> {
        self.load("ct1", index as i32, ct1)?;
        self.load("ct2", index as i32, ct2)?;
        self.load("C", index as i32, c)
    }

    fn load_gradient(&mut self, index: usize, g: &Matrix) -> RomResult<()> {
        self.load("G", index as i32, g)
    }

    fn load_weights(&mut self, index: usize, weights: &Matrix) -> RomResult<()> {
        self.load("wRBF", index as i32, weights)
    }

    fn load_regression(&mut self, mu: &Matrix, coeff_l2: &Matrix) -> RomResult<()> {
        self.load("mu", -1, mu)?;
        self.load("coeffL2", -1, coeff_l2)
    }

    fn load_grid(&mut self, vtu: &[u8]) -> RomResult<()> {
        Self::check(solver_load_grid(self.handle, vtu), "grid")
    }

    fn preprocess(&mut self) -> RomResult<()> {
        Self::check(solver_preprocess(self.handle), "preprocess")
    }

    fn solve(&mut self, nu: f64, velocity: [f64; 3], angle: Option<f64>) -> RomResult<()> {
        Self::check(
            solver_solve(
                self.handle,
                nu,
                velocity[0],
                velocity[1],
                velocity[2],
                angle.unwrap_or(0.0),
                angle.is_some(),
            ),
            "online solve",
        )
    }

    fn reconstruct(&mut self) -> RomResult<Vec<f64>> {
        Ok(solver_reconstruct(self.handle))
    }

    fn plane_x(&mut self, offset: f64) -> RomResult<SurfaceField> {
        self.extract("planeX", &[offset])
    }

    fn plane_y(&mut self, offset: f64) -> RomResult<SurfaceField> {
        self.extract("planeY", &[offset])
    }

    fn plane_z(&mut self, offset: f64) -> RomResult<SurfaceField> {
        self.extract("planeZ", &[offset])
    }

    fn streamlines(&mut self, seed: &StreamSeed) -> RomResult<SurfaceField> {
        self.extract(
            "streams",
            &[seed.x, seed.y, seed.z, seed.radius, seed.propagation],
        )
    }

    fn full_field(&mut self) -> RomResult<SurfaceField> {
        self.extract("full", &[])
    }

    fn release(&mut self) {
        solver_release(self.handle);
    }
}

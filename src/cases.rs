use crate::rom::events::Stabilization;
use crate::rom::session::{StreamSeed, ViscosityFit};

/// Inclusive slider range with a step and an initial value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub initial: f64,
}

impl ParamRange {
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Static description of one viewable case. The scene controller consumes
/// this verbatim; nothing here changes at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaseDescriptor {
    pub slug: &'static str,
    pub title: &'static str,
    pub archive_url: &'static str,
    /// Cases ship before their dataset does; unready ones are listed but
    /// not navigable.
    pub ready: bool,
    pub stabilization: Stabilization,
    pub three_dimensional: bool,
    /// Boundary-condition parameter count handed to the solver.
    pub n_bc: usize,
    pub viscosity: ViscosityFit,
    pub temperature: ParamRange,
    pub velocity_x: ParamRange,
    pub velocity_y: ParamRange,
    pub angle: Option<ParamRange>,
    pub plane_x: ParamRange,
    pub plane_y: ParamRange,
    pub plane_z: ParamRange,
    pub seed: StreamSeed,
    /// Debounce quiet window for this case's sliders: 1 ms is enough to
    /// coalesce desktop drag events on 2-D cases, heavier 3-D cases need a
    /// real pause.
    pub debounce_ms: i32,
}

pub const CASES: &[CaseDescriptor] = &[
    CaseDescriptor {
        slug: "pitz-daily",
        title: "Pitz–Daily backward-facing step",
        archive_url: "assets/datasets/pitz-daily.zip",
        ready: true,
        stabilization: Stabilization::Supremizer,
        three_dimensional: false,
        n_bc: 2,
        viscosity: ViscosityFit {
            a0: 2.94e-6,
            a1: -4.2e-8,
            a2: 2.6e-10,
        },
        temperature: ParamRange { min: 20.0, max: 80.0, step: 1.0, initial: 40.0 },
        velocity_x: ParamRange { min: 5.0, max: 15.0, step: 0.1, initial: 10.0 },
        velocity_y: ParamRange { min: 0.0, max: 0.0, step: 0.0, initial: 0.0 },
        angle: None,
        plane_x: ParamRange { min: 0.0, max: 0.29, step: 0.005, initial: 0.1 },
        plane_y: ParamRange { min: -0.025, max: 0.025, step: 0.001, initial: 0.0 },
        plane_z: ParamRange { min: -0.001, max: 0.001, step: 0.0005, initial: 0.0 },
        seed: StreamSeed { x: 0.05, y: 0.0, z: 0.0, radius: 0.01, propagation: 0.3 },
        debounce_ms: 1,
    },
    CaseDescriptor {
        slug: "lid-cavity",
        title: "Lid-driven cavity",
        archive_url: "assets/datasets/lid-cavity.zip",
        ready: true,
        stabilization: Stabilization::Ppe,
        three_dimensional: false,
        n_bc: 1,
        viscosity: ViscosityFit { a0: 1e-5, a1: 0.0, a2: 0.0 },
        temperature: ParamRange { min: 20.0, max: 20.0, step: 0.0, initial: 20.0 },
        velocity_x: ParamRange { min: 0.5, max: 2.0, step: 0.05, initial: 1.0 },
        velocity_y: ParamRange { min: 0.0, max: 0.0, step: 0.0, initial: 0.0 },
        angle: None,
        plane_x: ParamRange { min: 0.0, max: 0.1, step: 0.002, initial: 0.05 },
        plane_y: ParamRange { min: 0.0, max: 0.1, step: 0.002, initial: 0.05 },
        plane_z: ParamRange { min: -0.005, max: 0.005, step: 0.001, initial: 0.0 },
        seed: StreamSeed { x: 0.05, y: 0.05, z: 0.0, radius: 0.01, propagation: 0.2 },
        debounce_ms: 1,
    },
    CaseDescriptor {
        slug: "cylinder-3d",
        title: "Flow past a cylinder (3-D)",
        archive_url: "assets/datasets/cylinder-3d.zip",
        ready: true,
        stabilization: Stabilization::Supremizer,
        three_dimensional: true,
        n_bc: 3,
        viscosity: ViscosityFit {
            a0: 1.52e-5,
            a1: 9.1e-8,
            a2: 6.0e-11,
        },
        temperature: ParamRange { min: 0.0, max: 60.0, step: 1.0, initial: 20.0 },
        velocity_x: ParamRange { min: 1.0, max: 8.0, step: 0.1, initial: 4.0 },
        velocity_y: ParamRange { min: -1.0, max: 1.0, step: 0.05, initial: 0.0 },
        angle: Some(ParamRange { min: -15.0, max: 15.0, step: 0.5, initial: 0.0 }),
        plane_x: ParamRange { min: -1.0, max: 4.0, step: 0.05, initial: 0.5 },
        plane_y: ParamRange { min: -1.5, max: 1.5, step: 0.05, initial: 0.0 },
        plane_z: ParamRange { min: -0.5, max: 0.5, step: 0.02, initial: 0.0 },
        seed: StreamSeed { x: -0.8, y: 0.0, z: 0.0, radius: 0.15, propagation: 5.0 },
        debounce_ms: 300,
    },
    CaseDescriptor {
        slug: "t-junction",
        title: "T-junction mixer",
        archive_url: "assets/datasets/t-junction.zip",
        ready: false,
        stabilization: Stabilization::Ppe,
        three_dimensional: true,
        n_bc: 2,
        viscosity: ViscosityFit { a0: 1e-6, a1: 0.0, a2: 0.0 },
        temperature: ParamRange { min: 10.0, max: 90.0, step: 1.0, initial: 50.0 },
        velocity_x: ParamRange { min: 0.1, max: 1.0, step: 0.01, initial: 0.5 },
        velocity_y: ParamRange { min: 0.1, max: 1.0, step: 0.01, initial: 0.5 },
        angle: None,
        plane_x: ParamRange { min: 0.0, max: 0.2, step: 0.005, initial: 0.1 },
        plane_y: ParamRange { min: 0.0, max: 0.2, step: 0.005, initial: 0.1 },
        plane_z: ParamRange { min: 0.0, max: 0.02, step: 0.001, initial: 0.01 },
        seed: StreamSeed { x: 0.02, y: 0.1, z: 0.01, radius: 0.005, propagation: 0.5 },
        debounce_ms: 300,
    },
];

pub fn find(slug: &str) -> Option<&'static CaseDescriptor> {
    CASES.iter().find(|case| case.slug == slug)
}

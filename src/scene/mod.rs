mod controller;
mod renderer;

pub use controller::{unified_range, Axis, SceneController, ScenePhase, ViewMode};
pub use renderer::{JsSceneRenderer, SceneRenderer, SurfaceKind, ALL_SURFACES};

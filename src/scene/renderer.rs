use wasm_bindgen::prelude::*;

use crate::rom::error::{RomError, RomResult};
use crate::rom::session::SurfaceField;
use crate::storage::Theme;

/// One drawable surface in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    FullField,
    PlaneX,
    PlaneY,
    PlaneZ,
    Streamlines,
}

pub const ALL_SURFACES: [SurfaceKind; 5] = [
    SurfaceKind::FullField,
    SurfaceKind::PlaneX,
    SurfaceKind::PlaneY,
    SurfaceKind::PlaneZ,
    SurfaceKind::Streamlines,
];

impl SurfaceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SurfaceKind::FullField => "full",
            SurfaceKind::PlaneX => "planeX",
            SurfaceKind::PlaneY => "planeY",
            SurfaceKind::PlaneZ => "planeZ",
            SurfaceKind::Streamlines => "streams",
        }
    }
}

/// The opaque 3-D rendering capability ("given a scalar field over a mesh,
/// produce a colored, navigable view"). Surface updates swap data into the
/// renderer's existing objects, so actor identity survives parameter drags;
/// `render` presents the whole scene at once. `release` drops the native
/// view and runs exactly once, driven by the scene controller.
pub trait SceneRenderer {
    fn build_scene(&mut self, grid: &[u8], surface: Option<&[u8]>) -> RomResult<()>;
    fn update_surface(&mut self, kind: SurfaceKind, surface: &SurfaceField) -> RomResult<()>;
    fn set_visibility(&mut self, kind: SurfaceKind, visible: bool);
    fn set_color_range(&mut self, min: f64, max: f64);
    fn apply_theme(&mut self, theme: Theme);
    fn render(&mut self);
    fn release(&mut self);
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = flowScene, js_name = createView)]
    fn view_create(container: &str) -> u32;
    #[wasm_bindgen(js_namespace = flowScene, js_name = buildScene)]
    fn view_build(view: u32, grid: &[u8], surface: Option<&[u8]>) -> bool;
    #[wasm_bindgen(js_namespace = flowScene, js_name = updateSurface)]
    fn view_update_surface(view: u32, kind: &str, geometry: &[u8], scalars: &[f64]) -> bool;
    #[wasm_bindgen(js_namespace = flowScene, js_name = setVisibility)]
    fn view_set_visibility(view: u32, kind: &str, visible: bool);
    #[wasm_bindgen(js_namespace = flowScene, js_name = setColorRange)]
    fn view_set_color_range(view: u32, min: f64, max: f64);
    #[wasm_bindgen(js_namespace = flowScene, js_name = setDarkTheme)]
    fn view_set_dark(view: u32, dark: bool);
    #[wasm_bindgen(js_namespace = flowScene, js_name = render)]
    fn view_render(view: u32);
    #[wasm_bindgen(js_namespace = flowScene, js_name = releaseView)]
    fn view_release(view: u32);
}

/// Binding to the browser-side visualization library. Holds one native view
/// handle; geometry crosses the boundary as raw byte/float slices, which
/// wasm-bindgen exposes to JS without copying.
pub struct JsSceneRenderer {
    view: u32,
}

impl JsSceneRenderer {
    pub fn attach(container: &str) -> Self {
        JsSceneRenderer {
            view: view_create(container),
        }
    }
}

impl SceneRenderer for JsSceneRenderer {
    fn build_scene(&mut self, grid: &[u8], surface: Option<&[u8]>) -> RomResult<()> {
        if view_build(self.view, grid, surface) {
            Ok(())
        } else {
            Err(RomError::Scene {
                what: "renderer rejected the mesh".into(),
            })
        }
    }

    fn update_surface(&mut self, kind: SurfaceKind, surface: &SurfaceField) -> RomResult<()> {
        if view_update_surface(self.view, kind.as_str(), &surface.geometry, &surface.scalars) {
            Ok(())
        } else {
            Err(RomError::Scene {
                what: format!("renderer rejected {} surface", kind.as_str()),
            })
        }
    }

    fn set_visibility(&mut self, kind: SurfaceKind, visible: bool) {
        view_set_visibility(self.view, kind.as_str(), visible);
    }

    fn set_color_range(&mut self, min: f64, max: f64) {
        view_set_color_range(self.view, min, max);
    }

    fn apply_theme(&mut self, theme: Theme) {
        view_set_dark(self.view, theme.is_dark());
    }

    fn render(&mut self) {
        view_render(self.view);
    }

    fn release(&mut self) {
        view_release(self.view);
    }
}

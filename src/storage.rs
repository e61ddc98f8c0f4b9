use serde::{Deserialize, Serialize};

use crate::cases::CaseDescriptor;

const THEME_KEY: &str = "romview_theme";

/// UI color theme. The only piece of client state that survives a reload;
/// stored as a bare `"light"`/`"dark"` string so other tooling can read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn from_str(value: &str) -> Theme {
        match value {
            "dark" => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }
}

/// Attempts to get the browser's localStorage.
///
/// Returns `None` when running outside a browser, in private browsing with
/// storage disabled, or when a SecurityError blocks access.
fn get_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

/// Log a warning message to the browser console.
pub(crate) fn log_warning(msg: &str) {
    web_sys::console::warn_1(&msg.into());
}

/// Load the persisted theme, defaulting to light when storage is
/// unavailable or nothing has been saved yet. The app must always come up,
/// so there is no error path here.
pub fn load_theme() -> Theme {
    match get_storage() {
        Some(storage) => match storage.get_item(THEME_KEY) {
            Ok(Some(value)) => Theme::from_str(&value),
            Ok(None) => Theme::default(),
            Err(_) => {
                log_warning("romview: could not read theme preference (using light)");
                Theme::default()
            }
        },
        None => Theme::default(),
    }
}

/// Persist the theme. Silently degrades when storage is unavailable; users
/// in private browsing simply start with the default each visit.
pub fn save_theme(theme: Theme) {
    let Some(storage) = get_storage() else {
        return;
    };
    if storage.set_item(THEME_KEY, theme.as_str()).is_err() {
        log_warning("romview: could not save theme preference");
    }
}

/// Reflect the theme on the document body so stylesheets can key off it.
/// Styling only: theme changes never touch geometry or field data.
pub fn apply_theme_class(theme: Theme) {
    if let Some(body) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.body())
    {
        let _ = body.set_attribute("data-theme", theme.as_str());
    }
}

/// Last-used boundary parameters for one case, restored on the next visit
/// so a reload does not reset the sliders.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredCaseParams {
    pub temperature: f64,
    pub velocity_x: f64,
    pub velocity_y: f64,
    pub angle: Option<f64>,
}

impl StoredCaseParams {
    /// Stored values can predate a case update that narrowed its ranges;
    /// clamp everything back inside before use.
    pub fn clamped(self, case: &CaseDescriptor) -> StoredCaseParams {
        StoredCaseParams {
            temperature: case.temperature.clamp(self.temperature),
            velocity_x: case.velocity_x.clamp(self.velocity_x),
            velocity_y: case.velocity_y.clamp(self.velocity_y),
            angle: case
                .angle
                .map(|range| range.clamp(self.angle.unwrap_or(range.initial))),
        }
    }
}

fn case_key(slug: &str) -> String {
    format!("romview_case_{slug}")
}

pub fn load_case_params(slug: &str) -> Option<StoredCaseParams> {
    let raw = get_storage()?.get_item(&case_key(slug)).ok()??;
    match serde_json::from_str(&raw) {
        Ok(params) => Some(params),
        Err(_) => {
            log_warning("romview: stored case parameters are unreadable (ignoring)");
            None
        }
    }
}

pub fn save_case_params(slug: &str, params: &StoredCaseParams) {
    let Some(storage) = get_storage() else {
        return;
    };
    if let Ok(raw) = serde_json::to_string(params) {
        if storage.set_item(&case_key(slug), &raw).is_err() {
            log_warning("romview: could not save case parameters");
        }
    }
}

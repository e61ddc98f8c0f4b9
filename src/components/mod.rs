mod case_view;
mod catalog;
mod mode_toggle;
mod nav_bar;
mod plane_controls;
mod progress_bar;
mod stream_controls;
mod variable_controls;

pub use case_view::CaseView;
pub use catalog::CaseCatalog;
pub use mode_toggle::ModeToggle;
pub use nav_bar::NavBar;
pub use plane_controls::PlaneControls;
pub use progress_bar::ProgressBar;
pub use stream_controls::StreamControls;
pub use variable_controls::VariableControls;

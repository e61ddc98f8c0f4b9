use web_sys::window;

/// Short confirmation buzz for slider and stepper interactions, on devices
/// that support it. Desktop browsers report success and do nothing.
pub fn vibrate_tick() {
    if let Some(window) = window() {
        let _ = window.navigator().vibrate_with_duration(10);
    }
}

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Trailing-debounce bookkeeping, independent of any timer so it can be
/// exercised directly in tests. Each `submit` supersedes the pending value
/// and returns a token; only the timer holding the latest token gets the
/// value back, every stale timer fires into nothing.
pub struct DebounceState<T> {
    pending: Option<T>,
    generation: u64,
}

impl<T> DebounceState<T> {
    pub fn new() -> Self {
        DebounceState {
            pending: None,
            generation: 0,
        }
    }

    pub fn submit(&mut self, value: T) -> u64 {
        self.pending = Some(value);
        self.generation += 1;
        self.generation
    }

    pub fn fire(&mut self, token: u64) -> Option<T> {
        if token == self.generation {
            self.pending.take()
        } else {
            None
        }
    }
}

impl<T> Default for DebounceState<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Rate limiter for one logical input family (variables, planes, streamline
/// parameters each get their own instance, so dragging one slider never
/// delays another). Within the quiet window only the last submitted value
/// reaches the handler; this is pure flow control with no knowledge of what
/// the values mean.
pub struct Debouncer<T: 'static> {
    window_ms: i32,
    state: Rc<RefCell<DebounceState<T>>>,
    handler: Rc<dyn Fn(T)>,
}

impl<T> Clone for Debouncer<T> {
    fn clone(&self) -> Self {
        Debouncer {
            window_ms: self.window_ms,
            state: Rc::clone(&self.state),
            handler: Rc::clone(&self.handler),
        }
    }
}

impl<T> Debouncer<T> {
    pub fn new(window_ms: i32, handler: impl Fn(T) + 'static) -> Self {
        Debouncer {
            window_ms,
            state: Rc::new(RefCell::new(DebounceState::new())),
            handler: Rc::new(handler),
        }
    }

    /// Schedule `value` for delivery after the quiet window. Earlier
    /// in-flight timers become stale and no-op when they go off.
    pub fn call(&self, value: T) {
        let token = self.state.borrow_mut().submit(value);
        let state = Rc::clone(&self.state);
        let handler = Rc::clone(&self.handler);
        let closure = Closure::once(Box::new(move || {
            let fired = state.borrow_mut().fire(token);
            if let Some(value) = fired {
                handler(value);
            }
        }) as Box<dyn FnOnce()>);

        if let Some(window) = web_sys::window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                self.window_ms,
            );
        }
        closure.forget();
    }
}

/// Phase of one +/− stepper control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepPhase {
    #[default]
    Idle,
    Requested,
    Applying,
}

/// Serializes repeated stepper presses: a press is accepted only from
/// `Idle`, applied from `Requested`, and further presses are rejected until
/// `finish` returns the gate to `Idle`. Replaces the old chain of boolean
/// toggles that retriggered each other.
#[derive(Debug, Default)]
pub struct StepperGate {
    phase: StepPhase,
}

impl StepperGate {
    pub fn new() -> Self {
        StepperGate::default()
    }

    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    /// Accept a press. Returns false while a previous press is in flight.
    pub fn request(&mut self) -> bool {
        if self.phase == StepPhase::Idle {
            self.phase = StepPhase::Requested;
            true
        } else {
            false
        }
    }

    /// Move an accepted press into `Applying`.
    pub fn begin(&mut self) -> bool {
        if self.phase == StepPhase::Requested {
            self.phase = StepPhase::Applying;
            true
        } else {
            false
        }
    }

    pub fn finish(&mut self) {
        if self.phase == StepPhase::Applying {
            self.phase = StepPhase::Idle;
        }
    }
}

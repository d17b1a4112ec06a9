//! Slint-facing controller for the word space window.
//!
//! [`WordSpaceController`] owns the [`Experiment`] and translates raw Slint
//! callback arguments (lengths, key text, stack indices) into experiment
//! operations. After anything visible changes it invokes the refresh
//! handler installed by the application, which copies [`TokenView`]s into
//! the window's own token model.
//!
//! # Example
//!
//! ```ignore
//! use word_space::WordSpaceController;
//!
//! slint::include_modules!();
//!
//! fn main() {
//!     let window = MainWindow::new().unwrap();
//!     let ctrl = WordSpaceController::new(experiment);
//!     let tokens = Rc::new(VecModel::<TokenData>::default());
//!     let w = window.as_weak();
//!
//!     window.set_stack_words(ctrl.stack_model());
//!     window.set_tokens(ModelRc::from(tokens.clone()));
//!     ctrl.set_refresh_handler(move |ctrl| {
//!         if let Some(w) = w.upgrade() {
//!             tokens.set_vec(ctrl.token_views().iter().map(to_token_data).collect::<Vec<_>>());
//!             w.set_zoom_text(ctrl.zoom_text());
//!         }
//!     });
//!
//!     window.on_pointer_pressed(ctrl.pointer_pressed_callback());
//!     window.on_scrolled(ctrl.scrolled_callback());
//!     window.on_key_pressed(ctrl.key_pressed_callback());
//!     window.on_place_word(ctrl.place_word_callback());
//!     window.run().unwrap();
//! }
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use slint::platform::Key;
use slint::{ModelRc, SharedString, VecModel};

use crate::error::Result;
use crate::experiment::{Experiment, TrialEnd};
use crate::input::{ArrowKey, InputEvent, ViewportEvent};
use crate::sequencer::COMPLETION_MESSAGE;
use crate::transform::{Point, Size};
use crate::viewport::TokenView;

type RefreshHandler = Rc<dyn Fn(&WordSpaceController)>;

/// Shares one experiment across every UI callback.
///
/// Clone this controller to move it into callbacks; all clones drive the
/// same experiment.
#[derive(Clone)]
pub struct WordSpaceController {
    experiment: Rc<RefCell<Experiment>>,
    stack_words: Rc<VecModel<SharedString>>,
    status: Rc<RefCell<SharedString>>,
    on_refresh: Rc<RefCell<Option<RefreshHandler>>>,
}

impl WordSpaceController {
    pub fn new(experiment: Experiment) -> Self {
        let stack_words: Rc<VecModel<SharedString>> = Rc::new(VecModel::default());
        experiment.stack().sync_to_model(&stack_words);
        let status = if experiment.is_complete() {
            SharedString::from(COMPLETION_MESSAGE)
        } else {
            SharedString::new()
        };
        Self {
            experiment: Rc::new(RefCell::new(experiment)),
            stack_words,
            status: Rc::new(RefCell::new(status)),
            on_refresh: Rc::new(RefCell::new(None)),
        }
    }

    /// Get access to the experiment.
    pub fn experiment(&self) -> Rc<RefCell<Experiment>> {
        self.experiment.clone()
    }

    /// Called after every change that moves, adds or removes tokens.
    ///
    /// The handler receives the controller; capturing a clone of it inside
    /// the handler would keep the experiment alive forever.
    pub fn set_refresh_handler(&self, handler: impl Fn(&WordSpaceController) + 'static) {
        *self.on_refresh.borrow_mut() = Some(Rc::new(handler));
    }

    pub fn refresh(&self) {
        let handler = self.on_refresh.borrow().clone();
        if let Some(handler) = handler {
            handler(self);
        }
    }

    // === Read-only views ===

    /// Words still waiting in the side panel, kept in sync by the controller.
    pub fn stack_model(&self) -> ModelRc<SharedString> {
        ModelRc::from(self.stack_words.clone())
    }

    pub fn token_views(&self) -> Vec<TokenView> {
        self.experiment.borrow().viewport().token_views()
    }

    pub fn title(&self) -> SharedString {
        self.experiment.borrow().title().into()
    }

    pub fn zoom_text(&self) -> SharedString {
        self.experiment.borrow().viewport().zoom_label().into()
    }

    pub fn highlight_mode(&self) -> bool {
        self.experiment.borrow().viewport().highlight_mode()
    }

    pub fn highlight_label(&self) -> SharedString {
        let state = if self.highlight_mode() { "ON" } else { "OFF" };
        format!("Highlight Mode: {state}").into()
    }

    /// Last trial message or error, for a status line.
    pub fn status(&self) -> SharedString {
        self.status.borrow().clone()
    }

    pub fn is_complete(&self) -> bool {
        self.experiment.borrow().is_complete()
    }

    // === Callback factories ===

    /// Returns a callback for `pointer-pressed(x, y)`.
    pub fn pointer_pressed_callback(&self) -> impl Fn(f32, f32) {
        let ctrl = self.clone();
        move |x, y| {
            ctrl.handle_input(InputEvent::PointerDown(Point::new(x, y)));
        }
    }

    /// Returns a callback for `pointer-moved(x, y)`.
    pub fn pointer_moved_callback(&self) -> impl Fn(f32, f32) {
        let ctrl = self.clone();
        move |x, y| {
            ctrl.handle_input(InputEvent::PointerMove(Point::new(x, y)));
        }
    }

    /// Returns a callback for `pointer-released(x, y)`.
    pub fn pointer_released_callback(&self) -> impl Fn(f32, f32) {
        let ctrl = self.clone();
        move |x, y| {
            ctrl.handle_input(InputEvent::PointerUp(Point::new(x, y)));
        }
    }

    /// Returns a callback for `scrolled(x, y, delta)`.
    ///
    /// The wheel position becomes the zoom pivot.
    pub fn scrolled_callback(&self) -> impl Fn(f32, f32, f32) {
        let ctrl = self.clone();
        move |x, y, delta| {
            ctrl.handle_input(InputEvent::PointerMove(Point::new(x, y)));
            ctrl.handle_input(InputEvent::WheelScroll { delta });
        }
    }

    /// Returns a callback for `key-pressed(text) -> bool`; `true` when the
    /// key was an arrow key and has been handled.
    pub fn key_pressed_callback(&self) -> impl Fn(SharedString) -> bool {
        let ctrl = self.clone();
        move |text| ctrl.handle_key(&text)
    }

    /// Returns a callback for `place-word(index)`.
    pub fn place_word_callback(&self) -> impl Fn(i32) {
        let ctrl = self.clone();
        move |index| {
            ctrl.place_word(index);
        }
    }

    /// Returns a callback for `end-trial()`; the outcome lands in
    /// [`WordSpaceController::status`].
    pub fn end_trial_callback(&self) -> impl Fn() {
        let ctrl = self.clone();
        move || {
            // Logged and shown in the status line by `end_trial`.
            let _ = ctrl.end_trial();
        }
    }

    /// Returns a callback for `canvas-resized(width, height)`.
    pub fn canvas_resized_callback(&self) -> impl Fn(f32, f32) {
        let ctrl = self.clone();
        move |width, height| ctrl.set_canvas_size(width, height)
    }

    /// Returns a callback for `recenter()`.
    pub fn recenter_callback(&self) -> impl Fn() {
        let ctrl = self.clone();
        move || ctrl.recenter()
    }

    /// Returns a callback for `toggle-highlight()`.
    pub fn toggle_highlight_callback(&self) -> impl Fn() {
        let ctrl = self.clone();
        move || {
            ctrl.toggle_highlight_mode();
        }
    }

    // === Direct handlers ===

    pub fn handle_input(&self, event: InputEvent) -> Option<ViewportEvent> {
        let result = self.experiment.borrow_mut().handle_input(event);
        if result.is_some_and(|e| e.needs_redraw()) {
            self.refresh();
        }
        result
    }

    /// Route a Slint key event text. Non-arrow keys are left to the UI.
    pub fn handle_key(&self, text: &str) -> bool {
        match arrow_key_from_text(text) {
            Some(key) => {
                self.handle_input(InputEvent::KeyPress(key));
                true
            }
            None => false,
        }
    }

    pub fn place_word(&self, index: i32) -> bool {
        let Ok(index) = usize::try_from(index) else {
            return false;
        };
        let placed = {
            let mut experiment = self.experiment.borrow_mut();
            let placed = experiment.place_word(index).is_some();
            experiment.stack().sync_to_model(&self.stack_words);
            placed
        };
        if placed {
            self.refresh();
        }
        placed
    }

    /// Follow a canvas resize. Degenerate or unchanged sizes are ignored.
    pub fn set_canvas_size(&self, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let size = Size::new(width, height);
        {
            let mut experiment = self.experiment.borrow_mut();
            if experiment.viewport().canvas_size() == size {
                return;
            }
            experiment.viewport_mut().set_canvas_size(size);
        }
        tracing::debug!(width, height, "canvas resized");
        self.refresh();
    }

    pub fn recenter(&self) {
        self.experiment.borrow_mut().recenter();
        self.refresh();
    }

    pub fn toggle_highlight_mode(&self) -> bool {
        let mode = self.experiment.borrow_mut().toggle_highlight_mode();
        self.refresh();
        mode
    }

    /// End the current trial, updating the stack model and status line.
    ///
    /// Errors are also written to the status line; the trial stays open.
    pub fn end_trial(&self) -> Result<TrialEnd> {
        let result = {
            let mut experiment = self.experiment.borrow_mut();
            let result = experiment.end_trial();
            experiment.stack().sync_to_model(&self.stack_words);
            result
        };
        *self.status.borrow_mut() = match &result {
            Ok(end) => end.message().into(),
            Err(err) => {
                tracing::warn!(error = %err, "trial could not be ended");
                err.to_string().into()
            }
        };
        self.refresh();
        result
    }

    /// Flag the session as interrupted if the experiment is unfinished.
    pub fn interrupt(&self, kind: Option<String>) -> Result<()> {
        self.experiment.borrow_mut().interrupt(kind)
    }
}

/// Map the text of a Slint key event to an arrow key.
pub fn arrow_key_from_text(text: &str) -> Option<ArrowKey> {
    [
        (Key::LeftArrow, ArrowKey::Left),
        (Key::RightArrow, ArrowKey::Right),
        (Key::UpArrow, ArrowKey::Up),
        (Key::DownArrow, ArrowKey::Down),
    ]
    .into_iter()
    .find(|(key, _)| SharedString::from(*key) == text)
    .map(|(_, arrow)| arrow)
}

//! Test harness for the word space window.
//!
//! Provides a complete setup mirroring `demos/word-arrangement/src/main.rs`
//! with callback tracking and helper methods for simulating user
//! interactions. Results go to a temporary data directory.

#![allow(dead_code)]

use super::CallbackTracker;
use slint::{
    platform::{Key, PointerEventButton, WindowEvent},
    ComponentHandle, LogicalPosition, LogicalSize, Model, ModelRc, VecModel,
};
use std::rc::Rc;
use tempfile::TempDir;
use word_space::{
    Config, CsvResultWriter, Experiment, ExperimentConfig, TokenView, Viewport, WordList,
    WordSpaceController,
};

// Include the compiled UI from build.rs
slint::include_modules!();

/// Two trials of three words each.
pub const DEFAULT_WORDS: &str = "\
trial;w1;w2;w3
1;sun;moon;star
2;cat;dog;fish
";

/// Initialize the testing backend for this thread.
/// With init_no_event_loop(), each test thread can have its own backend instance.
/// Uses thread_local to ensure each thread only initializes once.
fn init_testing_backend() {
    use std::cell::Cell;
    thread_local! {
        static INITIALIZED: Cell<bool> = const { Cell::new(false) };
    }

    INITIALIZED.with(|init| {
        if !init.get() {
            i_slint_backend_testing::init_no_event_loop();
            init.set(true);
        }
    });
}

pub fn default_config() -> Config {
    Config {
        experiment: ExperimentConfig {
            training_trials: 1,
            main_trials: 1,
            words_per_trial: Some(3),
        },
        ..Config::default()
    }
}

pub fn token_data(view: &TokenView) -> TokenData {
    TokenData {
        id: view.id.0 as i32,
        word: view.word.clone(),
        x: view.x,
        y: view.y,
        width: view.width,
        height: view.height,
        highlighted: view.highlighted,
        fill: view.fill,
        text_color: view.text_color,
        outline: view.outline,
        outline_width: view.outline_width,
    }
}

/// Test harness for the word space window.
///
/// Sets up the experiment, models, and all callbacks with tracking.
pub struct WordSpaceHarness {
    pub window: MainWindow,
    pub ctrl: WordSpaceController,
    pub tokens: Rc<VecModel<TokenData>>,
    pub tracker: CallbackTracker,
    pub data_dir: TempDir,
}

impl WordSpaceHarness {
    /// Create a new test harness with the default two-trial word list.
    pub fn new() -> Self {
        Self::with_words(DEFAULT_WORDS, default_config())
    }

    /// Create a new test harness with a custom word list and configuration.
    pub fn with_words(words: &str, config: Config) -> Self {
        init_testing_backend();
        let data_dir = tempfile::tempdir().unwrap();
        let wordlist = WordList::parse(words, &config.experiment).unwrap();
        let sink = CsvResultWriter::with_directory(data_dir.path(), &config.output);
        let viewport = Viewport::with_seed(&config, 42);
        let canvas = config.canvas.size();
        let experiment =
            Experiment::with_viewport(config, viewport, wordlist, "P001", Box::new(sink)).unwrap();

        let window = MainWindow::new().unwrap();
        window
            .window()
            .set_size(LogicalSize::new(canvas.width + 200.0, canvas.height + 44.0));
        let ctrl = WordSpaceController::new(experiment);
        let tracker = CallbackTracker::new();
        let w = window.as_weak();

        let tokens = Rc::new(VecModel::<TokenData>::default());
        window.set_tokens(ModelRc::from(tokens.clone()));
        window.set_stack_words(ctrl.stack_model());
        window.set_canvas_width(canvas.width);
        window.set_canvas_height(canvas.height);

        // Refresh - copy token views and labels into the window
        ctrl.set_refresh_handler({
            let tokens = tokens.clone();
            let tracker = tracker.clone();
            let w = w.clone();
            move |ctrl| {
                tokens.set_vec(ctrl.token_views().iter().map(token_data).collect::<Vec<_>>());
                if let Some(w) = w.upgrade() {
                    w.set_window_title(ctrl.title());
                    w.set_zoom_text(ctrl.zoom_text());
                    w.set_highlight_text(ctrl.highlight_label());
                    w.set_status_text(ctrl.status());
                }
                *tracker.refreshes.borrow_mut() += 1;
            }
        });

        // Canvas input - controller handles the logic
        window.on_pointer_pressed({
            let handler = ctrl.pointer_pressed_callback();
            let tracker = tracker.clone();
            move |x, y| {
                tracker.pointer_pressed.borrow_mut().push((x, y));
                handler(x, y);
            }
        });
        window.on_pointer_moved(ctrl.pointer_moved_callback());
        window.on_pointer_released({
            let handler = ctrl.pointer_released_callback();
            let tracker = tracker.clone();
            move |x, y| {
                tracker.pointer_released.borrow_mut().push((x, y));
                handler(x, y);
            }
        });
        window.on_scrolled({
            let handler = ctrl.scrolled_callback();
            let tracker = tracker.clone();
            move |x, y, delta| {
                tracker.scrolled.borrow_mut().push((x, y, delta));
                handler(x, y, delta);
            }
        });
        window.on_key_pressed({
            let ctrl = ctrl.clone();
            let tracker = tracker.clone();
            move |text| {
                tracker.key_pressed.borrow_mut().push(text.to_string());
                ctrl.handle_key(&text)
            }
        });

        // Side panel and buttons
        window.on_place_word({
            let ctrl = ctrl.clone();
            let tracker = tracker.clone();
            move |index| {
                tracker.place_word.borrow_mut().push(index);
                ctrl.place_word(index);
            }
        });
        window.on_end_trial({
            let ctrl = ctrl.clone();
            let tracker = tracker.clone();
            move || {
                *tracker.end_trial.borrow_mut() += 1;
                let _ = ctrl.end_trial();
            }
        });
        window.on_canvas_resized(ctrl.canvas_resized_callback());
        window.on_recenter(ctrl.recenter_callback());
        window.on_toggle_highlight(ctrl.toggle_highlight_callback());

        ctrl.refresh();

        Self {
            window,
            ctrl,
            tokens,
            tracker,
            data_dir,
        }
    }

    /// Process all pending events and render a frame.
    pub fn pump_events(&self) {
        slint::platform::update_timers_and_animations();
    }

    /// Token data by word, as currently shown.
    pub fn token(&self, word: &str) -> Option<TokenData> {
        (0..self.tokens.row_count())
            .filter_map(|i| self.tokens.row_data(i))
            .find(|t| t.word.as_str() == word)
    }

    /// Device-space centre of the token showing `word`.
    pub fn token_center(&self, word: &str) -> Option<(f32, f32)> {
        let t = self.token(word)?;
        Some((t.x + t.width / 2.0, t.y + t.height / 2.0))
    }

    /// Place every word left in the stack, in order.
    pub fn place_all_words(&self) {
        while self.window.get_stack_words().row_count() > 0 {
            self.window.invoke_place_word(0);
        }
    }

    // === Mouse event helpers ===

    /// Simulate mouse down at the given position.
    pub fn mouse_down(&self, x: f32, y: f32) {
        self.window
            .window()
            .dispatch_event(WindowEvent::PointerPressed {
                position: LogicalPosition::new(x, y),
                button: PointerEventButton::Left,
            });
        self.pump_events();
    }

    /// Simulate mouse move to the given position.
    pub fn mouse_move(&self, x: f32, y: f32) {
        self.window
            .window()
            .dispatch_event(WindowEvent::PointerMoved {
                position: LogicalPosition::new(x, y),
            });
        self.pump_events();
    }

    /// Simulate mouse up at the given position.
    pub fn mouse_up(&self, x: f32, y: f32) {
        self.window
            .window()
            .dispatch_event(WindowEvent::PointerReleased {
                position: LogicalPosition::new(x, y),
                button: PointerEventButton::Left,
            });
        self.pump_events();
    }

    /// Simulate a complete click (down + up) at the given position.
    pub fn click(&self, x: f32, y: f32) {
        self.mouse_down(x, y);
        self.mouse_up(x, y);
    }

    /// Simulate a complete drag from start to end.
    pub fn drag(&self, start_x: f32, start_y: f32, end_x: f32, end_y: f32) {
        self.mouse_down(start_x, start_y);
        self.mouse_move(end_x, end_y);
        self.mouse_up(end_x, end_y);
    }

    /// Simulate scroll (for zoom).
    pub fn scroll(&self, x: f32, y: f32, delta_y: f32) {
        self.window
            .window()
            .dispatch_event(WindowEvent::PointerScrolled {
                position: LogicalPosition::new(x, y),
                delta_x: 0.0,
                delta_y,
            });
        self.pump_events();
    }

    // === Keyboard event helpers ===

    /// Simulate a key press.
    pub fn key_press(&self, key: Key) {
        self.window.window().dispatch_event(WindowEvent::KeyPressed {
            text: key.into(),
        });
        self.pump_events();
    }

    /// Simulate a key release.
    pub fn key_release(&self, key: Key) {
        self.window.window().dispatch_event(WindowEvent::KeyReleased {
            text: key.into(),
        });
        self.pump_events();
    }

    /// Simulate a complete key press and release.
    pub fn key_tap(&self, key: Key) {
        self.key_press(key);
        self.key_release(key);
    }
}

impl Default for WordSpaceHarness {
    fn default() -> Self {
        Self::new()
    }
}

//! Common test utilities for integration tests.

#![allow(dead_code)]

pub mod harness;

use std::cell::RefCell;
use std::rc::Rc;

/// Tracks callback invocations for testing.
///
/// Each field records calls to the corresponding callback with their arguments.
#[derive(Default, Clone)]
pub struct CallbackTracker {
    /// (x, y)
    pub pointer_pressed: Rc<RefCell<Vec<(f32, f32)>>>,
    /// (x, y)
    pub pointer_released: Rc<RefCell<Vec<(f32, f32)>>>,
    /// (x, y, delta)
    pub scrolled: Rc<RefCell<Vec<(f32, f32, f32)>>>,
    /// Key event text
    pub key_pressed: Rc<RefCell<Vec<String>>>,
    /// Stack index
    pub place_word: Rc<RefCell<Vec<i32>>>,
    /// Count of end_trial calls
    pub end_trial: Rc<RefCell<usize>>,
    /// Count of refresh handler runs
    pub refreshes: Rc<RefCell<usize>>,
}

impl CallbackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all recorded callbacks.
    pub fn clear(&self) {
        self.pointer_pressed.borrow_mut().clear();
        self.pointer_released.borrow_mut().clear();
        self.scrolled.borrow_mut().clear();
        self.key_pressed.borrow_mut().clear();
        self.place_word.borrow_mut().clear();
        *self.end_trial.borrow_mut() = 0;
        *self.refreshes.borrow_mut() = 0;
    }
}

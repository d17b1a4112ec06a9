//! # Word Space
//!
//! A pannable, zoomable canvas on which participants arrange word tokens by
//! relatedness, plus the trial bookkeeping around it.
//!
//! ## Features
//!
//! - **Logical coordinates** - Token positions are independent of zoom and pan
//! - **Pivot zoom** - The point under the pointer stays put while zooming
//! - **Strict accounting** - Every trial's layout is recorded; the final count is checked
//! - **Single write** - Results are persisted once, at the end of the experiment
//! - **Recoverable sessions** - A JSON session log allows resuming after an interruption
//!
//! ## Quick Start
//!
//! ```slint
//! import { WordSpaceWindow } from "@word-space/word_space.slint";
//!
//! export component MainWindow inherits WordSpaceWindow { }
//! ```
//!
//! ## Core Types
//!
//! - [`Transform`] - Logical/device coordinate mapping with pivot zoom
//! - [`Token`] - A draggable, highlightable word on the canvas
//! - [`Viewport`] - The canvas: tokens plus the current view
//! - [`InputDispatcher`] - Routes pointer, wheel and key events
//! - [`TrialSequencer`] - Trial progression and result accounting
//! - [`Experiment`] - One participant's full run
//! - [`WordSpaceController`] - Slint callback glue
//!
//! Configuration comes from [`Config`], loadable from JSON; every
//! fallible operation returns [`Result`] with an [`ExperimentError`].

pub mod config;
pub mod controller;
pub mod error;
pub mod experiment;
pub mod input;
pub mod results;
pub mod sequencer;
pub mod session;
pub mod stack;
pub mod token;
pub mod transform;
pub mod viewport;
pub mod wordlist;

pub use config::{
    CanvasConfig, Config, ControlsConfig, ExperimentConfig, OutputConfig, PlacementConfig,
    TokenConfig, ZoomConfig,
};
pub use controller::{arrow_key_from_text, WordSpaceController};
pub use error::{ExperimentError, Result};
pub use experiment::{Experiment, TrialEnd};
pub use input::{ArrowKey, InputDispatcher, InputEvent, ViewportEvent};
pub use results::{CsvResultWriter, MemorySink, ResultSink, TrialRecord, CSV_HEADER};
pub use sequencer::{RecordOutcome, TrialAdvance, TrialSequencer, COMPLETION_MESSAGE};
pub use session::{SessionFile, SessionLog};
pub use stack::WordStack;
pub use token::{Token, TokenId, TokenSnapshot};
pub use transform::{Bounds, Point, Size, Transform, ZoomChange};
pub use viewport::{TokenView, Viewport};
pub use wordlist::{TrialWords, WordList};

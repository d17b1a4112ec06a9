//! One participant's run through every trial of a word list.
//!
//! [`Experiment`] ties the canvas, the word stack, the trial sequencer and
//! the session log together. It knows nothing about Slint; the controller
//! drives it from UI callbacks.

use std::path::PathBuf;

use crate::config::Config;
use crate::error::{ExperimentError, Result};
use crate::input::{InputDispatcher, InputEvent, ViewportEvent};
use crate::results::ResultSink;
use crate::sequencer::{TrialAdvance, TrialSequencer};
use crate::session::SessionFile;
use crate::stack::WordStack;
use crate::token::TokenId;
use crate::viewport::Viewport;
use crate::wordlist::WordList;

pub const WINDOW_TITLE_PREFIX: &str = "Word Relatedness";

/// Result of a successful `end_trial`.
#[derive(Debug, Clone, PartialEq)]
pub enum TrialEnd {
    Next { trial: usize, message: String },
    Finished { message: String, artifact: Option<PathBuf> },
}

impl TrialEnd {
    /// Text for the status line.
    pub fn message(&self) -> &str {
        match self {
            Self::Next { message, .. } | Self::Finished { message, .. } => message,
        }
    }
}

/// A participant's run: the canvas for the current trial, the words still
/// to place, and everything recorded so far.
///
/// Results are written once, when the final trial ends. With a session
/// attached, every completed trial is also noted in the session log.
pub struct Experiment {
    config: Config,
    viewport: Viewport,
    input: InputDispatcher,
    stack: WordStack,
    sequencer: TrialSequencer,
    wordlist: WordList,
    sink: Box<dyn ResultSink>,
    session: Option<SessionFile>,
}

impl Experiment {
    /// Start at trial 1 with the first trial's words in the stack.
    ///
    /// Fails with [`ExperimentError::MissingParticipant`] for an empty
    /// participant id.
    pub fn new(
        config: Config,
        wordlist: WordList,
        participant_id: impl Into<String>,
        sink: Box<dyn ResultSink>,
    ) -> Result<Self> {
        let viewport = Viewport::new(&config);
        Self::with_viewport(config, viewport, wordlist, participant_id, sink)
    }

    /// Same as [`Experiment::new`] with a caller-built viewport, e.g. one
    /// with seeded placement jitter.
    pub fn with_viewport(
        config: Config,
        viewport: Viewport,
        wordlist: WordList,
        participant_id: impl Into<String>,
        sink: Box<dyn ResultSink>,
    ) -> Result<Self> {
        let participant_id = participant_id.into();
        if participant_id.is_empty() {
            return Err(ExperimentError::MissingParticipant);
        }
        let sequencer = TrialSequencer::new(
            Some(participant_id),
            wordlist.trial_sizes(),
            config.output.invert_y,
        )?;
        let input = InputDispatcher::new(&config);
        let mut experiment = Self {
            config,
            viewport,
            input,
            stack: WordStack::default(),
            sequencer,
            wordlist,
            sink,
            session: None,
        };
        experiment.start_trial();
        Ok(experiment)
    }

    /// Continue a previous session at the trial its log points to.
    ///
    /// A log whose trials are all complete leaves the experiment complete
    /// with an empty canvas and stack; nothing is re-run.
    pub fn resume(&mut self, mut session: SessionFile) -> Result<()> {
        match session.log().next_trial() {
            Some(trial) => {
                self.sequencer.resume_from(trial)?;
                session.record_resumed()?;
            }
            None => self.sequencer.resume_completed()?,
        }
        self.session = Some(session);
        self.start_trial();
        Ok(())
    }

    /// Keep `session` up to date from now on. Used for new sessions;
    /// [`Experiment::resume`] attaches the session it resumes.
    pub fn attach_session(&mut self, session: SessionFile) {
        self.session = Some(session);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn stack(&self) -> &WordStack {
        &self.stack
    }

    pub fn sequencer(&self) -> &TrialSequencer {
        &self.sequencer
    }

    pub fn session(&self) -> Option<&SessionFile> {
        self.session.as_ref()
    }

    /// 1-based number of the trial being run.
    pub fn current_trial(&self) -> usize {
        self.sequencer.current_trial()
    }

    /// True once the final trial has ended.
    pub fn is_complete(&self) -> bool {
        self.sequencer.is_complete()
    }

    /// Whether the current trial is one of the leading training trials.
    pub fn is_training_trial(&self) -> bool {
        self.wordlist
            .trial(self.current_trial())
            .is_some_and(|t| t.training)
    }

    /// `"Word Relatedness - Trial {n} of {max}"`
    pub fn title(&self) -> String {
        format!(
            "{WINDOW_TITLE_PREFIX} - Trial {} of {}",
            self.sequencer.current_trial(),
            self.sequencer.max_trials()
        )
    }

    /// Route a pointer, wheel or key event to the canvas.
    ///
    /// Returns what changed, or `None` when the event had no effect.
    pub fn handle_input(&mut self, event: InputEvent) -> Option<ViewportEvent> {
        self.input.dispatch(&mut self.viewport, event)
    }

    /// Move the word at `index` from the stack onto the canvas, near the
    /// centre of the current view. `None` for an out-of-range index.
    pub fn place_word(&mut self, index: usize) -> Option<TokenId> {
        let word = self.stack.take(index)?;
        let id = self.viewport.add_token(word);
        tracing::debug!(index, ?id, remaining = self.stack.len(), "word placed");
        Some(id)
    }

    /// Fit every token into view, or return to the default view when the
    /// canvas is empty.
    pub fn recenter(&mut self) {
        self.viewport.reset_view();
    }

    /// Returns the new mode.
    pub fn toggle_highlight_mode(&mut self) -> bool {
        self.viewport.toggle_highlight_mode()
    }

    /// Finish the current trial.
    ///
    /// Every word must be on the canvas. The layout is recorded, the session
    /// log notes the trial, and the next trial starts on a cleared canvas.
    /// Ending the final trial writes the results file and returns
    /// [`TrialEnd::Finished`] with its path.
    ///
    /// On failure nothing changes and the participant can fix the problem
    /// and try again. After the final trial this fails with
    /// [`ExperimentError::TrialsExceeded`].
    pub fn end_trial(&mut self) -> Result<TrialEnd> {
        if self.sequencer.is_complete() {
            return Err(ExperimentError::TrialsExceeded);
        }
        self.stack.ensure_empty()?;
        self.input.cancel_drag(&mut self.viewport);

        let trial = self.sequencer.current_trial();
        let snapshot = self.viewport.tokens_snapshot();
        let outcome = self.sequencer.record_trial(&snapshot, self.sink.as_mut())?;

        if let Some(session) = self.session.as_mut() {
            // Results are already committed; a stale log only affects recovery.
            if let Err(err) = session.record_completed(trial, self.sequencer.max_trials()) {
                tracing::warn!(%err, trial, "could not update session log");
            }
        }

        match self.sequencer.advance() {
            TrialAdvance::Continue { message } => {
                tracing::info!(%message);
                self.start_trial();
                Ok(TrialEnd::Next {
                    trial: self.sequencer.current_trial(),
                    message,
                })
            }
            TrialAdvance::Complete { message } => {
                tracing::info!(%message);
                Ok(TrialEnd::Finished {
                    message,
                    artifact: outcome.artifact,
                })
            }
        }
    }

    /// Mark the session as interrupted, e.g. when the window closes early.
    ///
    /// Does nothing once the experiment is complete or without a session.
    pub fn interrupt(&mut self, kind: Option<String>) -> Result<()> {
        if self.sequencer.is_complete() {
            return Ok(());
        }
        if let Some(session) = self.session.as_mut() {
            session.record_interrupted(kind)?;
        }
        Ok(())
    }

    /// Clear the canvas and load the current trial's words into the stack.
    fn start_trial(&mut self) {
        self.input.cancel_drag(&mut self.viewport);
        self.viewport.remove_all_tokens();
        self.viewport.reset_view();
        let trial = self.sequencer.current_trial();
        let words = if self.sequencer.is_complete() {
            None
        } else {
            self.wordlist.trial(trial)
        };
        match words {
            Some(words) => self.stack.refill(words.words.iter().cloned()),
            None => self.stack.refill(std::iter::empty::<String>()),
        }
        tracing::info!(trial, words = self.stack.len(), "trial started");
    }
}

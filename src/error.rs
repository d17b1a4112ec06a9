use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExperimentError>;

/// Everything that can go wrong while setting up or running an experiment.
///
/// Trial-level failures (`MissingParticipant`, `EmptyTrial`,
/// `RecordCountMismatch`, `IncompleteTrialWords`, `Persistence`) are
/// reported to the participant and never change recorded state, so the
/// triggering action can simply be repeated.
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("participant_id is required for saving results")]
    MissingParticipant,

    #[error("no words provided for saving")]
    EmptyTrial,

    #[error("trial completed with {actual} words, expected {expected} in total")]
    RecordCountMismatch { expected: usize, actual: usize },

    #[error("you must use all the words before ending the trial ({remaining} left)")]
    IncompleteTrialWords { remaining: usize },

    #[error("maximum number of trials reached")]
    TrialsExceeded,

    #[error("trial {trial} has already been recorded")]
    TrialAlreadyRecorded { trial: usize },

    #[error("unable to write results to {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExperimentError {
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether the participant can fix the problem and retry the action.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::Configuration { .. } | Self::TrialsExceeded | Self::TrialAlreadyRecorded { .. }
        )
    }
}

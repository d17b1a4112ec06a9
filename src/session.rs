//! Per-participant session log (`<data_dir>/<participant>/log.json`).
//!
//! The log is rewritten after every completed trial so an interrupted
//! session can be resumed from `current_trial`.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const LOG_FILE_NAME: &str = "log.json";

/// Everything needed to resume a participant's session.
///
/// Field names match the JSON keys of `log.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLog {
    pub participant_id: String,
    pub experimenter: String,
    pub wordlist_file: String,
    pub start_time: DateTime<Local>,
    pub interruption_time: Option<DateTime<Local>>,
    pub resume_time: Option<DateTime<Local>>,
    pub end_time: Option<DateTime<Local>>,
    pub interruption_type: Option<String>,
    pub completed_trials: Vec<usize>,
    pub current_trial: usize,
    pub interrupted: bool,
    #[serde(default)]
    pub notes: String,
}

impl SessionLog {
    /// A fresh log starting at trial 1, stamped with the current time.
    pub fn new(
        participant_id: impl Into<String>,
        experimenter: impl Into<String>,
        wordlist_file: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            participant_id: participant_id.into(),
            experimenter: experimenter.into(),
            wordlist_file: wordlist_file.into(),
            start_time: Local::now(),
            interruption_time: None,
            resume_time: None,
            end_time: None,
            interruption_type: None,
            completed_trials: Vec::new(),
            current_trial: 1,
            interrupted: false,
            notes: notes.into(),
        }
    }

    /// Like [`SessionLog::new`], but records `wordlist` as a canonical
    /// absolute path.
    ///
    /// Fails with [`ExperimentError::Io`](crate::ExperimentError::Io) when the file does not exist.
    pub fn for_wordlist(
        participant_id: impl Into<String>,
        experimenter: impl Into<String>,
        wordlist: impl AsRef<Path>,
        notes: impl Into<String>,
    ) -> Result<Self> {
        let absolute = fs::canonicalize(wordlist)?;
        Ok(Self::new(
            participant_id,
            experimenter,
            absolute.display().to_string(),
            notes,
        ))
    }

    /// Trial a resumed session should start at, or `None` when every trial
    /// is already complete.
    pub fn next_trial(&self) -> Option<usize> {
        if self.is_finished() || self.completed_trials.contains(&self.current_trial) {
            None
        } else {
            Some(self.current_trial)
        }
    }

    /// Note that `trial` finished. Repeated notifications are ignored.
    ///
    /// The end time is stamped once every one of `max_trials` trials is
    /// complete.
    pub fn mark_completed(&mut self, trial: usize, max_trials: usize) {
        if self.completed_trials.contains(&trial) {
            return;
        }
        self.completed_trials.push(trial);
        self.current_trial = (trial + 1).min(max_trials);
        if self.completed_trials.len() >= max_trials && self.end_time.is_none() {
            self.end_time = Some(Local::now());
        }
    }

    /// Flag the session as interrupted, e.g. by closing the window.
    pub fn mark_interrupted(&mut self, kind: Option<String>) {
        self.interruption_time = Some(Local::now());
        self.interruption_type = kind;
        self.interrupted = true;
    }

    /// Stamp the resume time. The interruption fields are kept.
    pub fn mark_resumed(&mut self) {
        self.resume_time = Some(Local::now());
    }

    /// True once the end time has been stamped.
    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }
}

/// A [`SessionLog`] bound to the file it is saved in.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
    log: SessionLog,
}

impl SessionFile {
    /// `<data_directory>/<participant_id>/log.json`
    pub fn path_for(data_directory: impl AsRef<Path>, participant_id: &str) -> PathBuf {
        data_directory
            .as_ref()
            .join(participant_id)
            .join(LOG_FILE_NAME)
    }

    /// Start a new log in the participant folder, creating it if needed.
    pub fn create(data_directory: impl AsRef<Path>, log: SessionLog) -> Result<Self> {
        let path = Self::path_for(data_directory, &log.participant_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = Self { path, log };
        file.save()?;
        tracing::info!(path = %file.path.display(), "session log created");
        Ok(file)
    }

    /// Load an existing log, e.g. to resume an interrupted session.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let text = fs::read_to_string(&path)?;
        let log: SessionLog = serde_json::from_str(&text)?;
        tracing::info!(
            path = %path.display(),
            current_trial = log.current_trial,
            "session log loaded"
        );
        Ok(Self { path, log })
    }

    /// Location of `log.json`.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    /// Word list named by the log.
    ///
    /// Relative paths are resolved against the data directory, the parent
    /// of the participant folder holding the log.
    pub fn wordlist_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.log.wordlist_file);
        if path.is_absolute() {
            return path;
        }
        self.path
            .parent()
            .and_then(Path::parent)
            .map(|data| data.join(&path))
            .unwrap_or(path)
    }

    /// Write the log as pretty-printed JSON, replacing the file.
    pub fn save(&self) -> Result<()> {
        let mut out = BufWriter::new(fs::File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut out, &self.log)?;
        out.flush()?;
        Ok(())
    }

    /// [`SessionLog::mark_completed`] followed by [`SessionFile::save`].
    pub fn record_completed(&mut self, trial: usize, max_trials: usize) -> Result<()> {
        self.log.mark_completed(trial, max_trials);
        self.save()
    }

    /// [`SessionLog::mark_interrupted`] followed by a save.
    pub fn record_interrupted(&mut self, kind: Option<String>) -> Result<()> {
        self.log.mark_interrupted(kind);
        self.save()
    }

    /// [`SessionLog::mark_resumed`] followed by a save.
    pub fn record_resumed(&mut self) -> Result<()> {
        self.log.mark_resumed();
        self.save()
    }
}

//! Word list files.
//!
//! One trial per row, `;`-delimited, first column the trial label:
//!
//! ```text
//! trial;word1;word2;word3
//! 1;apple;banana;orange
//! 2;cat;dog;fish
//! ```
//!
//! The first row is a header. Blank cells are skipped and rows without any
//! word are ignored.

use std::fs;
use std::path::Path;

use crate::config::ExperimentConfig;
use crate::error::{ExperimentError, Result};

const DELIMITER: char = ';';

/// The words of one trial, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialWords {
    /// First column of the row, kept for diagnostics.
    pub label: String,
    pub words: Vec<String>,
    /// Set for the first `training_trials` rows.
    pub training: bool,
}

/// Every trial of an experiment, validated against [`ExperimentConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordList {
    trials: Vec<TrialWords>,
}

impl WordList {
    /// Read and [`parse`](Self::parse) a word list file.
    ///
    /// Unreadable files fail with [`ExperimentError::Io`].
    pub fn from_path(path: impl AsRef<Path>, experiment: &ExperimentConfig) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let list = Self::parse(&text, experiment)?;
        tracing::info!(
            path = %path.display(),
            trials = list.len(),
            training = list.training_count(),
            "word list loaded"
        );
        Ok(list)
    }

    /// Parse and validate against the configured trial layout.
    ///
    /// Fails with [`ExperimentError::Configuration`] when no row holds a
    /// word, when the row count differs from
    /// [`ExperimentConfig::total_trials`], or when `words_per_trial` is set
    /// and a row has a different number of words.
    pub fn parse(text: &str, experiment: &ExperimentConfig) -> Result<Self> {
        let mut trials = Vec::new();
        for line in text.lines().skip(1) {
            let mut cells = line.split(DELIMITER).map(str::trim);
            let label = cells.next().unwrap_or_default().to_owned();
            let words: Vec<String> = cells.filter(|c| !c.is_empty()).map(str::to_owned).collect();
            if words.is_empty() {
                continue;
            }
            let training = trials.len() < experiment.training_trials;
            trials.push(TrialWords {
                label,
                words,
                training,
            });
        }

        let list = Self { trials };
        list.validate(experiment)?;
        Ok(list)
    }

    fn validate(&self, experiment: &ExperimentConfig) -> Result<()> {
        if self.trials.is_empty() {
            return Err(ExperimentError::configuration(
                "no valid words found in the word list",
            ));
        }
        let expected = experiment.total_trials();
        if self.trials.len() != expected {
            return Err(ExperimentError::configuration(format!(
                "word list has {} trials, expected {expected}",
                self.trials.len()
            )));
        }
        if let Some(per_trial) = experiment.words_per_trial {
            if let Some((index, trial)) = self
                .trials
                .iter()
                .enumerate()
                .find(|(_, t)| t.words.len() != per_trial)
            {
                return Err(ExperimentError::configuration(format!(
                    "trial {} has {} words, expected {per_trial}",
                    index + 1,
                    trial.words.len()
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Number of training trials at the start of the list.
    pub fn training_count(&self) -> usize {
        self.trials.iter().filter(|t| t.training).count()
    }

    /// Words of `trial` (1-based).
    pub fn trial(&self, trial: usize) -> Option<&TrialWords> {
        trial.checked_sub(1).and_then(|i| self.trials.get(i))
    }

    pub fn trials(&self) -> &[TrialWords] {
        &self.trials
    }

    /// Word count per trial, in trial order.
    pub fn trial_sizes(&self) -> Vec<usize> {
        self.trials.iter().map(|t| t.words.len()).collect()
    }
}

//! Trial progression and result accounting.
//!
//! The sequencer only ever sees [`TokenSnapshot`]s; it never touches the
//! tokens on the canvas. Records accumulate in memory and are handed to a
//! [`ResultSink`] in a single write when the final trial is recorded.

use std::path::{Path, PathBuf};

use crate::error::{ExperimentError, Result};
use crate::results::{ResultSink, TrialRecord};
use crate::token::TokenSnapshot;

pub const COMPLETION_MESSAGE: &str = "All trials completed!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialAdvance {
    Continue { message: String },
    Complete { message: String },
}

impl TrialAdvance {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Continue { message } | Self::Complete { message } => message,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    pub trial_number: usize,
    pub records_added: usize,
    /// Set when this call wrote the final result artifact.
    pub artifact: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct TrialSequencer {
    current_trial: usize,
    /// Trial this run started from; earlier trials belong to a previous run.
    first_trial: usize,
    trial_sizes: Vec<usize>,
    participant_id: Option<String>,
    invert_y: bool,
    /// Last trial whose records were committed; `first_trial - 1` before any.
    recorded_through: usize,
    records: Vec<TrialRecord>,
    artifact: Option<PathBuf>,
    finished: bool,
}

impl TrialSequencer {
    /// `trial_sizes[i]` is the number of words in trial `i + 1`; the number
    /// of entries is the number of trials.
    pub fn new(participant_id: Option<String>, trial_sizes: Vec<usize>, invert_y: bool) -> Result<Self> {
        if trial_sizes.is_empty() {
            return Err(ExperimentError::configuration(
                "experiment needs at least one trial",
            ));
        }
        Ok(Self {
            current_trial: 1,
            first_trial: 1,
            trial_sizes,
            participant_id,
            invert_y,
            recorded_through: 0,
            records: Vec::new(),
            artifact: None,
            finished: false,
        })
    }

    /// Every trial has the same number of words.
    pub fn uniform(
        participant_id: Option<String>,
        max_trials: usize,
        words_per_trial: usize,
        invert_y: bool,
    ) -> Result<Self> {
        Self::new(participant_id, vec![words_per_trial; max_trials], invert_y)
    }

    pub fn bind_participant(&mut self, participant_id: impl Into<String>) {
        self.participant_id = Some(participant_id.into());
    }

    pub fn participant_id(&self) -> Option<&str> {
        self.participant_id.as_deref()
    }

    pub fn current_trial(&self) -> usize {
        self.current_trial
    }

    pub fn max_trials(&self) -> usize {
        self.trial_sizes.len()
    }

    pub fn first_trial(&self) -> usize {
        self.first_trial
    }

    pub fn is_final_trial(&self) -> bool {
        self.current_trial == self.max_trials()
    }

    /// True once `advance()` has reported completion.
    pub fn is_complete(&self) -> bool {
        self.finished
    }

    /// Whether the current trial's records are already committed.
    pub fn is_current_trial_recorded(&self) -> bool {
        self.recorded_through >= self.current_trial
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn artifact(&self) -> Option<&Path> {
        self.artifact.as_deref()
    }

    /// Number of words expected in `trial` (1-based).
    pub fn trial_size(&self, trial: usize) -> Option<usize> {
        trial.checked_sub(1).and_then(|i| self.trial_sizes.get(i)).copied()
    }

    /// Records this run should hold once `trial` has been recorded.
    pub fn expected_records_through(&self, trial: usize) -> usize {
        let end = trial.min(self.max_trials());
        if end < self.first_trial {
            return 0;
        }
        self.trial_sizes[self.first_trial - 1..end].iter().sum()
    }

    /// Continue an interrupted session at `trial`.
    ///
    /// Only allowed before anything has been recorded in this run.
    pub fn resume_from(&mut self, trial: usize) -> Result<()> {
        if trial == 0 || trial > self.max_trials() {
            return Err(ExperimentError::configuration(format!(
                "cannot resume at trial {trial}, experiment has {} trials",
                self.max_trials()
            )));
        }
        if !self.records.is_empty() || self.current_trial != self.first_trial {
            return Err(ExperimentError::configuration(
                "cannot resume a sequencer that already recorded trials",
            ));
        }
        self.current_trial = trial;
        self.first_trial = trial;
        self.recorded_through = trial - 1;
        tracing::info!(trial, "resuming experiment");
        Ok(())
    }

    /// Resume a session whose every trial is already recorded.
    ///
    /// The sequencer is left complete; recording fails with
    /// [`ExperimentError::TrialsExceeded`].
    pub fn resume_completed(&mut self) -> Result<()> {
        if !self.records.is_empty() || self.current_trial != self.first_trial {
            return Err(ExperimentError::configuration(
                "cannot resume a sequencer that already recorded trials",
            ));
        }
        let last = self.max_trials();
        self.current_trial = last;
        self.first_trial = last;
        self.recorded_through = last;
        self.finished = true;
        tracing::info!(trials = last, "resumed a finished experiment");
        Ok(())
    }

    /// Move to the next trial, or report that the experiment is over.
    ///
    /// Never decreases the trial number; at the last trial it keeps
    /// returning [`TrialAdvance::Complete`].
    pub fn advance(&mut self) -> TrialAdvance {
        if self.current_trial >= self.max_trials() {
            self.finished = true;
            return TrialAdvance::Complete {
                message: COMPLETION_MESSAGE.into(),
            };
        }
        let previous = self.current_trial;
        self.current_trial += 1;
        TrialAdvance::Continue {
            message: format!(
                "Trial {previous} complete. Starting trial {}",
                self.current_trial
            ),
        }
    }

    /// Map a logical canvas position to the output coordinate system.
    ///
    /// The canvas has its origin top-left with y growing downwards; output
    /// files use y growing upwards when `invert_y` is set.
    pub fn output_coordinates(&self, x: f32, y: f32) -> (f32, f32) {
        if self.invert_y {
            (x, -y)
        } else {
            (x, y)
        }
    }

    /// Record the final layout of the current trial.
    ///
    /// After every trial the records of this run must equal
    /// [`expected_records_through`](Self::expected_records_through) for the
    /// current trial, otherwise [`ExperimentError::RecordCountMismatch`] is
    /// returned. A trial can be recorded once; call [`advance`](Self::advance)
    /// before recording the next. On the final trial the full result set is
    /// persisted through `sink`. Any error leaves the accumulated records
    /// exactly as they were.
    pub fn record_trial(
        &mut self,
        tokens: &[TokenSnapshot],
        sink: &mut dyn ResultSink,
    ) -> Result<RecordOutcome> {
        let participant_id = match self.participant_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_owned(),
            _ => return Err(ExperimentError::MissingParticipant),
        };
        if tokens.is_empty() {
            return Err(ExperimentError::EmptyTrial);
        }
        if self.artifact.is_some() || self.recorded_through >= self.max_trials() {
            return Err(ExperimentError::TrialsExceeded);
        }
        let trial_number = self.current_trial;
        if self.is_current_trial_recorded() {
            tracing::warn!(trial = trial_number, "trial recorded twice");
            return Err(ExperimentError::TrialAlreadyRecorded {
                trial: trial_number,
            });
        }

        let staged: Vec<TrialRecord> = tokens
            .iter()
            .map(|token| {
                let (x, y) = self.output_coordinates(token.x, token.y);
                TrialRecord {
                    trial_number,
                    word: token.word.clone(),
                    x,
                    y,
                    highlighted: token.highlighted,
                }
            })
            .collect();
        let records_added = staged.len();

        let expected = self.expected_records_through(trial_number);
        let actual = self.records.len() + records_added;
        if actual != expected {
            tracing::warn!(trial = trial_number, expected, actual, "record count mismatch");
            return Err(ExperimentError::RecordCountMismatch { expected, actual });
        }

        if !self.is_final_trial() {
            self.records.extend(staged);
            self.recorded_through = trial_number;
            tracing::info!(trial = trial_number, words = records_added, "trial recorded");
            return Ok(RecordOutcome {
                trial_number,
                records_added,
                artifact: None,
            });
        }

        let mut all = Vec::with_capacity(actual);
        all.extend_from_slice(&self.records);
        all.extend(staged);
        let path = sink.persist(&participant_id, &all)?;

        self.records = all;
        self.recorded_through = trial_number;
        self.artifact = Some(path.clone());
        tracing::info!(trial = trial_number, total = actual, "final trial recorded");
        Ok(RecordOutcome {
            trial_number,
            records_added,
            artifact: Some(path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::MemorySink;
    use crate::token::TokenId;
    use std::io;

    fn tokens(words: &[&str]) -> Vec<TokenSnapshot> {
        words
            .iter()
            .enumerate()
            .map(|(i, w)| TokenSnapshot {
                id: TokenId(i as u32 + 1),
                word: (*w).to_owned(),
                x: i as f32 * 10.0,
                y: 5.0 + i as f32,
                highlighted: i == 0,
            })
            .collect()
    }

    fn sequencer(max_trials: usize, words: usize) -> TrialSequencer {
        TrialSequencer::uniform(Some("P001".into()), max_trials, words, true).unwrap()
    }

    // ========================================================================
    // advance()
    // ========================================================================

    #[test]
    fn test_advance_increments_until_last_trial() {
        let mut seq = sequencer(3, 1);
        let step = seq.advance();
        assert_eq!(
            step,
            TrialAdvance::Continue {
                message: "Trial 1 complete. Starting trial 2".into()
            }
        );
        assert_eq!(seq.current_trial(), 2);
        assert!(!seq.advance().is_complete());
        assert_eq!(seq.current_trial(), 3);
        assert!(!seq.is_complete());
    }

    #[test]
    fn test_advance_at_last_trial_is_terminal_and_repeatable() {
        let mut seq = sequencer(2, 1);
        seq.advance();
        for _ in 0..3 {
            let step = seq.advance();
            assert!(step.is_complete());
            assert_eq!(step.message(), "All trials completed!");
            assert_eq!(seq.current_trial(), 2);
        }
        assert!(seq.is_complete());
    }

    #[test]
    fn test_single_trial_experiment_completes_immediately() {
        let mut seq = sequencer(1, 2);
        assert!(seq.is_final_trial());
        assert!(seq.advance().is_complete());
    }

    // ========================================================================
    // record_trial() - failures
    // ========================================================================

    #[test]
    fn test_record_without_participant_fails() {
        let mut seq = TrialSequencer::uniform(None, 2, 1, true).unwrap();
        let err = seq.record_trial(&tokens(&["a"]), &mut MemorySink::default()).unwrap_err();
        assert!(matches!(err, ExperimentError::MissingParticipant));

        seq.bind_participant("");
        let err = seq.record_trial(&tokens(&["a"]), &mut MemorySink::default()).unwrap_err();
        assert!(matches!(err, ExperimentError::MissingParticipant));
    }

    #[test]
    fn test_record_empty_trial_fails() {
        let mut seq = sequencer(2, 1);
        let err = seq.record_trial(&[], &mut MemorySink::default()).unwrap_err();
        assert!(matches!(err, ExperimentError::EmptyTrial));
        assert!(seq.records().is_empty());
    }

    #[test]
    fn test_final_trial_count_mismatch_fails_without_persisting() {
        let mut seq = sequencer(2, 3);
        let mut sink = MemorySink::default();
        seq.record_trial(&tokens(&["a", "b", "c"]), &mut sink).unwrap();
        seq.advance();

        let err = seq.record_trial(&tokens(&["d", "e"]), &mut sink).unwrap_err();
        match err {
            ExperimentError::RecordCountMismatch { expected, actual } => {
                assert_eq!(expected, 6);
                assert_eq!(actual, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(sink.written.is_empty());
        assert_eq!(seq.records().len(), 3);
    }

    #[test]
    fn test_persistence_failure_keeps_records_and_allows_retry() {
        let mut seq = sequencer(2, 1);
        let mut sink = MemorySink::default();
        seq.record_trial(&tokens(&["a"]), &mut sink).unwrap();
        seq.advance();

        sink.fail_with = Some(io::ErrorKind::PermissionDenied);
        let err = seq.record_trial(&tokens(&["b"]), &mut sink).unwrap_err();
        assert!(matches!(err, ExperimentError::Persistence { .. }));
        assert_eq!(seq.records().len(), 1);
        assert!(seq.artifact().is_none());

        sink.fail_with = None;
        let outcome = seq.record_trial(&tokens(&["b"]), &mut sink).unwrap();
        assert!(outcome.artifact.is_some());
        assert_eq!(seq.records().len(), 2);
    }

    #[test]
    fn test_recording_after_persist_is_rejected() {
        let mut seq = sequencer(1, 1);
        let mut sink = MemorySink::default();
        seq.record_trial(&tokens(&["a"]), &mut sink).unwrap();
        let err = seq.record_trial(&tokens(&["a"]), &mut sink).unwrap_err();
        assert!(matches!(err, ExperimentError::TrialsExceeded));
        assert_eq!(sink.written.len(), 1);
    }

    // ========================================================================
    // record_trial() - accounting
    // ========================================================================

    #[test]
    fn test_two_trial_scenario_persists_once() {
        let mut seq = sequencer(2, 3);
        let mut sink = MemorySink::default();

        let first = seq.record_trial(&tokens(&["a", "b", "c"]), &mut sink).unwrap();
        assert_eq!(first.records_added, 3);
        assert_eq!(first.artifact, None);
        assert_eq!(seq.records().len(), 3);
        assert!(sink.written.is_empty());

        assert!(!seq.advance().is_complete());

        let second = seq.record_trial(&tokens(&["d", "e", "f"]), &mut sink).unwrap();
        assert!(second.artifact.is_some());
        assert_eq!(seq.records().len(), 6);
        assert_eq!(sink.written.len(), 1);

        let (participant, rows) = &sink.written[0];
        assert_eq!(participant, "P001");
        assert_eq!(rows.len(), 6);
        assert!(rows[..3].iter().all(|r| r.trial_number == 1));
        assert!(rows[3..].iter().all(|r| r.trial_number == 2));
        assert!(seq.advance().is_complete());
    }

    #[test]
    fn test_records_use_inverted_y() {
        let mut seq = sequencer(2, 2);
        seq.record_trial(&tokens(&["a", "b"]), &mut MemorySink::default()).unwrap();
        let r = &seq.records()[1];
        assert_eq!(r.word, "b");
        assert_eq!((r.x, r.y), (10.0, -6.0));
        assert!(seq.records()[0].highlighted);
        assert!(!r.highlighted);
    }

    #[test]
    fn test_records_without_inversion_keep_y() {
        let mut seq = TrialSequencer::uniform(Some("P1".into()), 2, 1, false).unwrap();
        seq.record_trial(&tokens(&["a"]), &mut MemorySink::default()).unwrap();
        assert_eq!(seq.records()[0].y, 5.0);
    }

    #[test]
    fn test_uneven_trial_sizes_are_summed() {
        let mut seq = TrialSequencer::new(Some("P1".into()), vec![2, 3], true).unwrap();
        assert_eq!(seq.expected_records_through(1), 2);
        assert_eq!(seq.expected_records_through(2), 5);
        assert_eq!(seq.trial_size(2), Some(3));
        assert_eq!(seq.trial_size(0), None);

        let mut sink = MemorySink::default();
        seq.record_trial(&tokens(&["a", "b"]), &mut sink).unwrap();
        seq.advance();
        seq.record_trial(&tokens(&["c", "d", "e"]), &mut sink).unwrap();
        assert_eq!(sink.written[0].1.len(), 5);
    }

    #[test]
    fn test_record_count_checked_after_every_trial() {
        let mut seq = sequencer(4, 2);
        let mut sink = MemorySink::default();
        for trial in 1..=4 {
            seq.record_trial(&tokens(&["a", "b"]), &mut sink).unwrap();
            assert_eq!(seq.records().len(), trial * 2);
            assert_eq!(seq.records().len(), seq.expected_records_through(trial));
            seq.advance();
        }
        assert_eq!(sink.written.len(), 1);
        assert!(seq.is_complete());
    }

    #[test]
    fn test_intermediate_trial_miscount_is_rejected() {
        let mut seq = sequencer(2, 3);
        let mut sink = MemorySink::default();

        let err = seq.record_trial(&tokens(&["a", "b", "c", "d"]), &mut sink).unwrap_err();
        match err {
            ExperimentError::RecordCountMismatch { expected, actual } => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(seq.records().is_empty());
        assert!(!seq.is_current_trial_recorded());

        // Fixing the layout lets the same trial go through.
        seq.record_trial(&tokens(&["a", "b", "c"]), &mut sink).unwrap();
        seq.advance();
        let outcome = seq.record_trial(&tokens(&["d", "e", "f"]), &mut sink).unwrap();
        assert!(outcome.artifact.is_some());
        assert_eq!(sink.written[0].1.len(), 6);
    }

    #[test]
    fn test_compensating_miscounts_never_persist() {
        let mut seq = sequencer(2, 3);
        let mut sink = MemorySink::default();
        assert!(seq.record_trial(&tokens(&["a", "b", "c", "d"]), &mut sink).is_err());
        seq.advance();
        assert!(seq.record_trial(&tokens(&["e", "f"]), &mut sink).is_err());
        assert!(sink.written.is_empty());
        assert!(seq.records().is_empty());
    }

    #[test]
    fn test_recording_same_trial_twice_is_rejected() {
        let mut seq = sequencer(2, 3);
        let mut sink = MemorySink::default();
        seq.record_trial(&tokens(&["a", "b", "c"]), &mut sink).unwrap();
        assert!(seq.is_current_trial_recorded());

        let err = seq.record_trial(&tokens(&["a", "b", "c"]), &mut sink).unwrap_err();
        assert!(matches!(err, ExperimentError::TrialAlreadyRecorded { trial: 1 }));
        assert_eq!(seq.records().len(), 3);

        // The run can still finish normally.
        seq.advance();
        let outcome = seq.record_trial(&tokens(&["d", "e", "f"]), &mut sink).unwrap();
        assert!(outcome.artifact.is_some());
        assert_eq!(sink.written[0].1.len(), 6);
    }

    // ========================================================================
    // resume_from()
    // ========================================================================

    #[test]
    fn test_resume_counts_only_this_run() {
        let mut seq = sequencer(3, 2);
        seq.resume_from(3).unwrap();
        assert_eq!(seq.current_trial(), 3);
        assert_eq!(seq.expected_records_through(3), 2);
        assert_eq!(seq.expected_records_through(2), 0);
        assert!(!seq.is_current_trial_recorded());

        let mut sink = MemorySink::default();
        let outcome = seq.record_trial(&tokens(&["a", "b"]), &mut sink).unwrap();
        assert!(outcome.artifact.is_some());
    }

    #[test]
    fn test_resumed_run_checks_counts_from_resume_point() {
        let mut seq = sequencer(3, 2);
        seq.resume_from(2).unwrap();
        let mut sink = MemorySink::default();
        let err = seq.record_trial(&tokens(&["a", "b", "c"]), &mut sink).unwrap_err();
        assert!(matches!(
            err,
            ExperimentError::RecordCountMismatch { expected: 2, actual: 3 }
        ));
        seq.record_trial(&tokens(&["a", "b"]), &mut sink).unwrap();
        seq.advance();
        seq.record_trial(&tokens(&["c", "d"]), &mut sink).unwrap();
        assert_eq!(sink.written[0].1.len(), 4);
        assert!(sink.written[0].1.iter().all(|r| r.trial_number >= 2));
    }

    #[test]
    fn test_resume_rejects_out_of_range_and_late_calls() {
        let mut seq = sequencer(3, 1);
        assert!(seq.resume_from(0).is_err());
        assert!(seq.resume_from(4).is_err());

        seq.record_trial(&tokens(&["a"]), &mut MemorySink::default()).unwrap();
        assert!(seq.resume_from(2).is_err());
    }

    #[test]
    fn test_resume_completed_leaves_nothing_to_record() {
        let mut seq = sequencer(2, 1);
        seq.resume_completed().unwrap();
        assert!(seq.is_complete());
        assert_eq!(seq.current_trial(), 2);
        let mut sink = MemorySink::default();
        let err = seq.record_trial(&tokens(&["a"]), &mut sink).unwrap_err();
        assert!(matches!(err, ExperimentError::TrialsExceeded));
        assert!(sink.written.is_empty());
        assert!(seq.advance().is_complete());
    }

    #[test]
    fn test_new_without_trials_is_configuration_error() {
        let err = TrialSequencer::new(Some("P1".into()), Vec::new(), true).unwrap_err();
        assert!(matches!(err, ExperimentError::Configuration { .. }));
    }
}

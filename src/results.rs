//! Trial records and the end-of-experiment result artifact.
//!
//! Results are written once, when the final trial is recorded, as a
//! comma-delimited file with the header
//! `trial_number,word,x_coord,y_coord,highlighted`.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::config::OutputConfig;
use crate::error::{ExperimentError, Result};

pub const CSV_HEADER: [&str; 5] = ["trial_number", "word", "x_coord", "y_coord", "highlighted"];

/// One token's final position in one trial, in output coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub trial_number: usize,
    pub word: String,
    pub x: f32,
    pub y: f32,
    pub highlighted: bool,
}

/// Destination for the complete result set.
///
/// Called exactly once per experiment with every record in trial order. An
/// error leaves the caller's records untouched so the write can be retried.
pub trait ResultSink {
    fn persist(&mut self, participant_id: &str, records: &[TrialRecord]) -> Result<PathBuf>;
}

/// Writes `<data_dir>/<participant>/<template with timestamp>`.
#[derive(Debug, Clone)]
pub struct CsvResultWriter {
    data_directory: PathBuf,
    filename_template: String,
    timestamp_format: String,
}

impl CsvResultWriter {
    pub fn new(output: &OutputConfig) -> Self {
        Self::with_directory(&output.data_directory, output)
    }

    /// Same naming rules as [`CsvResultWriter::new`], different root.
    pub fn with_directory(data_directory: impl AsRef<Path>, output: &OutputConfig) -> Self {
        Self {
            data_directory: data_directory.as_ref().to_path_buf(),
            filename_template: output.results_filename_template.clone(),
            timestamp_format: output.timestamp_format.clone(),
        }
    }

    pub fn participant_directory(&self, participant_id: &str) -> PathBuf {
        self.data_directory.join(participant_id)
    }

    pub fn target_path(&self, participant_id: &str, now: DateTime<Local>) -> Result<PathBuf> {
        let mut stamp = String::new();
        write!(stamp, "{}", now.format(&self.timestamp_format)).map_err(|_| {
            ExperimentError::configuration(format!(
                "invalid timestamp format {:?}",
                self.timestamp_format
            ))
        })?;
        let filename = self.filename_template.replace("{timestamp}", &stamp);
        Ok(self.participant_directory(participant_id).join(filename))
    }
}

impl ResultSink for CsvResultWriter {
    fn persist(&mut self, participant_id: &str, records: &[TrialRecord]) -> Result<PathBuf> {
        let path = self.target_path(participant_id, Local::now())?;
        let persistence = |source: io::Error| ExperimentError::Persistence {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(self.participant_directory(participant_id)).map_err(persistence)?;
        let file = fs::File::create(&path).map_err(persistence)?;
        let mut out = BufWriter::new(file);
        write_records(&mut out, records).map_err(persistence)?;
        out.flush().map_err(persistence)?;

        tracing::info!(path = %path.display(), rows = records.len(), "results written");
        Ok(path)
    }
}

/// Keeps everything in memory. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub written: Vec<(String, Vec<TrialRecord>)>,
    /// When set, every `persist` call fails with a persistence error.
    pub fail_with: Option<io::ErrorKind>,
}

impl ResultSink for MemorySink {
    fn persist(&mut self, participant_id: &str, records: &[TrialRecord]) -> Result<PathBuf> {
        let path = PathBuf::from(format!("memory://{participant_id}/{}", self.written.len()));
        if let Some(kind) = self.fail_with {
            return Err(ExperimentError::Persistence {
                path,
                source: io::Error::from(kind),
            });
        }
        self.written.push((participant_id.to_owned(), records.to_vec()));
        Ok(path)
    }
}

pub fn write_records<W: Write>(mut out: W, records: &[TrialRecord]) -> io::Result<()> {
    writeln!(out, "{}", CSV_HEADER.join(","))?;
    for r in records {
        writeln!(
            out,
            "{},{},{},{},{}",
            r.trial_number,
            escape_field(&r.word),
            r.x,
            r.y,
            r.highlighted
        )?;
    }
    Ok(())
}

fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

//! Session report and feature table export.
//!
//! A [`SessionReport`] turns the frame counters of a [`SessionSnapshot`] into
//! elapsed wall-clock time, the way an operator reads them, alongside the
//! evaluation scores. Reports serialize to JSON with `serde_json`.
//!
//! Feature vectors can be written as a CSV table, one row per frame, with a
//! header naming each of the 22 columns.

use std::io::Write;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::evaluation::EvaluationResult;
use crate::session::{Counters, SessionSnapshot};
use crate::types::FeatureVector;

/// Renders whole seconds as `HH:MM:SS`. Hours are not wrapped at 24.
pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// A counter expressed both as frames and as elapsed time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elapsed {
    pub frames: u64,
    pub seconds: u64,
    pub display: String,
}

impl Elapsed {
    pub fn from_frames(frames: u64, frame_duration: Duration) -> Self {
        let seconds = (frame_duration.as_secs_f64() * frames as f64).floor() as u64;
        Self {
            frames,
            seconds,
            display: format_elapsed(seconds),
        }
    }
}

/// End-of-session summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub evaluating: bool,
    pub total: Elapsed,
    pub walking: Elapsed,
    pub running: Elapsed,
    pub actual_walking: Elapsed,
    pub actual_running: Elapsed,
    pub evaluation: EvaluationResult,
    pub failed_frames: u64,
    pub dropped_frames: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl SessionReport {
    pub fn from_snapshot(snapshot: &SessionSnapshot, frame_duration: Duration) -> Self {
        let Counters {
            total,
            walking,
            running,
            actual_walking,
            actual_running,
        } = snapshot.counters;
        let elapsed = |frames| Elapsed::from_frames(frames, frame_duration);

        Self {
            evaluating: snapshot.evaluating,
            total: elapsed(total),
            walking: elapsed(walking),
            running: elapsed(running),
            actual_walking: elapsed(actual_walking),
            actual_running: elapsed(actual_running),
            evaluation: snapshot.evaluation,
            failed_frames: snapshot.failed_frames,
            dropped_frames: snapshot.dropped_frames,
            last_error: snapshot.last_error.clone(),
        }
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_pretty_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Writes feature vectors as CSV with a named header row.
pub fn write_feature_csv<W, I>(writer: W, rows: I) -> EngineResult<usize>
where
    W: Write,
    I: IntoIterator<Item = FeatureVector>,
{
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(FeatureVector::NAMES).map_err(csv_error)?;

    let mut written = 0;
    for row in rows {
        csv.write_record(row.as_slice().iter().map(|v| v.to_string()))
            .map_err(csv_error)?;
        written += 1;
    }
    csv.flush()?;
    Ok(written)
}

pub(crate) fn csv_error(err: csv::Error) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, err)
}

//! Offline replay of recorded accelerometer data.
//!
//! Recordings are CSV files with `x,y,z` columns and an optional `truth`
//! column (`walking`, `running`, `none` or empty) carrying the operator's
//! ground truth for each sample. A replay runs the same recorder and session
//! as live capture, so its report matches what an operator would have seen.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classifier::ActivityClassifier;
use crate::config::{BackpressurePolicy, EngineConfig};
use crate::error::EngineResult;
use crate::export::{csv_error, SessionReport};
use crate::features::FeatureExtractor;
use crate::pipeline::Recorder;
use crate::session::SessionController;
use crate::types::{AccelSample, FeatureVector, GroundTruth};
use crate::windowing::FrameAccumulator;

/// One row of a recording.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default)]
    pub truth: Option<GroundTruth>,
}

impl SampleRecord {
    pub fn sample(&self) -> AccelSample {
        AccelSample::new(self.x, self.y, self.z)
    }

    pub fn ground_truth(&self) -> GroundTruth {
        self.truth.unwrap_or_default()
    }
}

/// Parses a recording. The first row must be a header.
pub fn read_samples<R: Read>(reader: R) -> EngineResult<Vec<SampleRecord>> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in csv.deserialize::<SampleRecord>() {
        records.push(row.map_err(csv_error)?);
    }
    debug!(rows = records.len(), "recording parsed");
    Ok(records)
}

pub fn read_samples_path(path: &Path) -> EngineResult<Vec<SampleRecord>> {
    let file = std::fs::File::open(path)?;
    read_samples(file)
}

/// Feature vectors of every complete frame in `samples`. A trailing partial
/// frame is discarded.
pub fn extract_features<I>(samples: I, frame_size: usize) -> Vec<FeatureVector>
where
    I: IntoIterator<Item = AccelSample>,
{
    let mut accumulator = FrameAccumulator::new(frame_size);
    let mut extractor = FeatureExtractor::new();
    samples
        .into_iter()
        .filter_map(|s| accumulator.accept(s))
        .map(|frame| extractor.extract_frame(&frame))
        .collect()
}

/// Runs a recording through a full evaluation session and reports on it.
///
/// Queued frames are drained before each ground-truth change so that every
/// completed frame is attributed to the truth that was active while it was
/// recorded. Replay never drops frames.
pub async fn replay(
    records: &[SampleRecord],
    classifier: Arc<dyn ActivityClassifier>,
    config: EngineConfig,
) -> EngineResult<SessionReport> {
    let config = EngineConfig {
        backpressure: BackpressurePolicy::Block,
        ..config
    };
    let frame_duration = config.frame_duration();

    let session = SessionController::new();
    session.set_evaluating(true);

    let mut recorder = Recorder::spawn(config, classifier, session.clone())?;
    recorder.start();

    for record in records {
        let truth = record.ground_truth();
        if truth != session.ground_truth() {
            recorder.drain().await;
            session.set_ground_truth(truth);
        }
        recorder.on_sample_async(record.sample()).await;
    }

    recorder.stop_and_drain().await;
    let report = SessionReport::from_snapshot(&session.snapshot(), frame_duration);
    recorder.shutdown().await;

    info!(
        samples = records.len(),
        frames = report.total.frames,
        f1 = report.evaluation.f1,
        "replay finished"
    );
    Ok(report)
}

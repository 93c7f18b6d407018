//! Recording session state and control surface.
//!
//! A [`SessionController`] owns the per-session counters, the operator's
//! ground-truth toggles and the latest evaluation. It is a cheap, cloneable
//! handle: the inference worker writes through one clone while any number of
//! observers read through others.
//!
//! Counters are atomics, so readers never block the worker. Every mutation
//! bumps a version number and wakes [`SessionObserver`]s, which then build a
//! fresh [`SessionSnapshot`] from the atomics. No lock is shared between the
//! writer and an observer holding a snapshot.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::error::InferenceError;
use crate::evaluation::{EvaluationInput, EvaluationResult};
use crate::types::{ActivityLabel, GroundTruth};

/// Frame counts accumulated during a session.
///
/// One frame corresponds to one frame duration of wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Counters {
    /// Frames classified, whatever the label.
    pub total: u64,
    /// Frames predicted as walking.
    pub walking: u64,
    /// Frames predicted as running.
    pub running: u64,
    /// Frames classified while the operator marked walking.
    pub actual_walking: u64,
    /// Frames classified while the operator marked running.
    pub actual_running: u64,
}

impl Counters {
    pub fn evaluation_input(&self) -> EvaluationInput {
        EvaluationInput::new(self.actual_walking, self.walking, self.actual_running, self.running)
    }
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub recording: bool,
    pub evaluating: bool,
    pub ground_truth: GroundTruth,
    pub counters: Counters,
    pub evaluation: EvaluationResult,
    /// Frames whose prediction failed. They are not part of `counters`.
    pub failed_frames: u64,
    /// Frames discarded because the inference queue was full.
    pub dropped_frames: u64,
    /// Most recent inference failure, if any.
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct SessionState {
    recording: AtomicBool,
    evaluating: AtomicBool,
    ground_truth: AtomicU8,

    total: AtomicU64,
    walking: AtomicU64,
    running: AtomicU64,
    actual_walking: AtomicU64,
    actual_running: AtomicU64,

    failed_frames: AtomicU64,
    dropped_frames: AtomicU64,

    // f32 bit patterns
    precision: AtomicU32,
    recall: AtomicU32,
    f1: AtomicU32,

    last_error: Mutex<Option<String>>,

    version: AtomicU64,
    changed: Notify,
}

/// Shared handle controlling one recording session.
#[derive(Debug, Clone)]
pub struct SessionController {
    state: Arc<SessionState>,
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            state: Arc::new(SessionState {
                recording: AtomicBool::new(false),
                evaluating: AtomicBool::new(false),
                ground_truth: AtomicU8::new(GroundTruth::None.to_u8()),
                total: AtomicU64::new(0),
                walking: AtomicU64::new(0),
                running: AtomicU64::new(0),
                actual_walking: AtomicU64::new(0),
                actual_running: AtomicU64::new(0),
                failed_frames: AtomicU64::new(0),
                dropped_frames: AtomicU64::new(0),
                precision: AtomicU32::new(0f32.to_bits()),
                recall: AtomicU32::new(0f32.to_bits()),
                f1: AtomicU32::new(0f32.to_bits()),
                last_error: Mutex::new(None),
                version: AtomicU64::new(0),
                changed: Notify::new(),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Starts accepting samples.
    pub fn start(&self) {
        self.state.recording.store(true, Ordering::SeqCst);
        info!("recording started");
        self.publish();
    }

    /// Stops accepting samples and publishes the evaluation of the counters
    /// accumulated so far. Frames already dispatched still complete.
    pub fn stop(&self) -> EvaluationResult {
        self.state.recording.store(false, Ordering::SeqCst);
        let result = self.evaluate();
        info!(
            precision = result.precision,
            recall = result.recall,
            f1 = result.f1,
            "recording stopped"
        );
        result
    }

    /// Zeroes every counter and score and clears the ground-truth toggles.
    ///
    /// Does not change whether the session is recording or evaluating.
    pub fn reset(&self) {
        let s = &self.state;
        for counter in [
            &s.total,
            &s.walking,
            &s.running,
            &s.actual_walking,
            &s.actual_running,
            &s.failed_frames,
            &s.dropped_frames,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
        self.store_evaluation(EvaluationResult::default());
        s.ground_truth.store(GroundTruth::None.to_u8(), Ordering::SeqCst);
        if let Ok(mut last) = s.last_error.lock() {
            *last = None;
        }
        debug!("session reset");
        self.publish();
    }

    pub fn is_recording(&self) -> bool {
        self.state.recording.load(Ordering::SeqCst)
    }

    // ------------------------------------------------------------------
    // Evaluation mode and ground truth
    // ------------------------------------------------------------------

    /// Enables or disables evaluation mode. Either way both ground-truth
    /// toggles are cleared.
    pub fn set_evaluating(&self, evaluating: bool) {
        self.state.evaluating.store(evaluating, Ordering::SeqCst);
        self.state.ground_truth.store(GroundTruth::None.to_u8(), Ordering::SeqCst);
        self.publish();
    }

    pub fn is_evaluating(&self) -> bool {
        self.state.evaluating.load(Ordering::SeqCst)
    }

    /// Sets the operator's ground truth. Ignored outside evaluation mode.
    pub fn set_ground_truth(&self, truth: GroundTruth) -> GroundTruth {
        if !self.is_evaluating() && truth != GroundTruth::None {
            debug!(?truth, "ground truth ignored outside evaluation mode");
            return self.ground_truth();
        }
        self.state.ground_truth.store(truth.to_u8(), Ordering::SeqCst);
        self.publish();
        truth
    }

    /// Flips the walking toggle; turning it on clears running.
    pub fn toggle_walking(&self) -> GroundTruth {
        self.toggle(GroundTruth::Walking)
    }

    /// Flips the running toggle; turning it on clears walking.
    pub fn toggle_running(&self) -> GroundTruth {
        self.toggle(GroundTruth::Running)
    }

    fn toggle(&self, target: GroundTruth) -> GroundTruth {
        let next = if self.ground_truth() == target {
            GroundTruth::None
        } else {
            target
        };
        self.set_ground_truth(next)
    }

    pub fn ground_truth(&self) -> GroundTruth {
        GroundTruth::from_u8(self.state.ground_truth.load(Ordering::SeqCst))
    }

    // ------------------------------------------------------------------
    // Pipeline completion path
    // ------------------------------------------------------------------

    /// Accounts one classified frame.
    ///
    /// Ground truth is read at completion time, as the operator toggles it
    /// while the frame is being classified.
    pub fn record_prediction(&self, label: ActivityLabel) {
        let s = &self.state;
        match label {
            ActivityLabel::Walking => {
                s.walking.fetch_add(1, Ordering::SeqCst);
            }
            ActivityLabel::Running => {
                s.running.fetch_add(1, Ordering::SeqCst);
            }
            ActivityLabel::Other => {}
        }
        s.total.fetch_add(1, Ordering::SeqCst);

        match self.ground_truth() {
            GroundTruth::Walking => {
                s.actual_walking.fetch_add(1, Ordering::SeqCst);
            }
            GroundTruth::Running => {
                s.actual_running.fetch_add(1, Ordering::SeqCst);
            }
            GroundTruth::None => {}
        }
        self.publish();
    }

    /// Accounts a frame whose prediction failed. No activity counter moves.
    pub fn record_failure(&self, error: &InferenceError) {
        self.state.failed_frames.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.state.last_error.lock() {
            *last = Some(error.to_string());
        }
        warn!(%error, "frame prediction failed");
        self.publish();
    }

    /// Accounts a frame discarded by backpressure.
    pub fn record_dropped(&self) {
        self.state.dropped_frames.fetch_add(1, Ordering::SeqCst);
        self.publish();
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    pub fn counters(&self) -> Counters {
        let s = &self.state;
        Counters {
            total: s.total.load(Ordering::SeqCst),
            walking: s.walking.load(Ordering::SeqCst),
            running: s.running.load(Ordering::SeqCst),
            actual_walking: s.actual_walking.load(Ordering::SeqCst),
            actual_running: s.actual_running.load(Ordering::SeqCst),
        }
    }

    /// Recomputes precision, recall and F1 from the current counters and
    /// publishes them.
    pub fn evaluate(&self) -> EvaluationResult {
        let result = self.counters().evaluation_input().evaluate();
        self.store_evaluation(result);
        self.publish();
        result
    }

    /// Last published evaluation.
    pub fn evaluation(&self) -> EvaluationResult {
        let s = &self.state;
        EvaluationResult {
            precision: f32::from_bits(s.precision.load(Ordering::SeqCst)),
            recall: f32::from_bits(s.recall.load(Ordering::SeqCst)),
            f1: f32::from_bits(s.f1.load(Ordering::SeqCst)),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let s = &self.state;
        SessionSnapshot {
            recording: self.is_recording(),
            evaluating: self.is_evaluating(),
            ground_truth: self.ground_truth(),
            counters: self.counters(),
            evaluation: self.evaluation(),
            failed_frames: s.failed_frames.load(Ordering::SeqCst),
            dropped_frames: s.dropped_frames.load(Ordering::SeqCst),
            last_error: s.last_error.lock().ok().and_then(|e| e.clone()),
        }
    }

    /// Observer that is woken after every change. Its current version counts
    /// as seen.
    pub fn subscribe(&self) -> SessionObserver {
        SessionObserver {
            session: self.clone(),
            seen: self.version(),
        }
    }

    /// Number of changes published so far.
    pub fn version(&self) -> u64 {
        self.state.version.load(Ordering::SeqCst)
    }

    fn store_evaluation(&self, result: EvaluationResult) {
        let s = &self.state;
        s.precision.store(result.precision.to_bits(), Ordering::SeqCst);
        s.recall.store(result.recall.to_bits(), Ordering::SeqCst);
        s.f1.store(result.f1.to_bits(), Ordering::SeqCst);
    }

    fn publish(&self) {
        self.state.version.fetch_add(1, Ordering::SeqCst);
        self.state.changed.notify_waiters();
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

/// Change-notified view of a session.
///
/// Snapshots are built from the atomics on demand and owned by the caller, so
/// holding one never delays the worker.
#[derive(Debug, Clone)]
pub struct SessionObserver {
    session: SessionController,
    seen: u64,
}

impl SessionObserver {
    /// Whether the session changed since the last snapshot taken here.
    pub fn has_changed(&self) -> bool {
        self.session.version() != self.seen
    }

    /// Current snapshot; marks every change so far as seen.
    pub fn snapshot(&mut self) -> SessionSnapshot {
        self.seen = self.session.version();
        self.session.snapshot()
    }

    /// Waits for the next change and returns the snapshot after it.
    pub async fn changed(&mut self) -> SessionSnapshot {
        let state = Arc::clone(&self.session.state);
        loop {
            let notified = state.changed.notified();
            if self.has_changed() {
                return self.snapshot();
            }
            notified.await;
        }
    }
}

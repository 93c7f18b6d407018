//! Activity Sensing Library
//!
//! Recognizes locomotion (walking, running, anything else) from a live
//! tri-axial accelerometer stream and scores the predictions against
//! operator-supplied ground truth.
//!
//! # Pipeline
//!
//! - **Windowing**: samples are grouped into fixed-size, non-overlapping frames.
//!   Partial frames are never emitted.
//! - **Features**: each frame becomes a fixed-order 22-value vector of means,
//!   population variances, Pearson correlations and FFT energy/entropy.
//! - **Classification**: an opaque model maps the vector to a label. Failures
//!   are surfaced, never replaced by a default label.
//! - **Session**: counters, ground-truth toggles and precision/recall/F1 are
//!   kept per recording session and observable without blocking the worker.
//!
//! # Example
//!
//! ```rust
//! use activity_sensing::types::{AccelSample, FeatureVector};
//! use activity_sensing::windowing::FrameAccumulator;
//! use activity_sensing::features::FeatureExtractor;
//!
//! let mut accumulator = FrameAccumulator::new(50);
//! let mut extractor = FeatureExtractor::new();
//!
//! let mut vectors: Vec<FeatureVector> = Vec::new();
//! for i in 0..120 {
//!     let t = i as f32 / 50.0;
//!     if let Some(frame) = accumulator.accept(AccelSample::new(t.sin(), t.cos(), 9.81)) {
//!         vectors.push(extractor.extract_frame(&frame));
//!     }
//! }
//! assert_eq!(vectors.len(), 2);
//! assert_eq!(accumulator.pending(), 20);
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod export;
pub mod features;
pub mod pipeline;
pub mod replay;
pub mod session;
pub mod signal;
pub mod spectral;
pub mod statistics;
pub mod types;
pub mod windowing;

#[cfg(test)]
mod integration_tests;

// Re-export commonly used types
pub use classifier::{ActivityClassifier, ModelAsset};
pub use config::{BackpressurePolicy, EngineConfig};
pub use error::{EngineError, EngineResult, InferenceError, InputError};
pub use evaluation::{EvaluationInput, EvaluationResult};
pub use export::SessionReport;
pub use features::FeatureExtractor;
pub use pipeline::{FramePipeline, Recorder, SampleOutcome};
pub use session::{Counters, SessionController, SessionObserver, SessionSnapshot};
pub use types::{AccelSample, ActivityLabel, FeatureVector, Frame, GroundTruth};
pub use windowing::FrameAccumulator;

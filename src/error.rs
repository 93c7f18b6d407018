//! Error types for the activity recognition engine.
//!
//! Every fallible operation in the crate returns one of the module-specific
//! errors below. Orchestration-level code (the recorder and the CLI) works with
//! [`EngineError`], which every lower-level error converts into.
//!
//! ```text
//! EngineError (top-level)
//! ├── InputError      (malformed sensor events, dropped by the caller)
//! ├── InferenceError  (classifier load / run / output / timeout failures)
//! ├── ConfigError     (config validation and file loading)
//! └── Runtime         (no async runtime to host the worker)
//! ```
//!
//! Degenerate arithmetic (zero variance, zero denominators) is not an error
//! anywhere in this crate: those values resolve to `0.0`.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Convenient `Result` alias for engine-level operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A sensor event could not be turned into a sample.
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// The classifier failed to produce a label for a frame.
    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    /// The configuration is invalid or could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Filesystem error outside configuration loading (asset cache, exports).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The recorder could not be set up on an async runtime.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl EngineError {
    /// Create a runtime setup error.
    pub fn runtime<S: Into<String>>(msg: S) -> Self {
        EngineError::Runtime(msg.into())
    }
}

/// A raw sensor event that does not describe a tri-axial sample.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// The event carried the wrong number of values.
    #[error("expected {expected} sensor values, got {actual}")]
    Dimension {
        /// Number of values a sample needs.
        expected: usize,
        /// Number of values the event carried.
        actual: usize,
    },
}

/// Failure of a single classifier invocation.
///
/// Any of these is fatal for the frame being classified: the frame's counters
/// are not incremented and no label is substituted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    /// The model could not be loaded or the session could not be built.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The inference runtime reported an error while running the model.
    #[error("inference failed: {0}")]
    Runtime(String),

    /// The model produced output that cannot be read as a label.
    #[error("malformed model output: {0}")]
    MalformedOutput(String),

    /// The model produced an integer outside the label set.
    #[error("model returned unknown label {0}")]
    InvalidLabel(i64),

    /// The call did not complete within the configured budget.
    #[error("inference timed out after {0:?}")]
    Timeout(Duration),

    /// The blocking call panicked or the worker's permits were closed.
    #[error("inference worker unavailable: {0}")]
    WorkerGone(String),
}

impl InferenceError {
    /// Create a model load error.
    pub fn model_load<S: Into<String>>(msg: S) -> Self {
        InferenceError::ModelLoad(msg.into())
    }

    /// Create a runtime error.
    pub fn runtime<S: Into<String>>(msg: S) -> Self {
        InferenceError::Runtime(msg.into())
    }

    /// Create a malformed output error.
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        InferenceError::MalformedOutput(msg.into())
    }
}

/// Errors produced while validating or loading an [`crate::config::EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field holds a value outside its valid range.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value is rejected.
        reason: String,
    },

    /// The configuration file could not be read or written.
    #[error("cannot access config file {path:?}: {source}")]
    FileRead {
        /// Path that was accessed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for this schema.
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Create an invalid value error.
    pub fn invalid_value<S: Into<String>>(field: &'static str, reason: S) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

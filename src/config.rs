//! Engine configuration.
//!
//! [`EngineConfig`] bundles every tunable of the recording pipeline into one
//! serializable value. It can be stored to / restored from JSON so that a
//! deployment can change the frame size or sampling interval without a
//! rebuild.
//!
//! # Example
//!
//! ```rust
//! use activity_sensing::config::EngineConfig;
//!
//! let cfg = EngineConfig::default();
//! cfg.validate().expect("default config is valid");
//! assert_eq!(cfg.frame_size, 50);
//! assert_eq!(cfg.frame_duration().as_secs(), 1);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What the producer does when the inference queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackpressurePolicy {
    /// Discard the frame that does not fit. The producer never waits.
    #[default]
    DropNewest,
    /// Wait until the worker frees a slot.
    Block,
}

/// Complete configuration for a recording pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Samples per analysis frame. Default: **50**.
    pub frame_size: usize,

    /// Target interval between sensor samples in microseconds.
    ///
    /// Default: **20 000** (50 Hz), which makes one frame last one second.
    pub sampling_interval_us: u64,

    /// Frames that may wait for inference before backpressure applies.
    /// Default: **8**.
    pub queue_capacity: usize,

    /// Behaviour when the queue is full. Default: drop the newest frame.
    pub backpressure: BackpressurePolicy,

    /// Budget for one classifier call in milliseconds. Default: **2000**.
    pub inference_timeout_ms: u64,

    /// Classifier calls that may run at once, including timed-out calls that
    /// have not returned yet. Default: **1**.
    pub max_concurrent_inferences: usize,

    /// File name of the bundled model. Default: `model.onnx`.
    pub model_asset: String,

    /// Directory holding bundled assets.
    pub asset_dir: PathBuf,

    /// Writable directory the model is cached into before loading.
    pub cache_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_size: 50,
            sampling_interval_us: 20_000,
            queue_capacity: 8,
            backpressure: BackpressurePolicy::DropNewest,
            inference_timeout_ms: 2_000,
            max_concurrent_inferences: 1,
            model_asset: "model.onnx".to_string(),
            asset_dir: PathBuf::from("assets"),
            cache_dir: std::env::temp_dir().join("activity-sensing"),
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a JSON file and validate it.
    ///
    /// Missing fields take their default value.
    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: EngineConfig = serde_json::from_str(&contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Write the configuration as pretty-printed JSON, creating parent
    /// directories as needed.
    pub fn to_json(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::FileRead {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check every field for a usable value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_size == 0 {
            return Err(ConfigError::invalid_value("frame_size", "must be > 0"));
        }
        let frame_size = u32::try_from(self.frame_size)
            .map_err(|_| ConfigError::invalid_value("frame_size", format!("must be <= {}", u32::MAX)))?;
        if self.sampling_interval_us == 0 {
            return Err(ConfigError::invalid_value("sampling_interval_us", "must be > 0"));
        }
        if self.sampling_interval().checked_mul(frame_size).is_none() {
            return Err(ConfigError::invalid_value(
                "sampling_interval_us",
                "frame duration overflows with this frame_size",
            ));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::invalid_value("queue_capacity", "must be > 0"));
        }
        if self.inference_timeout_ms == 0 {
            return Err(ConfigError::invalid_value("inference_timeout_ms", "must be > 0"));
        }
        if self.max_concurrent_inferences == 0
            || self.max_concurrent_inferences > tokio::sync::Semaphore::MAX_PERMITS
        {
            return Err(ConfigError::invalid_value(
                "max_concurrent_inferences",
                format!("must be in 1..={}", tokio::sync::Semaphore::MAX_PERMITS),
            ));
        }
        if self.model_asset.trim().is_empty() {
            return Err(ConfigError::invalid_value("model_asset", "must not be empty"));
        }
        Ok(())
    }

    /// Sampling interval as a duration.
    pub fn sampling_interval(&self) -> Duration {
        Duration::from_micros(self.sampling_interval_us)
    }

    /// Wall-clock span covered by one frame. Saturates for sizes that
    /// [`EngineConfig::validate`] rejects.
    pub fn frame_duration(&self) -> Duration {
        let frame_size = u32::try_from(self.frame_size).unwrap_or(u32::MAX);
        self.sampling_interval().saturating_mul(frame_size)
    }

    /// Inference budget as a duration.
    pub fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.inference_timeout_ms)
    }
}

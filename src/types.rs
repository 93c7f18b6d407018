//! Core data types for the activity recognition engine.
//!
//! This module defines the values that flow through the pipeline: raw
//! samples, frames, augmented frames, feature vectors and labels. Types make
//! the frame-size and feature-order contracts explicit so that raw arrays never
//! cross module boundaries.
//!
//! Design principle: if a concept exists, it gets a type. A `Frame` is never
//! partial and a `FeatureVector` is always 22 values in the trained order.

use serde::{Deserialize, Serialize};

use crate::error::{InferenceError, InputError};

/// Number of values in a raw linear-acceleration event.
pub const SAMPLE_DIMENSION: usize = 3;

/// Number of features produced per frame.
pub const FEATURE_COUNT: usize = 22;

/// A single linear-acceleration sample.
///
/// Gravity is already removed by the host sensor. Values are in m/s² and are
/// never sanitized: NaN and infinities flow through the pipeline unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccelSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl AccelSample {
    /// Creates a sample from its three components.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Creates a sample from a raw sensor value slice.
    ///
    /// The slice must hold exactly three values; anything else is rejected so
    /// the caller can drop the event.
    pub fn from_values(values: &[f32]) -> Result<Self, InputError> {
        match values {
            [x, y, z] => Ok(Self::new(*x, *y, *z)),
            _ => Err(InputError::Dimension {
                expected: SAMPLE_DIMENSION,
                actual: values.len(),
            }),
        }
    }

    /// Euclidean norm of the acceleration vector. Returns m/s².
    pub fn magnitude(&self) -> f32 {
        let x2 = self.x * self.x;
        let y2 = self.y * self.y;
        let z2 = self.z * self.z;
        (x2 + y2 + z2).sqrt()
    }

    /// Components as an array.
    pub fn to_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f32; 3]> for AccelSample {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// A complete analysis window of samples, in arrival order.
///
/// Only the windowing accumulator builds frames from a live stream, and it
/// only does so once the window is full.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    samples: Vec<AccelSample>,
}

impl Frame {
    /// Wraps an already-complete window of samples.
    pub fn new(samples: Vec<AccelSample>) -> Self {
        Self { samples }
    }

    /// Samples in arrival order.
    pub fn samples(&self) -> &[AccelSample] {
        &self.samples
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Consumes the frame and returns its samples.
    pub fn into_samples(self) -> Vec<AccelSample> {
        self.samples
    }
}

/// A sample with its magnitude appended.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AugmentedSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub magnitude: f32,
}

/// A frame whose samples carry their magnitude.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedFrame {
    samples: Vec<AugmentedSample>,
}

impl AugmentedFrame {
    pub fn new(samples: Vec<AugmentedSample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[AugmentedSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Splits the frame into parallel x, y, z and magnitude sequences.
    pub fn axes(&self) -> FrameAxes {
        let n = self.samples.len();
        let mut axes = FrameAxes {
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
            z: Vec::with_capacity(n),
            magnitude: Vec::with_capacity(n),
        };
        for s in &self.samples {
            axes.x.push(s.x);
            axes.y.push(s.y);
            axes.z.push(s.z);
            axes.magnitude.push(s.magnitude);
        }
        axes
    }
}

/// Per-axis sequences of an augmented frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameAxes {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
    pub magnitude: Vec<f32>,
}

/// The fixed-order feature vector fed to the classifier.
///
/// The layout is the contract the model was trained on:
///
/// | index | feature |
/// |-------|---------|
/// | 0–3   | mean of x, y, z, magnitude |
/// | 4–7   | population variance of x, y, z, magnitude |
/// | 8–13  | correlation (x,y), (y,z), (x,z), (mag,x), (mag,y), (mag,z) |
/// | 14–17 | spectral energy of x, y, z, magnitude |
/// | 18–21 | spectral entropy of x, y, z, magnitude |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f32; FEATURE_COUNT]);

impl FeatureVector {
    pub const MEAN: usize = 0;
    pub const VARIANCE: usize = 4;
    pub const CORRELATION: usize = 8;
    pub const ENERGY: usize = 14;
    pub const ENTROPY: usize = 18;

    /// Column names in output order, used for CSV headers.
    pub const NAMES: [&'static str; FEATURE_COUNT] = [
        "mean_x",
        "mean_y",
        "mean_z",
        "mean_magnitude",
        "var_x",
        "var_y",
        "var_z",
        "var_magnitude",
        "corr_xy",
        "corr_yz",
        "corr_xz",
        "corr_mag_x",
        "corr_mag_y",
        "corr_mag_z",
        "energy_x",
        "energy_y",
        "energy_z",
        "energy_magnitude",
        "entropy_x",
        "entropy_y",
        "entropy_z",
        "entropy_magnitude",
    ];

    pub fn new(values: [f32; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn to_array(&self) -> [f32; FEATURE_COUNT] {
        self.0
    }

    pub fn len(&self) -> usize {
        FEATURE_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl std::ops::Index<usize> for FeatureVector {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.0[index]
    }
}

/// Activity predicted for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLabel {
    /// Stationary or any activity that is neither walking nor running.
    Other = 0,
    Walking = 1,
    Running = 2,
}

impl ActivityLabel {
    /// Integer code used by the model.
    pub fn code(&self) -> i64 {
        *self as i64
    }
}

impl TryFrom<i64> for ActivityLabel {
    type Error = InferenceError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ActivityLabel::Other),
            1 => Ok(ActivityLabel::Walking),
            2 => Ok(ActivityLabel::Running),
            other => Err(InferenceError::InvalidLabel(other)),
        }
    }
}

/// Operator-supplied label for the activity currently being performed.
///
/// Walking and running are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundTruth {
    #[default]
    None,
    Walking,
    Running,
}

impl GroundTruth {
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            GroundTruth::None => 0,
            GroundTruth::Walking => 1,
            GroundTruth::Running => 2,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            1 => GroundTruth::Walking,
            2 => GroundTruth::Running,
            _ => GroundTruth::None,
        }
    }
}

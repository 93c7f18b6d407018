//! Frame preprocessing.
//!
//! Augments every sample of a frame with its acceleration magnitude, the
//! orientation-independent motion signal the feature extractor uses as its
//! fourth channel.
//!
//! Pure and allocation-light: one pass, one output buffer. Non-finite inputs
//! propagate into the magnitude unchanged.

use crate::types::{AugmentedFrame, AugmentedSample, Frame};

/// Appends `sqrt(x² + y² + z²)` to every sample, preserving sample order.
pub fn preprocess(frame: &Frame) -> AugmentedFrame {
    let samples = frame
        .samples()
        .iter()
        .map(|s| AugmentedSample {
            x: s.x,
            y: s.y,
            z: s.z,
            magnitude: s.magnitude(),
        })
        .collect();
    AugmentedFrame::new(samples)
}

//! Per-frame feature extraction.
//!
//! Turns an augmented frame into the 22-value [`FeatureVector`] the classifier
//! consumes. The four channels (x, y, z, magnitude) each contribute a mean, a
//! population variance, a spectral energy and a spectral entropy; six channel
//! pairs contribute a Pearson correlation.
//!
//! The output order is fixed by the trained model and must never be permuted.

use crate::signal::preprocess;
use crate::spectral::SpectralAnalyzer;
use crate::statistics::{mean, pearson, population_variance};
use crate::types::{AugmentedFrame, FeatureVector, Frame, FEATURE_COUNT};

/// Computes feature vectors. Holds the spectral analyzer so repeated frames reuse
/// the same plan.
#[derive(Debug, Default)]
pub struct FeatureExtractor {
    analyzer: SpectralAnalyzer,
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extracts the fixed-order feature vector from an augmented frame.
    pub fn extract(&mut self, frame: &AugmentedFrame) -> FeatureVector {
        let axes = frame.axes();
        let channels = [&axes.x, &axes.y, &axes.z, &axes.magnitude];

        let mut out = [0.0f32; FEATURE_COUNT];

        for (i, ch) in channels.iter().enumerate() {
            out[FeatureVector::MEAN + i] = mean(ch) as f32;
            out[FeatureVector::VARIANCE + i] = population_variance(ch) as f32;
        }

        let pairs = [
            (&axes.x, &axes.y),
            (&axes.y, &axes.z),
            (&axes.x, &axes.z),
            (&axes.magnitude, &axes.x),
            (&axes.magnitude, &axes.y),
            (&axes.magnitude, &axes.z),
        ];
        for (i, (a, b)) in pairs.iter().enumerate() {
            out[FeatureVector::CORRELATION + i] = pearson(a, b) as f32;
        }

        for (i, ch) in channels.iter().enumerate() {
            let spectral = self.analyzer.analyze(ch);
            out[FeatureVector::ENERGY + i] = spectral.energy;
            out[FeatureVector::ENTROPY + i] = spectral.entropy;
        }

        FeatureVector::new(out)
    }

    /// Preprocesses a raw frame and extracts its features.
    pub fn extract_frame(&mut self, frame: &Frame) -> FeatureVector {
        self.extract(&preprocess(frame))
    }
}

/// One-shot extraction without keeping an extractor around.
pub fn extract(frame: &AugmentedFrame) -> FeatureVector {
    FeatureExtractor::new().extract(frame)
}

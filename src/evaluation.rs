//! Duration-overlap scoring of predictions against operator ground truth.
//!
//! Predicted and actual walking/running times are aggregated frame counts, not
//! per-frame labels, so the score is an overlap approximation:
//!
//! - tp = min(aW, pW) + min(aR, pR)
//! - fp = (pW − min(aW, pW)) + (pR − min(aR, pR))
//! - fn = (aW − min(aW, pW)) + (aR − min(aR, pR))
//!
//! Precision, recall and F1 fall back to 0 whenever their denominator is zero.

use serde::{Deserialize, Serialize};

/// The four running counters an evaluation is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EvaluationInput {
    pub actual_walk: u64,
    pub predicted_walk: u64,
    pub actual_run: u64,
    pub predicted_run: u64,
}

impl EvaluationInput {
    pub fn new(actual_walk: u64, predicted_walk: u64, actual_run: u64, predicted_run: u64) -> Self {
        Self {
            actual_walk,
            predicted_walk,
            actual_run,
            predicted_run,
        }
    }

    fn walk_overlap(&self) -> f32 {
        self.actual_walk.min(self.predicted_walk) as f32
    }

    fn run_overlap(&self) -> f32 {
        self.actual_run.min(self.predicted_run) as f32
    }

    pub fn true_positives(&self) -> f32 {
        self.walk_overlap() + self.run_overlap()
    }

    pub fn false_positives(&self) -> f32 {
        (self.predicted_walk as f32 - self.walk_overlap()).max(0.0)
            + (self.predicted_run as f32 - self.run_overlap()).max(0.0)
    }

    pub fn false_negatives(&self) -> f32 {
        (self.actual_walk as f32 - self.walk_overlap()).max(0.0)
            + (self.actual_run as f32 - self.run_overlap()).max(0.0)
    }

    pub fn precision(&self) -> f32 {
        let tp = self.true_positives();
        ratio_or_zero(tp, tp + self.false_positives())
    }

    pub fn recall(&self) -> f32 {
        let tp = self.true_positives();
        ratio_or_zero(tp, tp + self.false_negatives())
    }

    pub fn f1_score(&self) -> f32 {
        let precision = self.precision();
        let recall = self.recall();
        ratio_or_zero(2.0 * precision * recall, precision + recall)
    }

    /// Computes all three scores.
    pub fn evaluate(&self) -> EvaluationResult {
        EvaluationResult {
            precision: self.precision(),
            recall: self.recall(),
            f1: self.f1_score(),
        }
    }
}

/// Precision, recall and F1, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
}

fn ratio_or_zero(num: f32, den: f32) -> f32 {
    let r = num / den;
    if r.is_nan() {
        0.0
    } else {
        r
    }
}

/// Basic usage example: feed accelerometer samples, get labelled frames
use std::sync::Arc;

use activity_sensing::{
    AccelSample, ActivityClassifier, ActivityLabel, FeatureVector, FrameAccumulator, FramePipeline,
    InferenceError,
};

/// Stand-in model: the variance of the magnitude channel separates still,
/// walking and running well enough for a demo.
struct ThresholdModel;

impl ActivityClassifier for ThresholdModel {
    fn predict(&self, features: &FeatureVector) -> Result<ActivityLabel, InferenceError> {
        let variance = features[FeatureVector::VARIANCE + 3];
        Ok(if variance < 0.5 {
            ActivityLabel::Other
        } else if variance < 20.0 {
            ActivityLabel::Walking
        } else {
            ActivityLabel::Running
        })
    }
}

fn main() {
    println!("=== Activity Sensing: Basic Example ===\n");

    // 50 samples per frame at 50 Hz: one frame per second.
    let mut accumulator = FrameAccumulator::new(50);
    let mut pipeline = FramePipeline::new(Arc::new(ThresholdModel));

    // Simulated stream: 3 s walking, 2 s standing, 3 s running.
    let phases = [(3, 2.0, 2.0), (2, 0.0, 0.0), (3, 3.0, 8.0)];
    let mut samples = Vec::new();
    for (seconds, cadence_hz, amplitude) in phases {
        for i in 0..seconds * 50 {
            let t = i as f32 / 50.0;
            let bounce = amplitude * (2.0 * std::f32::consts::PI * cadence_hz * t).sin();
            samples.push(AccelSample::new(0.1, 0.2, 9.8 + bounce));
        }
    }

    println!("Processing {} samples...\n", samples.len());

    for sample in samples {
        if let Some(frame) = accumulator.accept(sample) {
            let features = pipeline.features(&frame);
            match pipeline.run(&frame) {
                Ok(label) => println!(
                    "Frame {}: {:?} (magnitude variance {:.2}, z energy {:.1})",
                    accumulator.frames_emitted(),
                    label,
                    features[FeatureVector::VARIANCE + 3],
                    features[FeatureVector::ENERGY + 2],
                ),
                Err(err) => println!("Frame {}: prediction failed: {}", accumulator.frames_emitted(), err),
            }
        }
    }

    println!("\n{} samples left in the partial frame", accumulator.pending());
}

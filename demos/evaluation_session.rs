/// Evaluation session example: live recorder, ground-truth toggles and the
/// end-of-session report
use std::sync::Arc;

use activity_sensing::export::SessionReport;
use activity_sensing::{
    AccelSample, ActivityClassifier, ActivityLabel, EngineConfig, FeatureVector, InferenceError,
    Recorder, SessionController,
};

fn model() -> Arc<dyn ActivityClassifier> {
    Arc::new(|features: &FeatureVector| -> Result<ActivityLabel, InferenceError> {
        let variance = features[FeatureVector::VARIANCE + 3];
        Ok(if variance < 0.5 {
            ActivityLabel::Other
        } else if variance < 20.0 {
            ActivityLabel::Walking
        } else {
            ActivityLabel::Running
        })
    })
}

fn stride(seconds: usize, amplitude: f32) -> impl Iterator<Item = AccelSample> {
    (0..seconds * 50).map(move |i| {
        let t = i as f32 / 50.0;
        AccelSample::new(0.0, 0.1, 9.8 + amplitude * (2.0 * std::f32::consts::PI * 2.5 * t).sin())
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = EngineConfig::default();
    let frame_duration = config.frame_duration();

    let session = SessionController::new();
    let mut updates = session.subscribe();
    let mut recorder = Recorder::spawn(config, model(), session.clone())?;

    session.set_evaluating(true);
    recorder.start();

    println!("Operator marks walking for 6 s");
    session.toggle_walking();
    for sample in stride(6, 2.0) {
        recorder.on_sample_async(sample).await;
    }
    recorder.drain().await;

    println!("Operator marks running for 4 s");
    session.toggle_running();
    for sample in stride(4, 8.0) {
        recorder.on_sample_async(sample).await;
    }

    let result = recorder.stop_and_drain().await;
    println!(
        "precision {:.3}  recall {:.3}  f1 {:.3}",
        result.precision, result.recall, result.f1
    );

    if updates.has_changed() {
        let snapshot = updates.snapshot();
        let report = SessionReport::from_snapshot(&snapshot, frame_duration);
        println!("{}", report.to_pretty_json()?);
    }

    recorder.shutdown().await;
    Ok(())
}

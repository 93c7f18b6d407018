/// Integration tests for the complete activity recognition pipeline
/// Drives realistic motion profiles through windowing, feature extraction,
/// classification and session accounting, end to end.

#[cfg(test)]
mod integration_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::classifier::ActivityClassifier;
    use crate::config::EngineConfig;
    use crate::error::InferenceError;
    use crate::export::SessionReport;
    use crate::features::FeatureExtractor;
    use crate::pipeline::*;
    use crate::session::SessionController;
    use crate::signal::preprocess;
    use crate::spectral::SpectralAnalyzer;
    use crate::types::*;
    use crate::windowing::FrameAccumulator;

    const RATE_HZ: f32 = 50.0;

    /// Helper: thresholds the magnitude variance of a frame.
    struct MagnitudeVarianceClassifier;

    impl ActivityClassifier for MagnitudeVarianceClassifier {
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

    fn classifier() -> Arc<dyn ActivityClassifier> {
        Arc::new(MagnitudeVarianceClassifier)
    }

    /// Helper: phone at rest, gravity on Z
    fn still_profile(seconds: usize) -> Vec<AccelSample> {
        (0..seconds * RATE_HZ as usize)
            .map(|_| AccelSample::new(0.1, 0.2, 9.7))
            .collect()
    }

    /// Helper: vertical bounce at cadence `hz` with peak `amplitude`
    fn gait_profile(seconds: usize, hz: f32, amplitude: f32) -> Vec<AccelSample> {
        (0..seconds * RATE_HZ as usize)
            .map(|i| {
                let t = i as f32 / RATE_HZ;
                let phase = 2.0 * std::f32::consts::PI * hz * t;
                AccelSample::new(0.3 * phase.cos(), 0.1, 9.8 + amplitude * phase.sin())
            })
            .collect()
    }

    fn walking_profile(seconds: usize) -> Vec<AccelSample> {
        gait_profile(seconds, 2.0, 2.0)
    }

    fn running_profile(seconds: usize) -> Vec<AccelSample> {
        gait_profile(seconds, 3.0, 8.0)
    }

    /// Helper: classify every complete frame synchronously
    fn classify_profile(samples: &[AccelSample]) -> Vec<ActivityLabel> {
        let mut accumulator = FrameAccumulator::new(50);
        let mut pipeline = FramePipeline::new(classifier());
        samples
            .iter()
            .filter_map(|s| accumulator.accept(*s))
            .map(|frame| pipeline.run(&frame).unwrap())
            .collect()
    }

    async fn feed(recorder: &mut Recorder, samples: &[AccelSample]) {
        for s in samples {
            recorder.on_sample_async(*s).await;
        }
    }

    fn lossless_config() -> EngineConfig {
        EngineConfig {
            backpressure: crate::config::BackpressurePolicy::Block,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_still_profile_is_other() {
        let labels = classify_profile(&still_profile(5));
        assert_eq!(labels.len(), 5);
        assert!(labels.iter().all(|l| *l == ActivityLabel::Other));
    }

    #[test]
    fn test_walking_and_running_profiles() {
        let walking = classify_profile(&walking_profile(4));
        let running = classify_profile(&running_profile(4));
        assert_eq!(walking, vec![ActivityLabel::Walking; 4]);
        assert_eq!(running, vec![ActivityLabel::Running; 4]);
    }

    #[test]
    fn test_frames_are_complete_and_in_order() {
        let samples: Vec<AccelSample> = (0..250)
            .map(|i| AccelSample::new(i as f32, 0.0, 0.0))
            .collect();
        let mut accumulator = FrameAccumulator::new(50);
        let frames: Vec<Frame> = samples.iter().filter_map(|s| accumulator.accept(*s)).collect();

        assert_eq!(frames.len(), 5);
        for (k, frame) in frames.iter().enumerate() {
            assert_eq!(frame.len(), 50);
            for (i, s) in frame.samples().iter().enumerate() {
                assert_eq!(s.x, (k * 50 + i) as f32);
            }
        }
        assert_eq!(accumulator.pending(), 0);
    }

    #[test]
    fn test_magnitude_is_exact() {
        let samples = walking_profile(1);
        let augmented = preprocess(&Frame::new(samples.clone()));
        for (raw, aug) in samples.iter().zip(augmented.samples()) {
            assert_eq!(aug.magnitude, (raw.x * raw.x + raw.y * raw.y + raw.z * raw.z).sqrt());
        }
    }

    #[test]
    fn test_feature_contract_on_real_profile() {
        let samples = running_profile(1);
        let frame = Frame::new(samples.clone());
        let features = FeatureExtractor::new().extract_frame(&frame);

        assert_eq!(features.len(), 22);
        let mean_x = samples.iter().map(|s| s.x as f64).sum::<f64>() / samples.len() as f64;
        assert!((features[0] as f64 - mean_x).abs() < 1e-6);
        assert!(features.as_slice().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_zero_series_spectral_of_any_length() {
        let mut analyzer = SpectralAnalyzer::new();
        for len in [0usize, 1, 2, 3, 50, 64, 100, 257] {
            let result = analyzer.analyze(&vec![0.0; len]);
            assert_eq!(result.energy, 0.0, "len {len}");
            assert_eq!(result.entropy, 0.0, "len {len}");
        }
    }

    #[test]
    fn test_all_zero_frame_round_trip() {
        let frame = Frame::new(vec![AccelSample::default(); 50]);
        let features = FeatureExtractor::new().extract(&preprocess(&frame));
        for i in 0..FeatureVector::ENERGY {
            assert_eq!(features[i], 0.0, "{}", FeatureVector::NAMES[i]);
        }
    }

    #[tokio::test]
    async fn test_live_evaluation_session() {
        let session = SessionController::new();
        session.set_evaluating(true);
        let mut recorder = Recorder::spawn(lossless_config(), classifier(), session.clone()).unwrap();
        recorder.start();

        // 10 s marked walking, of which 2 s the phone was actually still.
        session.toggle_walking();
        feed(&mut recorder, &walking_profile(8)).await;
        feed(&mut recorder, &still_profile(2)).await;
        recorder.drain().await;

        session.toggle_running();
        feed(&mut recorder, &running_profile(5)).await;

        let result = recorder.stop_and_drain().await;
        let counters = session.counters();
        assert_eq!(counters.total, 15);
        assert_eq!(counters.walking, 8);
        assert_eq!(counters.running, 5);
        assert_eq!(counters.actual_walking, 10);
        assert_eq!(counters.actual_running, 5);

        assert_eq!(result.precision, 1.0);
        assert!((result.recall - 13.0 / 15.0).abs() < 1e-6);
        assert!((result.f1 - 0.928).abs() < 1e-3);

        let report = SessionReport::from_snapshot(&session.snapshot(), recorder.config().frame_duration());
        assert_eq!(report.total.display, "00:00:15");
        assert_eq!(report.actual_walking.display, "00:00:10");
        recorder.shutdown().await;
    }

    #[tokio::test]
    async fn test_stop_keeps_partial_frame_and_start_resumes() {
        let session = SessionController::new();
        let mut recorder = Recorder::spawn(lossless_config(), classifier(), session.clone()).unwrap();
        let samples = walking_profile(2);

        recorder.start();
        feed(&mut recorder, &samples[..75]).await;
        recorder.stop_and_drain().await;
        assert_eq!(session.counters().total, 1);
        assert_eq!(recorder.pending_samples(), 25);

        // Ignored while stopped.
        feed(&mut recorder, &samples[..10]).await;
        assert_eq!(recorder.pending_samples(), 25);

        recorder.start();
        feed(&mut recorder, &samples[75..]).await;
        recorder.stop_and_drain().await;
        assert_eq!(session.counters().total, 2);
        assert_eq!(session.counters().walking, 2);
        recorder.shutdown().await;
    }

    #[tokio::test]
    async fn test_reset_twice_yields_identical_state() {
        let session = SessionController::new();
        session.set_evaluating(true);
        let mut recorder = Recorder::spawn(lossless_config(), classifier(), session.clone()).unwrap();
        recorder.start();
        session.toggle_running();
        feed(&mut recorder, &running_profile(3)).await;
        recorder.drain().await;

        recorder.reset();
        let first = session.snapshot();
        recorder.reset();
        let second = session.snapshot();

        assert_eq!(first, second);
        assert_eq!(first.counters.total, 0);
        assert_eq!(first.ground_truth, GroundTruth::None);
        assert_eq!(recorder.pending_samples(), 0);
        recorder.shutdown().await;
    }

    #[tokio::test]
    async fn test_inference_failure_is_surfaced_and_pipeline_continues() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let flaky: Arc<dyn ActivityClassifier> =
            Arc::new(move |f: &FeatureVector| -> Result<ActivityLabel, InferenceError> {
                if seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 1 {
                    Err(InferenceError::malformed("unparseable output"))
                } else {
                    MagnitudeVarianceClassifier.predict(f)
                }
            });

        let session = SessionController::new();
        let mut recorder = Recorder::spawn(lossless_config(), flaky, session.clone()).unwrap();
        recorder.start();
        feed(&mut recorder, &walking_profile(3)).await;
        recorder.stop_and_drain().await;

        let snap = session.snapshot();
        assert_eq!(snap.counters.total, 2);
        assert_eq!(snap.counters.walking, 2);
        assert_eq!(snap.failed_frames, 1);
        assert!(snap.last_error.unwrap().contains("unparseable"));
        recorder.shutdown().await;
    }

    #[tokio::test]
    async fn test_slow_model_times_out() {
        let slow: Arc<dyn ActivityClassifier> =
            Arc::new(|_: &FeatureVector| -> Result<ActivityLabel, InferenceError> {
                std::thread::sleep(Duration::from_millis(200));
                Ok(ActivityLabel::Walking)
            });
        let config = EngineConfig {
            frame_size: 10,
            inference_timeout_ms: 20,
            ..lossless_config()
        };
        let session = SessionController::new();
        let mut recorder = Recorder::spawn(config, slow, session.clone()).unwrap();
        recorder.start();
        feed(&mut recorder, &still_profile(1)[..10]).await;
        recorder.stop_and_drain().await;

        let snap = session.snapshot();
        assert_eq!(snap.counters.total, 0);
        assert_eq!(snap.failed_frames, 1);
        assert!(snap.last_error.unwrap().contains("timed out"));
        recorder.shutdown().await;
    }

    #[tokio::test]
    async fn test_malformed_events_do_not_break_framing() {
        let config = EngineConfig {
            queue_capacity: 64,
            ..EngineConfig::default()
        };
        let session = SessionController::new();
        let mut recorder = Recorder::spawn(config, classifier(), session.clone()).unwrap();
        recorder.start();

        let mut rejected = 0;
        for (i, s) in still_profile(2).iter().enumerate() {
            if i % 7 == 0 {
                assert!(recorder.on_sensor_values(&[s.x, s.y]).is_err());
                rejected += 1;
            }
            assert!(recorder.on_sensor_values(&s.to_array()).is_ok());
        }
        assert!(rejected > 0);

        recorder.stop_and_drain().await;
        assert_eq!(session.counters().total, 2);
        recorder.shutdown().await;
    }

    #[tokio::test]
    async fn test_observer_sees_final_counts() {
        let session = SessionController::new();
        let mut observer = session.subscribe();
        let mut recorder = Recorder::spawn(lossless_config(), classifier(), session.clone()).unwrap();
        recorder.start();
        feed(&mut recorder, &running_profile(3)).await;
        recorder.stop_and_drain().await;

        assert!(observer.has_changed());
        let snap = observer.snapshot();
        assert_eq!(snap.counters.running, 3);
        assert!(!snap.recording);
        recorder.shutdown().await;
    }
}

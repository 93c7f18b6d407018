/// Frame classification pipeline and the recording front end that feeds it.
///
/// # Architecture
///
/// 1. **Accumulation** (producer thread): samples are buffered by the
///    [`FrameAccumulator`] until a frame completes.
/// 2. **Dispatch**: the completed frame is queued on a bounded channel. When the
///    queue is full the configured [`BackpressurePolicy`] decides between
///    dropping the frame and waiting for room.
/// 3. **Inference** (worker task): frames are taken in FIFO order, turned into
///    feature vectors and classified on a blocking thread under a timeout.
///    A semaphore bounds how many classifier calls may run at once, counting
///    timed-out calls that have not returned yet.
/// 4. **Accounting**: the worker is the only writer of the session counters.
///
/// Stopping a session stops accumulation only. Frames already queued still run
/// to completion; [`Recorder::stop_and_drain`] waits for them.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::classifier::ActivityClassifier;
use crate::config::{BackpressurePolicy, EngineConfig};
use crate::error::{EngineError, EngineResult, InferenceError, InputError};
use crate::evaluation::EvaluationResult;
use crate::features::FeatureExtractor;
use crate::session::SessionController;
use crate::types::{AccelSample, ActivityLabel, FeatureVector, Frame};
use crate::windowing::FrameAccumulator;

/// Synchronous preprocess → extract → predict chain for one frame.
pub struct FramePipeline {
    extractor: FeatureExtractor,
    classifier: Arc<dyn ActivityClassifier>,
}

impl FramePipeline {
    pub fn new(classifier: Arc<dyn ActivityClassifier>) -> Self {
        Self {
            extractor: FeatureExtractor::new(),
            classifier,
        }
    }

    /// Feature vector of a frame.
    pub fn features(&mut self, frame: &Frame) -> FeatureVector {
        self.extractor.extract_frame(frame)
    }

    /// Classifies a frame on the calling thread.
    pub fn run(&mut self, frame: &Frame) -> Result<ActivityLabel, InferenceError> {
        let features = self.features(frame);
        self.classifier.predict(&features)
    }

    pub fn classifier(&self) -> Arc<dyn ActivityClassifier> {
        Arc::clone(&self.classifier)
    }
}

/// Runs one prediction on the blocking pool, bounded by `timeout`.
///
/// The call needs a permit from `permits`, which it holds until the classifier
/// returns. A timed-out call keeps its permit and its blocking thread until
/// then, and its result is discarded. Waiting for a permit counts against
/// `timeout`, so a frame that finds every permit held by stragglers fails with
/// [`InferenceError::Timeout`] without starting another call.
pub async fn predict_with_timeout(
    classifier: Arc<dyn ActivityClassifier>,
    features: FeatureVector,
    permits: &Arc<Semaphore>,
    timeout: Duration,
) -> Result<ActivityLabel, InferenceError> {
    let deadline = tokio::time::Instant::now() + timeout;
    let permit = match tokio::time::timeout_at(deadline, Arc::clone(permits).acquire_owned()).await {
        Ok(Ok(permit)) => permit,
        Ok(Err(_)) => return Err(InferenceError::WorkerGone("inference permits closed".into())),
        Err(_) => {
            debug!("every inference permit is held, frame not classified");
            return Err(InferenceError::Timeout(timeout));
        }
    };

    let task = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        classifier.predict(&features)
    });
    match tokio::time::timeout_at(deadline, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(InferenceError::WorkerGone(join_err.to_string())),
        Err(_) => Err(InferenceError::Timeout(timeout)),
    }
}

/// What happened to a sample handed to the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// The session is not recording; the sample was discarded.
    Ignored,
    /// The sample is waiting in the current frame.
    Buffered,
    /// The sample completed a frame, which was queued for inference.
    Dispatched,
    /// The sample completed a frame, which was discarded by backpressure.
    Dropped,
}

/// Frames queued or being classified, with a wakeup for drain waiters.
#[derive(Debug, Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    fn enter(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn leave(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.get() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Live recording front end: accumulates samples and feeds the worker.
pub struct Recorder {
    config: EngineConfig,
    accumulator: FrameAccumulator,
    session: SessionController,
    queue: mpsc::Sender<Frame>,
    worker: JoinHandle<()>,
    in_flight: Arc<InFlight>,
}

impl Recorder {
    /// Validates `config` and spawns the inference worker on the current
    /// Tokio runtime.
    pub fn spawn(
        config: EngineConfig,
        classifier: Arc<dyn ActivityClassifier>,
        session: SessionController,
    ) -> EngineResult<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| EngineError::runtime(format!("no Tokio runtime: {}", e)))?;

        let (queue, rx) = mpsc::channel(config.queue_capacity);
        let in_flight = Arc::new(InFlight::default());

        let worker = runtime.spawn(run_worker(
            rx,
            FramePipeline::new(classifier),
            session.clone(),
            Arc::new(Semaphore::new(config.max_concurrent_inferences)),
            config.inference_timeout(),
            Arc::clone(&in_flight),
        ));

        info!(
            frame_size = config.frame_size,
            queue_capacity = config.queue_capacity,
            backpressure = ?config.backpressure,
            max_concurrent_inferences = config.max_concurrent_inferences,
            "recorder ready"
        );

        Ok(Self {
            accumulator: FrameAccumulator::new(config.frame_size),
            config,
            session,
            queue,
            worker,
            in_flight,
        })
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Samples buffered in the current, incomplete frame.
    pub fn pending_samples(&self) -> usize {
        self.accumulator.pending()
    }

    /// Frames queued or being classified.
    pub fn in_flight(&self) -> usize {
        self.in_flight.get()
    }

    pub fn start(&self) {
        self.session.start();
    }

    /// Stops accumulating and evaluates the counters as they stand. Frames
    /// already queued keep running; the partial frame is kept for a later
    /// `start`.
    pub fn stop(&self) -> EvaluationResult {
        self.session.stop()
    }

    /// Stops accumulating, waits for every queued frame to finish, then
    /// evaluates.
    pub async fn stop_and_drain(&self) -> EvaluationResult {
        self.session.stop();
        self.in_flight.wait_idle().await;
        self.session.evaluate()
    }

    /// Waits until no frame is queued or being classified.
    pub async fn drain(&self) {
        self.in_flight.wait_idle().await;
    }

    /// Zeroes the session and discards the partial frame.
    pub fn reset(&mut self) {
        self.accumulator.clear();
        self.session.reset();
    }

    /// Feeds one sample from a synchronous producer.
    ///
    /// With [`BackpressurePolicy::Block`] this waits for queue room and must
    /// not be called from inside the Tokio runtime; use
    /// [`Recorder::on_sample_async`] there.
    pub fn on_sample(&mut self, sample: AccelSample) -> SampleOutcome {
        match self.accumulate(sample) {
            Ok(frame) => match self.config.backpressure {
                BackpressurePolicy::DropNewest => self.try_dispatch(frame),
                BackpressurePolicy::Block => {
                    self.in_flight.enter();
                    match self.queue.blocking_send(frame) {
                        Ok(()) => SampleOutcome::Dispatched,
                        Err(_) => self.worker_closed(),
                    }
                }
            },
            Err(outcome) => outcome,
        }
    }

    /// Feeds one sample from async code.
    pub async fn on_sample_async(&mut self, sample: AccelSample) -> SampleOutcome {
        match self.accumulate(sample) {
            Ok(frame) => match self.config.backpressure {
                BackpressurePolicy::DropNewest => self.try_dispatch(frame),
                BackpressurePolicy::Block => {
                    self.in_flight.enter();
                    match self.queue.send(frame).await {
                        Ok(()) => SampleOutcome::Dispatched,
                        Err(_) => self.worker_closed(),
                    }
                }
            },
            Err(outcome) => outcome,
        }
    }

    /// Feeds a raw sensor event. Malformed events are logged, dropped and
    /// reported to the caller; the pipeline keeps running.
    pub fn on_sensor_values(&mut self, values: &[f32]) -> Result<SampleOutcome, InputError> {
        match AccelSample::from_values(values) {
            Ok(sample) => Ok(self.on_sample(sample)),
            Err(err) => {
                warn!(%err, "dropping malformed sensor event");
                Err(err)
            }
        }
    }

    /// Closes the queue, lets the worker finish what is queued and joins it.
    pub async fn shutdown(self) {
        let Recorder { queue, worker, .. } = self;
        drop(queue);
        if let Err(err) = worker.await {
            warn!(%err, "inference worker ended abnormally");
        }
    }

    fn accumulate(&mut self, sample: AccelSample) -> Result<Frame, SampleOutcome> {
        if !self.session.is_recording() {
            return Err(SampleOutcome::Ignored);
        }
        self.accumulator.accept(sample).ok_or(SampleOutcome::Buffered)
    }

    fn try_dispatch(&self, frame: Frame) -> SampleOutcome {
        self.in_flight.enter();
        match self.queue.try_send(frame) {
            Ok(()) => SampleOutcome::Dispatched,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.in_flight.leave();
                self.session.record_dropped();
                warn!(capacity = self.config.queue_capacity, "inference queue full, frame dropped");
                SampleOutcome::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => self.worker_closed(),
        }
    }

    fn worker_closed(&self) -> SampleOutcome {
        self.in_flight.leave();
        self.session.record_dropped();
        warn!("inference worker is gone, frame dropped");
        SampleOutcome::Dropped
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<Frame>,
    mut pipeline: FramePipeline,
    session: SessionController,
    permits: Arc<Semaphore>,
    timeout: Duration,
    in_flight: Arc<InFlight>,
) {
    let mut processed: u64 = 0;
    while let Some(frame) = rx.recv().await {
        let features = pipeline.features(&frame);
        match predict_with_timeout(pipeline.classifier(), features, &permits, timeout).await {
            Ok(label) => {
                processed += 1;
                debug!(frame = processed, ?label, "frame classified");
                session.record_prediction(label);
            }
            Err(err) => session.record_failure(&err),
        }
        in_flight.leave();
    }
    debug!(processed, "inference worker stopped");
}

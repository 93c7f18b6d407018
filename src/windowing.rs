//! Frame accumulation for the live sensor stream.
//!
//! The accumulator is the only stateful real-time stage. It buffers incoming
//! samples until exactly `frame_size` have arrived, hands the completed frame
//! out by value and immediately starts a fresh buffer.
//!
//! Invariants:
//! - the buffer never holds more than `frame_size` samples
//! - emitted frames always hold exactly `frame_size` samples, in arrival order
//! - leftover samples stay buffered until enough arrive (or `clear` is called)

use tracing::trace;

use crate::error::InputError;
use crate::types::{AccelSample, Frame};

/// Buffers samples into fixed-size frames.
#[derive(Debug, Clone)]
pub struct FrameAccumulator {
    frame_size: usize,
    buffer: Vec<AccelSample>,
    frames_emitted: u64,
}

impl FrameAccumulator {
    /// Creates an accumulator emitting frames of `frame_size` samples.
    ///
    /// A zero frame size is clamped to one.
    pub fn new(frame_size: usize) -> Self {
        let frame_size = frame_size.max(1);
        Self {
            frame_size,
            buffer: Vec::with_capacity(frame_size),
            frames_emitted: 0,
        }
    }

    /// Adds a sample and returns the completed frame when the buffer fills.
    pub fn accept(&mut self, sample: AccelSample) -> Option<Frame> {
        self.buffer.push(sample);

        if self.buffer.len() < self.frame_size {
            return None;
        }

        let samples = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.frame_size));
        self.frames_emitted += 1;
        trace!(frame = self.frames_emitted, "frame complete");
        Some(Frame::new(samples))
    }

    /// Adds a raw sensor event.
    ///
    /// Events that do not carry exactly three values are rejected and leave the
    /// buffer untouched.
    pub fn accept_values(&mut self, values: &[f32]) -> Result<Option<Frame>, InputError> {
        let sample = AccelSample::from_values(values)?;
        Ok(self.accept(sample))
    }

    /// Drops any partially filled frame.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Samples waiting in the current, incomplete frame.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Number of frames emitted since creation.
    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample(i: usize) -> AccelSample {
        AccelSample::new(i as f32, -(i as f32), 0.5 * i as f32)
    }

    #[test]
    fn test_accumulator_creation() {
        let acc = FrameAccumulator::new(50);
        assert_eq!(acc.frame_size(), 50);
        assert_eq!(acc.pending(), 0);
        assert_eq!(acc.frames_emitted(), 0);
    }

    #[test]
    fn test_zero_frame_size_clamped() {
        let mut acc = FrameAccumulator::new(0);
        assert_eq!(acc.frame_size(), 1);
        assert!(acc.accept(sample(0)).is_some());
    }

    #[test]
    fn test_emits_exactly_at_frame_size() {
        let mut acc = FrameAccumulator::new(4);
        for i in 0..3 {
            assert!(acc.accept(sample(i)).is_none());
            assert_eq!(acc.pending(), i + 1);
        }
        let frame = acc.accept(sample(3)).expect("frame should complete");
        assert_eq!(frame.len(), 4);
        assert_eq!(acc.pending(), 0);
        assert_eq!(acc.frames_emitted(), 1);
    }

    #[test]
    fn test_frame_is_decoupled_from_buffer() {
        let mut acc = FrameAccumulator::new(2);
        acc.accept(sample(0));
        let frame = acc.accept(sample(1)).unwrap();

        // Keep streaming: the emitted frame must not change.
        acc.accept(sample(10));
        let second = acc.accept(sample(11)).unwrap();

        assert_eq!(frame.samples(), &[sample(0), sample(1)]);
        assert_eq!(second.samples(), &[sample(10), sample(11)]);
    }

    #[test]
    fn test_accept_values_rejects_malformed_event() {
        let mut acc = FrameAccumulator::new(2);
        acc.accept_values(&[1.0, 2.0, 3.0]).unwrap();

        let err = acc.accept_values(&[1.0, 2.0]).unwrap_err();
        assert_eq!(err, InputError::Dimension { expected: 3, actual: 2 });
        assert_eq!(acc.pending(), 1, "malformed event must not touch the buffer");

        let frame = acc.accept_values(&[4.0, 5.0, 6.0]).unwrap().unwrap();
        assert_eq!(frame.samples()[1], AccelSample::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_clear_drops_partial_frame() {
        let mut acc = FrameAccumulator::new(3);
        acc.accept(sample(0));
        acc.accept(sample(1));
        acc.clear();
        assert_eq!(acc.pending(), 0);

        acc.accept(sample(5));
        acc.accept(sample(6));
        let frame = acc.accept(sample(7)).unwrap();
        assert_eq!(frame.samples()[0], sample(5));
    }

    proptest! {
        #[test]
        fn frames_are_complete_and_ordered(frame_size in 1usize..40, n in 0usize..400) {
            let mut acc = FrameAccumulator::new(frame_size);
            let mut frames = Vec::new();
            for i in 0..n {
                if let Some(frame) = acc.accept(sample(i)) {
                    frames.push(frame);
                }
            }

            prop_assert_eq!(frames.len(), n / frame_size);
            prop_assert_eq!(acc.pending(), n % frame_size);
            for (k, frame) in frames.iter().enumerate() {
                prop_assert_eq!(frame.len(), frame_size);
                for (j, s) in frame.samples().iter().enumerate() {
                    prop_assert_eq!(*s, sample(k * frame_size + j));
                }
            }
        }
    }
}

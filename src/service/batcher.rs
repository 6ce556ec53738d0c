//! Event batching between provider threads and the service loop

use crate::core::provider::EventSink;
use crate::core::types::SensorSample;
use parking_lot::Mutex;

/// Thread-safe accumulation of raw sensor readings
///
/// Two independent queues, one for continuous samples and one for
/// one-shot triggers, each drained by swapping the whole vector out
/// under a short lock. Producers only ever push; the loop thread only
/// ever swaps. Serialization and socket sends happen entirely outside
/// the lock, so a slow network tick never stalls a sensor callback.
///
/// Arrival order within each queue is preserved through the swap.
#[derive(Debug, Default)]
pub struct EventBatcher {
    samples: Mutex<Vec<SensorSample>>,
    triggers: Mutex<Vec<SensorSample>>,
}

impl EventBatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued continuous sample, oldest first
    pub fn drain_samples(&self) -> Vec<SensorSample> {
        Self::drain(&self.samples)
    }

    /// Take every queued trigger reading, oldest first
    pub fn drain_triggers(&self) -> Vec<SensorSample> {
        Self::drain(&self.triggers)
    }

    /// Discard everything queued in both queues
    pub fn clear(&self) {
        self.samples.lock().clear();
        self.triggers.lock().clear();
    }

    fn drain(queue: &Mutex<Vec<SensorSample>>) -> Vec<SensorSample> {
        let mut guard = queue.lock();
        if guard.is_empty() {
            return Vec::new();
        }
        // Swap, not copy: the lock is held for a pointer exchange and
        // producers start filling the fresh vector immediately.
        std::mem::take(&mut *guard)
    }
}

impl EventSink for EventBatcher {
    fn sample(&self, handle: usize, timestamp: i64, values: &[f32]) {
        let sample = SensorSample::new(handle, timestamp, values);
        self.samples.lock().push(sample);
    }

    fn trigger(&self, handle: usize, timestamp: i64, values: &[f32]) {
        let sample = SensorSample::new(handle, timestamp, values);
        self.triggers.lock().push(sample);
    }
}

//! SensorProvider trait definition

use crate::core::types::SensorInfo;
use crate::error::Result;
use std::sync::Arc;

/// Sink for raw sensor readings
///
/// Implemented by the service's event batcher. Providers call it from
/// their own callback or generator threads; a push is a short critical
/// section and never blocks on I/O.
pub trait EventSink: Send + Sync {
    /// Deliver one continuous-stream reading
    fn sample(&self, handle: usize, timestamp: i64, values: &[f32]);

    /// Deliver one one-shot trigger reading
    fn trigger(&self, handle: usize, timestamp: i64, values: &[f32]);
}

/// Sensor provider trait for platform abstraction
pub trait SensorProvider: Send {
    /// List available sensors in a stable order
    ///
    /// The position of each entry is its handle for `subscribe` and
    /// `unsubscribe`, and the service derives wire uids from the same
    /// order. The list must not change for the lifetime of the
    /// provider.
    fn enumerate(&mut self) -> Result<Vec<SensorInfo>>;

    /// Register the sink that receives readings
    ///
    /// Called once by the service before any subscription.
    fn set_sink(&mut self, sink: Arc<dyn EventSink>);

    /// Start delivering readings for one sensor
    ///
    /// `rate` is an opaque rate code passed through from the client.
    /// Whether readings arrive as continuous samples or one-shot
    /// triggers is the provider's choice per sensor; the service does
    /// not care. Returns false when the registration is rejected.
    fn subscribe(&mut self, handle: usize, rate: u8) -> bool;

    /// Stop delivering readings for one sensor
    fn unsubscribe(&mut self, handle: usize);

    /// Stop delivering readings for every sensor
    fn unsubscribe_all(&mut self);
}

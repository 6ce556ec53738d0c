//! Core data types shared between the service and sensor providers.
//!
//! Key types for provider implementers:
//! - [`SensorInfo`]: Static metadata reported by enumeration
//! - [`SensorSample`]: One raw reading queued for streaming

/// Static description of one sensor as reported by a provider
#[derive(Debug, Clone, PartialEq)]
pub struct SensorInfo {
    /// Platform sensor type code
    pub kind: u8,
    /// Human-readable sensor name
    pub name: String,
    /// True when the sensor fires one-shot trigger readings instead of
    /// a continuous stream
    pub one_shot: bool,
}

impl SensorInfo {
    /// Create a continuous-stream sensor description
    pub fn streaming(kind: u8, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            one_shot: false,
        }
    }

    /// Create a one-shot trigger sensor description
    pub fn one_shot(kind: u8, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            one_shot: true,
        }
    }
}

/// One raw reading delivered by a provider
///
/// `handle` is the provider's enumeration index. It is resolved to a
/// wire descriptor when the batch is drained, not when the reading is
/// produced, so a reading for a sensor disabled in the meantime is
/// simply discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSample {
    /// Enumeration index of the producing sensor
    pub handle: usize,
    /// Device timestamp in nanoseconds (monotonic)
    pub timestamp: i64,
    /// Reading payload; length depends on the sensor kind
    pub values: Vec<f32>,
}

impl SensorSample {
    pub fn new(handle: usize, timestamp: i64, values: &[f32]) -> Self {
        Self {
            handle,
            timestamp,
            values: values.to_vec(),
        }
    }
}

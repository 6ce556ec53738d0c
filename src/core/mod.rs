//! Core abstractions for sensor providers.
//!
//! - [`provider::SensorProvider`]: Trait to implement for new platforms
//! - [`types`]: Sensor metadata and raw readings

pub mod provider;
pub mod types;

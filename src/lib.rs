//! IndriyaIO - UDP sensor broadcast library
//!
//! This library provides the core components for serving device sensors
//! over a single UDP port: discovery beacons, sensor enumeration,
//! enable/disable control and low-latency event streaming to one client.

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod providers;
pub mod service;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use service::{SensorService, ServiceStatus};

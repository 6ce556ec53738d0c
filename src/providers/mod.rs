//! Sensor provider implementations

pub mod sim;

use crate::config::Config;
use crate::core::provider::SensorProvider;
use crate::error::{Error, Result};
use sim::SimProvider;

/// Create a sensor provider based on configuration
pub fn create_provider(config: &Config) -> Result<Box<dyn SensorProvider>> {
    match config.provider.kind.as_str() {
        "sim" => {
            let provider = SimProvider::new(config.provider.seed)?;
            Ok(Box::new(provider))
        }
        other => Err(Error::UnknownProvider(other.to_string())),
    }
}

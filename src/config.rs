//! Configuration for the indriya-io daemon
//!
//! Loads configuration from TOML file with the few parameters the
//! protocol engine needs: network identity, loop timing and the
//! sensor provider backing the descriptor table.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level daemon configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub network: NetworkConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// Network configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// UDP port to serve; also the destination port of hello broadcasts
    pub port: u16,

    /// Password required by state-changing requests (enable, disable-all)
    ///
    /// An empty string grants access to every client on the network.
    /// Discovery and enumeration are always unauthenticated.
    #[serde(default)]
    pub password: String,
}

/// Main loop timing (milliseconds)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimingConfig {
    /// Tick interval while a client is attached (~60 Hz streaming)
    pub tick_ms: u64,
    /// Sleep interval while no client is attached
    pub idle_ms: u64,
    /// Interval between unsolicited hello broadcasts
    pub hello_ms: u64,
}

/// Sensor provider selection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Provider kind (`sim` is the only built-in)
    pub kind: String,
    /// Seed for the simulated provider; 0 seeds from the OS each run
    #[serde(default)]
    pub seed: u64,
}

impl Config {
    /// Load configuration from TOML file
    ///
    /// # Arguments
    /// - `path`: Path to TOML configuration file
    ///
    /// # Returns
    /// Parsed and validated configuration or error
    ///
    /// # Example
    /// ```no_run
    /// use indriya_io::config::Config;
    ///
    /// let config = Config::from_file("indriya.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.network.port == 0 {
            // Port 0 would bind an ephemeral port, which breaks discovery:
            // clients listen for hellos on the configured service port.
            return Err(Error::Config("network.port must be non-zero".to_string()));
        }
        if self.timing.tick_ms == 0 || self.timing.idle_ms == 0 || self.timing.hello_ms == 0 {
            return Err(Error::Config("timing intervals must be non-zero".to_string()));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            timing: TimingConfig::default(),
            provider: ProviderConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            port: 9999,
            password: String::new(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            // 1000/60 rounded down, same cadence the stock client expects
            tick_ms: 16,
            idle_ms: 500,
            hello_ms: 1000,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: "sim".to_string(),
            seed: 0,
        }
    }
}

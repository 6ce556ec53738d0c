//! IndriyaIO - UDP sensor broadcast daemon
//!
//! ## Protocol Architecture
//!
//! - **UDP broadcast (port 9999)**: Unsolicited hello beacons for discovery
//! - **UDP unicast (same port)**: Request/response control and sensor event
//!   streaming to the single attached client
//!
//! A client that sends an authorized enable request becomes the streaming
//! client; every queued sensor reading is then sent to it as one datagram
//! per reading until it disables all sensors or the link degrades.

use indriya_io::providers::create_provider;
use indriya_io::transport::UdpTransport;
use indriya_io::{Config, Error, Result, SensorService};
use std::env;
use std::sync::atomic::Ordering;

/// Config path tried when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "/etc/indriya.toml";

/// Parse config path from command line arguments.
///
/// Supports:
/// - `indriya-io <path>` (positional)
/// - `indriya-io --config <path>` (flag-based)
/// - `indriya-io -c <path>` (short flag)
///
/// Returns `None` if not specified.
fn parse_config_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();

    // Look for --config or -c flag
    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }

    // Fall back to first positional argument (if it doesn't start with -)
    if args.len() > 1 && !args[1].starts_with('-') {
        return Some(args[1].clone());
    }

    None
}

/// Load the configuration.
///
/// An explicitly given path must load; the default path is allowed to be
/// absent, in which case the built-in defaults keep the daemon runnable
/// out of the box.
fn load_config() -> Result<Config> {
    match parse_config_path() {
        Some(path) => {
            log::info!("Using config: {}", path);
            Config::from_file(&path)
        }
        None => match Config::from_file(DEFAULT_CONFIG_PATH) {
            Ok(config) => {
                log::info!("Using config: {}", DEFAULT_CONFIG_PATH);
                Ok(config)
            }
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!(
                    "No config at {}; using built-in defaults",
                    DEFAULT_CONFIG_PATH
                );
                Ok(Config::default())
            }
            Err(e) => Err(e),
        },
    }
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("IndriyaIO v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    log::info!(
        "Provider: {} | port {} | auth {}",
        config.provider.kind,
        config.network.port,
        if config.network.password.is_empty() {
            "open"
        } else {
            "password"
        }
    );

    // Create sensor provider
    let provider = create_provider(&config)?;

    // Bind the service socket
    let transport = UdpTransport::bind(config.network.port)?;
    log::info!("UDP service bound on {}", transport.local_addr()?);

    let mut service = SensorService::new(&config, Box::new(transport), provider)?;

    // Set up shutdown signal handler
    let running = service.run_flag();
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        running.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    log::info!("IndriyaIO running. Press Ctrl-C to stop.");
    service.run()?;

    log::info!("IndriyaIO stopped");
    Ok(())
}

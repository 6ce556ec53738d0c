//! Error types for indriya-io

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// indriya-io error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error (socket bind, send or receive)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed inbound packet
    ///
    /// Raised by the wire codec; the dispatcher drops the offending
    /// datagram without a response, so this rarely escapes the service.
    #[error("Malformed packet: {0}")]
    Format(#[from] crate::protocol::wire::FormatError),

    /// Configuration problem
    #[error("Config error: {0}")]
    Config(String),

    /// Configuration file parse error
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration file encode error
    #[error("Config encode error: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    /// Sensor provider failure
    #[error("Provider error: {0}")]
    Provider(String),

    /// Unknown provider kind requested in configuration
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

//! Common error types for DFD

use thiserror::Error;

/// Common result type for DFD operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the DFD crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML document could not be parsed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Logging subsystem could not be initialised
    #[error("Logging error: {0}")]
    Logging(String),
}

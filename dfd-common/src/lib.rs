//! # DFD Common Library
//!
//! Shared code for the DeepFake Defender crates:
//! - Error type for configuration and startup
//! - Configuration file resolution and TOML loading
//! - Logging configuration and tracing initialisation

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};

//! Test Helper Utilities
//!
//! Shared utilities for testing dfd-detect

#![allow(dead_code)]

pub mod fixtures;
pub mod log_capture;

pub use fixtures::*;
pub use log_capture::LogCapture;

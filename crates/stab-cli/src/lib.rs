//! Command-line video stabilizer.
//!
//! This crate provides:
//! - Environment and JSON-file configuration
//! - Structured run logging

pub mod config;
pub mod logging;

pub use config::{default_output_path, CliConfig};
pub use logging::RunLogger;

//! Process-level plumbing shared by the server binary: layered configuration
//! and tracing setup.

pub mod config;
pub mod logging;
mod paths;

pub use config::{AppConfig, CliArgs, DatabaseConfig, LoggingConfig, Section, ServerConfig};

//! Infrastructure - ambient concerns
//!
//! Non-pipeline code:
//! - Logging
//! - Configuration management

pub mod config;
pub mod logging;

pub use config::{Config, ConfigError};
pub use logging::init_logging;

//! Polling live market-data viewer for Bybit and Bithumb
//!
//! Core library for the periodic fetch/diff/join/sort ticker pipeline.

pub mod core;
pub mod exchanges;
pub mod infrastructure;
pub mod metadata;
pub mod view;

// Re-export commonly used types
pub use infrastructure::config::{Config, RatesConfig, ViewConfig};

use thiserror::Error;

/// Main error type for the viewer
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("REST API error: {0}")]
    RestApi(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ViewerError>;

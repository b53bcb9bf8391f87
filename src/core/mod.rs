//! Core types for the ticker pipeline
//!
//! This module contains the fundamental types used throughout the system:
//! - Category / QuoteMarket / MarketTag: composite-key market identifiers
//! - TickerRecord / DisplayTicker: one instrument's current state
//! - InstrumentMetadata: slow-changing reference data
//! - decimal-string parsing and percent normalization helpers

pub mod instrument;
pub mod numeric;
pub mod percent;
pub mod ticker;

pub use instrument::InstrumentMetadata;
pub use numeric::parse_decimal;
pub use percent::{normalize_fraction_percent, normalize_percent};
pub use ticker::{Category, DisplayTicker, MarketTag, PriceEffect, QuoteMarket, TickerKey, TickerRecord};

//! Decimal-string parsing for comparison points
//!
//! Ticker values travel as decimal strings; the only places that interpret
//! them numerically are the diff engine and the sort comparator. Both go
//! through `parse_decimal` so a malformed string degrades the same way
//! everywhere: no comparison possible.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a decimal-formatted string, tolerating a leading `+`
///
/// Returns None for blank or malformed input.
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s).ok()
}

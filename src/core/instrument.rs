//! Instrument reference data
//!
//! Slow-changing metadata per (category, symbol), fetched once per category
//! and joined onto ticker records for display precision. Read-only after the
//! join.

/// Reference data for one instrument
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstrumentMetadata {
    pub symbol: String,
    pub base_coin: String,
    pub quote_coin: String,
    pub settle_coin: Option<String>,
    pub contract_type: Option<String>,
    /// Minimum price increment, e.g. "0.01"; drives display rounding
    pub tick_size: Option<String>,
    pub min_order_qty: Option<String>,
}

impl InstrumentMetadata {
    /// Fallback precision when no tick size is known
    pub const DEFAULT_PRICE_DECIMALS: u32 = 2;

    /// Number of decimal places implied by the tick size
    ///
    /// "0.001" -> 3, "1" -> 0. None when no tick size was joined.
    pub fn price_decimals(&self) -> Option<u32> {
        let tick = self.tick_size.as_deref()?;
        Some(match tick.split_once('.') {
            Some((_, frac)) => frac.len() as u32,
            None => 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_decimals_from_tick_size() {
        let meta = InstrumentMetadata {
            tick_size: Some("0.001".to_string()),
            ..Default::default()
        };
        assert_eq!(meta.price_decimals(), Some(3));
    }

    #[test]
    fn test_price_decimals_integer_tick() {
        let meta = InstrumentMetadata {
            tick_size: Some("1".to_string()),
            ..Default::default()
        };
        assert_eq!(meta.price_decimals(), Some(0));
    }

    #[test]
    fn test_price_decimals_missing() {
        let meta = InstrumentMetadata::default();
        assert_eq!(meta.price_decimals(), None);
    }
}

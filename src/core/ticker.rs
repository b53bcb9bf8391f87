//! Ticker data types
//!
//! TickerRecord is one instrument's current trading statistics, replaced
//! wholesale on every fetch tick. DisplayTicker layers the transient price
//! effect and joined instrument metadata on top.

use crate::core::instrument::InstrumentMetadata;
use std::fmt;

/// Bybit market category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Spot,
    Linear,
    Inverse,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Spot => "spot",
            Category::Linear => "linear",
            Category::Inverse => "inverse",
        }
    }

    /// Parse from a route/config string
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "spot" => Some(Category::Spot),
            "linear" => Some(Category::Linear),
            "inverse" => Some(Category::Inverse),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bithumb quote-currency sub-market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QuoteMarket {
    Krw,
    Usdt,
    Btc,
}

impl QuoteMarket {
    /// All sub-markets fetched by the aggregator
    pub const ALL: [QuoteMarket; 3] = [QuoteMarket::Krw, QuoteMarket::Usdt, QuoteMarket::Btc];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteMarket::Krw => "KRW",
            QuoteMarket::Usdt => "USDT",
            QuoteMarket::Btc => "BTC",
        }
    }
}

impl fmt::Display for QuoteMarket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market half of the composite ticker key
///
/// A bare symbol is not unique: the same base coin trades in several Bithumb
/// sub-markets at once. Everything downstream of the fetchers keys on
/// (symbol, market), never on symbol alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarketTag {
    Bybit(Category),
    Bithumb(QuoteMarket),
}

impl MarketTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketTag::Bybit(c) => c.as_str(),
            MarketTag::Bithumb(m) => m.as_str(),
        }
    }
}

impl fmt::Display for MarketTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite key, unique within one aggregated snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TickerKey {
    pub symbol: String,
    pub market: MarketTag,
}

impl fmt::Display for TickerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.symbol, self.market)
    }
}

/// One instrument's current state, normalized from a raw API row
///
/// All numeric values stay decimal-formatted strings exactly as the upstream
/// API delivered them (after percent normalization); parsing happens only at
/// comparison points.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerRecord {
    pub symbol: String,
    pub market: MarketTag,
    /// Display pair, e.g. "BTC/KRW" for Bithumb, the symbol itself for Bybit
    pub pair: String,
    /// Extended search key: `{base}{quote}{base}` for Bithumb (e.g. ETHKRWETH)
    pub search_key: String,
    pub last_price: String,
    /// Signed, normalized 24h change percentage, e.g. "+5.23"
    pub change24h_pcnt: String,
    pub volume24h: String,
    /// Traded notional over 24h; Bithumb `value24h` maps here
    pub turnover24h: String,
    pub bid1_price: Option<String>,
    pub ask1_price: Option<String>,
    pub prev_price: Option<String>,
    pub high_price24h: Option<String>,
    pub low_price24h: Option<String>,
    pub index_price: Option<String>,
    pub mark_price: Option<String>,
    pub open_interest: Option<String>,
    pub funding_rate: Option<String>,
    pub next_funding_time: Option<String>,
    pub delivery_time: Option<String>,
    /// Sticky auxiliary field: blank ticks inherit the last non-blank value
    pub usd_index_price: Option<String>,
}

impl TickerRecord {
    /// Empty record for a key; normalizers fill the fields they carry
    pub fn new(symbol: impl Into<String>, market: MarketTag) -> Self {
        let symbol = symbol.into();
        Self {
            pair: symbol.clone(),
            search_key: symbol.clone(),
            symbol,
            market,
            last_price: String::new(),
            change24h_pcnt: String::new(),
            volume24h: String::new(),
            turnover24h: String::new(),
            bid1_price: None,
            ask1_price: None,
            prev_price: None,
            high_price24h: None,
            low_price24h: None,
            index_price: None,
            mark_price: None,
            open_interest: None,
            funding_rate: None,
            next_funding_time: None,
            delivery_time: None,
            usd_index_price: None,
        }
    }

    /// Composite key for diffing and timer ownership
    pub fn key(&self) -> TickerKey {
        TickerKey {
            symbol: self.symbol.clone(),
            market: self.market,
        }
    }
}

/// Transient directional effect derived by the diff engine
///
/// Only Up/Down arm a reset timer; Flat is the terminal/reset state and is
/// never an entry-triggering effect. Never authoritative market state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceEffect {
    #[default]
    None,
    Up,
    Down,
    Flat,
}

impl PriceEffect {
    /// True for the states that arm an expiry timer
    pub fn is_directional(&self) -> bool {
        matches!(self, PriceEffect::Up | PriceEffect::Down)
    }
}

/// TickerRecord plus derived effect and joined reference data
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayTicker {
    pub record: TickerRecord,
    pub effect: PriceEffect,
    pub instrument: Option<InstrumentMetadata>,
}

impl DisplayTicker {
    pub fn new(record: TickerRecord) -> Self {
        Self {
            record,
            effect: PriceEffect::None,
            instrument: None,
        }
    }

    pub fn key(&self) -> TickerKey {
        self.record.key()
    }

    /// Display rounding precision: tick size when joined, else a default
    pub fn price_decimals(&self) -> u32 {
        self.instrument
            .as_ref()
            .and_then(|i| i.price_decimals())
            .unwrap_or(InstrumentMetadata::DEFAULT_PRICE_DECIMALS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_tag_labels() {
        assert_eq!(MarketTag::Bybit(Category::Linear).as_str(), "linear");
        assert_eq!(MarketTag::Bithumb(QuoteMarket::Krw).as_str(), "KRW");
    }

    #[test]
    fn test_category_round_trip() {
        for c in [Category::Spot, Category::Linear, Category::Inverse] {
            assert_eq!(Category::from_str_opt(c.as_str()), Some(c));
        }
        assert_eq!(Category::from_str_opt("swap"), None);
    }

    #[test]
    fn test_ticker_key_display() {
        let key = TickerKey {
            symbol: "ETH".to_string(),
            market: MarketTag::Bithumb(QuoteMarket::Usdt),
        };
        assert_eq!(key.to_string(), "ETH_USDT");
    }

    #[test]
    fn test_effect_directionality() {
        assert!(PriceEffect::Up.is_directional());
        assert!(PriceEffect::Down.is_directional());
        assert!(!PriceEffect::Flat.is_directional());
        assert!(!PriceEffect::None.is_directional());
    }
}

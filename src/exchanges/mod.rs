//! Exchange-specific REST implementations

pub mod bithumb;
pub mod bybit;
pub mod rates;

pub use bithumb::BithumbRestClient;
pub use bybit::{BybitRestClient, BybitTickerSource};
pub use rates::RateProvider;

use crate::core::{MarketTag, TickerRecord};
use std::collections::BTreeMap;
use std::time::Duration;

/// Exchange identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exchange {
    Bybit,
    Bithumb,
}

impl Exchange {
    pub fn name(&self) -> &'static str {
        match self {
            Exchange::Bybit => "bybit",
            Exchange::Bithumb => "bithumb",
        }
    }
}

/// Fetch errors surfaced by the snapshot fetchers
///
/// Fetchers never panic past their boundary; every transport, HTTP, decode
/// or upstream business failure maps onto one of these.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    Http(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("API error: {0}")]
    Upstream(String),

    #[error("All sub-markets failed: {0}")]
    AllMarketsFailed(String),
}

impl FetchError {
    pub(crate) fn transport(e: reqwest::Error) -> Self {
        FetchError::Transport(e.to_string())
    }
}

/// One fetch cycle's outcome across all sub-markets of a source
///
/// Aggregation preserves which sub-markets failed: good records are merged,
/// failures carry the upstream message keyed by market tag.
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    pub records: Vec<TickerRecord>,
    pub failures: BTreeMap<MarketTag, String>,
}

impl MarketSnapshot {
    pub fn from_records(records: Vec<TickerRecord>) -> Self {
        Self {
            records,
            failures: BTreeMap::new(),
        }
    }
}

/// Snapshot source driven by a view session's scheduler
///
/// One implementation per logical view (a Bybit category, or the Bithumb
/// multi-market aggregate). Mockable seam for session tests.
#[async_trait::async_trait]
pub trait TickerSource: Send + Sync {
    /// Perform one fetch cycle
    async fn fetch(&self) -> Result<MarketSnapshot, FetchError>;

    /// Source label for logging
    fn name(&self) -> String;
}

/// Shared reqwest client builder (timeout + user agent)
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent("marketscope/0.1")
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_names() {
        assert_eq!(Exchange::Bybit.name(), "bybit");
        assert_eq!(Exchange::Bithumb.name(), "bithumb");
    }

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::Upstream("bad api key".to_string());
        assert_eq!(err.to_string(), "API error: bad api key");
    }
}

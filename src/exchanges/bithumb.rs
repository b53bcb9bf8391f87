//! Bithumb public ticker client and multi-market aggregator
//!
//! Bithumb splits its book across three quote-currency sub-markets (KRW,
//! USDT, BTC). One fetch cycle hits all three in parallel and merges whatever
//! succeeded; a sub-market failure is carried in the snapshot's failure map
//! instead of sinking the whole cycle. Only when every sub-market fails does
//! the aggregate call itself fail.

use crate::core::{normalize_percent, MarketTag, QuoteMarket, TickerRecord};
use crate::exchanges::{http_client, FetchError, MarketSnapshot, TickerSource};
use serde::Deserialize;
use std::time::Duration;

/// Bithumb public REST client
pub struct BithumbRestClient {
    client: reqwest::Client,
    base_url: String,
}

impl BithumbRestClient {
    /// Bithumb public ticker API base
    pub const BASE_URL: &'static str = "https://api.bithumb.com/public/ticker";

    pub fn new() -> Self {
        Self::with_base_url(Self::BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: http_client(Duration::from_secs(10)),
            base_url: base_url.into(),
        }
    }

    /// Fetch all sub-markets in parallel and merge the survivors
    pub async fn fetch_all_markets(&self) -> Result<MarketSnapshot, FetchError> {
        let (krw, usdt, btc) = tokio::join!(
            self.fetch_market(QuoteMarket::Krw),
            self.fetch_market(QuoteMarket::Usdt),
            self.fetch_market(QuoteMarket::Btc),
        );

        aggregate([
            (QuoteMarket::Krw, krw),
            (QuoteMarket::Usdt, usdt),
            (QuoteMarket::Btc, btc),
        ])
    }

    /// Fetch one sub-market's ticker list
    ///
    /// API: GET {base}/ALL_{market}
    pub async fn fetch_market(&self, market: QuoteMarket) -> Result<Vec<TickerRecord>, FetchError> {
        let url = format!("{}/ALL_{}", self.base_url, market);

        let response = self.client.get(&url).send().await.map_err(FetchError::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }

        let body = response.bytes().await.map_err(FetchError::transport)?;
        decode_market(&body, market)
    }
}

impl Default for BithumbRestClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TickerSource for BithumbRestClient {
    async fn fetch(&self) -> Result<MarketSnapshot, FetchError> {
        self.fetch_all_markets().await
    }

    fn name(&self) -> String {
        "bithumb".to_string()
    }
}

/// Merge per-market outcomes into one snapshot
///
/// Partial failure keeps the good records and records the message per failed
/// market; total failure joins every message into one composite error.
fn aggregate(
    results: [(QuoteMarket, Result<Vec<TickerRecord>, FetchError>); 3],
) -> Result<MarketSnapshot, FetchError> {
    let mut snapshot = MarketSnapshot::default();

    for (market, result) in results {
        match result {
            Ok(records) => snapshot.records.extend(records),
            Err(e) => {
                snapshot.failures.insert(MarketTag::Bithumb(market), e.to_string());
            }
        }
    }

    if snapshot.failures.len() == 3 {
        let joined = snapshot
            .failures
            .iter()
            .map(|(market, message)| format!("{}: {}", market, message))
            .collect::<Vec<_>>()
            .join("\n");
        return Err(FetchError::AllMarketsFailed(joined));
    }

    Ok(snapshot)
}

/// Decode one sub-market payload into normalized records
fn decode_market(body: &[u8], market: QuoteMarket) -> Result<Vec<TickerRecord>, FetchError> {
    let response: BithumbResponse =
        serde_json::from_slice(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    if response.status != "0000" {
        return Err(FetchError::Upstream(response.message.unwrap_or_else(|| {
            format!("Invalid or empty response for {} market", market)
        })));
    }

    let data = response
        .data
        .ok_or_else(|| FetchError::Parse(format!("missing data for {} market", market)))?;

    let mut records = Vec::with_capacity(data.len());
    for (symbol, value) in data {
        // The payload mixes ticker objects with a "date" timestamp entry
        if symbol == "date" {
            continue;
        }
        match serde_json::from_value::<BithumbTickerRow>(value) {
            Ok(row) => records.push(row.into_record(&symbol, market)),
            Err(e) => {
                tracing::warn!("Skipping malformed {} row for {}: {}", market, symbol, e);
            }
        }
    }

    Ok(records)
}

// === API response types ===

#[derive(Debug, Deserialize)]
struct BithumbResponse {
    status: String,
    message: Option<String>,
    data: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct BithumbTickerRow {
    #[serde(default)]
    closing_price: String,
    #[serde(default)]
    prev_closing_price: String,
    #[serde(default)]
    max_price: String,
    #[serde(default)]
    min_price: String,
    #[serde(rename = "units_traded_24H", default)]
    units_traded_24h: String,
    #[serde(rename = "acc_trade_value_24H", default)]
    acc_trade_value_24h: String,
    #[serde(rename = "fluctate_rate_24H", default)]
    fluctate_rate_24h: String,
}

impl BithumbTickerRow {
    fn into_record(self, symbol: &str, market: QuoteMarket) -> TickerRecord {
        TickerRecord {
            symbol: symbol.to_string(),
            market: MarketTag::Bithumb(market),
            pair: format!("{}/{}", symbol, market),
            // {base}{quote}{base} so e.g. "ETHKRW" and "KRWETH" both match
            search_key: format!("{}{}{}", symbol, market, symbol),
            last_price: self.closing_price,
            change24h_pcnt: normalize_percent(&self.fluctate_rate_24h),
            volume24h: self.units_traded_24h,
            turnover24h: self.acc_trade_value_24h,
            bid1_price: None,
            ask1_price: None,
            prev_price: Some(self.prev_closing_price),
            high_price24h: Some(self.max_price),
            low_price24h: Some(self.min_price),
            index_price: None,
            mark_price: None,
            open_interest: None,
            funding_rate: None,
            next_funding_time: None,
            delivery_time: None,
            usd_index_price: None,
        }
    }
}

//! Bybit V5 market REST client
//!
//! Covers the three public endpoints the viewer consumes: ticker snapshots,
//! instrument metadata, and funding-rate history. One request per call, no
//! retries; the scheduler's next tick is the retry.

use crate::core::{normalize_fraction_percent, Category, InstrumentMetadata, MarketTag, TickerRecord};
use crate::exchanges::{http_client, FetchError, MarketSnapshot, TickerSource};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Bybit V5 REST client
pub struct BybitRestClient {
    client: reqwest::Client,
    base_url: String,
}

impl BybitRestClient {
    /// Bybit V5 market API base
    pub const BASE_URL: &'static str = "https://api.bybit.com/v5/market";

    pub fn new() -> Self {
        Self::with_base_url(Self::BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: http_client(Duration::from_secs(10)),
            base_url: base_url.into(),
        }
    }

    /// Fetch one ticker snapshot for a category
    ///
    /// API: GET {base}/tickers?category={category}
    pub async fn fetch_tickers(&self, category: Category) -> Result<Vec<TickerRecord>, FetchError> {
        let url = format!("{}/tickers?category={}", self.base_url, category);
        let result: TickersResult = self.get_envelope(&url).await?;

        Ok(result
            .list
            .into_iter()
            .map(|row| row.into_record(category))
            .collect())
    }

    /// Fetch instrument metadata for a whole category
    ///
    /// API: GET {base}/instruments-info?category={category}
    pub async fn fetch_instruments(
        &self,
        category: Category,
    ) -> Result<Vec<InstrumentMetadata>, FetchError> {
        let url = format!("{}/instruments-info?category={}", self.base_url, category);
        let result: InstrumentsResult = self.get_envelope(&url).await?;

        Ok(result.list.into_iter().map(BybitInstrumentRow::into_metadata).collect())
    }

    /// Fetch funding-rate history for one symbol
    ///
    /// Spot instruments have no funding; the call short-circuits to an empty
    /// list without touching the network.
    ///
    /// API: GET {base}/funding/history?category={category}&symbol={symbol}&limit={limit}
    pub async fn fetch_funding_history(
        &self,
        category: Category,
        symbol: &str,
        limit: u32,
    ) -> Result<Vec<FundingRateEntry>, FetchError> {
        if category == Category::Spot {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/funding/history?category={}&symbol={}&limit={}",
            self.base_url, category, symbol, limit
        );
        let result: FundingResult = self.get_envelope(&url).await?;

        Ok(result.list)
    }

    /// GET a V5 envelope, unwrapping retCode/retMsg
    async fn get_envelope<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self.client.get(url).send().await.map_err(FetchError::transport)?;

        let status = response.status();
        let body = response.bytes().await.map_err(FetchError::transport)?;

        if !status.is_success() {
            // Error bodies still carry retMsg when the API itself answered
            if let Ok(envelope) = serde_json::from_slice::<BybitEnvelope<serde_json::Value>>(&body) {
                if !envelope.ret_msg.is_empty() {
                    return Err(FetchError::Upstream(envelope.ret_msg));
                }
            }
            return Err(FetchError::Http(status.as_u16()));
        }

        let envelope: BybitEnvelope<T> = serde_json::from_slice(&body)
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        if envelope.ret_code != 0 {
            return Err(FetchError::Upstream(envelope.ret_msg));
        }

        envelope
            .result
            .ok_or_else(|| FetchError::Parse("missing result in API response".to_string()))
    }
}

impl Default for BybitRestClient {
    fn default() -> Self {
        Self::new()
    }
}

/// One Bybit category viewed as a snapshot source
pub struct BybitTickerSource {
    client: Arc<BybitRestClient>,
    category: Category,
}

impl BybitTickerSource {
    pub fn new(client: Arc<BybitRestClient>, category: Category) -> Self {
        Self { client, category }
    }
}

#[async_trait::async_trait]
impl TickerSource for BybitTickerSource {
    async fn fetch(&self) -> Result<MarketSnapshot, FetchError> {
        let records = self.client.fetch_tickers(self.category).await?;
        Ok(MarketSnapshot::from_records(records))
    }

    fn name(&self) -> String {
        format!("bybit-{}", self.category)
    }
}

// === API response types ===

/// V5 response envelope shared by all market endpoints
#[derive(Debug, Deserialize)]
struct BybitEnvelope<T> {
    #[serde(rename = "retCode", default)]
    ret_code: i32,
    #[serde(rename = "retMsg", default)]
    ret_msg: String,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TickersResult {
    list: Vec<BybitTickerRow>,
}

/// Raw ticker row; categories differ in which optional fields they carry
#[derive(Debug, Deserialize)]
struct BybitTickerRow {
    symbol: String,
    #[serde(rename = "lastPrice", default)]
    last_price: String,
    #[serde(rename = "price24hPcnt", default)]
    price24h_pcnt: String,
    #[serde(rename = "volume24h", default)]
    volume24h: String,
    #[serde(rename = "turnover24h", default)]
    turnover24h: String,
    #[serde(rename = "bid1Price")]
    bid1_price: Option<String>,
    #[serde(rename = "ask1Price")]
    ask1_price: Option<String>,
    #[serde(rename = "prevPrice24h")]
    prev_price24h: Option<String>,
    #[serde(rename = "highPrice24h")]
    high_price24h: Option<String>,
    #[serde(rename = "lowPrice24h")]
    low_price24h: Option<String>,
    #[serde(rename = "indexPrice")]
    index_price: Option<String>,
    #[serde(rename = "markPrice")]
    mark_price: Option<String>,
    #[serde(rename = "openInterest")]
    open_interest: Option<String>,
    #[serde(rename = "fundingRate")]
    funding_rate: Option<String>,
    #[serde(rename = "nextFundingTime")]
    next_funding_time: Option<String>,
    #[serde(rename = "deliveryTime")]
    delivery_time: Option<String>,
    #[serde(rename = "usdIndexPrice")]
    usd_index_price: Option<String>,
}

impl BybitTickerRow {
    fn into_record(self, category: Category) -> TickerRecord {
        TickerRecord {
            pair: self.symbol.clone(),
            search_key: self.symbol.clone(),
            symbol: self.symbol,
            market: MarketTag::Bybit(category),
            last_price: self.last_price,
            change24h_pcnt: normalize_fraction_percent(&self.price24h_pcnt),
            volume24h: self.volume24h,
            turnover24h: self.turnover24h,
            bid1_price: self.bid1_price,
            ask1_price: self.ask1_price,
            prev_price: self.prev_price24h,
            high_price24h: self.high_price24h,
            low_price24h: self.low_price24h,
            index_price: self.index_price,
            mark_price: self.mark_price,
            open_interest: self.open_interest,
            funding_rate: self.funding_rate,
            next_funding_time: self.next_funding_time,
            delivery_time: self.delivery_time,
            usd_index_price: self.usd_index_price,
        }
    }
}

#[derive(Debug, Deserialize)]
struct InstrumentsResult {
    list: Vec<BybitInstrumentRow>,
}

#[derive(Debug, Deserialize)]
struct BybitInstrumentRow {
    symbol: String,
    #[serde(rename = "baseCoin", default)]
    base_coin: String,
    #[serde(rename = "quoteCoin", default)]
    quote_coin: String,
    #[serde(rename = "settleCoin")]
    settle_coin: Option<String>,
    #[serde(rename = "contractType")]
    contract_type: Option<String>,
    #[serde(rename = "priceFilter")]
    price_filter: Option<BybitPriceFilter>,
    #[serde(rename = "lotSizeFilter")]
    lot_size_filter: Option<BybitLotSizeFilter>,
}

#[derive(Debug, Deserialize)]
struct BybitPriceFilter {
    #[serde(rename = "tickSize")]
    tick_size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BybitLotSizeFilter {
    #[serde(rename = "minOrderQty")]
    min_order_qty: Option<String>,
}

impl BybitInstrumentRow {
    fn into_metadata(self) -> InstrumentMetadata {
        InstrumentMetadata {
            symbol: self.symbol,
            base_coin: self.base_coin,
            quote_coin: self.quote_coin,
            settle_coin: self.settle_coin,
            contract_type: self.contract_type,
            tick_size: self.price_filter.and_then(|f| f.tick_size),
            min_order_qty: self.lot_size_filter.and_then(|f| f.min_order_qty),
        }
    }
}

/// One funding-rate history entry
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FundingRateEntry {
    #[serde(default)]
    pub symbol: String,
    #[serde(rename = "fundingRate", default)]
    pub funding_rate: String,
    #[serde(rename = "fundingRateTimestamp", default)]
    pub funding_rate_timestamp: String,
}

#[derive(Debug, Deserialize)]
struct FundingResult {
    list: Vec<FundingRateEntry>,
}

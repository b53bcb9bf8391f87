//! Currency exchange-rate client
//!
//! Rates move once per day upstream, so a successful response is cached for
//! the remainder of the UTC calendar day and reused across views.

use crate::exchanges::{http_client, FetchError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use time::{Date, OffsetDateTime};
use tokio::sync::Mutex;

/// Latest conversion rates for one base currency
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRates {
    pub base_code: String,
    /// Quote currency -> rate
    pub conversion_rates: BTreeMap<String, f64>,
    /// Upstream update timestamp, verbatim
    pub last_update_utc: String,
}

#[derive(Debug, Clone)]
struct CachedRates {
    fetched_on: Date,
    rates: ExchangeRates,
}

impl CachedRates {
    fn is_fresh(&self, today: Date) -> bool {
        self.fetched_on == today
    }
}

/// Exchange-rate REST client with a UTC-day cache
pub struct RateProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    base_currency: String,
    cache: Mutex<Option<CachedRates>>,
}

impl RateProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, base_currency: impl Into<String>) -> Self {
        Self {
            client: http_client(Duration::from_secs(10)),
            base_url: base_url.into(),
            api_key: api_key.into(),
            base_currency: base_currency.into(),
            cache: Mutex::new(None),
        }
    }

    /// Latest rates for the configured base currency
    ///
    /// Refetches at most once per UTC calendar day; concurrent callers
    /// serialize on the cache lock so a fresh day triggers a single request.
    pub async fn latest(&self) -> Result<ExchangeRates, FetchError> {
        let today = OffsetDateTime::now_utc().date();

        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh(today) {
                tracing::debug!("Using cached exchange rates for {}", today);
                return Ok(cached.rates.clone());
            }
        }

        let rates = self.fetch().await?;
        *cache = Some(CachedRates {
            fetched_on: today,
            rates: rates.clone(),
        });
        Ok(rates)
    }

    async fn fetch(&self) -> Result<ExchangeRates, FetchError> {
        let url = format!("{}/{}/latest/{}", self.base_url, self.api_key, self.base_currency);

        tracing::info!("Fetching fresh exchange rates for {}", self.base_currency);

        let response = self.client.get(&url).send().await.map_err(FetchError::transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(FetchError::transport)?;

        let payload: RatesPayload =
            serde_json::from_slice(&body).map_err(|e| FetchError::Parse(e.to_string()))?;

        if payload.result != "success" {
            if let Some(kind) = payload.error_type {
                return Err(FetchError::Upstream(kind));
            }
            if !status.is_success() {
                return Err(FetchError::Http(status.as_u16()));
            }
            return Err(FetchError::Parse("unexpected rates response structure".to_string()));
        }

        Ok(ExchangeRates {
            base_code: payload.base_code.unwrap_or_else(|| self.base_currency.clone()),
            conversion_rates: payload.conversion_rates.unwrap_or_default(),
            last_update_utc: payload.time_last_update_utc.unwrap_or_default(),
        })
    }

    #[cfg(test)]
    async fn seed_cache(&self, fetched_on: Date, rates: ExchangeRates) {
        *self.cache.lock().await = Some(CachedRates { fetched_on, rates });
    }
}

// === API response types ===

#[derive(Debug, Deserialize)]
struct RatesPayload {
    #[serde(default)]
    result: String,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    base_code: Option<String>,
    time_last_update_utc: Option<String>,
    conversion_rates: Option<BTreeMap<String, f64>>,
}

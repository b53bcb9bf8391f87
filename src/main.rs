//! Live market-data viewer for Bybit and Bithumb
//!
//! # Architecture
//! - **core**: Domain types (ticker records, percent normalization)
//! - **exchanges**: REST snapshot fetchers (Bybit, Bithumb, exchange rates)
//! - **metadata**: Single-flight instrument metadata cache
//! - **view**: Diff/join/filter/sort pipeline behind per-view sessions
//! - **infrastructure**: Logging and configuration

use marketscope::core::Category;
use marketscope::exchanges::{BithumbRestClient, BybitRestClient, BybitTickerSource, RateProvider};
use marketscope::infrastructure::{init_logging, Config};
use marketscope::metadata::InstrumentCache;
use marketscope::view::{ViewOptions, ViewSession, ViewState};
use marketscope::{Result, ViewerError};
use std::sync::Arc;

/// Main application state
pub struct ViewerApp {
    config: Config,
}

impl ViewerApp {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the viewer until interrupted
    pub async fn run(&self) -> Result<()> {
        tracing::info!("Starting market-data viewer...");

        let bybit = Arc::new(BybitRestClient::with_base_url(&self.config.bybit.base_url));
        let bithumb = Arc::new(BithumbRestClient::with_base_url(&self.config.bithumb.base_url));
        let instruments = Arc::new(InstrumentCache::new(bybit.clone()));

        // Rates are informational; a missing key just disables the feature
        if self.config.rates.api_key.is_empty() {
            tracing::info!("No exchange-rate API key configured, skipping rates");
        } else {
            let rates = RateProvider::new(
                &self.config.rates.base_url,
                &self.config.rates.api_key,
                &self.config.rates.base_currency,
            );
            match rates.latest().await {
                Ok(table) => tracing::info!(
                    "Exchange rates as of {}: 1 {} = {:.2} KRW",
                    table.last_update_utc,
                    table.base_code,
                    table.conversion_rates.get("KRW").copied().unwrap_or_default()
                ),
                Err(e) => tracing::warn!("Exchange-rate fetch failed: {}", e),
            }
        }

        let bybit_view = ViewSession::spawn(
            Arc::new(BybitTickerSource::new(bybit.clone(), Category::Linear)),
            ViewOptions::new(
                self.config.bybit_refresh_interval(),
                self.config.price_effect_duration(),
            )
            .with_instruments(instruments.clone(), Category::Linear),
        );

        let bithumb_view = ViewSession::spawn(
            bithumb,
            ViewOptions::new(
                self.config.bithumb_refresh_interval(),
                self.config.price_effect_duration(),
            ),
        );

        let mut bybit_rx = bybit_view.subscribe();
        let mut bithumb_rx = bithumb_view.subscribe();

        loop {
            tokio::select! {
                changed = bybit_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    log_view("bybit-linear", &bybit_rx.borrow());
                }
                changed = bithumb_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    log_view("bithumb", &bithumb_rx.borrow());
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

fn log_view(label: &str, state: &ViewState) {
    if let Some(error) = &state.error {
        tracing::warn!("{}: fetch error: {}", label, error);
    }
    for (market, message) in &state.market_errors {
        tracing::warn!("{}: {} degraded: {}", label, market, message);
    }
    if let Some(top) = state.tickers.first() {
        tracing::info!(
            "{}: {} tickers, top {} last={} change={}",
            label,
            state.tickers.len(),
            top.record.symbol,
            top.record.last_price,
            top.record.change24h_pcnt
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _guards = init_logging();

    let config = Config::load().map_err(|e| ViewerError::Config(e.to_string()))?;

    let app = ViewerApp::new(config);
    app.run().await?;

    Ok(())
}

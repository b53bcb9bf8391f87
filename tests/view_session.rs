//! End-to-end view session tests over a scripted ticker source
//!
//! All tests run on the paused clock so refresh cycles and effect expiry
//! are driven deterministically.

use marketscope::core::{Category, MarketTag, PriceEffect, QuoteMarket, TickerRecord};
use marketscope::exchanges::{FetchError, MarketSnapshot, TickerSource};
use marketscope::view::{SortCriterion, SortDirection, SortField, ViewOptions, ViewSession};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

const REFRESH: Duration = Duration::from_millis(1_000);
const EFFECT: Duration = Duration::from_millis(200);

/// Replays a script of fetch outcomes; the last entry repeats forever
struct ScriptedSource {
    script: Mutex<Vec<Result<MarketSnapshot, FetchError>>>,
}

impl ScriptedSource {
    fn new(script: Vec<Result<MarketSnapshot, FetchError>>) -> Arc<Self> {
        assert!(!script.is_empty());
        Arc::new(Self {
            script: Mutex::new(script),
        })
    }
}

#[async_trait::async_trait]
impl TickerSource for ScriptedSource {
    async fn fetch(&self) -> Result<MarketSnapshot, FetchError> {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.remove(0)
        } else {
            script[0].clone()
        }
    }

    fn name(&self) -> String {
        "scripted".to_string()
    }
}

fn record(symbol: &str, price: &str, turnover: &str) -> TickerRecord {
    TickerRecord {
        last_price: price.to_string(),
        turnover24h: turnover.to_string(),
        ..TickerRecord::new(symbol, MarketTag::Bybit(Category::Linear))
    }
}

fn snapshot(records: Vec<TickerRecord>) -> Result<MarketSnapshot, FetchError> {
    Ok(MarketSnapshot::from_records(records))
}

fn options() -> ViewOptions {
    ViewOptions::new(REFRESH, EFFECT)
}

#[tokio::test(start_paused = true)]
async fn test_initial_load_publishes_tickers() {
    let source = ScriptedSource::new(vec![snapshot(vec![record("BTCUSDT", "100", "9")])]);
    let session = ViewSession::spawn(source, options());
    let mut rx = session.subscribe();

    assert!(rx.borrow().loading);

    rx.changed().await.unwrap();
    let state = rx.borrow().clone();
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert_eq!(state.tickers.len(), 1);
    assert_eq!(state.tickers[0].effect, PriceEffect::None);
}

#[tokio::test(start_paused = true)]
async fn test_price_rise_highlights_then_fades() {
    let source = ScriptedSource::new(vec![
        snapshot(vec![record("BTCUSDT", "100", "9")]),
        snapshot(vec![record("BTCUSDT", "105", "9")]),
    ]);
    let session = ViewSession::spawn(source, options());
    let mut rx = session.subscribe();

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().tickers[0].effect, PriceEffect::None);

    // Second refresh cycle carries the higher price
    rx.changed().await.unwrap();
    let state = rx.borrow().clone();
    assert_eq!(state.tickers[0].effect, PriceEffect::Up);
    assert_eq!(state.tickers[0].record.last_price, "105");

    // Expiry fires before the next refresh and fades the highlight
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().tickers[0].effect, PriceEffect::Flat);
}

#[tokio::test(start_paused = true)]
async fn test_failure_after_success_keeps_stale_list() {
    let source = ScriptedSource::new(vec![
        snapshot(vec![record("BTCUSDT", "100", "9")]),
        Err(FetchError::Transport("connection refused".to_string())),
    ]);
    let session = ViewSession::spawn(source, options());
    let mut rx = session.subscribe();

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().tickers.len(), 1);

    rx.changed().await.unwrap();
    let state = rx.borrow().clone();
    assert_eq!(state.tickers.len(), 1);
    assert_eq!(state.tickers[0].record.last_price, "100");
    assert!(state.error.as_deref().unwrap().contains("connection refused"));
}

#[tokio::test(start_paused = true)]
async fn test_first_load_failure_then_recovery() {
    let source = ScriptedSource::new(vec![
        Err(FetchError::Http(503)),
        snapshot(vec![record("BTCUSDT", "100", "9")]),
    ]);
    let session = ViewSession::spawn(source, options());
    let mut rx = session.subscribe();

    rx.changed().await.unwrap();
    let state = rx.borrow().clone();
    assert!(!state.loading);
    assert!(state.tickers.is_empty());
    assert!(state.error.is_some());

    rx.changed().await.unwrap();
    let state = rx.borrow().clone();
    assert_eq!(state.tickers.len(), 1);
    assert!(state.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_sub_market_failures_surface_alongside_data() {
    let mut degraded = MarketSnapshot::from_records(vec![TickerRecord::new(
        "ETH",
        MarketTag::Bithumb(QuoteMarket::Krw),
    )]);
    degraded.failures.insert(
        MarketTag::Bithumb(QuoteMarket::Btc),
        "Invalid Parameter".to_string(),
    );

    let source = ScriptedSource::new(vec![Ok(degraded)]);
    let session = ViewSession::spawn(source, options());
    let mut rx = session.subscribe();

    rx.changed().await.unwrap();
    let state = rx.borrow().clone();
    assert_eq!(state.tickers.len(), 1);
    assert!(state.error.is_none());
    assert_eq!(
        state.market_errors,
        BTreeMap::from([(
            MarketTag::Bithumb(QuoteMarket::Btc),
            "Invalid Parameter".to_string()
        )])
    );
}

#[tokio::test(start_paused = true)]
async fn test_search_command_refilters_published_state() {
    let source = ScriptedSource::new(vec![snapshot(vec![
        record("BTCUSDT", "100", "9"),
        record("ETHUSDT", "50", "5"),
    ])]);
    // Long refresh keeps later cycles out of the way
    let session = ViewSession::spawn(source, ViewOptions::new(Duration::from_secs(60), EFFECT));
    let mut rx = session.subscribe();

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().tickers.len(), 2);

    session.set_search_term("eth");
    rx.changed().await.unwrap();
    let state = rx.borrow().clone();
    assert_eq!(state.tickers.len(), 1);
    assert_eq!(state.tickers[0].record.symbol, "ETHUSDT");

    session.set_search_term("");
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().tickers.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_sort_command_reorders_published_state() {
    let source = ScriptedSource::new(vec![snapshot(vec![
        record("AUSDT", "10", "100"),
        record("BUSDT", "2", "300"),
        record("CUSDT", "33", "200"),
    ])]);
    let session = ViewSession::spawn(source, ViewOptions::new(Duration::from_secs(60), EFFECT));
    let mut rx = session.subscribe();

    // Default ordering is turnover, highest first
    rx.changed().await.unwrap();
    let symbols: Vec<String> = rx
        .borrow()
        .tickers
        .iter()
        .map(|t| t.record.symbol.clone())
        .collect();
    assert_eq!(symbols, vec!["BUSDT", "CUSDT", "AUSDT"]);

    session.set_sort(SortCriterion::new(SortField::LastPrice, SortDirection::Asc));
    rx.changed().await.unwrap();
    let symbols: Vec<String> = rx
        .borrow()
        .tickers
        .iter()
        .map(|t| t.record.symbol.clone())
        .collect();
    assert_eq!(symbols, vec!["BUSDT", "AUSDT", "CUSDT"]);
}

#[tokio::test(start_paused = true)]
async fn test_market_filter_command() {
    let krw = TickerRecord::new("ETH", MarketTag::Bithumb(QuoteMarket::Krw));
    let usdt = TickerRecord::new("ETH", MarketTag::Bithumb(QuoteMarket::Usdt));

    let source = ScriptedSource::new(vec![snapshot(vec![krw, usdt])]);
    let session = ViewSession::spawn(source, ViewOptions::new(Duration::from_secs(60), EFFECT));
    let mut rx = session.subscribe();

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().tickers.len(), 2);

    session.set_market_filter(Some(MarketTag::Bithumb(QuoteMarket::Krw)));
    rx.changed().await.unwrap();
    let state = rx.borrow().clone();
    assert_eq!(state.tickers.len(), 1);
    assert_eq!(state.tickers[0].record.market, MarketTag::Bithumb(QuoteMarket::Krw));
}

#[tokio::test(start_paused = true)]
async fn test_two_sessions_are_independent() {
    let a = ViewSession::spawn(
        ScriptedSource::new(vec![snapshot(vec![record("BTCUSDT", "100", "9")])]),
        ViewOptions::new(Duration::from_secs(60), EFFECT),
    );
    let b = ViewSession::spawn(
        ScriptedSource::new(vec![snapshot(vec![
            record("BTCUSDT", "100", "9"),
            record("ETHUSDT", "50", "5"),
        ])]),
        ViewOptions::new(Duration::from_secs(60), EFFECT),
    );

    let mut rx_a = a.subscribe();
    let mut rx_b = b.subscribe();
    rx_a.changed().await.unwrap();
    rx_b.changed().await.unwrap();

    // Filtering one view leaves the other untouched
    a.set_search_term("nothing-matches-this");
    rx_a.changed().await.unwrap();
    assert!(rx_a.borrow().tickers.is_empty());
    assert_eq!(rx_b.borrow().tickers.len(), 2);
}

//! Instrument metadata cache (reference data joiner)
//!
//! Tickers refresh every second; instrument metadata barely moves. The cache
//! fetches each category at most once per process, collapses concurrent
//! requests for the same category into a single upstream call, and exposes a
//! synchronous lookup for the join step. A failed category fetch leaves the
//! slot empty so a later tick can retry.

use crate::core::{Category, InstrumentMetadata};
use crate::exchanges::{BybitRestClient, FetchError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

/// Metadata map for one category, keyed by symbol
pub type InstrumentMap = Arc<HashMap<String, InstrumentMetadata>>;

/// Fetch seam for the cache; mockable in tests
#[async_trait::async_trait]
pub trait InstrumentSource: Send + Sync {
    async fn instruments(&self, category: Category) -> Result<Vec<InstrumentMetadata>, FetchError>;
}

#[async_trait::async_trait]
impl InstrumentSource for BybitRestClient {
    async fn instruments(&self, category: Category) -> Result<Vec<InstrumentMetadata>, FetchError> {
        self.fetch_instruments(category).await
    }
}

/// Single-flight per-category instrument cache
pub struct InstrumentCache {
    source: Arc<dyn InstrumentSource>,
    cells: Mutex<HashMap<Category, Arc<OnceCell<InstrumentMap>>>>,
}

impl InstrumentCache {
    pub fn new(source: Arc<dyn InstrumentSource>) -> Self {
        Self {
            source,
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Ensure a category is populated, fetching at most once
    ///
    /// Concurrent callers for the same uncached category share one upstream
    /// fetch. On failure the cell stays empty and the error propagates.
    pub async fn ensure(&self, category: Category) -> Result<InstrumentMap, FetchError> {
        let cell = self.cell(category);

        cell.get_or_try_init(|| async {
            let list = self.source.instruments(category).await?;
            let map: HashMap<String, InstrumentMetadata> = list
                .into_iter()
                .map(|meta| (meta.symbol.clone(), meta))
                .collect();
            tracing::info!("Cached {} instruments for category {}", map.len(), category);
            Ok(Arc::new(map))
        })
        .await
        .map(Arc::clone)
    }

    /// Fire-and-forget populate, for callers that must not block
    pub fn prefetch(self: &Arc<Self>, category: Category) {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = cache.ensure(category).await {
                tracing::warn!("Instrument metadata fetch failed for {}: {}", category, e);
            }
        });
    }

    /// Synchronous lookup; None while the category is unfetched or the
    /// symbol is absent from it (neither is an error)
    pub fn lookup(&self, category: Category, symbol: &str) -> Option<InstrumentMetadata> {
        let cell = self.cell(category);
        cell.get().and_then(|map| map.get(symbol).cloned())
    }

    fn cell(&self, category: Category) -> Arc<OnceCell<InstrumentMap>> {
        let mut cells = self.cells.lock().expect("instrument cache lock poisoned");
        cells.entry(category).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait::async_trait]
    impl InstrumentSource for CountingSource {
        async fn instruments(&self, _category: Category) -> Result<Vec<InstrumentMetadata>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Hold the in-flight window open so concurrent callers overlap
            tokio::time::sleep(Duration::from_millis(10)).await;
            if self.fail {
                return Err(FetchError::Http(500));
            }
            Ok(vec![InstrumentMetadata {
                symbol: "BTCUSDT".to_string(),
                base_coin: "BTC".to_string(),
                quote_coin: "USDT".to_string(),
                settle_coin: Some("USDT".to_string()),
                contract_type: Some("LinearPerpetual".to_string()),
                tick_size: Some("0.1".to_string()),
                min_order_qty: Some("0.001".to_string()),
            }])
        }
    }

    #[tokio::test]
    async fn test_concurrent_lookups_single_fetch() {
        let source = Arc::new(CountingSource::new(false));
        let cache = InstrumentCache::new(source.clone());

        let (a, b) = tokio::join!(cache.ensure(Category::Linear), cache.ensure(Category::Linear));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_categories_cached_independently() {
        let source = Arc::new(CountingSource::new(false));
        let cache = InstrumentCache::new(source.clone());

        cache.ensure(Category::Linear).await.unwrap();
        cache.ensure(Category::Linear).await.unwrap();
        cache.ensure(Category::Inverse).await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_lookup_after_populate() {
        let source = Arc::new(CountingSource::new(false));
        let cache = InstrumentCache::new(source);

        assert!(cache.lookup(Category::Linear, "BTCUSDT").is_none());
        cache.ensure(Category::Linear).await.unwrap();

        let meta = cache.lookup(Category::Linear, "BTCUSDT").unwrap();
        assert_eq!(meta.tick_size.as_deref(), Some("0.1"));
        // Symbol miss after populate is still a plain None
        assert!(cache.lookup(Category::Linear, "DOGEUSDT").is_none());
    }

    #[tokio::test]
    async fn test_failure_leaves_cell_retryable() {
        let source = Arc::new(CountingSource::new(true));
        let cache = InstrumentCache::new(source.clone());

        assert!(cache.ensure(Category::Spot).await.is_err());
        assert!(cache.ensure(Category::Spot).await.is_err());
        // Each attempt reached upstream: no poisoned cache entry
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert!(cache.lookup(Category::Spot, "BTCUSDT").is_none());
    }
}

//! View session actor
//!
//! One `ViewSession` per open view. The actor owns the fetch scheduler, the
//! diff engine and the view-model settings; callers observe it through a
//! `watch` channel and steer it with commands. Dropping the session aborts
//! the actor task, which in turn aborts every pending effect timer.

use crate::core::{Category, DisplayTicker, MarketTag, PriceEffect, TickerKey};
use crate::exchanges::{FetchError, MarketSnapshot, TickerSource};
use crate::metadata::InstrumentCache;
use crate::view::sort::{apply_view, SortCriterion};
use crate::view::diff::EffectEngine;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Published state of one view
///
/// `tickers` is the fully derived display list (diffed, joined, filtered,
/// sorted). `loading` is true only until the first fetch cycle completes,
/// success or not. After the first successful load a fetch failure keeps
/// the stale list and surfaces the message in `error` instead.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub tickers: Vec<DisplayTicker>,
    pub loading: bool,
    pub error: Option<String>,
    pub market_errors: BTreeMap<MarketTag, String>,
}

/// Commands a caller can send to a running session
#[derive(Debug, Clone)]
pub enum ViewCommand {
    SetSearch(String),
    SetSort(SortCriterion),
    SetMarketFilter(Option<MarketTag>),
}

/// Reference-data join for views whose source has instrument metadata
#[derive(Clone)]
pub struct InstrumentJoin {
    pub cache: Arc<InstrumentCache>,
    pub category: Category,
}

/// Session tuning knobs
#[derive(Clone)]
pub struct ViewOptions {
    pub refresh_interval: Duration,
    pub effect_duration: Duration,
    pub instruments: Option<InstrumentJoin>,
}

impl ViewOptions {
    pub fn new(refresh_interval: Duration, effect_duration: Duration) -> Self {
        Self {
            refresh_interval,
            effect_duration,
            instruments: None,
        }
    }

    pub fn with_instruments(mut self, cache: Arc<InstrumentCache>, category: Category) -> Self {
        self.instruments = Some(InstrumentJoin { cache, category });
        self
    }
}

/// Handle to a running view session
///
/// Owns the actor task; dropping the handle tears the whole view down
/// (scheduler, in-flight fetches become no-ops, effect timers aborted).
pub struct ViewSession {
    cmd_tx: mpsc::UnboundedSender<ViewCommand>,
    state_rx: watch::Receiver<ViewState>,
    task: JoinHandle<()>,
}

impl ViewSession {
    /// Spawn the actor and trigger the initial load immediately
    pub fn spawn(source: Arc<dyn TickerSource>, options: ViewOptions) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ViewState {
            loading: true,
            ..ViewState::default()
        });

        let (engine, expired_rx) = EffectEngine::new(options.effect_duration);
        let actor = SessionActor {
            source,
            engine,
            refresh_interval: options.refresh_interval,
            instruments: options.instruments,
            merged: Vec::new(),
            search_term: String::new(),
            market_filter: None,
            criterion: SortCriterion::default(),
            loading: true,
            error: None,
            market_errors: BTreeMap::new(),
            state_tx,
        };
        let task = tokio::spawn(actor.run(cmd_rx, expired_rx));

        Self {
            cmd_tx,
            state_rx,
            task,
        }
    }

    /// New receiver onto the published state
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state_rx.clone()
    }

    /// Latest published state
    pub fn state(&self) -> ViewState {
        self.state_rx.borrow().clone()
    }

    pub fn set_search_term(&self, term: impl Into<String>) {
        self.send(ViewCommand::SetSearch(term.into()));
    }

    pub fn set_sort(&self, criterion: SortCriterion) {
        self.send(ViewCommand::SetSort(criterion));
    }

    pub fn set_market_filter(&self, filter: Option<MarketTag>) {
        self.send(ViewCommand::SetMarketFilter(filter));
    }

    fn send(&self, command: ViewCommand) {
        // Actor gone means the session is tearing down
        let _ = self.cmd_tx.send(command);
    }
}

impl Drop for ViewSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct SessionActor {
    source: Arc<dyn TickerSource>,
    engine: EffectEngine,
    refresh_interval: Duration,
    instruments: Option<InstrumentJoin>,

    // Derived-but-unfiltered list the view model is computed from
    merged: Vec<DisplayTicker>,
    search_term: String,
    market_filter: Option<MarketTag>,
    criterion: SortCriterion,

    loading: bool,
    error: Option<String>,
    market_errors: BTreeMap<MarketTag, String>,

    state_tx: watch::Sender<ViewState>,
}

impl SessionActor {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<ViewCommand>,
        mut expired_rx: mpsc::UnboundedReceiver<TickerKey>,
    ) {
        if let Some(join) = &self.instruments {
            join.cache.prefetch(join.category);
        }

        let mut ticks = tokio::time::interval(self.refresh_interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Fetches run detached so a slow upstream never stalls command or
        // expiry handling; results land here in completion order
        let (fetch_tx, mut fetch_rx) =
            mpsc::unbounded_channel::<Result<MarketSnapshot, FetchError>>();

        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    let source = Arc::clone(&self.source);
                    let tx = fetch_tx.clone();
                    tokio::spawn(async move {
                        let _ = tx.send(source.fetch().await);
                    });
                }
                Some(result) = fetch_rx.recv() => {
                    self.on_fetch_result(result);
                }
                Some(key) = expired_rx.recv() => {
                    self.on_effect_expired(&key);
                }
                command = cmd_rx.recv() => {
                    match command {
                        Some(command) => self.on_command(command),
                        // All handles dropped: stop the view
                        None => break,
                    }
                }
            }
        }

        self.engine.shutdown();
    }

    fn on_fetch_result(&mut self, result: Result<MarketSnapshot, FetchError>) {
        match result {
            Ok(snapshot) => {
                for (market, message) in &snapshot.failures {
                    warn!("{}: sub-market {} failed: {}", self.source.name(), market, message);
                }
                debug!(
                    "{}: snapshot with {} records",
                    self.source.name(),
                    snapshot.records.len()
                );

                let mut merged = self.engine.apply(snapshot.records);
                if let Some(join) = &self.instruments {
                    for ticker in &mut merged {
                        ticker.instrument = join.cache.lookup(join.category, &ticker.record.symbol);
                    }
                }

                self.merged = merged;
                self.market_errors = snapshot.failures;
                self.error = None;
            }
            Err(e) => {
                warn!("{}: fetch failed: {}", self.source.name(), e);
                // Before the first successful load there is nothing to keep
                // stale; afterwards the previous list stays on screen
                self.error = Some(e.to_string());
            }
        }

        self.loading = false;
        self.publish();
    }

    fn on_effect_expired(&mut self, key: &TickerKey) {
        self.engine.expire(key);
        let mut changed = false;
        for ticker in &mut self.merged {
            if &ticker.key() == key && ticker.effect.is_directional() {
                ticker.effect = PriceEffect::Flat;
                changed = true;
            }
        }
        if changed {
            self.publish();
        }
    }

    fn on_command(&mut self, command: ViewCommand) {
        match command {
            ViewCommand::SetSearch(term) => self.search_term = term,
            ViewCommand::SetSort(criterion) => self.criterion = criterion,
            ViewCommand::SetMarketFilter(filter) => self.market_filter = filter,
        }
        self.publish();
    }

    fn publish(&self) {
        let state = ViewState {
            tickers: apply_view(
                &self.merged,
                &self.search_term,
                self.market_filter,
                self.criterion,
            ),
            loading: self.loading,
            error: self.error.clone(),
            market_errors: self.market_errors.clone(),
        };
        // Last receiver gone is fine, the handle still holds one
        let _ = self.state_tx.send(state);
    }
}

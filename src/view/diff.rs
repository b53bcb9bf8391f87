//! Diff engine: per-key price-effect state machine
//!
//! Each (symbol, market) key moves Idle -> Active(direction) -> Idle. A new
//! snapshot compares every record's last price against the immediately
//! preceding tick's value; Up/Down arm a fixed-duration expiry timer that
//! reports back on a channel so the owning session can reset the effect to
//! Flat. Re-entering Active cancels the pending timer before starting a new
//! one, so at most one timer is ever live per key.

use crate::core::{parse_decimal, DisplayTicker, PriceEffect, TickerKey, TickerRecord};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Owned, cancellable expiry timers, one slot per key
///
/// Every timer is a resource of the owning view session; dropping the set
/// aborts whatever is still pending.
pub struct EffectTimers {
    duration: Duration,
    expired_tx: mpsc::UnboundedSender<TickerKey>,
    handles: HashMap<TickerKey, JoinHandle<()>>,
}

impl EffectTimers {
    pub fn new(duration: Duration) -> (Self, mpsc::UnboundedReceiver<TickerKey>) {
        let (expired_tx, expired_rx) = mpsc::unbounded_channel();
        (
            Self {
                duration,
                expired_tx,
                handles: HashMap::new(),
            },
            expired_rx,
        )
    }

    /// (Re)start the expiry timer for a key, cancelling any pending one
    pub fn arm(&mut self, key: TickerKey) {
        if let Some(pending) = self.handles.remove(&key) {
            pending.abort();
        }

        let tx = self.expired_tx.clone();
        let duration = self.duration;
        let fired_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            // Receiver gone means the session is tearing down
            let _ = tx.send(fired_key);
        });
        self.handles.insert(key, handle);
    }

    /// Release the slot after its timer fired
    pub fn complete(&mut self, key: &TickerKey) {
        self.handles.remove(key);
    }

    /// Abort every pending timer (view teardown)
    pub fn clear(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
    }

    /// Number of currently live timers
    pub fn live_count(&self) -> usize {
        self.handles.len()
    }
}

impl Drop for EffectTimers {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Per-session diff engine
///
/// Owns the previous-tick store and the effect timers. Instance-scoped so
/// two open views never share state.
pub struct EffectEngine {
    prev: HashMap<TickerKey, TickerRecord>,
    timers: EffectTimers,
}

impl EffectEngine {
    pub fn new(effect_duration: Duration) -> (Self, mpsc::UnboundedReceiver<TickerKey>) {
        let (timers, expired_rx) = EffectTimers::new(effect_duration);
        (
            Self {
                prev: HashMap::new(),
                timers,
            },
            expired_rx,
        )
    }

    /// Apply one snapshot: derive effects, arm timers, roll the prev store
    ///
    /// Never fails; a malformed price string on either side just means no
    /// comparison is possible and no effect is derived.
    pub fn apply(&mut self, records: Vec<TickerRecord>) -> Vec<DisplayTicker> {
        let mut next_prev = HashMap::with_capacity(records.len());
        let mut out = Vec::with_capacity(records.len());

        for mut record in records {
            let key = record.key();

            // Carry-forward exception to full-replace: a blank auxiliary
            // index price sticks at its last known-good value
            if record.usd_index_price.as_deref().map_or(true, str::is_empty) {
                if let Some(previous) = self.prev.get(&key) {
                    if previous.usd_index_price.as_deref().is_some_and(|v| !v.is_empty()) {
                        record.usd_index_price = previous.usd_index_price.clone();
                    }
                }
            }

            let effect = self.derive_effect(&key, &record);
            if effect.is_directional() {
                self.timers.arm(key.clone());
            }

            // The comparison base is always the immediately preceding tick,
            // regardless of the effect outcome
            next_prev.insert(key, record.clone());

            out.push(DisplayTicker {
                record,
                effect,
                instrument: None,
            });
        }

        // Keys absent from this tick drop out of the store entirely
        self.prev = next_prev;
        out
    }

    /// A timer fired: release its slot
    ///
    /// The caller owns the display list and flips the key's effect to Flat.
    pub fn expire(&mut self, key: &TickerKey) {
        self.timers.complete(key);
    }

    /// Abort all pending timers (view teardown)
    pub fn shutdown(&mut self) {
        self.timers.clear();
    }

    /// Number of currently live effect timers
    pub fn live_timers(&self) -> usize {
        self.timers.live_count()
    }

    fn derive_effect(&self, key: &TickerKey, record: &TickerRecord) -> PriceEffect {
        let Some(previous) = self.prev.get(key) else {
            return PriceEffect::None;
        };
        let (Some(prev_price), Some(new_price)) = (
            parse_decimal(&previous.last_price),
            parse_decimal(&record.last_price),
        ) else {
            return PriceEffect::None;
        };

        if new_price > prev_price {
            PriceEffect::Up
        } else if new_price < prev_price {
            PriceEffect::Down
        } else {
            PriceEffect::Flat
        }
    }
}

//! View-derivation pipeline
//!
//! - diff: per-key price-effect state machine with timed reset
//! - filter/sort: pure view-model functions
//! - session: the per-view actor driving the fetch cycle

pub mod diff;
pub mod filter;
pub mod session;
pub mod sort;

pub use diff::{EffectEngine, EffectTimers};
pub use session::{InstrumentJoin, ViewCommand, ViewOptions, ViewSession, ViewState};
pub use sort::{apply_view, SortCriterion, SortDirection, SortField};

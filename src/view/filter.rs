//! Search and market predicates for the view model

use crate::core::{DisplayTicker, MarketTag};

/// Case-insensitive substring match over search key, pair, then symbol
///
/// The extended search key disambiguates symbols shared across sub-markets
/// ("ETHKRWETH" matches both "ETHKRW" and "KRWETH" queries). An empty term
/// matches everything.
pub fn matches_search(ticker: &DisplayTicker, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let term = term.to_uppercase();
    ticker.record.search_key.to_uppercase().contains(&term)
        || ticker.record.pair.to_uppercase().contains(&term)
        || ticker.record.symbol.to_uppercase().contains(&term)
}

/// Sub-market filter; None means ALL
pub fn matches_market(ticker: &DisplayTicker, filter: Option<MarketTag>) -> bool {
    match filter {
        Some(market) => ticker.record.market == market,
        None => true,
    }
}

//! Sort criterion and the pure view-model function
//!
//! `apply_view` is the deterministic seam between state and presentation:
//! same inputs, same output, input untouched.

use crate::core::{parse_decimal, DisplayTicker, MarketTag};
use crate::view::filter::{matches_market, matches_search};
use std::cmp::Ordering;

/// Field a view can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    None,
    Symbol,
    LastPrice,
    ChangePercent,
    Volume,
    #[default]
    Turnover,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn toggle(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// One view's sort setting; default is turnover, highest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortCriterion {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortCriterion {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

/// Produce the ordered display list for one view
///
/// Filter by optional sub-market and case-insensitive search term, then sort
/// by the criterion. `SortField::None` preserves the incoming order; ties
/// keep input order (stable sort).
pub fn apply_view(
    tickers: &[DisplayTicker],
    search_term: &str,
    market_filter: Option<MarketTag>,
    criterion: SortCriterion,
) -> Vec<DisplayTicker> {
    let mut out: Vec<DisplayTicker> = tickers
        .iter()
        .filter(|t| matches_market(t, market_filter))
        .filter(|t| matches_search(t, search_term))
        .cloned()
        .collect();

    if criterion.field != SortField::None {
        out.sort_by(|a, b| {
            let ordering = compare_values(sort_value(a, criterion.field), sort_value(b, criterion.field));
            match criterion.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    out
}

fn sort_value<'a>(ticker: &'a DisplayTicker, field: SortField) -> &'a str {
    match field {
        SortField::Symbol => &ticker.record.symbol,
        SortField::LastPrice => &ticker.record.last_price,
        SortField::ChangePercent => &ticker.record.change24h_pcnt,
        SortField::Volume => &ticker.record.volume24h,
        SortField::Turnover => &ticker.record.turnover24h,
        SortField::None => "",
    }
}

/// Numeric compare when both operands parse, else lexicographic
fn compare_values(a: &str, b: &str) -> Ordering {
    match (parse_decimal(a), parse_decimal(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Category, QuoteMarket, TickerRecord};

    fn ticker(symbol: &str, price: &str, turnover: &str) -> DisplayTicker {
        DisplayTicker::new(TickerRecord {
            last_price: price.to_string(),
            turnover24h: turnover.to_string(),
            ..TickerRecord::new(symbol, MarketTag::Bybit(Category::Linear))
        })
    }

    fn symbols(list: &[DisplayTicker]) -> Vec<&str> {
        list.iter().map(|t| t.record.symbol.as_str()).collect()
    }

    #[test]
    fn test_numeric_sort_asc_desc() {
        let input = vec![
            ticker("A", "10", "1"),
            ticker("B", "2", "2"),
            ticker("C", "33", "3"),
        ];

        let asc = apply_view(
            &input,
            "",
            None,
            SortCriterion::new(SortField::LastPrice, SortDirection::Asc),
        );
        assert_eq!(symbols(&asc), vec!["B", "A", "C"]);

        let desc = apply_view(
            &input,
            "",
            None,
            SortCriterion::new(SortField::LastPrice, SortDirection::Desc),
        );
        assert_eq!(symbols(&desc), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_field_none_preserves_order() {
        let input = vec![
            ticker("Z", "3", "1"),
            ticker("A", "1", "2"),
            ticker("M", "2", "3"),
        ];
        let out = apply_view(
            &input,
            "",
            None,
            SortCriterion::new(SortField::None, SortDirection::Asc),
        );
        assert_eq!(symbols(&out), vec!["Z", "A", "M"]);
    }

    #[test]
    fn test_lexicographic_fallback() {
        // Unparsable prices fall back to string comparison
        let input = vec![ticker("A", "beta", "1"), ticker("B", "alpha", "2")];
        let out = apply_view(
            &input,
            "",
            None,
            SortCriterion::new(SortField::LastPrice, SortDirection::Asc),
        );
        assert_eq!(symbols(&out), vec!["B", "A"]);
    }

    #[test]
    fn test_signed_percent_sorts_numerically() {
        let mut a = ticker("A", "1", "1");
        a.record.change24h_pcnt = "+5.23".to_string();
        let mut b = ticker("B", "1", "1");
        b.record.change24h_pcnt = "-2.10".to_string();
        let mut c = ticker("C", "1", "1");
        c.record.change24h_pcnt = "+0.00".to_string();

        let out = apply_view(
            &[a, b, c],
            "",
            None,
            SortCriterion::new(SortField::ChangePercent, SortDirection::Asc),
        );
        assert_eq!(symbols(&out), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_default_criterion_turnover_desc() {
        let input = vec![
            ticker("A", "1", "100"),
            ticker("B", "1", "300"),
            ticker("C", "1", "200"),
        ];
        let out = apply_view(&input, "", None, SortCriterion::default());
        assert_eq!(symbols(&out), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_stable_ties_keep_input_order() {
        let input = vec![
            ticker("A", "1", "100"),
            ticker("B", "1", "100"),
            ticker("C", "1", "100"),
        ];
        let out = apply_view(
            &input,
            "",
            None,
            SortCriterion::new(SortField::Turnover, SortDirection::Asc),
        );
        assert_eq!(symbols(&out), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_idempotent_and_input_untouched() {
        let input = vec![
            ticker("A", "10", "1"),
            ticker("B", "2", "2"),
            ticker("C", "33", "3"),
        ];
        let snapshot = input.clone();
        let criterion = SortCriterion::new(SortField::LastPrice, SortDirection::Asc);

        let first = apply_view(&input, "", None, criterion);
        let second = apply_view(&input, "", None, criterion);

        assert_eq!(first, second);
        assert_eq!(input, snapshot);
    }

    #[test]
    fn test_search_and_market_filter_compose() {
        let krw = DisplayTicker::new(TickerRecord {
            pair: "ETH/KRW".to_string(),
            search_key: "ETHKRWETH".to_string(),
            ..TickerRecord::new("ETH", MarketTag::Bithumb(QuoteMarket::Krw))
        });
        let usdt = DisplayTicker::new(TickerRecord {
            pair: "ETH/USDT".to_string(),
            search_key: "ETHUSDTETH".to_string(),
            ..TickerRecord::new("ETH", MarketTag::Bithumb(QuoteMarket::Usdt))
        });

        let out = apply_view(
            &[krw, usdt],
            "ETH",
            Some(MarketTag::Bithumb(QuoteMarket::Usdt)),
            SortCriterion::default(),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].record.market, MarketTag::Bithumb(QuoteMarket::Usdt));
    }
}

//! 24h change percentage normalization
//!
//! Upstream delivers the 24h change either as a raw fraction needing x100
//! (Bybit `price24hPcnt`: "0.0523") or as an already-scaled percentage
//! (Bithumb `fluctate_rate_24H`: "-3.00"). Both normalize to a signed string
//! with two decimal places and an explicit `+` for non-negative values.
//!
//! The parse-failure fallback order is deliberate and load-bearing: prefix
//! `+` only when the raw string carries no sign of its own, otherwise pass
//! it through unchanged.

/// Normalize a raw fraction ("0.0523") to a signed percentage ("+5.23")
pub fn normalize_fraction_percent(raw: &str) -> String {
    match raw.trim().parse::<f64>() {
        Ok(factor) => {
            let pct = factor * 100.0;
            if pct >= 0.0 {
                format!("+{:.2}", pct)
            } else {
                format!("{:.2}", pct)
            }
        }
        Err(_) => sign_prefix_fallback(raw),
    }
}

/// Normalize an already-scaled percentage string ("-3.00", "5") in place
pub fn normalize_percent(raw: &str) -> String {
    match raw.trim().parse::<f64>() {
        Ok(pct) => {
            if pct >= 0.0 {
                format!("+{:.2}", pct)
            } else {
                format!("{:.2}", pct)
            }
        }
        Err(_) => sign_prefix_fallback(raw),
    }
}

fn sign_prefix_fallback(raw: &str) -> String {
    if raw.is_empty() {
        "+0.00".to_string()
    } else if raw.starts_with('-') || raw.starts_with('+') {
        raw.to_string()
    } else {
        format!("+{}", raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_positive() {
        assert_eq!(normalize_fraction_percent("0.0523"), "+5.23");
    }

    #[test]
    fn test_fraction_negative() {
        assert_eq!(normalize_fraction_percent("-0.0210"), "-2.10");
    }

    #[test]
    fn test_fraction_zero() {
        assert_eq!(normalize_fraction_percent("0.0000"), "+0.00");
    }

    #[test]
    fn test_fraction_unparsable_unsigned() {
        // Sign-prefix fallback: no existing sign gets a '+'
        assert_eq!(normalize_fraction_percent("N/A"), "+N/A");
    }

    #[test]
    fn test_fraction_unparsable_signed() {
        assert_eq!(normalize_fraction_percent("-abc"), "-abc");
        assert_eq!(normalize_fraction_percent("+abc"), "+abc");
    }

    #[test]
    fn test_fraction_empty() {
        assert_eq!(normalize_fraction_percent(""), "+0.00");
    }

    #[test]
    fn test_percent_already_signed_unchanged() {
        assert_eq!(normalize_percent("-3.00"), "-3.00");
    }

    #[test]
    fn test_percent_unsigned_gets_prefix_and_scale() {
        assert_eq!(normalize_percent("5"), "+5.00");
        assert_eq!(normalize_percent("0.5"), "+0.50");
    }

    #[test]
    fn test_percent_unparsable() {
        assert_eq!(normalize_percent("??"), "+??");
    }
}

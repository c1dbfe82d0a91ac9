//! Fixed-precision decimal strings.
//!
//! Balances travel as decimal strings with a per-currency number of
//! fractional digits. Arithmetic on them (deltas) goes through `f64`, which
//! is exact to well below the 8 decimal places a delta is rendered with for
//! every magnitude in the built-in catalog.

use crate::constants::DELTA_DECIMALS;
use crate::error::BalanceError;

/// Render `value` with exactly `places` fractional digits.
///
/// Negative zero (including values that round to zero from below) is
/// rendered without a sign.
pub fn format_decimal(value: f64, places: usize) -> String {
    let text = format!("{value:.places$}");
    match text.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => text,
    }
}

/// Parse a decimal string produced by [`format_decimal`] (or typed by hand).
pub fn parse_decimal(text: &str) -> Result<f64, BalanceError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| BalanceError::InvalidDecimal(text.to_string()))
}

/// Signed difference `current - previous` at delta precision.
pub fn format_delta(current: f64, previous: f64) -> String {
    format_decimal(current - previous, DELTA_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_pads_fraction() {
        assert_eq!(format_decimal(3.14159, 6), "3.141590");
        assert_eq!(format_decimal(100.0, 2), "100.00");
    }

    #[test]
    fn format_zero_places() {
        assert_eq!(format_decimal(7.4, 0), "7");
    }

    #[test]
    fn format_drops_negative_zero() {
        assert_eq!(format_decimal(-0.0, 2), "0.00");
        assert_eq!(format_decimal(-0.000000001, 8), "0.00000000");
    }

    #[test]
    fn format_keeps_real_negative() {
        assert_eq!(format_decimal(-1.5, 2), "-1.50");
    }

    #[test]
    fn parse_accepts_padded_input() {
        assert_eq!(parse_decimal(" 1.25 ").unwrap(), 1.25);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            parse_decimal("abc"),
            Err(BalanceError::InvalidDecimal("abc".into()))
        );
    }

    #[test]
    fn parse_rejects_non_finite() {
        assert!(parse_decimal("inf").is_err());
        assert!(parse_decimal("NaN").is_err());
    }

    #[test]
    fn delta_has_eight_places() {
        assert_eq!(format_delta(150.0, 100.0), "50.00000000");
        assert_eq!(format_delta(0.5, 1.75), "-1.25000000");
    }

    #[test]
    fn delta_of_equal_values_is_unsigned_zero() {
        assert_eq!(format_delta(1.1, 1.1), "0.00000000");
    }

    proptest::proptest! {
        #[test]
        fn fraction_width_matches_places(value in -1.0e6f64..1.0e6, places in 0usize..=12) {
            let text = format_decimal(value, places);
            let fraction = text.split('.').nth(1).map(str::len).unwrap_or(0);
            proptest::prop_assert_eq!(fraction, places);
            proptest::prop_assert!(parse_decimal(&text).is_ok());
        }
    }
}

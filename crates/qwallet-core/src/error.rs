//! Error types shared across qwallet crates.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unsupported currency: {0}")] UnsupportedCurrency(String),
    #[error("duplicate currency code: {0}")] DuplicateCode(String),
    #[error("invalid catalog entry {code}: {reason}")] InvalidEntry { code: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("network error: {0}")] Network(String),
    #[error("timeout")] Timeout,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BalanceError {
    #[error("invalid decimal: {0:?}")] InvalidDecimal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unsupported_currency() {
        let e = CatalogError::UnsupportedCurrency("XRP".into());
        assert_eq!(e.to_string(), "unsupported currency: XRP");
    }

    #[test]
    fn display_invalid_entry() {
        let e = CatalogError::InvalidEntry {
            code: "BTC".into(),
            reason: "zero address length".into(),
        };
        assert_eq!(e.to_string(), "invalid catalog entry BTC: zero address length");
    }

    #[test]
    fn display_invalid_decimal_quotes_input() {
        let e = BalanceError::InvalidDecimal("abc".into());
        assert_eq!(e.to_string(), "invalid decimal: \"abc\"");
    }

    #[test]
    fn display_oracle_timeout() {
        assert_eq!(OracleError::Timeout.to_string(), "timeout");
    }
}

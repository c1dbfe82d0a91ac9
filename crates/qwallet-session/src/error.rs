//! Session error types.

use qwallet_core::error::{BalanceError, CatalogError, OracleError};
use thiserror::Error;

/// Errors that can occur in session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A balance check was requested before any wallet was generated.
    #[error("no wallet generated")]
    NoWallet,

    /// Auto-scan needs a Tokio runtime to host its timer task.
    #[error("auto-scan requires a running Tokio runtime")]
    NoRuntime,

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration: {0}")]
    Config(String),

    /// Catalog lookup or validation failure.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The balance oracle failed.
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// A balance string could not be interpreted.
    #[error(transparent)]
    Balance(#[from] BalanceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_no_wallet() {
        assert_eq!(SessionError::NoWallet.to_string(), "no wallet generated");
    }

    #[test]
    fn display_config() {
        let e = SessionError::Config("history_capacity must be between 1 and 10".into());
        assert_eq!(e.to_string(), "configuration: history_capacity must be between 1 and 10");
    }

    #[test]
    fn from_catalog_error() {
        let e: SessionError = CatalogError::UnsupportedCurrency("XRP".into()).into();
        assert_eq!(
            e,
            SessionError::Catalog(CatalogError::UnsupportedCurrency("XRP".into()))
        );
        assert_eq!(e.to_string(), "unsupported currency: XRP");
    }

    #[test]
    fn from_oracle_error() {
        let e: SessionError = OracleError::Timeout.into();
        assert_eq!(e, SessionError::Oracle(OracleError::Timeout));
    }

    #[test]
    fn from_balance_error() {
        let e: SessionError = BalanceError::InvalidDecimal("x".into()).into();
        assert!(matches!(e, SessionError::Balance(_)));
    }
}

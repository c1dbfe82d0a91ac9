//! Session configuration.
//!
//! [`SessionConfig`] carries the session tunables and extra catalog rows.
//! It is assembled with the `config` crate from an optional TOML file
//! overlaid by `QWALLET_*` environment variables (`__` separates nested
//! keys), e.g. `QWALLET_AUTO_SCAN_INTERVAL_MS=5000`.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use qwallet_core::constants::{
    AUTO_SCAN_INTERVAL_MS, BALANCE_LATENCY_MS, HISTORY_CAPACITY, MARKET_TICK_MS, MARKET_WINDOW,
};
use qwallet_core::{CurrencyCatalog, CurrencyCode, CurrencyEntry};

use crate::error::SessionError;

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "QWALLET";

/// Tunables for a [`WalletSession`](crate::WalletSession).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Simulated balance inquiry latency.
    pub balance_latency_ms: u64,
    /// Period of the auto-scan timer.
    pub auto_scan_interval_ms: u64,
    /// Snapshots kept per wallet, 1 to 10.
    pub history_capacity: usize,
    /// Reject currencies without a catalog row instead of falling back.
    pub strict_currencies: bool,
    /// Currency preselected before the user picks one.
    pub default_currency: CurrencyCode,
    /// Period of simulated market ticks.
    pub market_tick_ms: u64,
    /// Price points kept by the market feed.
    pub market_window: usize,
    /// Rows added to (or replacing rows of) the built-in catalog.
    pub currencies: Vec<CurrencyEntry>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            balance_latency_ms: BALANCE_LATENCY_MS,
            auto_scan_interval_ms: AUTO_SCAN_INTERVAL_MS,
            history_capacity: HISTORY_CAPACITY,
            strict_currencies: false,
            default_currency: CurrencyCode::new("ETH"),
            market_tick_ms: MARKET_TICK_MS,
            market_window: MARKET_WINDOW,
            currencies: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Load from `path` (when given) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, SessionError> {
        Self::load_with_env(path, None)
    }

    /// [`load`](Self::load) reading variables from `vars` instead of the
    /// process environment when given.
    fn load_with_env(
        path: Option<&Path>,
        vars: Option<config::Map<String, String>>,
    ) -> Result<Self, SessionError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(vars),
        );
        Self::from_builder(builder)
    }

    /// Parse a TOML document, ignoring the environment.
    pub fn from_toml_str(text: &str) -> Result<Self, SessionError> {
        let builder = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml));
        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, SessionError> {
        let cfg: Self = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| SessionError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the session cannot run with.
    pub fn validate(&self) -> Result<(), SessionError> {
        if !(1..=HISTORY_CAPACITY).contains(&self.history_capacity) {
            return Err(SessionError::Config(format!(
                "history_capacity must be between 1 and {HISTORY_CAPACITY}"
            )));
        }
        if self.auto_scan_interval_ms == 0 {
            return Err(SessionError::Config("auto_scan_interval_ms must be positive".into()));
        }
        if self.market_window == 0 {
            return Err(SessionError::Config("market_window must be at least 1".into()));
        }
        if self.market_tick_ms == 0 {
            return Err(SessionError::Config("market_tick_ms must be positive".into()));
        }
        Ok(())
    }

    /// Built-in catalog with the configured rows applied.
    pub fn catalog(&self) -> Result<CurrencyCatalog, SessionError> {
        let catalog = self
            .currencies
            .iter()
            .cloned()
            .try_fold(CurrencyCatalog::builtin(), CurrencyCatalog::with_entry)?;
        Ok(catalog)
    }

    pub fn balance_latency(&self) -> Duration {
        Duration::from_millis(self.balance_latency_ms)
    }

    pub fn auto_scan_interval(&self) -> Duration {
        Duration::from_millis(self.auto_scan_interval_ms)
    }

    pub fn market_tick(&self) -> Duration {
        Duration::from_millis(self.market_tick_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_constants() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.balance_latency(), Duration::from_millis(1_500));
        assert_eq!(cfg.auto_scan_interval(), Duration::from_secs(10));
        assert_eq!(cfg.history_capacity, 10);
        assert!(!cfg.strict_currencies);
        assert_eq!(cfg.default_currency.as_str(), "ETH");
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = SessionConfig::from_toml_str("auto_scan_interval_ms = 5000").unwrap();
        assert_eq!(cfg.auto_scan_interval_ms, 5_000);
        assert_eq!(cfg.balance_latency_ms, 1_500);
        assert_eq!(cfg.history_capacity, 10);
    }

    #[test]
    fn toml_adds_currency_rows() {
        let text = r#"
            strict_currencies = true

            [[currencies]]
            code = "SOL"
            name = "Solana"
            address_prefix = "So"
            address_length = 44
            explorer_template = "https://solscan.io/account/{address}"
            balance_scale = 500.0
            decimal_places = 9
        "#;
        let cfg = SessionConfig::from_toml_str(text).unwrap();
        assert!(cfg.strict_currencies);
        let catalog = cfg.catalog().unwrap();
        assert_eq!(catalog.len(), 7);
        let sol = catalog.require(&CurrencyCode::new("SOL")).unwrap();
        assert_eq!(sol.address_length, 44);
        assert_eq!(sol.decimal_places, 9);
    }

    #[test]
    fn invalid_row_is_rejected_by_catalog() {
        let text = r#"
            [[currencies]]
            code = "BAD"
            name = "Bad"
            address_prefix = "b"
            address_length = 0
            explorer_template = "https://example.com/{address}"
            balance_scale = 1.0
            decimal_places = 2
        "#;
        let cfg = SessionConfig::from_toml_str(text).unwrap();
        assert!(matches!(cfg.catalog(), Err(SessionError::Catalog(_))));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = SessionConfig::from_toml_str("history_capacity = 0").unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }

    #[test]
    fn capacity_above_ten_is_rejected() {
        let err = SessionConfig::from_toml_str("history_capacity = 50").unwrap_err();
        assert_eq!(
            err,
            SessionError::Config("history_capacity must be between 1 and 10".into())
        );
        let cfg = SessionConfig::from_toml_str("history_capacity = 10").unwrap();
        assert_eq!(cfg.history_capacity, 10);
    }

    fn vars(pairs: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn env_overrides_flat_keys() {
        let cfg = SessionConfig::load_with_env(
            None,
            vars(&[
                ("QWALLET_AUTO_SCAN_INTERVAL_MS", "5000"),
                ("QWALLET_STRICT_CURRENCIES", "true"),
                ("QWALLET_DEFAULT_CURRENCY", "BTC"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.auto_scan_interval_ms, 5_000);
        assert!(cfg.strict_currencies);
        assert_eq!(cfg.default_currency.as_str(), "BTC");
        assert_eq!(cfg.balance_latency_ms, 1_500);
    }

    #[test]
    fn env_overrides_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qwallet.toml");
        std::fs::write(&path, "balance_latency_ms = 250\nhistory_capacity = 5\n").unwrap();

        let cfg = SessionConfig::load_with_env(
            Some(&path),
            vars(&[("QWALLET_BALANCE_LATENCY_MS", "40")]),
        )
        .unwrap();
        assert_eq!(cfg.balance_latency_ms, 40);
        assert_eq!(cfg.history_capacity, 5);
    }

    #[test]
    fn env_ignores_other_prefixes() {
        let cfg = SessionConfig::load_with_env(
            None,
            vars(&[("OTHER_AUTO_SCAN_INTERVAL_MS", "1"), ("QWALLETX_MARKET_WINDOW", "3")]),
        )
        .unwrap();
        assert_eq!(cfg, SessionConfig::default());
    }

    #[test]
    fn env_values_are_validated() {
        let err = SessionConfig::load_with_env(None, vars(&[("QWALLET_HISTORY_CAPACITY", "0")]))
            .unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = SessionConfig::from_toml_str("history_capacity = [").unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qwallet.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "balance_latency_ms = 250").unwrap();
        writeln!(file, "default_currency = \"BTC\"").unwrap();
        drop(file);

        let cfg = SessionConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.balance_latency_ms, 250);
        assert_eq!(cfg.default_currency.as_str(), "BTC");
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            SessionConfig::load(Some(&path)),
            Err(SessionError::Config(_))
        ));
    }
}

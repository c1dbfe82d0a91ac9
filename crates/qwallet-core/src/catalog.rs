//! Currency catalog: the single source of truth for address shape and
//! balance magnitude/precision.
//!
//! Every currency-specific behaviour in qwallet reads a [`CurrencyEntry`].
//! Adding a currency means adding one row; nothing else hardcodes codes.
//!
//! Lookups never fail: codes without a row resolve to the catalog's default
//! entry (ETH address shape, its own explorer template). Callers that want
//! to reject unknown codes use [`CurrencyCatalog::require`].

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CURRENCY_CODE, EXPLORER_ADDRESS_PLACEHOLDER, MAX_DECIMAL_PLACES};
use crate::error::CatalogError;
use crate::types::CurrencyCode;

/// Static configuration for one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyEntry {
    /// Ticker symbol.
    pub code: CurrencyCode,
    /// Human-readable name for selectors.
    pub name: String,
    /// Literal prefix of generated addresses.
    pub address_prefix: String,
    /// Number of random hex characters after the prefix.
    pub address_length: usize,
    /// Explorer link with `{address}` where the address goes.
    pub explorer_template: String,
    /// Exclusive upper bound of simulated balances.
    pub balance_scale: f64,
    /// Fractional digits of simulated balances.
    pub decimal_places: usize,
    /// Exclusive upper bound of simulated market prices.
    #[serde(default = "default_reference_price")]
    pub reference_price: f64,
}

fn default_reference_price() -> f64 {
    1_000.0
}

impl CurrencyEntry {
    /// Resolve the explorer link for `address`.
    pub fn explorer_url(&self, address: &str) -> String {
        self.explorer_template
            .replace(EXPLORER_ADDRESS_PLACEHOLDER, address)
    }

    /// Total length of a generated address, prefix included.
    pub fn full_address_len(&self) -> usize {
        self.address_prefix.len() + self.address_length
    }

    /// Check the invariants every row must satisfy.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |reason: &str| CatalogError::InvalidEntry {
            code: self.code.to_string(),
            reason: reason.to_string(),
        };
        if self.code.as_str().trim().is_empty() {
            return Err(invalid("empty currency code"));
        }
        if self.address_length == 0 {
            return Err(invalid("zero address length"));
        }
        if !self.explorer_template.contains(EXPLORER_ADDRESS_PLACEHOLDER) {
            return Err(invalid("explorer template lacks {address}"));
        }
        if !(self.balance_scale.is_finite() && self.balance_scale > 0.0) {
            return Err(invalid("balance scale must be finite and positive"));
        }
        if self.decimal_places > MAX_DECIMAL_PLACES {
            return Err(invalid("too many decimal places"));
        }
        if !(self.reference_price.is_finite() && self.reference_price >= 0.0) {
            return Err(invalid("reference price must be finite and non-negative"));
        }
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn row(
    code: &str,
    name: &str,
    prefix: &str,
    length: usize,
    explorer: &str,
    scale: f64,
    places: usize,
    price: f64,
) -> CurrencyEntry {
    CurrencyEntry {
        code: CurrencyCode::new(code),
        name: name.to_string(),
        address_prefix: prefix.to_string(),
        address_length: length,
        explorer_template: explorer.to_string(),
        balance_scale: scale,
        decimal_places: places,
        reference_price: price,
    }
}

/// Lookup table `code -> CurrencyEntry` with a fallback row.
///
/// Rows keep insertion order so selectors list currencies the way they
/// were configured.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyCatalog {
    entries: Vec<CurrencyEntry>,
    fallback: CurrencyEntry,
}

impl CurrencyCatalog {
    /// Build a catalog from explicit rows. Rejects duplicate codes and
    /// invalid rows.
    pub fn new(entries: Vec<CurrencyEntry>, fallback: CurrencyEntry) -> Result<Self, CatalogError> {
        fallback.validate()?;
        let mut catalog = Self {
            entries: Vec::with_capacity(entries.len()),
            fallback,
        };
        for entry in entries {
            if catalog.contains(&entry.code) {
                return Err(CatalogError::DuplicateCode(entry.code.to_string()));
            }
            entry.validate()?;
            catalog.entries.push(entry);
        }
        Ok(catalog)
    }

    /// The six currencies of the stock dashboard.
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                row("ETH", "Ethereum", "0x", 40, "https://etherscan.io/address/{address}", 10.0, 6, 3_000.0),
                row("BTC", "Bitcoin", "bc1", 42, "https://blockchain.com/btc/address/{address}", 2.0, 8, 50_000.0),
                row("DOGE", "Dogecoin", "D", 40, "https://dogechain.info/address/{address}", 10_000.0, 2, 0.2),
                row("ADA", "Cardano", "addr1", 40, "https://cardanoscan.io/address/{address}", 5_000.0, 2, 2.0),
                row("DOT", "Polkadot", "1", 40, "https://polkascan.io/polkadot/account/{address}", 100.0, 4, 20.0),
                row("BNB", "Binance", "0x", 40, "https://bscscan.com/address/{address}", 50.0, 4, 300.0),
            ],
            fallback: row(
                DEFAULT_CURRENCY_CODE,
                "Unknown",
                "0x",
                40,
                "https://etherscan.io/address/{address}",
                10.0,
                4,
                1_000.0,
            ),
        }
    }

    /// Add a row, or replace the row with the same code.
    pub fn with_entry(mut self, entry: CurrencyEntry) -> Result<Self, CatalogError> {
        entry.validate()?;
        match self.entries.iter_mut().find(|e| e.code == entry.code) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        Ok(self)
    }

    /// Row for `code`, or the fallback row. Never fails.
    pub fn lookup(&self, code: &CurrencyCode) -> &CurrencyEntry {
        self.get(code).unwrap_or(&self.fallback)
    }

    /// Row for `code` if the catalog has one.
    pub fn get(&self, code: &CurrencyCode) -> Option<&CurrencyEntry> {
        self.entries.iter().find(|e| &e.code == code)
    }

    /// Row for `code`, or [`CatalogError::UnsupportedCurrency`].
    pub fn require(&self, code: &CurrencyCode) -> Result<&CurrencyEntry, CatalogError> {
        self.get(code)
            .ok_or_else(|| CatalogError::UnsupportedCurrency(code.to_string()))
    }

    pub fn contains(&self, code: &CurrencyCode) -> bool {
        self.get(code).is_some()
    }

    /// Configured rows in insertion order (fallback excluded).
    pub fn entries(&self) -> &[CurrencyEntry] {
        &self.entries
    }

    pub fn codes(&self) -> impl Iterator<Item = &CurrencyCode> {
        self.entries.iter().map(|e| &e.code)
    }

    pub fn fallback(&self) -> &CurrencyEntry {
        &self.fallback
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CurrencyCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::new(s)
    }

    #[test]
    fn builtin_has_six_currencies() {
        let catalog = CurrencyCatalog::builtin();
        let codes: Vec<&str> = catalog.codes().map(|c| c.as_str()).collect();
        assert_eq!(codes, ["ETH", "BTC", "DOGE", "ADA", "DOT", "BNB"]);
    }

    #[test]
    fn builtin_rows_are_valid() {
        let catalog = CurrencyCatalog::builtin();
        for entry in catalog.entries() {
            entry.validate().unwrap();
        }
        catalog.fallback().validate().unwrap();
    }

    #[test]
    fn btc_shape() {
        let catalog = CurrencyCatalog::builtin();
        let btc = catalog.lookup(&code("BTC"));
        assert_eq!(btc.address_prefix, "bc1");
        assert_eq!(btc.address_length, 42);
        assert_eq!(btc.full_address_len(), 45);
        assert_eq!(btc.decimal_places, 8);
    }

    #[test]
    fn unknown_code_falls_back() {
        let catalog = CurrencyCatalog::builtin();
        let entry = catalog.lookup(&code("XRP"));
        let eth = catalog.lookup(&code("ETH"));
        assert_eq!(entry.code.as_str(), DEFAULT_CURRENCY_CODE);
        assert_eq!(entry.address_prefix, eth.address_prefix);
        assert_eq!(entry.address_length, eth.address_length);
        assert_eq!(entry.decimal_places, 4);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let catalog = CurrencyCatalog::builtin();
        assert!(catalog.get(&code("btc")).is_none());
    }

    #[test]
    fn require_rejects_unknown() {
        let catalog = CurrencyCatalog::builtin();
        assert_eq!(
            catalog.require(&code("XRP")).unwrap_err(),
            CatalogError::UnsupportedCurrency("XRP".into())
        );
        assert!(catalog.require(&code("DOT")).is_ok());
    }

    #[test]
    fn explorer_url_substitutes_address() {
        let catalog = CurrencyCatalog::builtin();
        let dot = catalog.lookup(&code("DOT"));
        assert_eq!(
            dot.explorer_url("1abc"),
            "https://polkascan.io/polkadot/account/1abc"
        );
    }

    #[test]
    fn with_entry_adds_row() {
        let sol = row("SOL", "Solana", "So", 44, "https://solscan.io/account/{address}", 500.0, 9, 150.0);
        let catalog = CurrencyCatalog::builtin().with_entry(sol.clone()).unwrap();
        assert_eq!(catalog.len(), 7);
        assert_eq!(catalog.lookup(&code("SOL")), &sol);
    }

    #[test]
    fn with_entry_replaces_row_in_place() {
        let mut eth = CurrencyCatalog::builtin().lookup(&code("ETH")).clone();
        eth.balance_scale = 1.0;
        let catalog = CurrencyCatalog::builtin().with_entry(eth).unwrap();
        assert_eq!(catalog.len(), 6);
        assert_eq!(catalog.entries()[0].balance_scale, 1.0);
    }

    #[test]
    fn new_rejects_duplicates() {
        let eth = CurrencyCatalog::builtin().lookup(&code("ETH")).clone();
        let fallback = CurrencyCatalog::builtin().fallback().clone();
        let err = CurrencyCatalog::new(vec![eth.clone(), eth], fallback).unwrap_err();
        assert_eq!(err, CatalogError::DuplicateCode("ETH".into()));
    }

    #[test]
    fn validate_rejects_bad_rows() {
        let good = CurrencyCatalog::builtin().lookup(&code("ETH")).clone();

        let mut bad = good.clone();
        bad.address_length = 0;
        assert!(bad.validate().is_err());

        let mut bad = good.clone();
        bad.explorer_template = "https://example.com".into();
        assert!(bad.validate().is_err());

        let mut bad = good.clone();
        bad.balance_scale = f64::NAN;
        assert!(bad.validate().is_err());

        let mut bad = good.clone();
        bad.decimal_places = MAX_DECIMAL_PLACES + 1;
        assert!(bad.validate().is_err());

        let mut bad = good;
        bad.code = code("  ");
        assert!(bad.validate().is_err());
    }

    #[test]
    fn entry_deserializes_without_reference_price() {
        let json = r#"{
            "code": "LTC",
            "name": "Litecoin",
            "address_prefix": "ltc1",
            "address_length": 39,
            "explorer_template": "https://example.com/{address}",
            "balance_scale": 25.0,
            "decimal_places": 8
        }"#;
        let entry: CurrencyEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.reference_price, 1_000.0);
        entry.validate().unwrap();
    }
}

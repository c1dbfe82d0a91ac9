//! Wallet identity and balance snapshot types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::amount::parse_decimal;
use crate::constants::PRIVATE_KEY_PREVIEW_CHARS;
use crate::error::BalanceError;

/// Ticker symbol identifying a currency (e.g. `"BTC"`).
///
/// Codes are compared exactly; any string is a valid code; whether it is
/// *supported* is decided by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for CurrencyCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl From<&CurrencyCode> for CurrencyCode {
    fn from(code: &CurrencyCode) -> Self {
        code.clone()
    }
}

impl FromStr for CurrencyCode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

/// A mock address/key pair bound to one currency.
///
/// Key material is zeroized on drop and redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct WalletIdentity {
    /// Display address: catalog prefix followed by hex characters.
    pub address: String,
    private_key: String,
    /// Currency the identity was generated for.
    #[zeroize(skip)]
    pub currency: CurrencyCode,
}

impl WalletIdentity {
    pub fn new(address: String, private_key: String, currency: CurrencyCode) -> Self {
        Self {
            address,
            private_key,
            currency,
        }
    }

    /// Full `0x`-prefixed private key. Handle with care.
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Leading characters of the private key followed by `...`.
    pub fn private_key_preview(&self) -> String {
        let head: String = self.private_key.chars().take(PRIVATE_KEY_PREVIEW_CHARS).collect();
        format!("{head}...")
    }
}

impl fmt::Debug for WalletIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletIdentity")
            .field("address", &self.address)
            .field("private_key", &"[REDACTED]")
            .field("currency", &self.currency)
            .finish()
    }
}

/// Direction of a balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

/// One balance reading in a scan history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// When the reading was recorded.
    pub timestamp: DateTime<Utc>,
    /// Balance formatted to the currency's decimal places.
    pub balance: String,
    /// Change from the previous reading, 8 decimal places (`"0.00"` for
    /// the first reading of a wallet).
    pub delta: String,
}

impl BalanceSnapshot {
    pub fn balance_value(&self) -> Result<f64, BalanceError> {
        parse_decimal(&self.balance)
    }

    pub fn delta_value(&self) -> Result<f64, BalanceError> {
        parse_decimal(&self.delta)
    }

    pub fn trend(&self) -> Trend {
        match self.delta_value() {
            Ok(d) if d > 0.0 => Trend::Up,
            Ok(d) if d < 0.0 => Trend::Down,
            _ => Trend::Flat,
        }
    }

    /// Delta with an explicit `+` for increases, as shown in history lists.
    pub fn display_delta(&self) -> String {
        match self.trend() {
            Trend::Up => format!("+{}", self.delta),
            _ => self.delta.clone(),
        }
    }
}

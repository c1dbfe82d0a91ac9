//! Trait seams between the session and its sources of non-determinism.
//!
//! - [`RandomSource`]: randomness for addresses, keys and balances
//!   (`rng` implements)
//! - [`Clock`]: wall-clock instants for snapshot timestamps (`clock`
//!   implements)
//! - [`BalanceOracle`]: asynchronous balance inquiry (qwallet-session
//!   provides the simulated oracle)

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::OracleError;
use crate::types::CurrencyCode;

/// Source of uniform randomness.
///
/// Injected everywhere randomness is consumed so tests can supply fixed
/// sequences.
pub trait RandomSource: Send {
    /// Uniform draw in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Fill `dest` with random bytes.
    fn fill_bytes(&mut self, dest: &mut [u8]);
}

/// Source of the current wall-clock instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Asynchronous balance inquiry for one address.
///
/// Returns the balance as a decimal string formatted to the currency's
/// catalog precision.
#[async_trait]
pub trait BalanceOracle: Send + Sync {
    async fn fetch(&self, address: &str, currency: &CurrencyCode) -> Result<String, OracleError>;
}

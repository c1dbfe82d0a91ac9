//! Simulated balance oracle.
//!
//! Models a network balance inquiry without any I/O: the call suspends for
//! a fixed latency and then reports a random balance in
//! `[0, balance_scale)` at the currency's precision. It never fails.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use qwallet_core::amount::format_decimal;
use qwallet_core::constants::BALANCE_LATENCY_MS;
use qwallet_core::{BalanceOracle, CurrencyCatalog, CurrencyCode, CurrencyEntry, OracleError, RandomSource};

/// Balance for a unit draw `unit ∈ [0, 1)`.
///
/// The value is truncated (not rounded) to `decimal_places` so the rendered
/// balance stays strictly below `balance_scale`.
pub fn simulated_balance(unit: f64, entry: &CurrencyEntry) -> String {
    let factor = 10f64.powi(entry.decimal_places as i32);
    let value = (unit * entry.balance_scale * factor).floor() / factor;
    format_decimal(value, entry.decimal_places)
}

/// [`BalanceOracle`] that fabricates balances after a fixed delay.
pub struct SimulatedOracle {
    catalog: Arc<CurrencyCatalog>,
    rng: Mutex<Box<dyn RandomSource>>,
    latency: Duration,
}

impl SimulatedOracle {
    pub fn new(catalog: Arc<CurrencyCatalog>, rng: Box<dyn RandomSource>, latency: Duration) -> Self {
        Self {
            catalog,
            rng: Mutex::new(rng),
            latency,
        }
    }

    /// Oracle with the stock 1500 ms latency.
    pub fn with_default_latency(catalog: Arc<CurrencyCatalog>, rng: Box<dyn RandomSource>) -> Self {
        Self::new(catalog, rng, Duration::from_millis(BALANCE_LATENCY_MS))
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

#[async_trait]
impl BalanceOracle for SimulatedOracle {
    async fn fetch(&self, address: &str, currency: &CurrencyCode) -> Result<String, OracleError> {
        tokio::time::sleep(self.latency).await;
        let entry = self.catalog.lookup(currency);
        let unit = self.rng.lock().next_unit();
        let balance = simulated_balance(unit, entry);
        debug!(%currency, address, %balance, "simulated balance inquiry");
        Ok(balance)
    }
}

impl std::fmt::Debug for SimulatedOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedOracle")
            .field("latency", &self.latency)
            .field("currencies", &self.catalog.len())
            .finish()
    }
}

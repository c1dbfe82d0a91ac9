//! Shared test helpers for session integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use qwallet_core::clock::ManualClock;
use qwallet_core::rng::StdRandom;
use qwallet_core::{BalanceOracle, CurrencyCode, OracleError};
use qwallet_session::{SessionConfig, WalletSession};

/// Latency used when the script runs dry.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(10);

/// Wall-clock start of every fixture clock.
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
}

/// [`BalanceOracle`] that answers from a script of `(delay, reply)` pairs
/// in call order, then `"1.00"` after [`DEFAULT_DELAY`].
#[derive(Default)]
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<(Duration, Result<String, OracleError>)>>,
    requests: Mutex<Vec<(String, CurrencyCode)>>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a successful reply after `ms` milliseconds.
    pub fn reply(&self, ms: u64, balance: &str) -> &Self {
        self.replies
            .lock()
            .push_back((Duration::from_millis(ms), Ok(balance.to_string())));
        self
    }

    /// Queue a failure after `ms` milliseconds.
    pub fn fail(&self, ms: u64, err: OracleError) -> &Self {
        self.replies.lock().push_back((Duration::from_millis(ms), Err(err)));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(address, currency)` of every request, in call order.
    pub fn requests(&self) -> Vec<(String, CurrencyCode)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl BalanceOracle for ScriptedOracle {
    async fn fetch(&self, address: &str, currency: &CurrencyCode) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push((address.to_string(), currency.clone()));
        let next = self.replies.lock().pop_front();
        let (delay, reply) = next.unwrap_or((DEFAULT_DELAY, Ok("1.00".to_string())));
        tokio::time::sleep(delay).await;
        reply
    }
}

/// A session wired to `oracle`, a seeded RNG and a manual clock at [`epoch`].
pub fn session_with(oracle: Arc<ScriptedOracle>, config: SessionConfig) -> (WalletSession, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(epoch()));
    let session = WalletSession::builder()
        .config(config)
        .oracle(oracle)
        .random(StdRandom::seeded(0x5eed))
        .clock(clock.clone())
        .build()
        .unwrap();
    (session, clock)
}

/// [`session_with`] and the default config.
pub fn session(oracle: Arc<ScriptedOracle>) -> WalletSession {
    session_with(oracle, SessionConfig::default()).0
}

/// Yield until the oracle has seen `n` calls.
pub async fn wait_for_calls(oracle: &ScriptedOracle, n: usize) {
    while oracle.calls() < n {
        tokio::task::yield_now().await;
    }
}

pub fn is_lower_hex(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

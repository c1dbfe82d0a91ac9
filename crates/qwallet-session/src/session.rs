//! The wallet session aggregate.
//!
//! [`WalletSession`] owns the identity, balance, scan history and scanning
//! flag, and is the only place they change. It is a cheap clonable handle;
//! clones share one session.
//!
//! Balance reads race with `generate`: every read is tagged with the
//! generation it started in plus a per-read ticket, and a completed read is
//! applied only if its generation is still current and no newer read has
//! already been applied. Anything else is discarded and reported as a
//! [`StaleReason`].
//!
//! Lock order is `auto_scan` then `state`. Neither lock is held across an
//! `.await`.

use std::fmt;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, trace, warn};

use qwallet_core::clock::SystemClock;
use qwallet_core::constants::PLACEHOLDER_BALANCE;
use qwallet_core::rng::StdRandom;
use qwallet_core::{
    BalanceOracle, BalanceSnapshot, Clock, CurrencyCatalog, CurrencyCode, OracleError, RandomSource,
    WalletIdentity,
};

use crate::address::AddressFactory;
use crate::age::describe_age;
use crate::auto_scan::AutoScanController;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::history::ScanHistory;
use crate::oracle::SimulatedOracle;

/// Buffered events per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// Outcomes and events
// ---------------------------------------------------------------------------

/// Why a completed balance read was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StaleReason {
    /// A newer `generate` replaced the identity while the read was in flight.
    SupersededGeneration { started: u64, current: u64 },
    /// The read targeted an address or currency other than the current one.
    IdentityMismatch,
    /// A read started later in the same generation was already applied.
    OutOfOrder { ticket: u64, applied: u64 },
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SupersededGeneration { started, current } => {
                write!(f, "generation {started} superseded by {current}")
            }
            Self::IdentityMismatch => f.write_str("identity no longer matches"),
            Self::OutOfOrder { ticket, applied } => {
                write!(f, "read {ticket} completed after read {applied}")
            }
        }
    }
}

/// Result of a balance check that did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// The reading was pushed into the history.
    Applied(BalanceSnapshot),
    /// The reading arrived too late and was dropped.
    Discarded(StaleReason),
}

impl CheckOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn applied(&self) -> Option<&BalanceSnapshot> {
        match self {
            Self::Applied(snapshot) => Some(snapshot),
            Self::Discarded(_) => None,
        }
    }
}

/// Discrete session changes, delivered on [`WalletSession::events`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Generated {
        generation: u64,
        currency: CurrencyCode,
        address: String,
    },
    BalanceUpdated {
        generation: u64,
        snapshot: BalanceSnapshot,
    },
    StaleResultDiscarded {
        reason: StaleReason,
    },
    AutoScanStarted,
    AutoScanStopped,
    CurrencySelected {
        currency: CurrencyCode,
    },
}

/// Observable session state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub identity: Option<WalletIdentity>,
    pub balance: String,
    pub loading: bool,
    pub is_scanning: bool,
    /// Newest first.
    pub history: Vec<BalanceSnapshot>,
    pub explorer_url: Option<String>,
    pub last_scan: Option<DateTime<Utc>>,
    pub generation: u64,
    pub selected_currency: CurrencyCode,
    /// Increases with every published change.
    pub revision: u64,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// A balance read that has been started but not yet resolved.
#[derive(Debug)]
struct PendingRead {
    generation: u64,
    ticket: u64,
    address: String,
    currency: CurrencyCode,
}

#[derive(Debug)]
struct SessionState {
    identity: Option<WalletIdentity>,
    balance: String,
    last_scan: Option<DateTime<Utc>>,
    explorer_url: Option<String>,
    history: ScanHistory,
    generation: u64,
    next_ticket: u64,
    applied_ticket: u64,
    in_flight: usize,
    is_scanning: bool,
    selected_currency: CurrencyCode,
    revision: u64,
}

impl SessionState {
    fn new(config: &SessionConfig) -> Self {
        Self {
            identity: None,
            balance: PLACEHOLDER_BALANCE.to_string(),
            last_scan: None,
            explorer_url: None,
            history: ScanHistory::with_capacity(config.history_capacity),
            generation: 0,
            next_ticket: 0,
            applied_ticket: 0,
            in_flight: 0,
            is_scanning: false,
            selected_currency: config.default_currency.clone(),
            revision: 0,
        }
    }

    fn begin_read(&mut self, address: String, currency: CurrencyCode) -> PendingRead {
        self.next_ticket += 1;
        self.in_flight += 1;
        PendingRead {
            generation: self.generation,
            ticket: self.next_ticket,
            address,
            currency,
        }
    }

    fn apply_read(
        &mut self,
        read: &PendingRead,
        balance: String,
        now: DateTime<Utc>,
        catalog: &CurrencyCatalog,
    ) -> Result<CheckOutcome, SessionError> {
        if read.generation != self.generation {
            return Ok(CheckOutcome::Discarded(StaleReason::SupersededGeneration {
                started: read.generation,
                current: self.generation,
            }));
        }
        let same_identity = self
            .identity
            .as_ref()
            .is_some_and(|id| id.address == read.address && id.currency == read.currency);
        if !same_identity {
            return Ok(CheckOutcome::Discarded(StaleReason::IdentityMismatch));
        }
        if read.ticket <= self.applied_ticket {
            return Ok(CheckOutcome::Discarded(StaleReason::OutOfOrder {
                ticket: read.ticket,
                applied: self.applied_ticket,
            }));
        }

        let snapshot = self.history.push(&balance, now)?;
        self.balance = balance;
        self.last_scan = Some(now);
        self.explorer_url = Some(catalog.lookup(&read.currency).explorer_url(&read.address));
        self.applied_ticket = read.ticket;
        Ok(CheckOutcome::Applied(snapshot))
    }

    /// Record a change and capture the state to publish.
    fn touch(&mut self) -> SessionSnapshot {
        self.revision += 1;
        self.snapshot()
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            identity: self.identity.clone(),
            balance: self.balance.clone(),
            loading: self.in_flight > 0,
            is_scanning: self.is_scanning,
            history: self.history.to_vec(),
            explorer_url: self.explorer_url.clone(),
            last_scan: self.last_scan,
            generation: self.generation,
            selected_currency: self.selected_currency.clone(),
            revision: self.revision,
        }
    }
}

struct SessionInner {
    catalog: Arc<CurrencyCatalog>,
    factory: AddressFactory,
    oracle: Arc<dyn BalanceOracle>,
    random: Mutex<Box<dyn RandomSource>>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    auto_scan: Mutex<AutoScanController>,
    state: Mutex<SessionState>,
    snapshots: watch::Sender<SessionSnapshot>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionInner {
    /// Publish `snapshot` unless a newer one is already out.
    fn publish(&self, snapshot: SessionSnapshot) {
        self.snapshots.send_if_modified(|current| {
            if snapshot.revision > current.revision {
                *current = snapshot;
                true
            } else {
                false
            }
        });
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn finish_read(
        &self,
        read: PendingRead,
        result: Result<String, OracleError>,
    ) -> Result<CheckOutcome, SessionError> {
        let (outcome, snapshot) = {
            let mut st = self.state.lock();
            st.in_flight = st.in_flight.saturating_sub(1);
            let outcome = match result {
                Ok(balance) => st.apply_read(&read, balance, self.clock.now(), &self.catalog),
                Err(e) => Err(e.into()),
            };
            (outcome, st.touch())
        };
        self.publish(snapshot);

        match &outcome {
            Ok(CheckOutcome::Applied(snapshot)) => {
                debug!(
                    generation = read.generation,
                    ticket = read.ticket,
                    currency = %read.currency,
                    balance = %snapshot.balance,
                    delta = %snapshot.delta,
                    "balance applied"
                );
                self.emit(SessionEvent::BalanceUpdated {
                    generation: read.generation,
                    snapshot: snapshot.clone(),
                });
            }
            Ok(CheckOutcome::Discarded(reason)) => {
                debug!(
                    generation = read.generation,
                    ticket = read.ticket,
                    %reason,
                    "stale balance discarded"
                );
                self.emit(SessionEvent::StaleResultDiscarded {
                    reason: reason.clone(),
                });
            }
            Err(e) => {
                warn!(generation = read.generation, ticket = read.ticket, "balance check failed: {e}");
            }
        }
        outcome
    }
}

/// Keeps `in_flight` honest when a read future is dropped mid-await.
struct InFlight<'a> {
    inner: &'a SessionInner,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(inner: &'a SessionInner) -> Self {
        Self { inner, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let snapshot = {
            let mut st = self.inner.state.lock();
            st.in_flight = st.in_flight.saturating_sub(1);
            st.touch()
        };
        self.inner.publish(snapshot);
        debug!("balance read cancelled");
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Assembles a [`WalletSession`]; every collaborator has a production default.
#[derive(Default)]
pub struct SessionBuilder {
    config: SessionConfig,
    catalog: Option<Arc<CurrencyCatalog>>,
    oracle: Option<Arc<dyn BalanceOracle>>,
    random: Option<Box<dyn RandomSource>>,
    clock: Option<Arc<dyn Clock>>,
}

impl SessionBuilder {
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `catalog` instead of the one derived from the config.
    pub fn catalog(mut self, catalog: Arc<CurrencyCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn oracle(mut self, oracle: Arc<dyn BalanceOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Randomness for address and key generation.
    pub fn random(mut self, random: impl RandomSource + 'static) -> Self {
        self.random = Some(Box::new(random));
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<WalletSession, SessionError> {
        self.config.validate()?;
        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => Arc::new(self.config.catalog()?),
        };
        let oracle: Arc<dyn BalanceOracle> = match self.oracle {
            Some(oracle) => oracle,
            None => Arc::new(SimulatedOracle::new(
                catalog.clone(),
                Box::new(StdRandom::from_entropy()),
                self.config.balance_latency(),
            )),
        };
        let random = self
            .random
            .unwrap_or_else(|| Box::new(StdRandom::from_entropy()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let state = SessionState::new(&self.config);
        let (snapshots, _) = watch::channel(state.snapshot());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(WalletSession {
            inner: Arc::new(SessionInner {
                factory: AddressFactory::new(catalog.clone()),
                catalog,
                oracle,
                random: Mutex::new(random),
                clock,
                auto_scan: Mutex::new(AutoScanController::new(self.config.auto_scan_interval())),
                config: self.config,
                state: Mutex::new(state),
                snapshots,
                events,
            }),
        })
    }
}

// ---------------------------------------------------------------------------
// WalletSession
// ---------------------------------------------------------------------------

/// Shared handle to one wallet session.
#[derive(Clone)]
pub struct WalletSession {
    inner: Arc<SessionInner>,
}

impl WalletSession {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Session with the simulated oracle, OS randomness and the system clock.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        Self::builder().config(config).build()
    }

    /// Replace the identity with a fresh one for `currency` and run the
    /// first balance check.
    ///
    /// Auto-scan is stopped first. The previous identity's history is
    /// dropped and any of its in-flight reads become stale.
    pub async fn generate(
        &self,
        currency: impl Into<CurrencyCode>,
    ) -> Result<CheckOutcome, SessionError> {
        let currency = currency.into();
        let inner = &self.inner;
        if inner.config.strict_currencies {
            inner.catalog.require(&currency)?;
        }
        self.stop_auto_scan();

        let identity = {
            let mut rng = inner.random.lock();
            inner.factory.create(&currency, &mut **rng)
        };
        let address = identity.address.clone();
        let (read, snapshot) = {
            let mut st = inner.state.lock();
            st.generation += 1;
            st.identity = Some(identity);
            st.balance = PLACEHOLDER_BALANCE.to_string();
            st.history = ScanHistory::with_capacity(inner.config.history_capacity);
            st.last_scan = None;
            st.explorer_url = None;
            st.selected_currency = currency.clone();
            let read = st.begin_read(address.clone(), currency.clone());
            (read, st.touch())
        };
        info!(%currency, generation = read.generation, %address, "wallet generated");
        inner.publish(snapshot);
        inner.emit(SessionEvent::Generated {
            generation: read.generation,
            currency,
            address,
        });

        self.run_read(read).await
    }

    /// Check the balance of the current identity.
    pub async fn check_balance(&self) -> Result<CheckOutcome, SessionError> {
        self.check_current(None).await
    }

    /// Check the current identity, or discard without a read when
    /// `expected` names a generation that is no longer current.
    async fn check_current(&self, expected: Option<u64>) -> Result<CheckOutcome, SessionError> {
        let (read, snapshot) = {
            let mut st = self.inner.state.lock();
            let identity = st.identity.as_ref().ok_or(SessionError::NoWallet)?;
            let (address, currency) = (identity.address.clone(), identity.currency.clone());
            if let Some(started) = expected.filter(|g| *g != st.generation) {
                let reason = StaleReason::SupersededGeneration {
                    started,
                    current: st.generation,
                };
                drop(st);
                debug!(%reason, "check skipped for superseded generation");
                self.inner.emit(SessionEvent::StaleResultDiscarded {
                    reason: reason.clone(),
                });
                return Ok(CheckOutcome::Discarded(reason));
            }
            let read = st.begin_read(address, currency);
            (read, st.touch())
        };
        self.inner.publish(snapshot);
        self.run_read(read).await
    }

    /// Check the balance of `address` in `currency`.
    ///
    /// The result is applied only if they still name the current identity
    /// when the read resolves.
    pub async fn check_balance_for(
        &self,
        address: &str,
        currency: impl Into<CurrencyCode>,
    ) -> Result<CheckOutcome, SessionError> {
        let currency = currency.into();
        let (read, snapshot) = {
            let mut st = self.inner.state.lock();
            if st.identity.is_none() {
                return Err(SessionError::NoWallet);
            }
            let read = st.begin_read(address.to_string(), currency);
            (read, st.touch())
        };
        self.inner.publish(snapshot);
        self.run_read(read).await
    }

    async fn run_read(&self, read: PendingRead) -> Result<CheckOutcome, SessionError> {
        trace!(
            generation = read.generation,
            ticket = read.ticket,
            currency = %read.currency,
            address = %read.address,
            "balance inquiry started"
        );
        let mut guard = InFlight::new(&self.inner);
        let result = self.inner.oracle.fetch(&read.address, &read.currency).await;
        guard.disarm();
        self.inner.finish_read(read, result)
    }

    /// Start periodic balance checks.
    ///
    /// Returns `Ok(false)` without side effects when no wallet exists or a
    /// scan is already running.
    pub fn start_auto_scan(&self) -> Result<bool, SessionError> {
        let mut scanner = self.inner.auto_scan.lock();
        let generation = {
            let st = self.inner.state.lock();
            if st.identity.is_none() {
                debug!("auto-scan requested without a wallet");
                return Ok(false);
            }
            st.generation
        };
        let session = Arc::downgrade(&self.inner);
        if !scanner.start(move || scan_tick(session.clone(), generation))? {
            return Ok(false);
        }
        let period_ms = scanner.period().as_millis() as u64;
        let snapshot = {
            let mut st = self.inner.state.lock();
            st.is_scanning = true;
            st.touch()
        };
        drop(scanner);

        info!(period_ms, "auto-scan enabled");
        self.inner.publish(snapshot);
        self.inner.emit(SessionEvent::AutoScanStarted);
        Ok(true)
    }

    /// Stop periodic checks. A check already in flight still completes.
    /// Returns `false` when no scan was running.
    pub fn stop_auto_scan(&self) -> bool {
        let mut scanner = self.inner.auto_scan.lock();
        if !scanner.stop() {
            return false;
        }
        let snapshot = {
            let mut st = self.inner.state.lock();
            st.is_scanning = false;
            st.touch()
        };
        drop(scanner);

        info!("auto-scan disabled");
        self.inner.publish(snapshot);
        self.inner.emit(SessionEvent::AutoScanStopped);
        true
    }

    /// Switch the selected currency. Stops auto-scan; the current identity
    /// is kept until the next `generate`.
    pub fn select_currency(&self, currency: impl Into<CurrencyCode>) -> Result<(), SessionError> {
        let currency = currency.into();
        if self.inner.config.strict_currencies {
            self.inner.catalog.require(&currency)?;
        }
        self.stop_auto_scan();
        let snapshot = {
            let mut st = self.inner.state.lock();
            st.selected_currency = currency.clone();
            st.touch()
        };
        debug!(%currency, "currency selected");
        self.inner.publish(snapshot);
        self.inner.emit(SessionEvent::CurrencySelected { currency });
        Ok(())
    }

    /// Time since the last applied scan, e.g. `"5 seconds ago"`; empty
    /// before the first scan.
    pub fn last_scan_age(&self) -> String {
        let last = self.inner.state.lock().last_scan;
        describe_age(last, self.inner.clock.now())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.lock().snapshot()
    }

    /// Receiver that always holds the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.snapshots.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub fn identity(&self) -> Option<WalletIdentity> {
        self.inner.state.lock().identity.clone()
    }

    pub fn balance(&self) -> String {
        self.inner.state.lock().balance.clone()
    }

    pub fn history(&self) -> Vec<BalanceSnapshot> {
        self.inner.state.lock().history.to_vec()
    }

    pub fn is_scanning(&self) -> bool {
        self.inner.state.lock().is_scanning
    }

    pub fn generation(&self) -> u64 {
        self.inner.state.lock().generation
    }

    /// Auto-scan firings since the session was created.
    pub fn auto_scan_ticks(&self) -> u64 {
        self.inner.auto_scan.lock().ticks()
    }

    pub fn catalog(&self) -> &CurrencyCatalog {
        &self.inner.catalog
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }
}

impl fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.inner.state.lock();
        f.debug_struct("WalletSession")
            .field("generation", &st.generation)
            .field("identity", &st.identity)
            .field("balance", &st.balance)
            .field("history_len", &st.history.len())
            .field("is_scanning", &st.is_scanning)
            .finish()
    }
}

/// One auto-scan firing for the timer started in `generation`. Holds only a
/// weak reference between firings so the timer never keeps a dropped
/// session alive.
async fn scan_tick(session: Weak<SessionInner>, generation: u64) {
    let Some(inner) = session.upgrade() else {
        return;
    };
    let session = WalletSession { inner };
    match session.check_current(Some(generation)).await {
        Ok(CheckOutcome::Applied(snapshot)) => {
            trace!(balance = %snapshot.balance, "auto-scan reading applied");
        }
        Ok(CheckOutcome::Discarded(reason)) => {
            debug!(%reason, "auto-scan reading discarded");
        }
        Err(e) => warn!("auto-scan check failed: {e}"),
    }
}

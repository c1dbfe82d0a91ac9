//! Periodic scan timer.
//!
//! [`AutoScanController`] is a two-state machine: `Idle` (no task) and
//! `Scanning` (exactly one periodic task). The task only *triggers* work:
//! every firing spawns the supplied tick future as its own task, so stopping
//! the timer cancels future firings but never a scan already in flight.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace};

use crate::error::SessionError;

/// Shortest accepted period; Tokio intervals reject zero.
const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanState {
    Idle,
    Scanning,
}

/// Owner of the single auto-scan timer task.
pub struct AutoScanController {
    period: Duration,
    task: Option<JoinHandle<()>>,
    ticks: Arc<AtomicU64>,
}

impl AutoScanController {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(MIN_PERIOD),
            task: None,
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn state(&self) -> ScanState {
        if self.task.is_some() {
            ScanState::Scanning
        } else {
            ScanState::Idle
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.state() == ScanState::Scanning
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Total firings since the controller was created.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Idle → Scanning. `tick` is invoked once per period, first one period
    /// from now.
    ///
    /// Returns `Ok(false)` without side effects when already scanning, and
    /// [`SessionError::NoRuntime`] outside a Tokio runtime.
    pub fn start<F, Fut>(&mut self, mut tick: F) -> Result<bool, SessionError>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.task.is_some() {
            return Ok(false);
        }
        let handle = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;
        let period = self.period;
        let ticks = self.ticks.clone();
        let spawner = handle.clone();

        self.task = Some(handle.spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let n = ticks.fetch_add(1, Ordering::Relaxed) + 1;
                trace!(tick = n, "auto-scan tick");
                spawner.spawn(tick());
            }
        }));
        debug!(period_ms = period.as_millis() as u64, "auto-scan started");
        Ok(true)
    }

    /// Scanning → Idle. Returns `false` when already idle.
    pub fn stop(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                debug!("auto-scan stopped");
                true
            }
            None => false,
        }
    }
}

impl Drop for AutoScanController {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for AutoScanController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoScanController")
            .field("period", &self.period)
            .field("state", &self.state())
            .field("ticks", &self.ticks())
            .finish()
    }
}

//! qwallet-dashboard — HTTP dashboard for the simulated wallet session.
//!
//! Serves a single-page UI at `/` and a JSON API under `/api/` that maps
//! one-to-one onto the session actions (generate, check, auto-scan start
//! and stop, currency selection) plus a simulated market panel.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::Mutex;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

mod config;
mod routes;

use config::Config;
use qwallet_core::rng::StdRandom;
use qwallet_session::{MarketFeed, SessionConfig, WalletSession};

/// Shared application state passed to every Axum handler.
#[derive(Clone)]
pub struct AppState {
    /// The one wallet session this dashboard drives.
    pub session: WalletSession,
    /// Market panel for the selected currency.
    pub market: Arc<Mutex<MarketFeed>>,
    /// Randomness for market ticks.
    pub rng: Arc<Mutex<StdRandom>>,
}

impl AppState {
    pub fn new(session: WalletSession) -> Self {
        let window = session.config().market_window;
        let selected = session.snapshot().selected_currency;
        Self {
            market: Arc::new(Mutex::new(MarketFeed::with_window(selected, window))),
            rng: Arc::new(Mutex::new(StdRandom::from_entropy())),
            session,
        }
    }

    /// Point the market feed at the session's selected currency.
    pub fn follow_currency(&self) {
        let selected = self.session.snapshot().selected_currency;
        if self.market.lock().select(&selected) {
            info!(currency = %selected, "market feed switched");
        }
    }

    /// One market tick for the selected currency.
    pub fn tick_market(&self) {
        let selected = self.session.snapshot().selected_currency;
        let entry = self.session.catalog().lookup(&selected).clone();
        let mut feed = self.market.lock();
        feed.select(&selected);
        let mut rng = self.rng.lock();
        feed.tick(&entry, &mut *rng, Utc::now());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("Failed to load dashboard configuration")?;
    let session_config = SessionConfig::load(config.session_config.as_deref())
        .context("Failed to load session configuration")?;
    let market_tick = session_config.market_tick();

    info!(
        bind = %config.bind_addr,
        session_config = ?config.session_config,
        scan_interval_ms = session_config.auto_scan_interval_ms,
        "Starting qwallet-dashboard"
    );

    let session = WalletSession::new(session_config).context("Failed to build wallet session")?;
    let state = AppState::new(session);

    tokio::spawn(run_market_feed(state.clone(), market_tick));

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("Dashboard listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}

/// Tick the market panel every `period` for the life of the process.
async fn run_market_feed(state: AppState, period: Duration) {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        state.tick_market();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

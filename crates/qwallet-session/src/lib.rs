//! # qwallet-session — wallet session state machine.
//!
//! Generates mock wallet identities, runs simulated balance inquiries,
//! keeps a bounded scan history and drives the periodic auto-scan. All
//! session mutation goes through [`WalletSession`]; presentation layers
//! read [`SessionSnapshot`]s and subscribe to [`SessionEvent`]s.
//!
//! # Modules
//!
//! - [`error`] — `SessionError` enum
//! - [`address`] — Mock address and private-key generation
//! - [`oracle`] — Simulated balance oracle
//! - [`history`] — Bounded newest-first scan history
//! - [`auto_scan`] — Single periodic scan timer
//! - [`age`] — Relative rendering of the last scan time
//! - [`config`] — `SessionConfig` loading (TOML + env)
//! - [`market`] — Simulated price window and network statistics
//! - [`session`] — The `WalletSession` aggregate

pub mod address;
pub mod age;
pub mod auto_scan;
pub mod config;
pub mod error;
pub mod history;
pub mod market;
pub mod oracle;
pub mod session;

// Re-exports for convenient access
pub use address::AddressFactory;
pub use age::describe_age;
pub use auto_scan::{AutoScanController, ScanState};
pub use config::SessionConfig;
pub use error::SessionError;
pub use history::ScanHistory;
pub use market::{MarketFeed, MarketView, NetworkStats, PricePoint};
pub use oracle::SimulatedOracle;
pub use session::{
    CheckOutcome, SessionBuilder, SessionEvent, SessionSnapshot, StaleReason, WalletSession,
};

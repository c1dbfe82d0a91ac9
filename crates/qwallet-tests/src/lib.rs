//! Integration test suite for qwallet.
//!
//! Drives a full `WalletSession` on Tokio's paused clock with scripted
//! oracle replies, and checks session invariants with property tests.

pub mod helpers;

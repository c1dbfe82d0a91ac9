//! Bounded, newest-first log of balance snapshots.
//!
//! Each push records the change from the snapshot that was at the head
//! immediately before it, never from an older entry. Once the history is
//! full the oldest snapshot is evicted.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use qwallet_core::amount::{format_delta, parse_decimal};
use qwallet_core::constants::{HISTORY_CAPACITY, INITIAL_DELTA};
use qwallet_core::{BalanceError, BalanceSnapshot};

#[derive(Debug, Clone, PartialEq)]
pub struct ScanHistory {
    entries: VecDeque<BalanceSnapshot>,
    capacity: usize,
}

impl ScanHistory {
    /// Empty history holding at most ten snapshots.
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// Empty history holding at most `capacity` snapshots, clamped to
    /// `1..=10`.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, HISTORY_CAPACITY);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Record `balance` observed at `now` and return the new head.
    pub fn push(&mut self, balance: &str, now: DateTime<Utc>) -> Result<BalanceSnapshot, BalanceError> {
        let current = parse_decimal(balance)?;
        let delta = match self.entries.front() {
            Some(head) => format_delta(current, head.balance_value()?),
            None => INITIAL_DELTA.to_string(),
        };
        let snapshot = BalanceSnapshot {
            timestamp: now,
            balance: balance.to_string(),
            delta,
        };
        self.entries.push_front(snapshot.clone());
        self.entries.truncate(self.capacity);
        Ok(snapshot)
    }

    /// Snapshots, newest first.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = &BalanceSnapshot> + '_ {
        self.entries.iter()
    }

    /// Most recent snapshot.
    pub fn head(&self) -> Option<&BalanceSnapshot> {
        self.entries.front()
    }

    pub fn to_vec(&self) -> Vec<BalanceSnapshot> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for ScanHistory {
    fn default() -> Self {
        Self::new()
    }
}

//! Simulated market analytics.
//!
//! [`MarketFeed`] keeps a rolling window of mock prices for one currency and
//! cumulative mock network statistics. It does no timing of its own; the
//! owner calls [`MarketFeed::tick`] on its own schedule.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use qwallet_core::constants::MARKET_WINDOW;
use qwallet_core::{CurrencyCode, CurrencyEntry, RandomSource};

/// Largest transaction count added per tick (exclusive).
const MAX_TX_PER_TICK: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkStats {
    pub transactions: u64,
    pub block_height: u64,
    /// Random walk in steps of `[-1, 1)`; may go negative.
    pub hash_rate: f64,
    pub last_update: Option<DateTime<Utc>>,
}

/// Serializable view of the feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketView {
    pub currency: CurrencyCode,
    pub prices: Vec<PricePoint>,
    pub stats: NetworkStats,
}

#[derive(Debug, Clone)]
pub struct MarketFeed {
    currency: CurrencyCode,
    window: usize,
    prices: VecDeque<PricePoint>,
    stats: NetworkStats,
}

impl MarketFeed {
    pub fn new(currency: CurrencyCode) -> Self {
        Self::with_window(currency, MARKET_WINDOW)
    }

    /// Feed keeping at most `window` prices (minimum 1).
    pub fn with_window(currency: CurrencyCode, window: usize) -> Self {
        let window = window.max(1);
        Self {
            currency,
            window,
            prices: VecDeque::with_capacity(window + 1),
            stats: NetworkStats::default(),
        }
    }

    /// Switch to `currency`. The price series restarts; network statistics
    /// carry on. Returns `false` if it was already selected.
    pub fn select(&mut self, currency: &CurrencyCode) -> bool {
        if &self.currency == currency {
            return false;
        }
        self.currency = currency.clone();
        self.prices.clear();
        true
    }

    /// Append one price drawn from `[0, entry.reference_price)` and advance
    /// the network statistics.
    pub fn tick(&mut self, entry: &CurrencyEntry, rng: &mut dyn RandomSource, now: DateTime<Utc>) -> &PricePoint {
        let price = rng.next_unit() * entry.reference_price;
        self.prices.push_back(PricePoint { timestamp: now, price });
        while self.prices.len() > self.window {
            self.prices.pop_front();
        }

        self.stats.transactions += (rng.next_unit() * MAX_TX_PER_TICK).floor() as u64;
        self.stats.block_height += 1;
        self.stats.hash_rate += rng.next_unit() * 2.0 - 1.0;
        self.stats.last_update = Some(now);

        // push_back above guarantees a last element
        &self.prices[self.prices.len() - 1]
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    /// Prices, oldest first.
    pub fn prices(&self) -> impl ExactSizeIterator<Item = &PricePoint> + '_ {
        self.prices.iter()
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn view(&self) -> MarketView {
        MarketView {
            currency: self.currency.clone(),
            prices: self.prices.iter().cloned().collect(),
            stats: self.stats.clone(),
        }
    }
}

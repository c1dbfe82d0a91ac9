//! Criterion benchmarks for qwallet-session hot paths.
//!
//! Covers: history push at capacity, address generation, and market ticks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use qwallet_core::rng::StdRandom;
use qwallet_core::{CurrencyCatalog, CurrencyCode};
use qwallet_session::{AddressFactory, MarketFeed, ScanHistory};

fn bench_history_push(c: &mut Criterion) {
    let now = DateTime::<Utc>::UNIX_EPOCH;
    let mut history = ScanHistory::new();
    for i in 0..10 {
        let _ = history.push(&format!("{i}.00"), now);
    }

    c.bench_function("history_push_full", |b| {
        b.iter(|| history.push(black_box("123.45678901"), now))
    });
}

fn bench_address_factory(c: &mut Criterion) {
    let factory = AddressFactory::new(Arc::new(CurrencyCatalog::builtin()));
    let mut rng = StdRandom::seeded(1);
    let btc = CurrencyCode::new("BTC");

    c.bench_function("address_create_btc", |b| {
        b.iter(|| factory.create(black_box(&btc), &mut rng))
    });
}

fn bench_market_tick(c: &mut Criterion) {
    let catalog = CurrencyCatalog::builtin();
    let eth = CurrencyCode::new("ETH");
    let entry = catalog.lookup(&eth).clone();
    let mut feed = MarketFeed::new(eth);
    let mut rng = StdRandom::seeded(2);
    let now = DateTime::<Utc>::UNIX_EPOCH;

    c.bench_function("market_tick", |b| {
        b.iter(|| feed.tick(&entry, &mut rng, now).price)
    });
}

criterion_group!(benches, bench_history_push, bench_address_factory, bench_market_tick);
criterion_main!(benches);

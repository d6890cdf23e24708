use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use relief::reporting::{summarize_records, Reporting};
use relief::repository::Repository;
use relief_core::{DocumentStore, Donation};
use relief_memory::InMemoryStore;
use rust_decimal::Decimal;
use time::OffsetDateTime;

const KINDS: [&str; 5] = ["Money", "Goods", "Services", "Medical", "Shelter"];

fn donations(n: usize) -> Vec<Donation> {
    let date = OffsetDateTime::UNIX_EPOCH;
    (0..n)
        .map(|i| Donation {
            id: None,
            donation_type: KINDS[i % KINDS.len()].to_string(),
            description: format!("Donation {}", i),
            amount: Decimal::new(i as i64 * 101 + 7, 2),
            date,
        })
        .collect()
}

fn seeded_store(n: usize) -> Arc<dyn DocumentStore> {
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
    let repo = Repository::<Donation>::new(store.clone());
    for d in donations(n) {
        repo.create(d).unwrap();
    }
    store
}

fn bench_summarize_records(c: &mut Criterion) {
    let records = donations(10_000);
    c.bench_function("summarize_records_10k", |b| {
        b.iter(|| summarize_records(black_box(&records), 100, 100, 10).unwrap())
    });
}

fn bench_summarize_store(c: &mut Criterion) {
    let reporting = Reporting::new(seeded_store(1_000));
    c.bench_function("summarize_memory_store_1k", |b| {
        b.iter(|| reporting.summarize().unwrap())
    });
}

criterion_group!(benches, bench_summarize_records, bench_summarize_store);
criterion_main!(benches);

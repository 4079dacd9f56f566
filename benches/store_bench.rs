//! Benchmarks for defrag
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use defrag::fragment::{FragmentNaming, FragmentStore};
use std::sync::Arc;
use std::thread;

fn benchmark_store_insert(c: &mut Criterion) {
    c.bench_function("store_insert_sequential", |b| {
        b.iter(|| {
            let store = FragmentStore::new();
            for pos in 0..1024 {
                store.insert(pos, vec![0u8; 64]).unwrap();
            }
            black_box(store.len());
        })
    });

    c.bench_function("store_insert_4_threads", |b| {
        b.iter(|| {
            let store = Arc::new(FragmentStore::new());
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let store = Arc::clone(&store);
                    thread::spawn(move || {
                        for i in 0..256 {
                            store.insert(i * 4 + t, vec![0u8; 64]).unwrap();
                        }
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }
            black_box(store.len());
        })
    });
}

fn benchmark_name_parsing(c: &mut Criterion) {
    let naming = FragmentNaming::default();

    c.bench_function("classify_fragment_name", |b| {
        b.iter(|| {
            black_box(naming.classify(black_box("000123.bin")));
            black_box(naming.classify(black_box("notes.txt")));
        })
    });
}

criterion_group!(benches, benchmark_store_insert, benchmark_name_parsing);
criterion_main!(benches);

//! Microbenchmarks for hot path components
//!
//! These measure the isolated operations on the state-matching hot path:
//! structural hash folding, hash-consing pool hits, visited-set lookups
//! and permutation generation.
//!
//! Run with: cargo bench --bench hot_path

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use mc_state::{HashAccumulator, Permuter, Pool, StateSet, WorkingBitSet};

fn bench_hash_accumulator(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_accumulator");
    for size in [16usize, 256, 4096] {
        let words: Vec<i32> = (0..size as i32).map(|i| i.wrapping_mul(2654435761u32 as i32)).collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("fold", size), &words, |b, words| {
            b.iter(|| {
                let mut hd = HashAccumulator::new();
                for &w in words {
                    hd.add(black_box(w));
                }
                hd.value()
            })
        });
    }
    group.finish();
}

fn bench_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool");

    // steady state: every lookup is a hit on an already-canonical value
    group.bench_function("hit", |b| {
        let mut pool: Pool<Vec<i32>> = Pool::new();
        for i in 0..256 {
            pool.pool(vec![i, i * 2, i * 3]);
        }
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) & 255;
            pool.pool(black_box(vec![i, i * 2, i * 3]))
        })
    });

    group.bench_function("miss", |b| {
        let mut pool: Pool<Vec<i32>> = Pool::new();
        let mut i = 0i32;
        b.iter(|| {
            i += 1;
            pool.pool(black_box(vec![i, i, i]))
        })
    });

    group.finish();
}

fn bench_state_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("state_set");

    group.bench_function("add_new", |b| {
        let mut set = StateSet::new();
        let mut v = vec![0i32; 16];
        let mut i = 0i32;
        b.iter(|| {
            i += 1;
            v[0] = i;
            set.add(black_box(&v))
        })
    });

    group.bench_function("add_seen", |b| {
        let mut set = StateSet::new();
        let mut v = vec![0i32; 16];
        for i in 0..1024 {
            v[0] = i;
            set.add(&v);
        }
        let mut i = 0i32;
        b.iter(|| {
            i = (i + 1) & 1023;
            v[0] = i;
            set.add(black_box(&v))
        })
    });

    group.finish();
}

fn bench_permuters(c: &mut Criterion) {
    let mut group = c.benchmark_group("permute");

    group.bench_function("pairwise_16", |b| {
        b.iter(|| {
            let mut p = Permuter::pairwise(16);
            let mut acc = 0u32;
            while let Some(perm) = p.next() {
                acc ^= perm[0];
            }
            acc
        })
    });

    group.bench_function("unique_random_6_of_64", |b| {
        b.iter(|| {
            let mut p = Permuter::unique_random(6, 42, 64);
            let mut acc = 0u32;
            while let Some(perm) = p.next() {
                acc ^= perm[0];
            }
            acc
        })
    });

    group.finish();
}

fn bench_bitset(c: &mut Criterion) {
    c.bench_function("bitset_canonicalize_512", |b| {
        let mut ws = WorkingBitSet::new();
        for i in (0..512).step_by(3) {
            ws.add(i);
        }
        b.iter(|| black_box(&ws).to_canonical())
    });
}

criterion_group!(
    benches,
    bench_hash_accumulator,
    bench_pool,
    bench_state_set,
    bench_permuters,
    bench_bitset
);
criterion_main!(benches);

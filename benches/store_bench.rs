use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use keyslot::{search, CollisionResolver, HashFunction, SlotStore};
use rand::{rngs::StdRng, Rng, SeedableRng};

const KEY_LENGTH: usize = 6;

fn keys(count: usize) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(0xDE4326423);
    (0..count)
        .map(|_| format!("{:06}", rng.gen_range(0..1_000_000u32)))
        .collect()
}

pub fn hashed_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("hashed_insert");
    let keys = keys(900);
    for resolver in [
        CollisionResolver::LinearProbing,
        CollisionResolver::QuadraticProbing,
        CollisionResolver::SequentialDisplacement,
    ] {
        for hash in [HashFunction::Modulo, HashFunction::MidSquare] {
            group.bench_with_input(
                BenchmarkId::new(resolver.to_string(), hash.to_string()),
                &hash,
                |b, hash| {
                    let mut store = SlotStore::new(1024, KEY_LENGTH).unwrap();
                    b.iter(|| {
                        store.initialize();
                        for k in &keys {
                            let _ = store.insert_hashed(k, hash, resolver);
                        }
                    })
                },
            );
        }
    }
    group.finish()
}

pub fn searches(c: &mut Criterion) {
    let keys = keys(900);
    let mut flat = SlotStore::new(1024, KEY_LENGTH).unwrap();
    let mut blocked = SlotStore::blocked(1024, KEY_LENGTH).unwrap();
    flat.initialize();
    blocked.initialize();
    for k in &keys {
        let _ = flat.insert(k);
        let _ = blocked.insert(k);
    }
    c.bench_function("linear_search", |b| {
        b.iter(|| search::linear_search(&flat, &keys[450]).unwrap())
    });
    flat.sort().unwrap();
    blocked.sort().unwrap();
    c.bench_function("binary_search", |b| {
        b.iter(|| search::binary_search(&flat, &keys[450]).unwrap())
    });
    c.bench_function("block_binary_search", |b| {
        b.iter(|| search::block_binary_search(&blocked, &keys[450]).unwrap())
    });
}

criterion_group!(store, hashed_insert, searches);
criterion_main!(store);

use car_store::{Car, CarStore, Collection, FlushPolicy};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use shardmap::ShardMap;
use std::hint::black_box;
use std::path::PathBuf;
use std::time::Duration;

fn bench_path(name: &str, size: usize) -> PathBuf {
    std::env::temp_dir().join(format!("car_store_bench_{}_{}.json", name, size))
}

fn car(i: usize) -> Car {
    Car {
        name: format!("car {i}").into(),
        color: "red".into(),
        manufacturer: "Seat".into(),
        model: "Ibiza".into(),
        year: "2019".into(),
    }
}

fn bench_insert_read_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_read_remove");
    for size in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("btreemap", size), &size, |b, &size| {
            let path = bench_path("irr_btree", size);
            let _ = std::fs::remove_file(&path);
            let db = CarStore::open_with_policy(&path, FlushPolicy::Manual).unwrap();
            b.iter(|| {
                let ids: Vec<_> = (0..size).map(|i| db.insert(car(i)).unwrap()).collect();
                for pos in 1..=size {
                    black_box(db.at(pos));
                }
                for id in ids {
                    db.remove(id).unwrap();
                }
            });
            let _ = std::fs::remove_file(&path);
        });
        group.bench_with_input(BenchmarkId::new("shardmap", size), &size, |b, &size| {
            let path = bench_path("irr_shard", size);
            let _ = std::fs::remove_file(&path);
            let db = Collection::<Car, ShardMap<u64, Car>>::open_with_policy(&path, FlushPolicy::Manual)
                .unwrap();
            b.iter(|| {
                let ids: Vec<_> = (0..size).map(|i| db.insert(car(i)).unwrap()).collect();
                black_box(db.all());
                for id in ids {
                    db.remove(id).unwrap();
                }
            });
            let _ = std::fs::remove_file(&path);
        });
    }
}

fn bench_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("flush");
    group.sample_size(50);
    group.measurement_time(Duration::from_secs(8));
    for size in [100, 1000, 10_000] {
        group.bench_with_input(BenchmarkId::new("btreemap", size), &size, |b, &size| {
            let path = bench_path("flush", size);
            let _ = std::fs::remove_file(&path);
            let db = CarStore::open_with_policy(&path, FlushPolicy::Manual).unwrap();
            for i in 0..size {
                db.insert(car(i)).unwrap();
            }
            b.iter(|| db.flush().unwrap());
            let _ = std::fs::remove_file(&path);
        });
    }
}

// Every request pays for a full rewrite; this is the per-request cost.
fn bench_immediate_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("immediate_update");
    group.sample_size(30);
    for size in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("btreemap", size), &size, |b, &size| {
            let path = bench_path("immediate", size);
            let _ = std::fs::remove_file(&path);
            let db = CarStore::open(&path).unwrap();
            for i in 0..size {
                db.insert(car(i)).unwrap();
            }
            b.iter(|| db.update(1, |c| c.year = "2020".into()).unwrap());
            let _ = std::fs::remove_file(&path);
        });
    }
}

criterion_group!(
    benches,
    bench_insert_read_remove,
    bench_flush,
    bench_immediate_update,
);
criterion_main!(benches);

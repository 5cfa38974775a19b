//! Benchmarks demonstrating that hash-consing and the operation cache keep
//! `union`/`intersect`/`next` tracking diagram size rather than set size.
//!
//! Run with: cargo bench

use std::cell::RefCell;
use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mdd_engine::{Factory, FactoryHandle, Irel, MddSet};

fn new_factory<V>() -> FactoryHandle<V>
where
    V: Clone + Eq + std::hash::Hash,
{
    Rc::new(RefCell::new(Factory::new()))
}

fn chain_set(f: &FactoryHandle<u32>, width: u32) -> MddSet<u32> {
    let mut set = MddSet::empty(f.clone());
    for i in 0..width {
        set = set.add_element(&[i, i + 1]);
    }
    set
}

fn bench_union(c: &mut Criterion) {
    let mut group = c.benchmark_group("union");
    for width in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*width as u64));
        group.bench_with_input(BenchmarkId::new("width", width), width, |b, &width| {
            b.iter(|| {
                let f = new_factory();
                let a = chain_set(&f, width);
                let b2 = chain_set(&f, width);
                black_box((&a | &b2).size())
            });
        });
    }
    group.finish();
}

fn bench_intersect(c: &mut Criterion) {
    let mut group = c.benchmark_group("intersect");
    for width in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*width as u64));
        group.bench_with_input(BenchmarkId::new("width", width), width, |b, &width| {
            b.iter(|| {
                let f = new_factory();
                let a = chain_set(&f, width);
                let b2 = chain_set(&f, width / 2);
                black_box((&a & &b2).size())
            });
        });
    }
    group.finish();
}

fn bench_next(c: &mut Criterion) {
    let mut group = c.benchmark_group("next");
    for width in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*width as u64));
        group.bench_with_input(BenchmarkId::new("width", width), width, |b, &width| {
            b.iter(|| {
                let f = new_factory();
                let mut rel = Irel::empty(f.clone());
                for i in 0..width {
                    rel = rel.add_element(&[i, i + 1]);
                }
                let set = chain_set(&f, width).project(&mdd_engine::Projection::from_indices(&[0], 2));
                black_box(rel.apply(&set).size())
            });
        });
    }
    group.finish();
}

fn bench_repeated_union_cache_hits(c: &mut Criterion) {
    let mut group = c.benchmark_group("union_cache_reuse");
    group.bench_function("same_pair_100_times", |b| {
        let f = new_factory();
        let a = chain_set(&f, 200);
        let b2 = chain_set(&f, 200);
        b.iter(|| {
            for _ in 0..100 {
                black_box((&a | &b2).size());
            }
        });
    });
    group.finish();
}

criterion_group!(benches, bench_union, bench_intersect, bench_next, bench_repeated_union_cache_hits);
criterion_main!(benches);

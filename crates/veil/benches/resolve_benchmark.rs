//! Benchmark for the per-viewer, per-cell resolve path.
//!
//! TARGET: resolution is cheap enough to run for every cell of every chunk
//! packet sent to every player.
//!
//! Run with: cargo bench --package veil --bench resolve_benchmark

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use veil::FibRegistry;
use veil_shared::mock::{MockKindRegistry, MockPartition, MockState, MockViewer};
use veil_shared::{BlockPos, Partition, PartitionClass};

fn setup() -> (FibRegistry<MockState, MockViewer>, MockPartition, MockState, MockState) {
    let mut kinds = MockKindRegistry::new();
    let ore = kinds.register("mod:hidden_ore");
    let stone = kinds.register("minecraft:stone");

    let registry = FibRegistry::default();
    let world = MockPartition::new(1, PartitionClass::OVERWORLD);
    registry.register(&world, ore, move |state: &MockState, viewer: &MockViewer| {
        if viewer.privileged {
            *state
        } else {
            MockState { kind: stone, meta: state.meta }
        }
    });
    (registry, world, MockState::of(ore), MockState::of(stone))
}

fn benchmark_resolve(c: &mut Criterion) {
    let (registry, world, ore, stone) = setup();
    let viewer = MockViewer::in_partition("steve", world.id());

    let mut group = c.benchmark_group("resolve");
    group.throughput(Throughput::Elements(1));
    group.bench_function("fibbed_kind", |b| {
        b.iter(|| black_box(registry.get(black_box(&ore), &viewer)));
    });
    group.bench_function("unfibbed_kind", |b| {
        b.iter(|| black_box(registry.get(black_box(&stone), &viewer)));
    });
    group.bench_function("viewer_without_store", |b| {
        let stranger = MockViewer::detached("stranger");
        b.iter(|| black_box(registry.get(black_box(&ore), &stranger)));
    });
    group.finish();
}

fn benchmark_chunk_of_cells(c: &mut Criterion) {
    let (registry, world, ore, _) = setup();
    let viewer = MockViewer::in_partition("steve", world.id());

    // 16x16x16 section
    let mut group = c.benchmark_group("section");
    group.throughput(Throughput::Elements(4096));
    group.bench_function("resolve_4096_cells", |b| {
        b.iter(|| {
            for _ in 0..4096 {
                black_box(registry.get(black_box(&ore), &viewer));
            }
        });
    });
    group.bench_function("track_4096_cells", |b| {
        b.iter(|| {
            for i in 0..4096 {
                black_box(registry.put(&world, ore.kind, BlockPos::new(i & 15, i >> 8, (i >> 4) & 15)));
            }
        });
    });
    group.finish();
}

criterion_group!(benches, benchmark_resolve, benchmark_chunk_of_cells);
criterion_main!(benches);

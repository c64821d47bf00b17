#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

use accessflow::{
    AccessMode, NoAccess, Read, ResourceAccess, ResourceId, Task, TaskScheduler, Write, annotation,
    members, normalize, registry,
};

// ---------------------------------------------------------------------------
// Helper domain
// ---------------------------------------------------------------------------

struct Store {
    records: u64,
    label: String,
    epoch: u64,
}

members! {
    struct StoreRecords: Store { records: u64 }
    struct StoreLabel: Store { label: String }
    struct StoreEpoch: Store { epoch: u64 }
}

annotation! {
    struct Compact => (Write<StoreRecords>, Write<StoreEpoch>);
    struct Verify => (Compact, Read<StoreRecords>);
    struct Rotate => (Verify, Read<StoreRecords>, Write<StoreLabel>);
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

fn bench_normalize_flat_list(c: &mut Criterion) {
    let id = ResourceId::new::<Store, u64>("records");
    let expanded: Vec<ResourceAccess> = (0..256)
        .map(|i| {
            let mode = if i % 3 == 0 {
                AccessMode::Write
            } else {
                AccessMode::Read
            };
            ResourceAccess::new(id, mode)
        })
        .collect();

    c.bench_function("normalize_256_accesses_one_resource", |b| {
        b.iter_batched(
            || expanded.clone(),
            |list| black_box(normalize(list)),
            BatchSize::SmallInput,
        );
    });
}

fn bench_annotation_fold(c: &mut Criterion) {
    use accessflow::Annotation;

    c.bench_function("fold_three_level_annotation", |b| {
        b.iter(|| black_box(Rotate::filtered()));
    });
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

fn bench_schedule_independent(c: &mut Criterion) {
    registry::register::<NoAccess>();
    let scheduler = TaskScheduler::new();

    c.bench_function("schedule_32_independent_tasks", |b| {
        b.iter_batched(
            || {
                (0..32)
                    .map(|_| Arc::new(Task::new::<NoAccess>(|| {})))
                    .collect::<VecDeque<_>>()
            },
            |queue| {
                let errors = scheduler.order_and_execute(queue);
                assert!(errors.is_empty());
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_schedule_writer_chain(c: &mut Criterion) {
    registry::register::<Compact>();
    let scheduler = TaskScheduler::new();

    c.bench_function("schedule_32_task_writer_chain", |b| {
        b.iter_batched(
            || {
                (0..32)
                    .map(|_| Arc::new(Task::new::<Compact>(|| {})))
                    .collect::<VecDeque<_>>()
            },
            |queue| {
                let errors = scheduler.order_and_execute(queue);
                assert!(errors.is_empty());
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_normalize_flat_list,
    bench_annotation_fold,
    bench_schedule_independent,
    bench_schedule_writer_chain,
);
criterion_main!(benches);

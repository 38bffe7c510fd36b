use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use merit_slicer::{Merit, Schedule, SchedulerConfig, SlicingMethod};

const ITEMS: usize = 3600;

fn populated(method: SlicingMethod) -> merit_slicer::Scheduler {
    let config = SchedulerConfig {
        slicing_method: method,
        item_count: ITEMS,
        num_demes: 36,
        burst_size: 5,
        seed: 1,
    };
    let mut scheduler = config.build().expect("valid bench config");
    for id in 0..ITEMS {
        let merit = ((id * 37) % 1000) as f64;
        scheduler.set_merit(id, Merit::new(merit)).expect("id in range");
    }
    scheduler
}

fn bench_next_id(c: &mut Criterion) {
    let mut group = c.benchmark_group("next_id");
    for code in 0..=5i64 {
        let method = SlicingMethod::try_from(code).expect("known method");
        let mut scheduler = populated(method);
        group.bench_function(BenchmarkId::from_parameter(format!("{:?}", method)), |b| {
            b.iter(|| black_box(scheduler.next_id()))
        });
    }
    group.finish();
}

fn bench_adjust(c: &mut Criterion) {
    let mut group = c.benchmark_group("adjust");
    for method in [SlicingMethod::Probabilistic, SlicingMethod::Integrated] {
        let mut scheduler = populated(method);
        let mut tick = 0usize;
        group.bench_function(BenchmarkId::from_parameter(format!("{:?}", method)), |b| {
            b.iter(|| {
                tick += 1;
                let id = (tick * 7919) % ITEMS;
                let merit = Merit::new((tick % 4096) as f64);
                scheduler.set_merit(black_box(id), merit).expect("id in range");
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_next_id, bench_adjust);
criterion_main!(benches);

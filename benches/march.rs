use bevy_math::ivec2;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use eikonal_march::{ConstantSlowness, EikonalSolver, GridSpec, LinearSlowness};
use pprof::criterion::{Output, PProfProfiler};

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("march");
    group.sample_size(30);

    group.bench_function("constant_slowness_101x101", |b| {
        b.iter(|| {
            let mut solver =
                EikonalSolver::new(GridSpec::new(ivec2(101, 101), 0.05), ConstantSlowness(1.0));
            solver.add_point_source(black_box(ivec2(50, 50)), 0.0).unwrap();
            solver.solve().unwrap();
            black_box(solver.t(ivec2(100, 50)));
        });
    });

    group.bench_function("linear_slowness_101x101", |b| {
        b.iter(|| {
            let slowness = LinearSlowness::new(1.0, bevy_math::dvec2(0.1, -0.05));
            let mut solver = EikonalSolver::new(GridSpec::new(ivec2(101, 101), 0.05), slowness);
            solver.add_point_source(black_box(ivec2(50, 50)), 0.1).unwrap();
            solver.solve().unwrap();
            black_box(solver.t(ivec2(100, 50)));
        });
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
    targets = criterion_benchmark
}
criterion_main!(benches);

//! # Trajectory Generation Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use swerve_lib::{
    loc::Pose,
    traj_gen::{generate, TrajConfig},
};

fn traj_gen_benchmark(c: &mut Criterion) {
    let config = TrajConfig::new(5.0, 2.0);

    let start = Pose::new(0.0, 0.0, 0.0);
    let short_goal = Pose::new(3.0, -0.5, 0.0);
    let long_goal = Pose::new(40.0, 25.0, 0.0);

    c.bench_function("traj_gen::generate::short", |b| {
        b.iter(|| generate(&start, black_box(0.0), &short_goal, &config).unwrap())
    });

    // Replan while moving
    c.bench_function("traj_gen::generate::long_moving", |b| {
        b.iter(|| generate(&start, black_box(3.2), &long_goal, &config).unwrap())
    });

    let traj = generate(&start, 0.0, &long_goal, &config).unwrap();
    let duration_s = traj.duration_s();

    c.bench_function("Trajectory::sample", |b| {
        b.iter(|| traj.sample(black_box(duration_s * 0.37)))
    });
}

criterion_group!(benches, traj_gen_benchmark);
criterion_main!(benches);

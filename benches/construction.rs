// Copyright (c) 2025-present, banana-tree contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use banana_tree::PersistenceContext;
use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

fn random_walk(len: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut values = Vec::with_capacity(len);
    let mut v = 0.0;
    for _ in 0..len {
        v += rng.random_range(-1.0..1.0);
        values.push(v);
        v += rng.random_range(0.0001..0.0002);
    }
    values
}

fn construction(c: &mut Criterion) {
    let values = random_walk(10_000);

    c.bench_function("construct 10k", |b| {
        b.iter(|| {
            let mut ctx = PersistenceContext::new();
            let (interval, _) = ctx.new_interval_at(black_box(&values), 0.0);
            black_box(interval);
        });
    });
}

fn sliding_window(c: &mut Criterion) {
    let window = 512;
    let slides = 2_048;
    let walk = random_walk(window + slides);

    c.bench_function("slide 512-window x2048", |b| {
        b.iter(|| {
            let mut ctx = PersistenceContext::new();
            let (interval, _) = ctx.new_interval_at(&walk[..window], 0.0);
            for slide in 0..slides {
                ctx.delete_left_endpoint(interval);
                ctx.insert_right_endpoint(interval, 1.0, walk[window + slide]);
            }
            black_box(ctx.global_max_value(interval));
        });
    });
}

criterion_group!(benches, construction, sliding_window);
criterion_main!(benches);

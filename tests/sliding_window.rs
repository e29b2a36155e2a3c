// Copyright (c) 2025-present, banana-tree contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A sliding window over a random walk, maintained by local operations
//! only: delete the left endpoint, append a right endpoint. After every
//! slide the maintained diagram must equal the diagram of a freshly built
//! interval over the current window.

mod common;

use banana_tree::{validation, PersistenceContext, SubDiagram};
use common::{assert_value_pairs_close, diagram_of, value_pairs};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use test_log::test;

fn random_walk(rng: &mut StdRng, len: usize) -> Vec<f64> {
    let mut values = Vec::with_capacity(len);
    let mut v = 0.0;
    for _ in 0..len {
        v += rng.random_range(-1.0..1.0);
        values.push(v);
        // Keep values generic: no two samples ever tie exactly.
        v += rng.random_range(0.0001..0.0002);
    }
    values
}

#[test]
fn sliding_window_matches_fresh_construction() {
    const WINDOW: usize = 10;
    const SLIDES: usize = 120;

    let mut rng = StdRng::seed_from_u64(7);
    let walk = random_walk(&mut rng, WINDOW + SLIDES);

    let mut ctx = PersistenceContext::new();
    let (interval, _items) = ctx.new_interval_at(&walk[..WINDOW], 0.0);

    for slide in 0..SLIDES {
        ctx.delete_left_endpoint(interval);
        ctx.insert_right_endpoint(interval, 1.0, walk[WINDOW + slide]);
        validation::validate_interval(&ctx, interval);
        assert!(ctx.validate_item_counts(interval));

        let window: Vec<f64> = ctx
            .interval_items(interval)
            .iter()
            .map(|&item| ctx.item_value(item))
            .collect();
        assert_eq!(window.len(), WINDOW);
        assert_eq!(window, walk[slide + 1..slide + 1 + WINDOW].to_vec());

        let mut fresh = PersistenceContext::new();
        let (fresh_interval, _) = fresh.new_interval_at(&window, 0.0);
        let maintained = diagram_of(&ctx, interval);
        let expected = diagram_of(&fresh, fresh_interval);
        for sub in [SubDiagram::Ordinary, SubDiagram::Essential, SubDiagram::Relative] {
            assert_value_pairs_close(
                &value_pairs(&ctx, &maintained, sub),
                &value_pairs(&fresh, &expected, sub),
                0.0,
            );
        }
    }
}

#[test]
fn sliding_window_by_interior_deletion() {
    // The same window law, but shrinking from the inside: delete the
    // second sample instead of the endpoint, then re-grow on the right.
    const WINDOW: usize = 8;
    const STEPS: usize = 40;

    let mut rng = StdRng::seed_from_u64(11);
    let walk = random_walk(&mut rng, WINDOW + STEPS);

    let mut ctx = PersistenceContext::new();
    let (interval, _items) = ctx.new_interval_at(&walk[..WINDOW], 0.0);

    for step in 0..STEPS {
        let second = ctx.interval_items(interval)[1];
        ctx.delete_item(interval, second);
        ctx.insert_right_endpoint(interval, 1.0, walk[WINDOW + step]);
        validation::validate_interval(&ctx, interval);

        let window: Vec<f64> = ctx
            .interval_items(interval)
            .iter()
            .map(|&item| ctx.item_value(item))
            .collect();
        let mut fresh = PersistenceContext::new();
        let (fresh_interval, _) = fresh.new_interval_at(&window, 0.0);
        let maintained = diagram_of(&ctx, interval);
        let expected = diagram_of(&fresh, fresh_interval);
        for sub in [SubDiagram::Ordinary, SubDiagram::Essential, SubDiagram::Relative] {
            assert_value_pairs_close(
                &value_pairs(&ctx, &maintained, sub),
                &value_pairs(&fresh, &expected, sub),
                0.0,
            );
        }
    }
}

#[test]
fn arena_recycling_keeps_allocation_bounded() {
    const WINDOW: usize = 16;
    const SLIDES: usize = 200;

    let mut rng = StdRng::seed_from_u64(23);
    let walk = random_walk(&mut rng, WINDOW + SLIDES);

    let mut ctx = PersistenceContext::new();
    let (interval, _items) = ctx.new_interval_at(&walk[..WINDOW], 0.0);
    for slide in 0..SLIDES {
        ctx.delete_left_endpoint(interval);
        ctx.insert_right_endpoint(interval, 1.0, walk[WINDOW + slide]);
    }
    let stats = ctx.item_arena_stats();
    assert!(
        stats.recyclings > 0,
        "sliding windows must reuse freed samples instead of growing the arena"
    );
    assert!(stats.live <= WINDOW + 8, "live samples stay bounded by the window");
}

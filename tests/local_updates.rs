// Copyright (c) 2025-present, banana-tree contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Local maintenance: value changes, slides, anticancellation and
//! cancellation, endpoint type flips, and item insertion/deletion.

mod common;

use banana_tree::{validation, Criticality, PersistenceContext};
use common::{assert_same_diagram, diagram_of, paper_values};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use test_log::test;

const D: usize = 1;
const E: usize = 2;
const I: usize = 6;
const J: usize = 7;
const O: usize = 12;

#[test]
fn value_round_trip_restores_the_diagram() {
    let mut ctx = PersistenceContext::new();
    let (interval, items) = ctx.new_interval_at(&paper_values(), 0.0);
    let before = diagram_of(&ctx, interval);

    ctx.change_value(interval, items[D], 12.5);
    validation::validate_interval(&ctx, interval);
    ctx.change_value(interval, items[D], 2.0);
    validation::validate_interval(&ctx, interval);

    let after = diagram_of(&ctx, interval);
    assert_same_diagram(&before, &after);
}

#[test]
fn max_increase_above_global_max_reassigns_it() {
    let mut ctx = PersistenceContext::new();
    let (interval, items) = ctx.new_interval_at(&paper_values(), 0.0);
    assert_eq!(ctx.global_max_item(interval), items[O]);

    ctx.change_value(interval, items[I], 13.5);
    validation::validate_interval(&ctx, interval);
    assert_eq!(ctx.global_max_item(interval), items[I]);
    assert_eq!(ctx.global_max_value(interval), 13.5);

    ctx.change_value(interval, items[I], 7.0);
    validation::validate_interval(&ctx, interval);
    assert_eq!(ctx.global_max_item(interval), items[O]);
}

#[test]
fn min_decrease_below_global_min_reassigns_it() {
    let mut ctx = PersistenceContext::new();
    let (interval, items) = ctx.new_interval_at(&paper_values(), 0.0);
    assert_eq!(ctx.global_min_item(interval), items[J]);

    ctx.change_value(interval, items[D], 0.25);
    validation::validate_interval(&ctx, interval);
    assert_eq!(ctx.global_min_item(interval), items[D]);

    ctx.change_value(interval, items[D], 2.0);
    validation::validate_interval(&ctx, interval);
    assert_eq!(ctx.global_min_item(interval), items[J]);
}

#[test]
fn every_extremum_survives_an_up_down_round_trip() {
    let values = paper_values();
    let mut ctx = PersistenceContext::new();
    let (interval, items) = ctx.new_interval_at(&values, 0.0);
    let before = diagram_of(&ctx, interval);

    // Push every sample up and back, then down and back; each intermediate
    // state must be a valid tree and the round trip must restore the
    // diagram.
    for idx in 0..values.len() {
        let original = values[idx];
        ctx.change_value(interval, items[idx], original + 4.25);
        validation::validate_interval(&ctx, interval);
        ctx.change_value(interval, items[idx], original);
        validation::validate_interval(&ctx, interval);

        ctx.change_value(interval, items[idx], original - 4.25);
        validation::validate_interval(&ctx, interval);
        ctx.change_value(interval, items[idx], original);
        validation::validate_interval(&ctx, interval);

        let after = diagram_of(&ctx, interval);
        assert_same_diagram(&before, &after);
    }
}

#[test]
fn anticancel_then_cancel_restores_the_diagram() {
    // Two fresh non-critical samples between g and h; the lower one rises
    // above the other, anticancelling a fresh banana, then drops back,
    // cancelling it again.
    let mut ctx = PersistenceContext::new();
    let (interval, _items) = ctx.new_interval_at(&paper_values(), 0.0);
    let before = diagram_of(&ctx, interval);

    let w1 = ctx.insert_item(interval, 4.3);
    let w2 = ctx.insert_item(interval, 4.6);
    assert_eq!(ctx.criticality(w1), Criticality::NonCritical);
    assert_eq!(ctx.criticality(w2), Criticality::NonCritical);
    validation::validate_interval(&ctx, interval);

    ctx.change_value(interval, w2, 6.5);
    assert_eq!(ctx.criticality(w2), Criticality::Maximum);
    assert_eq!(ctx.criticality(w1), Criticality::Minimum);
    validation::validate_interval(&ctx, interval);

    ctx.change_value(interval, w2, 5.0);
    assert_eq!(ctx.criticality(w2), Criticality::NonCritical);
    assert_eq!(ctx.criticality(w1), Criticality::NonCritical);
    validation::validate_interval(&ctx, interval);

    ctx.delete_item(interval, w2);
    validation::validate_interval(&ctx, interval);
    ctx.delete_item(interval, w1);
    validation::validate_interval(&ctx, interval);
    let after = diagram_of(&ctx, interval);
    assert_same_diagram(&before, &after);
}

#[test]
fn endpoint_type_flip_round_trip() {
    let mut ctx = PersistenceContext::new();
    let (interval, items) = ctx.new_interval_at(&paper_values(), 0.0);
    let before = diagram_of(&ctx, interval);

    // c = 6 is a down-type left endpoint (its neighbour d = 2 is lower).
    assert_eq!(ctx.criticality(items[0]), Criticality::DownType);
    ctx.change_value(interval, items[0], 1.5);
    assert_eq!(ctx.criticality(items[0]), Criticality::UpType);
    validation::validate_interval(&ctx, interval);

    ctx.change_value(interval, items[0], 6.0);
    assert_eq!(ctx.criticality(items[0]), Criticality::DownType);
    validation::validate_interval(&ctx, interval);

    let after = diagram_of(&ctx, interval);
    assert_same_diagram(&before, &after);
}

#[test]
fn insert_then_delete_item_restores_the_diagram() {
    let mut ctx = PersistenceContext::new();
    let (interval, items) = ctx.new_interval_at(&paper_values(), 0.0);
    let before = diagram_of(&ctx, interval);

    let inserted = ctx.insert_item_right_of(interval, items[E]);
    assert_eq!(ctx.criticality(inserted), Criticality::NonCritical);
    validation::validate_interval(&ctx, interval);

    // Make it critical, then delete it outright; deletion forces it back
    // to non-critical internally.
    ctx.change_value(interval, inserted, 0.5);
    assert_eq!(ctx.criticality(inserted), Criticality::Minimum);
    validation::validate_interval(&ctx, interval);

    ctx.delete_item(interval, inserted);
    validation::validate_interval(&ctx, interval);
    let after = diagram_of(&ctx, interval);
    assert_same_diagram(&before, &after);
}

#[test]
fn construction_equals_incremental_endpoint_insertion() {
    let values = paper_values();
    let mut whole = PersistenceContext::new();
    let (whole_interval, _) = whole.new_interval_at(&values, 0.0);

    let mut incremental = PersistenceContext::new();
    let (grown, _) = incremental.new_interval_at(&values[0..2], 0.0);
    for (idx, &value) in values.iter().enumerate().skip(2) {
        let item = incremental.insert_right_endpoint(grown, 1.0, value);
        assert_eq!(incremental.item_order(item), idx as f64);
        validation::validate_interval(&incremental, grown);
    }

    let a = diagram_of(&whole, whole_interval);
    let b = diagram_of(&incremental, grown);
    for sub in [
        banana_tree::SubDiagram::Ordinary,
        banana_tree::SubDiagram::Essential,
        banana_tree::SubDiagram::Relative,
    ] {
        let pa = common::value_pairs(&whole, &a, sub);
        let pb = common::value_pairs(&incremental, &b, sub);
        common::assert_value_pairs_close(&pa, &pb, 0.0);
    }
}

#[test]
fn endpoint_deletion_is_the_inverse_of_insertion() {
    let mut ctx = PersistenceContext::new();
    let (interval, _items) = ctx.new_interval_at(&paper_values(), 0.0);
    let before = diagram_of(&ctx, interval);

    ctx.insert_right_endpoint(interval, 1.0, 4.5);
    validation::validate_interval(&ctx, interval);
    ctx.delete_right_endpoint(interval);
    validation::validate_interval(&ctx, interval);

    ctx.insert_left_endpoint(interval, 1.0, 11.5);
    validation::validate_interval(&ctx, interval);
    ctx.delete_left_endpoint(interval);
    validation::validate_interval(&ctx, interval);

    let after = diagram_of(&ctx, interval);
    assert_same_diagram(&before, &after);
}

#[test]
fn random_walk_updates_maintain_all_invariants() {
    let mut rng = StdRng::seed_from_u64(0x0bad_beef);
    let mut values: Vec<f64> = Vec::new();
    let mut v = 0.0;
    for _ in 0..64 {
        v += rng.random_range(-1.0..1.0);
        values.push(v);
        v += rng.random_range(0.001..0.002);
    }

    let mut ctx = PersistenceContext::new();
    let (interval, items) = ctx.new_interval_at(&values, 0.0);
    validation::validate_interval(&ctx, interval);

    for step in 0..256 {
        let idx = rng.random_range(0..items.len());
        let delta = rng.random_range(-2.0..2.0);
        let target = ctx.item_value(items[idx]) + delta;
        ctx.change_value(interval, items[idx], target);
        validation::validate_interval(&ctx, interval);
        assert!(ctx.validate_item_counts(interval), "node counts diverged at step {step}");

        // The diagram must agree with a fresh construction of the same
        // values.
        let current: Vec<f64> = ctx
            .interval_items(interval)
            .iter()
            .map(|&it| ctx.item_value(it))
            .collect();
        let mut fresh = PersistenceContext::new();
        let (fresh_interval, _) = fresh.new_interval_at(&current, 0.0);
        let a = diagram_of(&ctx, interval);
        let b = diagram_of(&fresh, fresh_interval);
        for sub in [
            banana_tree::SubDiagram::Ordinary,
            banana_tree::SubDiagram::Essential,
            banana_tree::SubDiagram::Relative,
        ] {
            common::assert_value_pairs_close(
                &common::value_pairs(&ctx, &a, sub),
                &common::value_pairs(&fresh, &b, sub),
                0.0,
            );
        }
    }
}

#[test]
fn metrics_count_interchanges() {
    let mut ctx = PersistenceContext::new();
    let (interval, items) = ctx.new_interval_at(&paper_values(), 0.0);
    assert_eq!(ctx.metrics().total_interchanges(), 0);
    ctx.change_value(interval, items[I], 13.5);
    assert!(ctx.metrics().total_interchanges() > 0);
}

// Copyright (c) 2025-present, banana-tree contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Topological maintenance: gluing across all endpoint-type combinations,
//! cutting, and the cut/glue inverse laws.

mod common;

use banana_tree::{
    validation, IntervalId, PersistenceContext, PersistenceDiagram, SubDiagram,
};
use common::{assert_same_diagram, assert_value_pairs_close, diagram_of, paper_values, value_pairs};
use test_log::test;

/// Glues two freshly built intervals and checks the result against a fresh
/// construction of the concatenated values.
fn glue_and_check(left_values: &[f64], right_values: &[f64]) {
    let mut ctx = PersistenceContext::new();
    let (left, _) = ctx.new_interval_at(left_values, 0.0);
    let (right, _) = ctx.new_interval_at(right_values, 100.0);
    validation::validate_interval(&ctx, left);
    validation::validate_interval(&ctx, right);

    ctx.glue_intervals(left, right);
    assert_eq!(ctx.num_intervals(), 1);
    validation::validate_interval(&ctx, left);
    assert!(ctx.validate_item_counts(left));

    let glued = diagram_of(&ctx, left);

    let mut concatenated: Vec<f64> = left_values.to_vec();
    concatenated.extend_from_slice(right_values);
    let mut fresh = PersistenceContext::new();
    let (fresh_interval, _) = fresh.new_interval_at(&concatenated, 0.0);
    let expected = diagram_of(&fresh, fresh_interval);

    for sub in [SubDiagram::Ordinary, SubDiagram::Essential, SubDiagram::Relative] {
        assert_value_pairs_close(
            &value_pairs(&ctx, &glued, sub),
            &value_pairs(&fresh, &expected, sub),
            0.0,
        );
    }
}

/// Cuts right of `cut_order` and checks both parts against fresh
/// constructions of their samples.
fn cut_and_check(ctx: &mut PersistenceContext, interval: IntervalId, cut_order: f64) -> (IntervalId, IntervalId) {
    let cut_item = common::item_at(ctx, interval, cut_order);
    let (left, right) = ctx.cut_interval(interval, cut_item);
    assert_eq!(ctx.num_intervals(), 2);
    validation::validate_interval(ctx, left);
    validation::validate_interval(ctx, right);

    for part in [left, right] {
        let values: Vec<f64> = ctx
            .interval_items(part)
            .iter()
            .map(|&item| ctx.item_value(item))
            .collect();
        let mut fresh = PersistenceContext::new();
        let (fresh_interval, _) = fresh.new_interval_at(&values, 0.0);
        let got = diagram_of(ctx, part);
        let expected = diagram_of(&fresh, fresh_interval);
        for sub in [SubDiagram::Ordinary, SubDiagram::Essential, SubDiagram::Relative] {
            assert_value_pairs_close(
                &value_pairs(ctx, &got, sub),
                &value_pairs(&fresh, &expected, sub),
                0.0,
            );
        }
    }
    (left, right)
}

#[test]
fn glues_down_down_left_below_right() {
    glue_and_check(&[3.0, 1.0, 4.0], &[5.0, 2.0, 6.0]);
}

#[test]
fn glues_down_down_left_above_right() {
    glue_and_check(&[3.0, 1.0, 4.0], &[3.5, 0.5, 6.0]);
}

#[test]
fn glues_up_down_left_below_right() {
    glue_and_check(&[3.0, 6.0, 2.0], &[5.0, 1.0, 7.0]);
}

#[test]
fn glues_up_down_left_above_right() {
    glue_and_check(&[3.0, 6.0, 4.0], &[3.5, 1.0, 7.0]);
}

#[test]
fn glues_down_up_left_below_right() {
    glue_and_check(&[1.0, 0.2, 2.0], &[2.5, 7.0, 0.5, 6.0]);
}

#[test]
fn glues_down_up_left_above_right() {
    glue_and_check(&[1.0, 0.2, 3.0], &[2.5, 7.0, 0.5, 6.0]);
}

#[test]
fn glues_up_up_left_below_right() {
    glue_and_check(&[3.0, 6.0, 2.0], &[2.5, 7.0, 0.5, 6.5]);
}

#[test]
fn glues_up_up_left_above_right() {
    glue_and_check(&[3.0, 6.0, 2.8], &[2.5, 7.0, 0.5, 6.5]);
}

#[test]
fn glues_the_paper_example_split_in_half() {
    let values = paper_values();
    glue_and_check(&values[..7], &values[7..]);
}

#[test]
fn cuts_the_paper_example_between_j_and_k() {
    let mut ctx = PersistenceContext::new();
    let (interval, items) = ctx.new_interval_at(&paper_values(), 0.0);
    let (left, right) = cut_and_check(&mut ctx, interval, 7.0);

    // Left part: c..j plus the fresh endpoint.
    let left_diagram = diagram_of(&ctx, left);
    assert_value_pairs_close(
        &value_pairs(&ctx, &left_diagram, SubDiagram::Ordinary),
        &[(2.0, 12.0), (4.0, 7.0), (5.0, 8.0)],
        1e-9,
    );
    let essential = left_diagram.pairs(SubDiagram::Essential);
    assert_eq!(essential.len(), 1);
    assert_eq!(essential[0].birth, items[7], "the left part keeps the global minimum j");
    assert_eq!(essential[0].death, items[2], "e is the left part's global maximum");

    // Right part: k..o plus the fresh endpoint (value about 6).
    let right_diagram = diagram_of(&ctx, right);
    assert_value_pairs_close(
        &value_pairs(&ctx, &right_diagram, SubDiagram::Ordinary),
        &[(6.0, 11.0), (9.0, 10.0)],
        1e-6,
    );
    let essential = right_diagram.pairs(SubDiagram::Essential);
    assert_eq!(essential.len(), 1);
    assert_eq!(essential[0].birth, items[11], "n is the right part's global minimum");
    assert_eq!(essential[0].death, items[12], "o is the right part's global maximum");
}

#[test]
fn cut_then_glue_restores_the_diagram_exactly() {
    let mut ctx = PersistenceContext::new();
    let (interval, _items) = ctx.new_interval_at(&paper_values(), 0.0);
    let before = diagram_of(&ctx, interval);

    let (left, right) = cut_and_check(&mut ctx, interval, 7.0);
    ctx.glue_intervals(left, right);
    assert_eq!(ctx.num_intervals(), 1);
    validation::validate_interval(&ctx, left);

    let after = diagram_of(&ctx, left);
    assert_same_diagram(&before, &after);
}

#[test]
fn cut_at_every_admissible_position_round_trips() {
    let values = paper_values();
    for cut_order in 0..=10 {
        let mut ctx = PersistenceContext::new();
        let (interval, _items) = ctx.new_interval_at(&values, 0.0);
        let before = diagram_of(&ctx, interval);

        let (left, right) = cut_and_check(&mut ctx, interval, f64::from(cut_order));
        ctx.glue_intervals(left, right);
        validation::validate_interval(&ctx, left);
        let after = diagram_of(&ctx, left);
        assert_same_diagram(&before, &after);
    }
}

#[test]
fn glue_then_cut_separates_cleanly() {
    let mut ctx = PersistenceContext::new();
    let (left, left_items) = ctx.new_interval_at(&[3.0, 1.0, 4.0, 2.0, 5.0], 0.0);
    let (right, _) = ctx.new_interval_at(&[4.5, 1.5, 6.0, 0.5, 7.0], 100.0);
    ctx.glue_intervals(left, right);
    validation::validate_interval(&ctx, left);

    // Cut again at the old boundary; both parts must match fresh
    // constructions of their samples.
    let boundary = *left_items.last().expect("left interval has items");
    let (a, b) = ctx.cut_interval(left, boundary);
    validation::validate_interval(&ctx, a);
    validation::validate_interval(&ctx, b);
    for part in [a, b] {
        let values: Vec<f64> = ctx
            .interval_items(part)
            .iter()
            .map(|&item| ctx.item_value(item))
            .collect();
        let mut fresh = PersistenceContext::new();
        let (fresh_interval, _) = fresh.new_interval_at(&values, 0.0);
        let got = diagram_of(&ctx, part);
        let expected = diagram_of(&fresh, fresh_interval);
        for sub in [SubDiagram::Ordinary, SubDiagram::Essential, SubDiagram::Relative] {
            assert_value_pairs_close(
                &value_pairs(&ctx, &got, sub),
                &value_pairs(&fresh, &expected, sub),
                0.0,
            );
        }
    }
}

#[test]
fn gluing_many_pieces_back_together() {
    // Split the worked example into four pieces and glue them back in two
    // different association orders.
    let values = paper_values();
    for split in [[3_usize, 7, 10], [2, 6, 9]] {
        let mut ctx = PersistenceContext::new();
        let mut pieces = Vec::new();
        let mut start = 0;
        for &end in &split {
            #[allow(clippy::cast_precision_loss)]
            let (piece, _) = ctx.new_interval_at(&values[start..end], start as f64);
            pieces.push(piece);
            start = end;
        }
        #[allow(clippy::cast_precision_loss)]
        let (piece, _) = ctx.new_interval_at(&values[start..], start as f64);
        pieces.push(piece);

        ctx.glue_intervals(pieces[0], pieces[1]);
        ctx.glue_intervals(pieces[2], pieces[3]);
        ctx.glue_intervals(pieces[0], pieces[2]);
        assert_eq!(ctx.num_intervals(), 1);
        validation::validate_interval(&ctx, pieces[0]);

        let glued = diagram_of(&ctx, pieces[0]);
        let mut fresh = PersistenceContext::new();
        let (fresh_interval, _) = fresh.new_interval_at(&values, 0.0);
        let expected = diagram_of(&fresh, fresh_interval);
        for sub in [SubDiagram::Ordinary, SubDiagram::Essential, SubDiagram::Relative] {
            assert_value_pairs_close(
                &value_pairs(&ctx, &glued, sub),
                &value_pairs(&fresh, &expected, sub),
                0.0,
            );
        }
    }
}

#[test]
fn cut_keeps_short_wave_bananas_of_the_second_tree() {
    // After the up-tree has been cut, its spine labels describe the result,
    // not the input; the down-tree cut must still process a short-wave
    // banana whose maximum ended up on one of those fresh spines. With the
    // pairing below, the banana of the samples at orders 4 and 5 is exactly
    // that case for a cut right of order 5.
    let values = [
        16301.0, 12646.0, 15560.0, 18830.0, 38793.0, 22824.0, 23284.0, 53723.0, 19072.0, 27207.0,
    ];
    let mut ctx = PersistenceContext::new();
    let (interval, items) = ctx.new_interval_at(&values, 0.0);
    let (left, right) = cut_and_check(&mut ctx, interval, 5.0);

    // The left part's relative diagram pairs the fresh endpoint with the
    // sample at order 5, and its essential pair is (12646, 38793).
    let left_diagram = diagram_of(&ctx, left);
    assert_value_pairs_close(
        &value_pairs(&ctx, &left_diagram, SubDiagram::Relative),
        &[(16301.0, 12646.0), (23054.0, 22824.0)],
        1e-6,
    );
    let essential = left_diagram.pairs(SubDiagram::Essential);
    assert_eq!(essential[0].birth, items[1]);
    assert_eq!(essential[0].death, items[4]);
    let _ = right;
}

#[test]
fn deleting_an_interval_recycles_its_objects() {
    let mut ctx = PersistenceContext::new();
    let (interval, _items) = ctx.new_interval_at(&paper_values(), 0.0);
    let live_before = ctx.item_arena_stats().live;
    assert!(live_before > 0);
    ctx.delete_interval(interval);
    assert_eq!(ctx.item_arena_stats().live, 0);
    assert_eq!(ctx.num_intervals(), 0);

    // A new interval reuses the freed slots.
    let (_interval, _items) = ctx.new_interval_at(&paper_values(), 0.0);
    assert!(ctx.item_arena_stats().recyclings > 0);
}

#[test]
fn diagram_across_multiple_intervals() {
    let mut ctx = PersistenceContext::new();
    let (_a, a_items) = ctx.new_interval_at(&[1.0, 2.0], 0.0);
    let (_b, b_items) = ctx.new_interval_at(&[4.0, 3.0], 10.0);
    let mut diagram = PersistenceDiagram::default();
    ctx.compute_persistence_diagram(&mut diagram);
    assert_eq!(diagram.len(), 2);
    assert_eq!(diagram.death_of(a_items[0]), Some(a_items[1]));
    assert_eq!(diagram.death_of(b_items[1]), Some(b_items[0]));
}

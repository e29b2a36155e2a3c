// Copyright (c) 2025-present, banana-tree contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

#![allow(dead_code)]

use banana_tree::{
    IntervalId, ItemId, PersistenceContext, PersistenceDiagram, PersistentPair, SubDiagram,
};

/// The worked example: values at positions 0..=12.
#[must_use]
pub fn paper_values() -> Vec<f64> {
    vec![6.0, 2.0, 12.0, 5.0, 8.0, 4.0, 7.0, 1.0, 11.0, 9.0, 10.0, 3.0, 13.0]
}

/// Extracts the diagram of one interval.
#[must_use]
pub fn diagram_of(ctx: &PersistenceContext, interval: IntervalId) -> PersistenceDiagram {
    let mut diagram = PersistenceDiagram::default();
    ctx.compute_interval_diagram(interval, &mut diagram);
    diagram
}

/// Asserts that two diagrams of the same context are identical.
pub fn assert_same_diagram(a: &PersistenceDiagram, b: &PersistenceDiagram) {
    let diff = PersistenceDiagram::symmetric_difference(a, b);
    assert_eq!(diff.points, 0, "diagrams differ in {} points", diff.points);
    assert_eq!(diff.arrows, 0, "diagrams differ in {} arrows", diff.arrows);
}

/// The (birth value, death value) multiset of one sub-diagram, sorted.
#[must_use]
pub fn value_pairs(
    ctx: &PersistenceContext,
    diagram: &PersistenceDiagram,
    sub: SubDiagram,
) -> Vec<(f64, f64)> {
    let mut pairs: Vec<(f64, f64)> = diagram
        .pairs(sub)
        .into_iter()
        .map(|PersistentPair { birth, death }| (ctx.item_value(birth), ctx.item_value(death)))
        .collect();
    pairs.sort_by(|a, b| a.partial_cmp(b).expect("values are never NaN"));
    pairs
}

/// Asserts that two sorted value-pair lists agree within floating slack.
pub fn assert_value_pairs_close(a: &[(f64, f64)], b: &[(f64, f64)], tolerance: f64) {
    assert_eq!(a.len(), b.len(), "pair counts differ: {a:?} vs {b:?}");
    for (x, y) in a.iter().zip(b) {
        assert!(
            (x.0 - y.0).abs() <= tolerance && (x.1 - y.1).abs() <= tolerance,
            "pairs differ beyond tolerance: {x:?} vs {y:?}"
        );
    }
}

/// Looks up the sample handle of the item with the given order.
#[must_use]
pub fn item_at(ctx: &PersistenceContext, interval: IntervalId, order: f64) -> ItemId {
    ctx.interval_items(interval)
        .into_iter()
        .find(|&item| (ctx.item_order(item) - order).abs() < 1e-12)
        .expect("no sample at that order")
}

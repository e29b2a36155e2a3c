// Copyright (c) 2025-present, banana-tree contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Structural tests on the worked 13-sample example and on the smallest
//! possible interval, pinning the exact pointer structure of both trees.

mod common;

use banana_tree::{validation, NodeRef, PersistenceContext, PersistenceDiagram, Sign, SubDiagram};
use common::paper_values;
use test_log::test;

const C: usize = 0;
const D: usize = 1;
const E: usize = 2;
const F: usize = 3;
const G: usize = 4;
const H: usize = 5;
const I: usize = 6;
const J: usize = 7;
const K: usize = 8;
const L: usize = 9;
const M: usize = 10;
const N: usize = 11;
const O: usize = 12;

#[test]
fn simple_up_tree_construction() {
    let mut ctx = PersistenceContext::new();
    let (interval, items) = ctx.new_interval_at(&[0.0, 1.0], 0.0);
    let item = |n: usize| Some(NodeRef::Item(items[n]));

    let v0 = ctx.node_view(interval, Sign::Up, NodeRef::Item(items[0])).unwrap();
    assert!(v0.is_leaf);
    assert_eq!(v0.death, Some(NodeRef::SpecialRoot));
    assert_eq!(v0.r#in, Some(NodeRef::SpecialRoot));
    assert_eq!(v0.mid, item(1));
    assert!(v0.spine.on_left());

    let hook = ctx.node_view(interval, Sign::Up, NodeRef::RightHook).unwrap();
    assert!(hook.is_leaf);
    assert_eq!(hook.death, item(1));
    assert!(hook.spine.on_right());

    let v1 = ctx.node_view(interval, Sign::Up, NodeRef::Item(items[1])).unwrap();
    assert_eq!(v1.low, item(0));
    assert_eq!(v1.down, item(0));
    assert_eq!(v1.up, Some(NodeRef::SpecialRoot));
    assert_eq!(v1.r#in, Some(NodeRef::RightHook));
    assert_eq!(v1.mid, Some(NodeRef::RightHook));
    assert!(v1.spine.on_right());

    let sr = ctx.node_view(interval, Sign::Up, NodeRef::SpecialRoot).unwrap();
    assert_eq!(sr.r#in, item(0));
    assert_eq!(sr.mid, item(1));
    assert!(sr.spine.on_left() && sr.spine.on_right());

    assert!(ctx.node_view(interval, Sign::Up, NodeRef::LeftHook).is_none());
    assert_eq!(ctx.global_max_item(interval), items[1]);

    validation::validate_interval(&ctx, interval);
}

#[test]
fn simple_down_tree_construction() {
    let mut ctx = PersistenceContext::new();
    let (interval, items) = ctx.new_interval_at(&[0.0, 1.0], 0.0);
    let item = |n: usize| Some(NodeRef::Item(items[n]));

    let v0 = ctx.node_view(interval, Sign::Down, NodeRef::Item(items[0])).unwrap();
    assert_eq!(v0.low, item(1));
    assert_eq!(v0.up, Some(NodeRef::SpecialRoot));
    assert_eq!(v0.down, item(1));
    assert_eq!(v0.r#in, Some(NodeRef::LeftHook));
    assert_eq!(v0.mid, Some(NodeRef::LeftHook));
    assert!(v0.spine.on_left());

    let hook = ctx.node_view(interval, Sign::Down, NodeRef::LeftHook).unwrap();
    assert!(hook.is_leaf);
    assert_eq!(hook.death, item(0));
    assert!(hook.spine.on_left());

    let v1 = ctx.node_view(interval, Sign::Down, NodeRef::Item(items[1])).unwrap();
    assert!(v1.is_leaf);
    assert_eq!(v1.r#in, item(0));
    assert_eq!(v1.mid, Some(NodeRef::SpecialRoot));
    assert!(v1.spine.on_right());

    let sr = ctx.node_view(interval, Sign::Down, NodeRef::SpecialRoot).unwrap();
    assert_eq!(sr.r#in, item(0));
    assert_eq!(sr.mid, item(1));

    assert!(ctx.node_view(interval, Sign::Down, NodeRef::RightHook).is_none());
    assert_eq!(ctx.global_min_item(interval), items[0]);
}

#[test]
#[allow(clippy::too_many_lines)]
fn paper_example_up_tree_constructs_correctly() {
    let mut ctx = PersistenceContext::new();
    let (interval, items) = ctx.new_interval_at(&paper_values(), 0.0);
    let item = |n: usize| Some(NodeRef::Item(items[n]));
    let view = |ctx: &PersistenceContext, n: usize| {
        ctx.node_view(interval, Sign::Up, NodeRef::Item(items[n])).unwrap()
    };

    assert_eq!(ctx.global_max_item(interval), items[O]);

    let c = view(&ctx, C);
    assert_eq!(c.up, item(E));
    assert_eq!(c.down, item(D));
    assert_eq!(c.r#in, Some(NodeRef::LeftHook));
    assert_eq!(c.mid, Some(NodeRef::LeftHook));
    assert_eq!(c.low, item(D));
    assert_eq!(c.death, None);
    assert!(c.on_in_trail);
    assert!(c.spine.on_left() && !c.spine.on_right());

    let d = view(&ctx, D);
    assert_eq!(d.up, None);
    assert_eq!(d.down, None);
    assert_eq!(d.r#in, item(C));
    assert_eq!(d.mid, item(E));
    assert_eq!(d.low, item(D));
    assert_eq!(d.death, item(E));
    assert!(!d.spine.on_spine());

    let e = view(&ctx, E);
    assert_eq!(e.up, Some(NodeRef::SpecialRoot));
    assert_eq!(e.down, item(G));
    assert_eq!(e.r#in, item(C));
    assert_eq!(e.mid, item(D));
    assert_eq!(e.low, item(J));
    assert!(e.on_in_trail);
    assert!(e.spine.on_left() && !e.spine.on_right());

    let f = view(&ctx, F);
    assert_eq!(f.r#in, item(G));
    assert_eq!(f.mid, item(G));
    assert_eq!(f.low, item(F));
    assert_eq!(f.death, item(G));
    assert!(!f.spine.on_spine());

    let g = view(&ctx, G);
    assert_eq!(g.up, item(E));
    assert_eq!(g.down, item(I));
    assert_eq!(g.r#in, item(F));
    assert_eq!(g.mid, item(F));
    assert_eq!(g.low, item(J));
    assert!(g.on_in_trail);
    assert!(!g.spine.on_spine());

    let h = view(&ctx, H);
    assert_eq!(h.r#in, item(I));
    assert_eq!(h.mid, item(I));
    assert_eq!(h.death, item(I));
    assert!(!h.spine.on_spine());

    let i = view(&ctx, I);
    assert_eq!(i.up, item(G));
    assert_eq!(i.down, item(J));
    assert_eq!(i.r#in, item(H));
    assert_eq!(i.mid, item(H));
    assert_eq!(i.low, item(J));
    assert!(i.on_in_trail);
    assert!(!i.spine.on_spine());

    let j = view(&ctx, J);
    assert_eq!(j.up, None);
    assert_eq!(j.down, None);
    assert_eq!(j.r#in, item(I));
    assert_eq!(j.mid, item(K));
    assert_eq!(j.low, item(J));
    assert_eq!(j.death, Some(NodeRef::SpecialRoot));
    assert!(!j.spine.on_spine());

    let k = view(&ctx, K);
    assert_eq!(k.up, item(O));
    assert_eq!(k.down, item(J));
    assert_eq!(k.r#in, item(N));
    assert_eq!(k.mid, item(M));
    assert_eq!(k.low, item(J));
    assert!(k.on_mid_trail);
    assert!(!k.spine.on_spine());

    let l = view(&ctx, L);
    assert_eq!(l.r#in, item(M));
    assert_eq!(l.mid, item(M));
    assert_eq!(l.death, item(M));
    assert!(!l.spine.on_spine());

    let m = view(&ctx, M);
    assert_eq!(m.up, item(K));
    assert_eq!(m.down, item(N));
    assert_eq!(m.r#in, item(L));
    assert_eq!(m.mid, item(L));
    assert_eq!(m.low, item(N));
    assert!(m.on_mid_trail);
    assert!(!m.spine.on_spine());

    let n = view(&ctx, N);
    assert_eq!(n.r#in, item(K));
    assert_eq!(n.mid, item(M));
    assert_eq!(n.low, item(N));
    assert_eq!(n.death, item(K));
    assert!(!n.spine.on_spine());

    let o = view(&ctx, O);
    assert_eq!(o.up, Some(NodeRef::SpecialRoot));
    assert_eq!(o.down, item(K));
    assert_eq!(o.r#in, Some(NodeRef::RightHook));
    assert_eq!(o.mid, Some(NodeRef::RightHook));
    assert_eq!(o.low, item(J));
    assert!(o.on_mid_trail);
    assert!(o.spine.on_right() && !o.spine.on_left());

    let left_hook = ctx.node_view(interval, Sign::Up, NodeRef::LeftHook).unwrap();
    assert_eq!(left_hook.r#in, item(C));
    assert_eq!(left_hook.mid, item(C));
    assert_eq!(left_hook.death, item(C));
    assert!(left_hook.spine.on_left());

    let right_hook = ctx.node_view(interval, Sign::Up, NodeRef::RightHook).unwrap();
    assert_eq!(right_hook.r#in, item(O));
    assert_eq!(right_hook.mid, item(O));
    assert_eq!(right_hook.death, item(O));
    assert!(right_hook.spine.on_right());

    let sr = ctx.node_view(interval, Sign::Up, NodeRef::SpecialRoot).unwrap();
    assert_eq!(sr.r#in, item(E));
    assert_eq!(sr.mid, item(O));
    assert_eq!(sr.low, item(J));
    assert!(sr.spine.on_left() && sr.spine.on_right());

    validation::validate_interval(&ctx, interval);
}

#[test]
#[allow(clippy::too_many_lines)]
fn paper_example_down_tree_constructs_correctly() {
    let mut ctx = PersistenceContext::new();
    let (interval, items) = ctx.new_interval_at(&paper_values(), 0.0);
    let item = |n: usize| Some(NodeRef::Item(items[n]));
    let view = |ctx: &PersistenceContext, n: usize| {
        ctx.node_view(interval, Sign::Down, NodeRef::Item(items[n])).unwrap()
    };

    assert_eq!(ctx.global_min_item(interval), items[J]);

    let c = view(&ctx, C);
    assert_eq!(c.r#in, item(D));
    assert_eq!(c.mid, item(D));
    assert_eq!(c.low, item(C));
    assert_eq!(c.death, item(D));
    assert!(c.spine.on_left() && !c.spine.on_right());

    let d = view(&ctx, D);
    assert_eq!(d.up, item(J));
    assert_eq!(d.down, item(E));
    assert_eq!(d.r#in, item(C));
    assert_eq!(d.mid, item(C));
    assert_eq!(d.low, item(E));
    assert!(d.on_in_trail);
    assert!(d.spine.on_left());

    let e = view(&ctx, E);
    assert_eq!(e.r#in, item(D));
    assert_eq!(e.mid, item(F));
    assert_eq!(e.low, item(E));
    assert_eq!(e.death, item(J));
    assert!(!e.spine.on_spine());

    let f = view(&ctx, F);
    assert_eq!(f.up, item(H));
    assert_eq!(f.down, item(E));
    assert_eq!(f.r#in, item(G));
    assert_eq!(f.mid, item(G));
    assert_eq!(f.low, item(E));
    assert!(f.on_mid_trail);
    assert!(!f.spine.on_spine());

    let g = view(&ctx, G);
    assert_eq!(g.r#in, item(F));
    assert_eq!(g.mid, item(F));
    assert_eq!(g.low, item(G));
    assert_eq!(g.death, item(F));
    assert!(!g.spine.on_spine());

    let h = view(&ctx, H);
    assert_eq!(h.up, item(J));
    assert_eq!(h.down, item(F));
    assert_eq!(h.r#in, item(I));
    assert_eq!(h.mid, item(I));
    assert_eq!(h.low, item(E));
    assert!(h.on_mid_trail);
    assert!(!h.spine.on_spine());

    let i = view(&ctx, I);
    assert_eq!(i.r#in, item(H));
    assert_eq!(i.mid, item(H));
    assert_eq!(i.low, item(I));
    assert_eq!(i.death, item(H));
    assert!(!i.spine.on_spine());

    let j = view(&ctx, J);
    assert_eq!(j.up, Some(NodeRef::SpecialRoot));
    assert_eq!(j.down, item(N));
    assert_eq!(j.r#in, item(D));
    assert_eq!(j.mid, item(H));
    assert_eq!(j.low, item(O));
    assert!(j.on_in_trail);
    assert!(j.spine.on_left());

    let k = view(&ctx, K);
    assert_eq!(k.r#in, item(N));
    assert_eq!(k.mid, item(L));
    assert_eq!(k.low, item(K));
    assert_eq!(k.death, item(N));
    assert!(!k.spine.on_spine());

    let l = view(&ctx, L);
    assert_eq!(l.up, item(N));
    assert_eq!(l.down, item(K));
    assert_eq!(l.r#in, item(M));
    assert_eq!(l.mid, item(M));
    assert_eq!(l.low, item(K));
    assert!(l.on_mid_trail);
    assert!(!l.spine.on_spine());

    let m = view(&ctx, M);
    assert_eq!(m.r#in, item(L));
    assert_eq!(m.mid, item(L));
    assert_eq!(m.low, item(M));
    assert_eq!(m.death, item(L));
    assert!(!m.spine.on_spine());

    let n = view(&ctx, N);
    assert_eq!(n.up, item(J));
    assert_eq!(n.down, item(O));
    assert_eq!(n.r#in, item(K));
    assert_eq!(n.mid, item(L));
    assert_eq!(n.low, item(O));
    assert!(n.on_in_trail);
    assert!(!n.spine.on_spine());

    let o = view(&ctx, O);
    assert_eq!(o.up, None);
    assert_eq!(o.down, None);
    assert_eq!(o.r#in, item(N));
    assert_eq!(o.mid, Some(NodeRef::SpecialRoot));
    assert_eq!(o.low, item(O));
    assert_eq!(o.death, Some(NodeRef::SpecialRoot));
    assert!(o.spine.on_right());

    let sr = ctx.node_view(interval, Sign::Down, NodeRef::SpecialRoot).unwrap();
    assert_eq!(sr.r#in, item(J));
    assert_eq!(sr.mid, item(O));
    assert_eq!(sr.low, item(O));

    assert!(ctx.node_view(interval, Sign::Down, NodeRef::LeftHook).is_none());
    assert!(ctx.node_view(interval, Sign::Down, NodeRef::RightHook).is_none());
}

#[test]
fn walks_paper_example_up_tree_correctly() {
    let mut ctx = PersistenceContext::new();
    let (interval, items) = ctx.new_interval_at(&paper_values(), 0.0);
    let item = |n: usize| NodeRef::Item(items[n]);

    let bananas = ctx.walk_pairs(interval, Sign::Up);
    assert_eq!(
        bananas,
        vec![
            (item(J), NodeRef::SpecialRoot),
            (item(H), item(I)),
            (item(F), item(G)),
            (item(D), item(E)),
            (NodeRef::LeftHook, item(C)),
            (item(N), item(K)),
            (item(L), item(M)),
            (NodeRef::RightHook, item(O)),
        ]
    );
}

#[test]
fn walks_paper_example_down_tree_correctly() {
    let mut ctx = PersistenceContext::new();
    let (interval, items) = ctx.new_interval_at(&paper_values(), 0.0);
    let item = |n: usize| NodeRef::Item(items[n]);

    let bananas = ctx.walk_pairs(interval, Sign::Down);
    assert_eq!(
        bananas,
        vec![
            (item(O), NodeRef::SpecialRoot),
            (item(K), item(N)),
            (item(M), item(L)),
            (item(E), item(J)),
            (item(C), item(D)),
            (item(G), item(F)),
            (item(I), item(H)),
        ]
    );
}

#[test]
fn extracts_paper_example_diagram_correctly() {
    let mut ctx = PersistenceContext::new();
    let (interval, items) = ctx.new_interval_at(&paper_values(), 0.0);
    let mut diagram = PersistenceDiagram::default();
    ctx.compute_persistence_diagram(&mut diagram);

    // Partners in the essential and ordinary sub-diagrams.
    assert_eq!(diagram.death_of(items[D]), Some(items[E]));
    assert_eq!(diagram.death_of(items[F]), Some(items[G]));
    assert_eq!(diagram.death_of(items[H]), Some(items[I]));
    assert_eq!(diagram.death_of(items[J]), Some(items[O]));
    assert_eq!(diagram.death_of(items[N]), Some(items[K]));
    assert_eq!(diagram.death_of(items[L]), Some(items[M]));

    // Arrows in the essential and ordinary sub-diagrams.
    assert_eq!(diagram.parent_of(items[D]).map(|p| p.birth), Some(items[J]));
    assert_eq!(diagram.parent_of(items[F]).map(|p| p.birth), Some(items[J]));
    assert_eq!(diagram.parent_of(items[H]).map(|p| p.birth), Some(items[J]));
    assert_eq!(diagram.parent_of(items[J]), None);
    assert_eq!(diagram.parent_of(items[N]).map(|p| p.birth), Some(items[J]));
    assert_eq!(diagram.parent_of(items[L]).map(|p| p.birth), Some(items[N]));

    // Partners in the relative sub-diagram.
    assert_eq!(diagram.death_of(items[C]), Some(items[D]));
    assert_eq!(diagram.death_of(items[E]), Some(items[J]));
    assert_eq!(diagram.death_of(items[G]), Some(items[F]));
    assert_eq!(diagram.death_of(items[I]), Some(items[H]));
    assert_eq!(diagram.death_of(items[K]), Some(items[N]));
    assert_eq!(diagram.death_of(items[M]), Some(items[L]));

    // Arrows in the relative sub-diagram.
    assert_eq!(diagram.parent_of(items[C]).map(|p| p.birth), Some(items[E]));
    assert_eq!(diagram.parent_of(items[G]).map(|p| p.birth), Some(items[E]));
    assert_eq!(diagram.parent_of(items[I]).map(|p| p.birth), Some(items[E]));
    assert_eq!(diagram.parent_of(items[M]).map(|p| p.birth), Some(items[K]));

    // Counts per sub-diagram.
    assert_eq!(diagram.pairs(SubDiagram::Ordinary).len(), 5);
    assert_eq!(diagram.pairs(SubDiagram::Essential).len(), 1);
    assert_eq!(diagram.pairs(SubDiagram::Relative).len(), 6);
}

#[test]
fn monotone_sequence_has_only_the_essential_pair() {
    let mut ctx = PersistenceContext::new();
    let (interval, items) = ctx.new_interval_at(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.0);
    let diagram = common::diagram_of(&ctx, interval);
    assert!(diagram.pairs(SubDiagram::Ordinary).is_empty());
    assert!(diagram.pairs(SubDiagram::Relative).is_empty());
    assert_eq!(diagram.pairs(SubDiagram::Essential).len(), 1);
    assert_eq!(diagram.death_of(items[0]), Some(items[4]));
    validation::validate_interval(&ctx, interval);
}

#[test]
fn two_samples_have_empty_diagrams_except_one_essential_point() {
    let mut ctx = PersistenceContext::new();
    let (interval, items) = ctx.new_interval_at(&[0.5, 2.5], 0.0);
    let diagram = common::diagram_of(&ctx, interval);
    assert_eq!(diagram.len(), 1);
    assert_eq!(diagram.death_of(items[0]), Some(items[1]));
}

#[test]
fn wiggle_between_i_and_j_keeps_string_order() {
    // The worked example with an extra non-critical-adjacent pair between
    // i and j.
    let values = [6.0, 2.0, 12.0, 5.0, 8.0, 4.0, 7.0, 1.5, 2.5, 1.0, 11.0, 9.0, 10.0, 3.0, 13.0];
    let mut ctx = PersistenceContext::new();
    let (interval, _items) = ctx.new_interval_at(&values, 0.0);
    validation::validate_interval(&ctx, interval);
    assert!(ctx.validate_item_counts(interval));
}

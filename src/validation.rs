// Copyright (c) 2025-present, banana-tree contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Structural validation of a context's intervals.
//!
//! These checks walk the full structure and panic with a description on the
//! first violation. They are meant for tests and debugging; every mutating
//! operation of the engine is expected to leave all of them satisfied.

use crate::arena::{Handle, IntervalId, ItemId, NodeId};
use crate::context::PersistenceContext;
use crate::interval::Interval;
use crate::store::Store;
use crate::tree::{
    birth, is_internal, is_leaf, is_special_root, node_item, node_value, walk, BananaTree,
};
use crate::types::{DOWN, UP};

/// Validates both trees, the dictionaries and the node assignments of one
/// interval.
///
/// # Panics
///
/// Panics with a description of the first violated invariant.
pub fn validate_interval(ctx: &PersistenceContext, interval: IntervalId) {
    let s = ctx.store();
    let ival = ctx.interval(interval);
    validate_tree::<UP>(s, &ival.persistence.up, ival);
    validate_tree::<DOWN>(s, &ival.persistence.down, ival);
    validate_dictionaries(s, ival);
    validate_node_assignments(s, ival);
}

fn items_of(s: &Store, ival: &Interval) -> Vec<ItemId> {
    ival.items(s)
}

fn validate_tree<const SIGN: i8>(s: &Store, tree: &BananaTree<SIGN>, ival: &Interval) {
    let special_root = tree.special_root(s);
    assert!(special_root.is_some(), "a constructed tree has a special root");
    assert!(
        is_special_root::<SIGN>(s, special_root),
        "the special root must satisfy its defining pointer pattern"
    );

    for (p, q) in walk::collect_walk(tree, s) {
        assert!(is_leaf::<SIGN>(s, p), "births are leaves (sign {SIGN})");
        assert!(is_internal::<SIGN>(s, q), "deaths are internal (sign {SIGN})");
        assert_eq!(
            s.nodes::<SIGN>()[p].death,
            q,
            "death pointer must close the banana (sign {SIGN})"
        );
        assert_eq!(birth::<SIGN>(s, q), p, "in/low must lead back to the birth (sign {SIGN})");

        // Invariant I2: a minimum dies strictly above the lower end of the
        // trail that kills it. The global minimum is its own trail low.
        let death_low = s.nodes::<SIGN>()[q].low;
        if death_low != p {
            assert!(
                node_value::<SIGN>(s, p) > node_value::<SIGN>(s, death_low),
                "I2: a birth must lie above the killing trail's low (sign {SIGN})"
            );
        }

        validate_invariant_1::<SIGN>(s, q);
        if q != special_root {
            validate_invariant_3::<SIGN>(s, q);
        }
        validate_trail_pointer_match::<SIGN>(s, q);
    }

    validate_string_order(s, tree, ival);
    validate_spine_labels(s, tree);
}

/// Invariant I1: the descendants of a maximum through in/mid lie on the
/// birth's side of it, those through down on the opposite side.
fn validate_invariant_1<const SIGN: i8>(s: &Store, max_node: NodeId) {
    let max_order = s.items.order(node_item::<SIGN>(s, max_node));
    let birth_order = s.items.order(node_item::<SIGN>(s, birth::<SIGN>(s, max_node)));
    let nodes = s.nodes::<SIGN>();
    let less = birth_order < max_order;
    descendants_on_side::<SIGN>(s, nodes[max_node].r#in, max_order, less);
    descendants_on_side::<SIGN>(s, nodes[max_node].mid, max_order, less);
    if nodes[max_node].down.is_some() {
        descendants_on_side::<SIGN>(s, nodes[max_node].down, max_order, !less);
    }
}

fn descendants_on_side<const SIGN: i8>(s: &Store, node: NodeId, pivot: f64, want_less: bool) {
    let order = s.items.order(node_item::<SIGN>(s, node));
    assert!(
        if want_less { order < pivot } else { order > pivot },
        "I1: subtree on the wrong side of its maximum (sign {SIGN})"
    );
    if is_leaf::<SIGN>(s, node) {
        return;
    }
    let nodes = s.nodes::<SIGN>();
    descendants_on_side::<SIGN>(s, nodes[node].r#in, pivot, want_less);
    descendants_on_side::<SIGN>(s, nodes[node].mid, pivot, want_less);
    descendants_on_side::<SIGN>(s, nodes[node].down, pivot, want_less);
}

/// Invariant I3: values increase along a trail and positions are monotone.
fn validate_invariant_3<const SIGN: i8>(s: &Store, max_node: NodeId) {
    let nodes = s.nodes::<SIGN>();
    let up = nodes[max_node].up;
    let down = nodes[max_node].down;
    assert!(
        node_value::<SIGN>(s, up) > node_value::<SIGN>(s, max_node)
            && node_value::<SIGN>(s, max_node) > node_value::<SIGN>(s, down),
        "I3: values along a trail must increase upwards (sign {SIGN})"
    );
    let up_order = s.items.order(node_item::<SIGN>(s, up));
    let max_order = s.items.order(node_item::<SIGN>(s, max_node));
    let down_order = s.items.order(node_item::<SIGN>(s, down));
    let ok = if nodes[up].r#in == max_node {
        // At the top of an in-trail the banana folds back over its birth.
        (up_order < max_order && down_order < max_order)
            || (up_order > max_order && down_order > max_order)
    } else {
        (up_order < max_order && max_order < down_order)
            || (down_order < max_order && max_order < up_order)
    };
    assert!(ok, "I3: positions along a trail must be monotone (sign {SIGN})");
}

/// The in/mid pointers of a maximum and of its birth must bound the same
/// two trails.
fn validate_trail_pointer_match<const SIGN: i8>(s: &Store, max_node: NodeId) {
    let nodes = s.nodes::<SIGN>();
    let b = birth::<SIGN>(s, max_node);

    let mid_matches = if nodes[max_node].mid == b {
        nodes[b].mid == max_node
    } else {
        let mut mid_node = nodes[max_node].mid;
        while nodes[mid_node].down != b {
            mid_node = nodes[mid_node].down;
            assert!(mid_node.is_some(), "ran into a disconnected mid-trail");
        }
        nodes[b].mid == mid_node
    };
    let in_matches = if nodes[max_node].r#in == b {
        nodes[b].r#in == max_node
    } else {
        let mut in_node = nodes[max_node].r#in;
        while nodes[in_node].down != b {
            in_node = nodes[in_node].down;
            assert!(in_node.is_some(), "ran into a disconnected in-trail");
        }
        nodes[b].r#in == in_node
    };
    assert!(
        mid_matches && in_matches,
        "trail tops and bottoms must describe the same trails (sign {SIGN})"
    );
}

/// The string order of the tree equals the sequence of critical samples.
fn validate_string_order<const SIGN: i8>(s: &Store, tree: &BananaTree<SIGN>, ival: &Interval) {
    let string = walk::string_items(tree, s);
    for pair in string.windows(2) {
        assert!(
            s.items.order(pair[0]) < s.items.order(pair[1]),
            "string order must increase along the interval (sign {SIGN})"
        );
    }
    let critical: Vec<ItemId> = items_of(s, ival)
        .into_iter()
        .filter(|&item| s.items.is_critical::<SIGN>(item))
        .collect();
    assert_eq!(
        string, critical,
        "tree must represent exactly the critical samples (sign {SIGN})"
    );
}

/// Spine labels are exactly the nodes reachable via `in*` from the special
/// root (left) and via `mid` then `in*` (right).
fn validate_spine_labels<const SIGN: i8>(s: &Store, tree: &BananaTree<SIGN>) {
    let special_root = tree.special_root(s);
    let nodes = s.nodes::<SIGN>();
    assert!(
        nodes[special_root].spine.on_left() && nodes[special_root].spine.on_right(),
        "the special root lies on both spines (sign {SIGN})"
    );

    let mut left_spine = Vec::new();
    let mut c = nodes[special_root].r#in;
    loop {
        left_spine.push(c);
        if is_leaf::<SIGN>(s, c) {
            break;
        }
        c = nodes[c].r#in;
    }
    let mut right_spine = Vec::new();
    let mut c = nodes[special_root].mid;
    loop {
        right_spine.push(c);
        if is_leaf::<SIGN>(s, c) {
            break;
        }
        c = nodes[c].r#in;
    }

    for n in tree.string(s) {
        if n == special_root {
            continue;
        }
        let on_left = left_spine.contains(&n);
        let on_right = right_spine.contains(&n);
        let label = nodes[n].spine;
        assert!(
            !(label.on_left() && label.on_right()),
            "only the special root may lie on both spines (sign {SIGN})"
        );
        assert_eq!(
            label.on_left(),
            on_left,
            "left-spine label disagrees with reachability (sign {SIGN})"
        );
        assert_eq!(
            label.on_right(),
            on_right,
            "right-spine label disagrees with reachability (sign {SIGN})"
        );
    }
}

/// Every sample sits in exactly the dictionary its criticality dictates.
fn validate_dictionaries(s: &Store, ival: &Interval) {
    let mut expected_min = Vec::new();
    let mut expected_max = Vec::new();
    let mut expected_nc = Vec::new();
    for item in items_of(s, ival) {
        if s.items.is_minimum::<UP>(item) || s.items.is_up_type::<UP>(item) {
            expected_min.push(item);
        } else if s.items.is_maximum::<UP>(item) || s.items.is_down_type::<UP>(item) {
            expected_max.push(item);
        } else {
            expected_nc.push(item);
        }
    }
    assert_eq!(
        ival.min_dict.items_in_order(),
        expected_min,
        "minima dictionary must hold exactly the minima and up-type endpoints"
    );
    assert_eq!(
        ival.max_dict.items_in_order(),
        expected_max,
        "maxima dictionary must hold exactly the maxima and down-type endpoints"
    );
    assert_eq!(
        ival.nc_dict.items_in_order(),
        expected_nc,
        "non-critical dictionary must hold exactly the non-critical samples"
    );
}

/// Node back-links exist exactly for critical samples and point back.
fn validate_node_assignments(s: &Store, ival: &Interval) {
    for item in items_of(s, ival) {
        let up_node = s.items.node::<UP>(item);
        assert_eq!(
            up_node.is_some(),
            s.items.is_critical::<UP>(item),
            "a sample has an up-tree node exactly when critical under sign +1"
        );
        if up_node.is_some() {
            assert_eq!(s.nodes::<UP>()[up_node].item, item, "up-node back-link mismatch");
        }
        let down_node = s.items.node::<DOWN>(item);
        assert_eq!(
            down_node.is_some(),
            s.items.is_critical::<DOWN>(item),
            "a sample has a down-tree node exactly when critical under sign -1"
        );
        if down_node.is_some() {
            assert_eq!(s.nodes::<DOWN>()[down_node].item, item, "down-node back-link mismatch");
        }
    }
}

// Copyright (c) 2025-present, banana-tree contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! The banana tree: the pointer structure that stores a persistence diagram
//! implicitly as a pairing of extrema.
//!
//! The tree is parameterised by a compile-time sign: `BananaTree<1>` is the
//! up-tree, `BananaTree<-1>` the structurally identical down-tree run on
//! value-negated samples. Nodes themselves are sign-free (only their
//! interpretation differs), which lets one node type serve both arenas.
//!
//! Every local and topological operation is assembled from the constant-time
//! pointer rewrites defined here (unlink from trail, insert on top/bottom of
//! a trail, banana swaps, trail merges and the fatality swap).

pub(crate) mod construction;
pub(crate) mod local;
pub(crate) mod topology;
pub(crate) mod walk;

use crate::arena::{Handle, ItemId, NodeId};
use crate::store::Store;
use crate::types::{raw_from_signed, tiny_offset, Value};

/// Position of a node relative to the two spines.
///
/// The left spine consists of the nodes reachable from the special root via
/// iterated `in` pointers, the right spine of those reachable via `mid`
/// followed by iterated `in`. Only the special root lies on both.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum SpineLabel {
    /// Not on either spine.
    #[default]
    NotOnSpine,
    /// On the left spine.
    OnLeftSpine,
    /// On the right spine.
    OnRightSpine,
    /// On both spines (the special root).
    OnBothSpines,
}

impl SpineLabel {
    /// True for left-spine nodes and the special root.
    #[must_use]
    pub fn on_left(self) -> bool {
        matches!(self, Self::OnLeftSpine | Self::OnBothSpines)
    }

    /// True for right-spine nodes and the special root.
    #[must_use]
    pub fn on_right(self) -> bool {
        matches!(self, Self::OnRightSpine | Self::OnBothSpines)
    }

    /// True for any node on a spine.
    #[must_use]
    pub fn on_spine(self) -> bool {
        !matches!(self, Self::NotOnSpine)
    }
}

/// A node of a banana tree.
///
/// Minima (and the hook sentinels) are leaves: `low` points to the node
/// itself, `in`/`mid` point at the first nodes up the two trails hanging off
/// the leaf, and `death` points at the maximum the leaf is paired with.
/// Maxima are internal: `in`/`mid` point at the tops of the two trails of
/// their banana, `up`/`down` chain them along the trail they sit on, `low`
/// points at the leaf their trail descends to, and `death` is meaningless.
pub(crate) struct Node {
    pub(crate) item: ItemId,
    pub(crate) up: NodeId,
    pub(crate) down: NodeId,
    pub(crate) r#in: NodeId,
    pub(crate) mid: NodeId,
    pub(crate) low: NodeId,
    pub(crate) death: NodeId,
    pub(crate) spine: SpineLabel,
}

impl Node {
    pub(crate) fn new(item: ItemId) -> Self {
        Self {
            item,
            up: NodeId::NONE,
            down: NodeId::NONE,
            r#in: NodeId::NONE,
            mid: NodeId::NONE,
            low: NodeId::NONE,
            death: NodeId::NONE,
            spine: SpineLabel::NotOnSpine,
        }
    }
}

//
// Sign-generic node queries
//

/// Value of the item represented by `n`, as the tree of sign `SIGN` sees it.
#[inline]
pub(crate) fn node_value<const SIGN: i8>(s: &Store, n: NodeId) -> Value {
    s.items.value::<SIGN>(s.nodes::<SIGN>()[n].item)
}

#[inline]
pub(crate) fn node_item<const SIGN: i8>(s: &Store, n: NodeId) -> ItemId {
    s.nodes::<SIGN>()[n].item
}

/// The node paired with `n`, i.e. the leaf `p` with `p.death == n`.
#[inline]
pub(crate) fn birth<const SIGN: i8>(s: &Store, n: NodeId) -> NodeId {
    let nodes = s.nodes::<SIGN>();
    nodes[nodes[n].r#in].low
}

#[inline]
pub(crate) fn is_leaf<const SIGN: i8>(s: &Store, n: NodeId) -> bool {
    s.nodes::<SIGN>()[n].low == n
}

#[inline]
pub(crate) fn is_internal<const SIGN: i8>(s: &Store, n: NodeId) -> bool {
    !is_leaf::<SIGN>(s, n)
}

/// The special root is the only internal node whose `low` equals its birth.
#[inline]
pub(crate) fn is_special_root<const SIGN: i8>(s: &Store, n: NodeId) -> bool {
    let nodes = s.nodes::<SIGN>();
    nodes[n].low == nodes[nodes[n].r#in].low && nodes[n].low != n
}

/// Hook sentinels are the only nodes whose item is not linked into the list.
#[inline]
pub(crate) fn is_hook<const SIGN: i8>(s: &Store, n: NodeId) -> bool {
    let item = s.nodes::<SIGN>()[n].item;
    s.items.left_neighbor(item).is_none() && s.items.right_neighbor(item).is_none()
}

#[inline]
pub(crate) fn has_empty_banana<const SIGN: i8>(s: &Store, n: NodeId) -> bool {
    let nodes = s.nodes::<SIGN>();
    nodes[n].r#in == nodes[n].mid
}

/// True iff `n` lies on the in-trail of the banana of its trail's leaf,
/// i.e. `n ∈ low(n).in(.up)*`.
pub(crate) fn is_on_in_trail<const SIGN: i8>(s: &Store, n: NodeId) -> bool {
    trail_top_is::<SIGN>(s, n, true)
}

/// True iff `n` lies on the mid-trail of the banana of its trail's leaf.
pub(crate) fn is_on_mid_trail<const SIGN: i8>(s: &Store, n: NodeId) -> bool {
    trail_top_is::<SIGN>(s, n, false)
}

fn trail_top_is<const SIGN: i8>(s: &Store, n: NodeId, want_in: bool) -> bool {
    let nodes = s.nodes::<SIGN>();
    if nodes[n].low == n {
        return false;
    }
    let leaf = nodes[n].low;
    let death = nodes[leaf].death;
    let mut c = n;
    while nodes[c].up != death {
        c = nodes[c].up;
        debug_assert!(c.is_some(), "ran off a trail while classifying it");
    }
    if want_in {
        nodes[death].r#in == c
    } else {
        nodes[death].mid == c
    }
}

//
// Constant-time pointer rewrites
//

/// If `x` is a leaf, set its in-pointer to `target`, else its up-pointer.
pub(crate) fn set_in_or_up<const SIGN: i8>(s: &mut Store, x: NodeId, target: NodeId) {
    if is_leaf::<SIGN>(s, x) {
        s.nodes_mut::<SIGN>()[x].r#in = target;
    } else {
        s.nodes_mut::<SIGN>()[x].up = target;
    }
}

/// If `x` is a leaf, set its mid-pointer to `target`, else its up-pointer.
pub(crate) fn set_mid_or_up<const SIGN: i8>(s: &mut Store, x: NodeId, target: NodeId) {
    if is_leaf::<SIGN>(s, x) {
        s.nodes_mut::<SIGN>()[x].mid = target;
    } else {
        s.nodes_mut::<SIGN>()[x].up = target;
    }
}

pub(crate) fn set_in_or_down<const SIGN: i8>(s: &mut Store, x: NodeId, target: NodeId, set_in: bool) {
    if set_in {
        s.nodes_mut::<SIGN>()[x].r#in = target;
    } else {
        s.nodes_mut::<SIGN>()[x].down = target;
    }
}

pub(crate) fn set_mid_or_down<const SIGN: i8>(s: &mut Store, x: NodeId, target: NodeId, set_mid: bool) {
    if set_mid {
        s.nodes_mut::<SIGN>()[x].mid = target;
    } else {
        s.nodes_mut::<SIGN>()[x].down = target;
    }
}

/// Splices the internal node `n` out of its trail and patches the hole.
pub(crate) fn unlink_from_trail<const SIGN: i8>(s: &mut Store, n: NodeId) {
    debug_assert!(is_internal::<SIGN>(s, n), "only internal nodes sit on a trail");
    let (the_up, the_down) = {
        let nodes = s.nodes::<SIGN>();
        (nodes[n].up, nodes[n].down)
    };

    let nodes = s.nodes_mut::<SIGN>();
    if nodes[the_up].r#in == n {
        nodes[the_up].r#in = the_down;
    } else if nodes[the_up].mid == n {
        nodes[the_up].mid = the_down;
    } else {
        nodes[the_up].down = the_down;
    }

    if nodes[the_down].r#in == n {
        nodes[the_down].r#in = the_up;
    } else if nodes[the_down].mid == n {
        nodes[the_down].mid = the_up;
    } else {
        nodes[the_down].up = the_up;
    }

    nodes[n].up = NodeId::NONE;
    nodes[n].down = NodeId::NONE;
}

/// Pushes `node` between the internal node `this` and its current in-child.
pub(crate) fn insert_node_on_top_of_in<const SIGN: i8>(s: &mut Store, this: NodeId, node: NodeId) {
    debug_assert!(is_internal::<SIGN>(s, this), "cannot stack on top of a leaf's trail");
    let the_in = s.nodes::<SIGN>()[this].r#in;
    let in_low = s.nodes::<SIGN>()[the_in].low;
    {
        let nodes = s.nodes_mut::<SIGN>();
        nodes[node].up = this;
        nodes[node].down = the_in;
        nodes[node].low = in_low;
    }
    set_in_or_up::<SIGN>(s, the_in, node);
    s.nodes_mut::<SIGN>()[this].r#in = node;
}

/// Pushes `node` between the internal node `this` and its current mid-child.
pub(crate) fn insert_node_on_top_of_mid<const SIGN: i8>(s: &mut Store, this: NodeId, node: NodeId) {
    debug_assert!(is_internal::<SIGN>(s, this), "cannot stack on top of a leaf's trail");
    let the_mid = s.nodes::<SIGN>()[this].mid;
    let mid_low = s.nodes::<SIGN>()[the_mid].low;
    {
        let nodes = s.nodes_mut::<SIGN>();
        nodes[node].up = this;
        nodes[node].down = the_mid;
        nodes[node].low = mid_low;
    }
    set_mid_or_up::<SIGN>(s, the_mid, node);
    s.nodes_mut::<SIGN>()[this].mid = node;
}

/// Pushes `node` between the leaf `this` and its in-trail.
pub(crate) fn insert_node_on_bottom_of_in<const SIGN: i8>(s: &mut Store, this: NodeId, node: NodeId) {
    debug_assert!(is_leaf::<SIGN>(s, this), "bottom insertion starts at a leaf");
    let the_in = s.nodes::<SIGN>()[this].r#in;
    let nodes = s.nodes_mut::<SIGN>();
    if nodes[the_in].r#in == this {
        nodes[the_in].r#in = node;
    } else {
        nodes[the_in].down = node;
    }
    nodes[node].up = the_in;
    nodes[node].down = this;
    nodes[node].low = this;
    nodes[this].r#in = node;
}

/// Pushes `node` between the leaf `this` and its mid-trail.
pub(crate) fn insert_node_on_bottom_of_mid<const SIGN: i8>(s: &mut Store, this: NodeId, node: NodeId) {
    debug_assert!(is_leaf::<SIGN>(s, this), "bottom insertion starts at a leaf");
    let the_mid = s.nodes::<SIGN>()[this].mid;
    let nodes = s.nodes_mut::<SIGN>();
    if nodes[the_mid].mid == this {
        nodes[the_mid].mid = node;
    } else {
        nodes[the_mid].down = node;
    }
    nodes[node].up = the_mid;
    nodes[node].down = this;
    nodes[node].low = this;
    nodes[this].mid = node;
}

/// Inserts `this` directly above `node` on `node`'s trail.
pub(crate) fn insert_above<const SIGN: i8>(s: &mut Store, this: NodeId, node: NodeId) {
    debug_assert!(is_internal::<SIGN>(s, node), "insertion point must be on a trail");
    let node_up = s.nodes::<SIGN>()[node].up;
    if s.nodes::<SIGN>()[node_up].r#in == node {
        insert_node_on_top_of_in::<SIGN>(s, node_up, this);
    } else if s.nodes::<SIGN>()[node_up].mid == node {
        insert_node_on_top_of_mid::<SIGN>(s, node_up, this);
    } else {
        let low = s.nodes::<SIGN>()[node].low;
        let nodes = s.nodes_mut::<SIGN>();
        nodes[node_up].down = this;
        nodes[this].down = node;
        nodes[node].up = this;
        nodes[this].up = node_up;
        nodes[this].low = low;
    }
}

fn swap_in_trail_with_internal_node<const SIGN: i8>(s: &mut Store, a: NodeId, b: NodeId) {
    let a_in = s.nodes::<SIGN>()[a].r#in;
    let b_in = s.nodes::<SIGN>()[b].r#in;
    let nodes = s.nodes_mut::<SIGN>();
    if nodes[a_in].r#in == a {
        nodes[a_in].r#in = b;
    } else {
        nodes[a_in].up = b;
    }
    if nodes[b_in].r#in == b {
        nodes[b_in].r#in = a;
    } else {
        nodes[b_in].up = a;
    }
    nodes[b].r#in = a_in;
    nodes[a].r#in = b_in;
}

fn swap_mid_trail_with_internal_node<const SIGN: i8>(s: &mut Store, a: NodeId, b: NodeId) {
    let a_mid = s.nodes::<SIGN>()[a].mid;
    let b_mid = s.nodes::<SIGN>()[b].mid;
    let nodes = s.nodes_mut::<SIGN>();
    if nodes[a_mid].mid == a {
        nodes[a_mid].mid = b;
    } else {
        nodes[a_mid].up = b;
    }
    if nodes[b_mid].mid == b {
        nodes[b_mid].mid = a;
    } else {
        nodes[b_mid].up = a;
    }
    nodes[b].mid = a_mid;
    nodes[a].mid = b_mid;
}

/// Exchanges the in- and mid-trails of the internal nodes `a` and `b` and
/// repairs the death pointers of their births.
pub(crate) fn swap_bananas_with_internal_node<const SIGN: i8>(s: &mut Store, a: NodeId, b: NodeId) {
    swap_in_trail_with_internal_node::<SIGN>(s, a, b);
    swap_mid_trail_with_internal_node::<SIGN>(s, a, b);
    let a_birth = birth::<SIGN>(s, a);
    let b_birth = birth::<SIGN>(s, b);
    let nodes = s.nodes_mut::<SIGN>();
    nodes[a_birth].death = a;
    nodes[b_birth].death = b;
}

/// Dissolves the in-trail beginning at `n` into the trail containing `n`.
pub(crate) fn merge_in_trail_to_up<const SIGN: i8>(s: &mut Store, n: NodeId) {
    debug_assert!(is_on_in_trail::<SIGN>(s, n), "node is not on an in-trail");
    let the_in = s.nodes::<SIGN>()[n].r#in;
    let the_up = s.nodes::<SIGN>()[n].up;
    {
        let nodes = s.nodes_mut::<SIGN>();
        if nodes[the_up].r#in == n {
            nodes[the_up].r#in = the_in;
        } else {
            nodes[the_up].down = the_in;
        }
    }
    set_in_or_up::<SIGN>(s, the_in, the_up);
}

/// Dissolves the mid-trail beginning at `n` into the trail containing `n`.
pub(crate) fn merge_mid_trail_to_up<const SIGN: i8>(s: &mut Store, n: NodeId) {
    debug_assert!(is_on_mid_trail::<SIGN>(s, n), "node is not on a mid-trail");
    let the_mid = s.nodes::<SIGN>()[n].mid;
    let the_up = s.nodes::<SIGN>()[n].up;
    {
        let nodes = s.nodes_mut::<SIGN>();
        if nodes[the_up].mid == n {
            nodes[the_up].mid = the_mid;
        } else {
            nodes[the_up].down = the_mid;
        }
    }
    set_mid_or_up::<SIGN>(s, the_mid, the_up);
}

/// Exchanges a leaf's hanging trails with the two trail sections descending
/// from another maximum: the in-trail below the target becomes a mid-trail
/// and vice versa. See the description of fatalities in the paper.
///
/// `top_of_in` and `top_of_mid` bound the moved sections; `node` is the
/// (hook or dummy) leaf being swapped in. The leaf's in-trail must be empty.
pub(crate) fn fatality_swap<const SIGN: i8>(
    s: &mut Store,
    top_of_in: NodeId,
    top_of_mid: NodeId,
    node: NodeId,
) {
    debug_assert_eq!(
        s.nodes::<SIGN>()[top_of_in].low,
        s.nodes::<SIGN>()[top_of_mid].low,
        "swapped trail tops must belong to the same banana"
    );
    debug_assert!(is_leaf::<SIGN>(s, node), "fatality swap exchanges a leaf");
    debug_assert!(is_hook::<SIGN>(s, node), "fatality swap exchanges a hook or dummy");

    let above_top_of_in = if is_internal::<SIGN>(s, top_of_in) {
        s.nodes::<SIGN>()[top_of_in].up
    } else {
        s.nodes::<SIGN>()[top_of_in].r#in
    };
    let moves_full_in_trail = s.nodes::<SIGN>()[above_top_of_in].r#in == top_of_in;

    let above_top_of_mid = if is_internal::<SIGN>(s, top_of_mid) {
        s.nodes::<SIGN>()[top_of_mid].up
    } else {
        s.nodes::<SIGN>()[top_of_mid].mid
    };
    let moves_full_mid_trail = s.nodes::<SIGN>()[above_top_of_mid].mid == top_of_mid;

    let node_in = s.nodes::<SIGN>()[node].r#in;
    let node_death = s.nodes::<SIGN>()[node].death;
    // A hook's in-trail is always empty; the correctness proof relies on it.
    debug_assert_eq!(node_in, node_death, "the swapped leaf's in-trail must be empty");
    let node_mid = s.nodes::<SIGN>()[node].mid;
    let node_has_empty_mid = node_mid == node_death;

    // Low pointers of the trail that stays with the old banana. The leaf's
    // in-trail is empty, so only its mid-trail is walked.
    let new_low = s.nodes::<SIGN>()[top_of_in].low;
    let mut it = node_mid;
    while it != node_death {
        s.nodes_mut::<SIGN>()[it].low = new_low;
        it = s.nodes::<SIGN>()[it].up;
    }

    // The moved trails change roles, so the lower end swaps its in and mid.
    {
        let low = s.nodes_mut::<SIGN>();
        let l = &mut low[new_low];
        std::mem::swap(&mut l.r#in, &mut l.mid);
    }
    // Connect `top_of_in` to `node_mid`.
    set_mid_or_up::<SIGN>(s, top_of_in, node_mid);
    set_mid_or_down::<SIGN>(s, node_mid, top_of_in, node_has_empty_mid);
    // Connect `top_of_mid` to `node_in`.
    set_in_or_up::<SIGN>(s, top_of_mid, node_in);
    set_in_or_down::<SIGN>(s, node_in, top_of_mid, true);

    // Connect `node` to the trail remainders above the moved sections.
    s.nodes_mut::<SIGN>()[node].r#in = above_top_of_in;
    set_in_or_down::<SIGN>(s, above_top_of_in, node, moves_full_in_trail);
    s.nodes_mut::<SIGN>()[node].mid = above_top_of_mid;
    set_mid_or_down::<SIGN>(s, above_top_of_mid, node, moves_full_mid_trail);

    // Exchange the deaths of the two leaves.
    {
        let nodes = s.nodes_mut::<SIGN>();
        let nd = nodes[node].death;
        let ld = nodes[new_low].death;
        nodes[node].death = ld;
        nodes[new_low].death = nd;
    }

    // Low pointers of the trails now hanging off `node`.
    let node_death = s.nodes::<SIGN>()[node].death;
    let mut it = s.nodes::<SIGN>()[node].mid;
    while it != node_death {
        s.nodes_mut::<SIGN>()[it].low = node;
        it = s.nodes::<SIGN>()[it].up;
    }
    let mut it = s.nodes::<SIGN>()[node].r#in;
    while it != node_death {
        s.nodes_mut::<SIGN>()[it].low = node;
        it = s.nodes::<SIGN>()[it].up;
    }
}

/// Replaces the item represented by `n` and fixes the back-links.
pub(crate) fn replace_node_item<const SIGN: i8>(s: &mut Store, n: NodeId, new_item: ItemId) {
    let old_item = s.nodes::<SIGN>()[n].item;
    if s.items.node::<SIGN>(old_item) == n {
        s.items.set_node::<SIGN>(old_item, NodeId::NONE);
    }
    s.nodes_mut::<SIGN>()[n].item = new_item;
    s.items.set_node::<SIGN>(new_item, n);
}

/// Exchanges which nodes represent the items `a` and `b`.
pub(crate) fn swap_node_with_item<const SIGN: i8>(s: &mut Store, a: ItemId, b: ItemId) {
    let a_node = s.items.node::<SIGN>(a);
    let b_node = s.items.node::<SIGN>(b);
    if a_node.is_none() && b_node.is_some() {
        replace_node_item::<SIGN>(s, b_node, a);
    } else if a_node.is_some() && b_node.is_none() {
        replace_node_item::<SIGN>(s, a_node, b);
    } else if a_node.is_some() && b_node.is_some() {
        s.items.set_node::<SIGN>(a, NodeId::NONE);
        s.items.set_node::<SIGN>(b, NodeId::NONE);
        replace_node_item::<SIGN>(s, a_node, b);
        replace_node_item::<SIGN>(s, b_node, a);
    }
}

//
// The tree itself
//

/// One banana tree (up- or down-tree depending on `SIGN`).
///
/// The tree owns three sentinel items: the special root at order `+∞` with
/// value `+∞` under the sign, and a left and right hook placed just outside
/// the endpoint orders. A hook is represented by a node exactly while its
/// neighbouring endpoint is down-type.
pub(crate) struct BananaTree<const SIGN: i8> {
    pub(crate) special_root_item: ItemId,
    pub(crate) left_hook_item: ItemId,
    pub(crate) right_hook_item: ItemId,
    pub(crate) global_max: ItemId,
    pub(crate) left_endpoint: ItemId,
    pub(crate) right_endpoint: ItemId,
}

pub(crate) type UpTree = BananaTree<1>;
pub(crate) type DownTree = BananaTree<{ -1 }>;

impl<const SIGN: i8> BananaTree<SIGN> {
    /// Creates an empty tree; `construct` or `initialize_empty_cut_tree`
    /// bring it to life.
    pub(crate) fn new(s: &mut Store) -> Self {
        let special_root_item = s.items.alloc(f64::INFINITY, raw_from_signed::<SIGN>(f64::INFINITY));
        let left_hook_item = s.items.alloc(f64::NEG_INFINITY, 0.0);
        let right_hook_item = s.items.alloc(f64::INFINITY, 0.0);
        Self {
            special_root_item,
            left_hook_item,
            right_hook_item,
            global_max: ItemId::NONE,
            left_endpoint: ItemId::NONE,
            right_endpoint: ItemId::NONE,
        }
    }

    pub(crate) fn special_root(&self, s: &Store) -> NodeId {
        s.items.node::<SIGN>(self.special_root_item)
    }

    pub(crate) fn left_hook(&self, s: &Store) -> NodeId {
        s.items.node::<SIGN>(self.left_hook_item)
    }

    pub(crate) fn right_hook(&self, s: &Store) -> NodeId {
        s.items.node::<SIGN>(self.right_hook_item)
    }

    pub(crate) fn allocate_node(&self, s: &mut Store, item: ItemId) -> NodeId {
        debug_assert!(
            s.items.node::<SIGN>(item).is_none(),
            "item is already represented in this tree"
        );
        let n = s.nodes_mut::<SIGN>().alloc(Node::new(item));
        s.items.set_node::<SIGN>(item, n);
        n
    }

    /// Frees `n` and clears its item's back-link.
    pub(crate) fn free_node(&self, s: &mut Store, n: NodeId) {
        let item = s.nodes::<SIGN>()[n].item;
        if s.items.node::<SIGN>(item) == n {
            s.items.set_node::<SIGN>(item, NodeId::NONE);
        }
        s.nodes_mut::<SIGN>().free(n);
    }

    /// Assigns order and value to a hook from the given endpoint: the order
    /// just outside the endpoint's order, the value just below the
    /// endpoint's value under this sign.
    pub(crate) fn assign_hook_from_endpoint(&self, s: &mut Store, left: bool, endpoint: ItemId) {
        let hook = if left { self.left_hook_item } else { self.right_hook_item };
        let signed_value = s.items.value::<SIGN>(endpoint);
        s.items
            .assign_value(hook, raw_from_signed::<SIGN>(tiny_offset(-1, signed_value)));
        let dir = if left { -1 } else { 1 };
        s.items.assign_order(hook, tiny_offset(dir, s.items.order(endpoint)));
    }

    /// Assigns order and value to a hook from the item its node is paired
    /// with.
    pub(crate) fn assign_hook_from_death(&self, s: &mut Store, left: bool) {
        let hook = if left { self.left_hook_item } else { self.right_hook_item };
        let hook_node = s.items.node::<SIGN>(hook);
        debug_assert!(hook_node.is_some(), "hook has no node to read its death from");
        let death = s.nodes::<SIGN>()[hook_node].death;
        let endpoint = s.nodes::<SIGN>()[death].item;
        self.assign_hook_from_endpoint(s, left, endpoint);
    }

    /// Makes `item` the global max if it is a maximum (or down-type) of
    /// greater value than the current one.
    pub(crate) fn update_global_max(&mut self, s: &Store, item: ItemId) {
        if !(s.items.is_down_type::<SIGN>(item) || s.items.is_maximum::<SIGN>(item)) {
            return;
        }
        if self.global_max.is_none()
            || s.items.value::<SIGN>(item) > s.items.value::<SIGN>(self.global_max)
        {
            self.global_max = item;
        }
    }

    /// Recomputes the global max from the special root's two children.
    pub(crate) fn update_global_max_from_root(&mut self, s: &Store) {
        let sr = self.special_root(s);
        let nodes = s.nodes::<SIGN>();
        let in_child = nodes[sr].r#in;
        let mid_child = nodes[sr].mid;
        self.global_max = if node_value::<SIGN>(s, in_child) > node_value::<SIGN>(s, mid_child) {
            nodes[in_child].item
        } else {
            nodes[mid_child].item
        };
    }

    /// Swaps the contents of two trees: sentinel node assignments, sentinel
    /// keys/values, endpoints and the global max. Used after cutting when
    /// the two signs separate on different sides.
    pub(crate) fn swap_contents(&mut self, other: &mut Self, s: &mut Store) {
        swap_node_with_item::<SIGN>(s, self.special_root_item, other.special_root_item);
        swap_node_with_item::<SIGN>(s, self.left_hook_item, other.left_hook_item);
        swap_node_with_item::<SIGN>(s, self.right_hook_item, other.right_hook_item);
        s.items
            .swap_order_and_value(self.special_root_item, other.special_root_item);
        s.items.swap_order_and_value(self.left_hook_item, other.left_hook_item);
        s.items
            .swap_order_and_value(self.right_hook_item, other.right_hook_item);
        std::mem::swap(&mut self.left_endpoint, &mut other.left_endpoint);
        std::mem::swap(&mut self.right_endpoint, &mut other.right_endpoint);
        std::mem::swap(&mut self.global_max, &mut other.global_max);
    }

    /// Frees any remaining sentinel nodes and the sentinel items. The items
    /// of the interval itself must already have been released from this
    /// tree.
    pub(crate) fn release(&mut self, s: &mut Store) {
        for item in [self.special_root_item, self.left_hook_item, self.right_hook_item] {
            let node = s.items.node::<SIGN>(item);
            if node.is_some() {
                self.free_node(s, node);
            }
            s.items.free(item);
        }
        self.left_endpoint = ItemId::NONE;
        self.right_endpoint = ItemId::NONE;
        self.global_max = ItemId::NONE;
    }
}

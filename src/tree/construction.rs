// Copyright (c) 2025-present, banana-tree contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Linear-time construction of a banana tree from the sample list.
//!
//! A single left-to-right pass over the critical samples maintains a stack of
//! alternating minima and maxima: the maxima on the stack decrease in value
//! towards the top, and each pair of stack-adjacent extrema are neighbours in
//! the condensed sequence of still-open samples. A new maximum closes every
//! stacked maximum of smaller value: the closed maximum pairs with the higher
//! of its two neighbouring minima and attaches below the previous attachment
//! on the surviving minimum's side, which builds the trails bottom-up. The
//! special root closes whatever remains.

use super::BananaTree;
use crate::arena::{Handle, ItemId, NodeId};
use crate::store::Store;
use crate::types::raw_from_signed;

/// A minimum that is still open during the scan, together with the tops of
/// the two chains of already-attached maxima hanging off it. The chain
/// bottoms live in the node's own `in` (left) and `mid` (right) pointers
/// until the minimum's banana closes and fixes the orientation.
struct OpenMin {
    node: NodeId,
    item: ItemId,
    left_top: NodeId,
    right_top: NodeId,
}

impl<const SIGN: i8> BananaTree<SIGN> {
    /// Builds the banana tree for the samples between `left_endpoint` and
    /// `right_endpoint` (inclusive, already linked).
    ///
    /// # Panics
    ///
    /// Panics if the list holds fewer than two samples.
    pub(crate) fn construct(
        &mut self,
        s: &mut Store,
        left_endpoint: ItemId,
        right_endpoint: ItemId,
    ) {
        assert!(
            s.items.right_neighbor(left_endpoint).is_some(),
            "an interval needs at least two samples"
        );
        log::trace!(
            "constructing banana tree (sign {SIGN}) over [{}, {}]",
            s.items.order(left_endpoint),
            s.items.order(right_endpoint),
        );

        self.left_endpoint = left_endpoint;
        self.right_endpoint = right_endpoint;
        self.global_max = ItemId::NONE;

        // The special root sits at order +inf with value +inf under the sign.
        s.items.assign_order(self.special_root_item, f64::INFINITY);
        s.items
            .assign_value(self.special_root_item, raw_from_signed::<SIGN>(f64::INFINITY));
        let special_root = self.allocate_node(s, self.special_root_item);

        // Hooks exist exactly for down-type endpoints.
        let left_hook = if s.items.is_down_type::<SIGN>(left_endpoint) {
            self.assign_hook_from_endpoint(s, true, left_endpoint);
            self.allocate_node(s, self.left_hook_item)
        } else {
            NodeId::NONE
        };
        let right_hook = if s.items.is_down_type::<SIGN>(right_endpoint) {
            self.assign_hook_from_endpoint(s, false, right_endpoint);
            self.allocate_node(s, self.right_hook_item)
        } else {
            NodeId::NONE
        };

        let mut mins: Vec<OpenMin> = Vec::new();
        let mut maxs: Vec<NodeId> = Vec::new();

        if left_hook.is_some() {
            self.open_min(&mut mins, left_hook, self.left_hook_item);
        }
        let mut cursor = left_endpoint;
        while cursor.is_some() {
            if s.items.is_minimum::<SIGN>(cursor) || s.items.is_up_type::<SIGN>(cursor) {
                let node = self.allocate_node(s, cursor);
                self.open_min(&mut mins, node, cursor);
            } else if s.items.is_maximum::<SIGN>(cursor) || s.items.is_down_type::<SIGN>(cursor) {
                let node = self.allocate_node(s, cursor);
                self.scan_maximum(s, &mut mins, &mut maxs, node);
            }
            cursor = s.items.right_neighbor(cursor);
        }
        if right_hook.is_some() {
            self.open_min(&mut mins, right_hook, self.right_hook_item);
        }

        // The special root plays the part of a final maximum of value +inf:
        // it closes every banana still on the stack.
        while let Some(q) = maxs.pop() {
            let right = mins.pop().expect("scan keeps a minimum on either side of a maximum");
            let left = mins.pop().expect("scan keeps a minimum on either side of a maximum");
            let survivor = self.close_banana(s, q, left, right);
            mins.push(survivor);
            let top = mins.last_mut().expect("just pushed");
            Self::attach_to_open_min(s, top, q);
        }
        let last = mins.pop().expect("one minimum survives to the special banana");
        debug_assert!(mins.is_empty(), "all minima but the global one must be closed");
        self.close_special_banana(s, special_root, &last);

        self.update_global_max_from_root(s);
        self.init_spine_labels(s);
    }

    fn open_min(&self, mins: &mut Vec<OpenMin>, node: NodeId, item: ItemId) {
        mins.push(OpenMin {
            node,
            item,
            left_top: NodeId::NONE,
            right_top: NodeId::NONE,
        });
    }

    /// Handles a newly scanned maximum `b`: closes every stacked maximum of
    /// smaller value, then stacks `b`.
    fn scan_maximum(
        &mut self,
        s: &mut Store,
        mins: &mut Vec<OpenMin>,
        maxs: &mut Vec<NodeId>,
        b: NodeId,
    ) {
        let b_value = super::node_value::<SIGN>(s, b);
        while let Some(&q) = maxs.last() {
            if super::node_value::<SIGN>(s, q) >= b_value {
                break;
            }
            maxs.pop();
            let right = mins.pop().expect("scan keeps a minimum on either side of a maximum");
            let left = mins.pop().expect("scan keeps a minimum on either side of a maximum");
            let survivor = self.close_banana(s, q, left, right);
            mins.push(survivor);
            let top = mins.last_mut().expect("just pushed");
            Self::attach_to_open_min(s, top, q);
        }
        let top = mins.last_mut().expect("a minimum precedes every maximum in the scan");
        Self::attach_to_open_min(s, top, b);
        maxs.push(b);
    }

    /// Attaches `q` at the top of the open minimum's chain on `q`'s side.
    /// No-op when `q` already is that chain's top.
    fn attach_to_open_min(s: &mut Store, min: &mut OpenMin, q: NodeId) {
        let q_item = super::node_item::<SIGN>(s, q);
        let q_is_left = s.items.order(q_item) < s.items.order(min.item);
        let top = if q_is_left { min.left_top } else { min.right_top };
        if top == q {
            return;
        }
        let nodes = s.nodes_mut::<SIGN>();
        if top.is_some() {
            nodes[q].down = top;
            nodes[top].up = q;
        } else {
            nodes[q].down = min.node;
            if q_is_left {
                nodes[min.node].r#in = q;
            } else {
                nodes[min.node].mid = q;
            }
        }
        if q_is_left {
            min.left_top = q;
        } else {
            min.right_top = q;
        }
    }

    /// Closes the banana of `q`, which sits between the open minima `left`
    /// and `right`: `q` pairs with the higher of the two, whose chains
    /// become the trails of the new banana; the lower one survives.
    fn close_banana(&mut self, s: &mut Store, q: NodeId, left: OpenMin, right: OpenMin) -> OpenMin {
        let left_value = s.items.value::<SIGN>(left.item);
        let right_value = s.items.value::<SIGN>(right.item);
        debug_assert!(left_value != right_value, "ties in value are not supported");
        let (p, survivor, q_right_of_p) = if left_value > right_value {
            (left, right, true)
        } else {
            (right, left, false)
        };

        // The in-trail hangs over the far side of `p` (away from `q`); the
        // chains were accumulated as left/right, so a killer on the left
        // means the roles of the two chains swap.
        let (far_top, near_top) = if q_right_of_p {
            (p.left_top, p.right_top)
        } else {
            {
                let nodes = s.nodes_mut::<SIGN>();
                let n = &mut nodes[p.node];
                std::mem::swap(&mut n.r#in, &mut n.mid);
            }
            (p.right_top, p.left_top)
        };

        {
            let nodes = s.nodes_mut::<SIGN>();
            if far_top.is_some() {
                nodes[far_top].up = q;
                nodes[q].r#in = far_top;
            } else {
                nodes[q].r#in = p.node;
                nodes[p.node].r#in = q;
            }
            if near_top == q {
                // `q` tops the near chain itself; the rest of the chain
                // below it becomes the mid-trail.
                let below = nodes[q].down;
                nodes[q].mid = below;
            } else if near_top.is_some() {
                nodes[near_top].up = q;
                nodes[q].mid = near_top;
            } else {
                nodes[q].mid = p.node;
                nodes[p.node].mid = q;
            }
            nodes[p.node].death = q;
            nodes[p.node].low = p.node;
        }
        Self::fix_trail_lows(s, q, p.node);
        survivor
    }

    fn close_special_banana(&mut self, s: &mut Store, special_root: NodeId, p: &OpenMin) {
        let nodes = s.nodes_mut::<SIGN>();
        if p.left_top.is_some() {
            nodes[p.left_top].up = special_root;
            nodes[special_root].r#in = p.left_top;
        } else {
            nodes[special_root].r#in = p.node;
            nodes[p.node].r#in = special_root;
        }
        if p.right_top.is_some() {
            nodes[p.right_top].up = special_root;
            nodes[special_root].mid = p.right_top;
        } else {
            nodes[special_root].mid = p.node;
            nodes[p.node].mid = special_root;
        }
        nodes[p.node].death = special_root;
        nodes[p.node].low = p.node;
        nodes[special_root].low = p.node;
        Self::fix_trail_lows(s, special_root, p.node);
    }

    /// Sets the low pointers of both trails of the banana `(p, q)` to `p`.
    fn fix_trail_lows(s: &mut Store, q: NodeId, p: NodeId) {
        let mut c = s.nodes::<SIGN>()[q].r#in;
        while c != p {
            s.nodes_mut::<SIGN>()[c].low = p;
            c = s.nodes::<SIGN>()[c].down;
        }
        let mut c = s.nodes::<SIGN>()[q].mid;
        while c != p {
            s.nodes_mut::<SIGN>()[c].low = p;
            c = s.nodes::<SIGN>()[c].down;
        }
    }

    /// Final labelling pass: the left spine is `in*(special root)`, the
    /// right spine `in*(mid(special root))`.
    pub(crate) fn init_spine_labels(&self, s: &mut Store) {
        let special_root = self.special_root(s);
        s.nodes_mut::<SIGN>()[special_root].spine = super::SpineLabel::OnBothSpines;
        let mut c = s.nodes::<SIGN>()[special_root].r#in;
        loop {
            s.nodes_mut::<SIGN>()[c].spine = super::SpineLabel::OnLeftSpine;
            if super::is_leaf::<SIGN>(s, c) {
                break;
            }
            c = s.nodes::<SIGN>()[c].r#in;
        }
        let mut c = s.nodes::<SIGN>()[special_root].mid;
        loop {
            s.nodes_mut::<SIGN>()[c].spine = super::SpineLabel::OnRightSpine;
            if super::is_leaf::<SIGN>(s, c) {
                break;
            }
            c = s.nodes::<SIGN>()[c].r#in;
        }
    }
}

// Copyright (c) 2025-present, banana-tree contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Local maintenance: interchanges, value changes, anticancellation,
//! cancellation and slides.
//!
//! Every operation here is a short sequence of the constant-time pointer
//! rewrites from the parent module. Value-change loops report each
//! interchange through a callback so the caller can mirror it in the
//! opposite-sign tree while the loop is still running; the coupled state is
//! read again on the next iteration, so the callback must not be deferred.

use super::{
    birth, has_empty_banana, insert_above, insert_node_on_bottom_of_in,
    insert_node_on_bottom_of_mid, insert_node_on_top_of_in, insert_node_on_top_of_mid,
    is_internal, is_leaf, is_on_in_trail, is_special_root, node_item, node_value,
    replace_node_item, set_in_or_up, swap_bananas_with_internal_node, unlink_from_trail,
    BananaTree, SpineLabel,
};
use crate::arena::{Handle, ItemId, NodeId};
use crate::metrics::sign_index;
use crate::store::Store;
use crate::types::{raw_from_signed, tiny_offset};

fn swap_spines<const SIGN: i8>(s: &mut Store, a: NodeId, b: NodeId) {
    let nodes = s.nodes_mut::<SIGN>();
    let tmp = nodes[a].spine;
    nodes[a].spine = nodes[b].spine;
    nodes[b].spine = tmp;
}

fn swap_in_mid<const SIGN: i8>(s: &mut Store, n: NodeId) {
    let node = &mut s.nodes_mut::<SIGN>()[n];
    std::mem::swap(&mut node.r#in, &mut node.mid);
}

/// Interchange of `n` with the maximum above it, where both sit on the same
/// trail and the parent's banana keeps its pairing (the parent's birth has
/// greater value than `n`'s).
fn parallel_max_interchange_without_swap<const SIGN: i8>(s: &mut Store, n: NodeId) {
    let parent = s.nodes::<SIGN>()[n].up;
    unlink_from_trail::<SIGN>(s, parent);
    insert_node_on_top_of_in::<SIGN>(s, n, parent);
    let parent_spine = s.nodes::<SIGN>()[parent].spine;
    s.nodes_mut::<SIGN>()[n].spine = parent_spine;
}

/// As above, but the parent's birth has smaller value, so the two bananas
/// swap pairings.
fn parallel_max_interchange_with_swap<const SIGN: i8>(s: &mut Store, n: NodeId) {
    let parent = s.nodes::<SIGN>()[n].up;
    swap_bananas_with_internal_node::<SIGN>(s, n, parent);
    unlink_from_trail::<SIGN>(s, parent);
    insert_node_on_top_of_mid::<SIGN>(s, n, parent);
    swap_in_mid::<SIGN>(s, parent);
    let parent_birth = birth::<SIGN>(s, parent);
    swap_in_mid::<SIGN>(s, parent_birth);
    swap_spines::<SIGN>(s, n, parent);
}

/// Interchange of `n` with its parent where `n` tops the parent's in-trail.
fn nested_max_interchange_in_trail<const SIGN: i8>(s: &mut Store, n: NodeId) {
    let parent = s.nodes::<SIGN>()[n].up;
    debug_assert_eq!(s.nodes::<SIGN>()[parent].r#in, n, "node must top the parent's in-trail");
    unlink_from_trail::<SIGN>(s, n);
    insert_above::<SIGN>(s, n, parent);
    if s.nodes::<SIGN>()[parent].spine.on_spine() {
        s.nodes_mut::<SIGN>()[parent].spine = SpineLabel::NotOnSpine;
    }
}

/// Interchange of `n` with its parent where `n` tops the parent's mid-trail.
fn nested_max_interchange_mid_trail<const SIGN: i8>(s: &mut Store, n: NodeId) {
    let parent = s.nodes::<SIGN>()[n].up;
    debug_assert_eq!(s.nodes::<SIGN>()[parent].mid, n, "node must top the parent's mid-trail");
    unlink_from_trail::<SIGN>(s, n);
    insert_above::<SIGN>(s, n, parent);
    swap_bananas_with_internal_node::<SIGN>(s, n, parent);
    swap_in_mid::<SIGN>(s, parent);
    let parent_birth = birth::<SIGN>(s, parent);
    swap_in_mid::<SIGN>(s, parent_birth);
    swap_spines::<SIGN>(s, n, parent);
}

/// Interchanges the maximum `n` with its parent. Requires `n`'s value to
/// exceed the parent's.
pub(crate) fn max_interchange_with_parent<const SIGN: i8>(s: &mut Store, n: NodeId) {
    let parent = s.nodes::<SIGN>()[n].up;
    debug_assert!(parent.is_some(), "node needs a parent for a max-interchange");
    debug_assert!(is_internal::<SIGN>(s, n), "a maximum is an internal node");
    debug_assert!(
        node_value::<SIGN>(s, n) > node_value::<SIGN>(s, parent),
        "parent must have smaller value"
    );

    s.metrics.max_interchanges[sign_index::<SIGN>()] += 1;

    if s.nodes::<SIGN>()[parent].r#in == n {
        nested_max_interchange_in_trail::<SIGN>(s, n);
    } else if s.nodes::<SIGN>()[parent].mid == n {
        nested_max_interchange_mid_trail::<SIGN>(s, n);
    } else if node_value::<SIGN>(s, birth::<SIGN>(s, n))
        < node_value::<SIGN>(s, birth::<SIGN>(s, parent))
    {
        parallel_max_interchange_without_swap::<SIGN>(s, n);
    } else {
        parallel_max_interchange_with_swap::<SIGN>(s, n);
    }
}

/// Interchanges the minimum `this` below the minimum `other`, merging
/// `other`'s window into `this`'s. A no-op unless the bananas are nested
/// (`other` is the leaf of the trail `this.death` sits on).
pub(crate) fn min_interchange_below<const SIGN: i8>(s: &mut Store, this: NodeId, other: NodeId) {
    debug_assert!(is_leaf::<SIGN>(s, this), "min-interchange works on leaves");
    debug_assert!(is_leaf::<SIGN>(s, other), "min-interchange works on leaves");
    debug_assert!(
        node_value::<SIGN>(s, this) < node_value::<SIGN>(s, other),
        "interchanged minimum must be the lower one"
    );

    let merge_death = s.nodes::<SIGN>()[this].death;
    if other != s.nodes::<SIGN>()[merge_death].low {
        return;
    }

    s.metrics.min_interchanges[sign_index::<SIGN>()] += 1;

    // The node at which the windows starting at `this` and `other` merge;
    // this is `other.death` after the interchange.
    let high_death = s.nodes::<SIGN>()[other].death;
    let on_in_trail = is_on_in_trail::<SIGN>(s, merge_death);

    // Fix the new upper trail starting at `this` (except low pointers) and
    // move `merge_death` onto its new trail by swapping its `down` and `mid`.
    if on_in_trail {
        super::merge_in_trail_to_up::<SIGN>(s, merge_death);
        let node = &mut s.nodes_mut::<SIGN>()[merge_death];
        std::mem::swap(&mut node.down, &mut node.mid);
    } else {
        // Swap the in- and mid-trail of the smaller banana so they agree
        // with the trails they merge into.
        swap_in_mid::<SIGN>(s, merge_death);
        swap_in_mid::<SIGN>(s, this);
        super::merge_mid_trail_to_up::<SIGN>(s, merge_death);
        let node = &mut s.nodes_mut::<SIGN>()[merge_death];
        std::mem::swap(&mut node.down, &mut node.r#in);
        std::mem::swap(&mut node.r#in, &mut node.mid);
    }

    // Find the point at which to split the trail that does not contain
    // `merge_death`, updating low pointers on the way down.
    let merge_value = node_value::<SIGN>(s, merge_death);
    let mut below_split = if on_in_trail {
        s.nodes::<SIGN>()[high_death].mid
    } else {
        s.nodes::<SIGN>()[high_death].r#in
    };
    while node_value::<SIGN>(s, below_split) > merge_value {
        s.nodes_mut::<SIGN>()[below_split].low = this;
        below_split = s.nodes::<SIGN>()[below_split].down;
    }
    let above_split = if is_leaf::<SIGN>(s, below_split) {
        debug_assert_eq!(below_split, other, "the split trail must bottom out at `other`");
        if on_in_trail {
            s.nodes::<SIGN>()[below_split].mid
        } else {
            s.nodes::<SIGN>()[below_split].r#in
        }
    } else {
        s.nodes::<SIGN>()[below_split].up
    };
    // Split the trail and attach the top half to `merge_death`.
    if above_split == high_death {
        if on_in_trail {
            s.nodes_mut::<SIGN>()[above_split].mid = merge_death;
        } else {
            s.nodes_mut::<SIGN>()[above_split].r#in = merge_death;
        }
    } else {
        s.nodes_mut::<SIGN>()[above_split].down = merge_death;
    }
    s.nodes_mut::<SIGN>()[merge_death].up = above_split;
    // `merge_death` has to end up on the mid-trail; if it was on the
    // in-trail before, `other`'s trails swap roles.
    if on_in_trail {
        swap_in_mid::<SIGN>(s, other);
    }
    // The bottom half becomes the in-trail beginning at `merge_death`.
    s.nodes_mut::<SIGN>()[merge_death].r#in = below_split;
    set_in_or_up::<SIGN>(s, below_split, merge_death);

    // Low pointers of the new in-trail.
    let mut iter_node = if on_in_trail {
        s.nodes::<SIGN>()[high_death].r#in
    } else {
        s.nodes::<SIGN>()[high_death].mid
    };
    while s.nodes::<SIGN>()[iter_node].low != this {
        s.nodes_mut::<SIGN>()[iter_node].low = this;
        iter_node = s.nodes::<SIGN>()[iter_node].down;
    }

    {
        let nodes = s.nodes_mut::<SIGN>();
        nodes[this].death = high_death;
        nodes[other].death = merge_death;
        nodes[merge_death].low = this;
        // The special root's low moves with the merged window.
        if nodes[high_death].low == other {
            nodes[high_death].low = this;
        }
    }
    // Spine labels of the re-routed section.
    if is_special_root::<SIGN>(s, high_death) {
        let label = if s.nodes::<SIGN>()[high_death].r#in == merge_death {
            SpineLabel::OnLeftSpine
        } else if s.nodes::<SIGN>()[high_death].mid == merge_death {
            SpineLabel::OnRightSpine
        } else {
            SpineLabel::NotOnSpine
        };
        s.nodes_mut::<SIGN>()[merge_death].spine = label;
    } else {
        let label = if s.nodes::<SIGN>()[high_death].r#in == merge_death {
            s.nodes::<SIGN>()[high_death].spine
        } else {
            SpineLabel::NotOnSpine
        };
        s.nodes_mut::<SIGN>()[merge_death].spine = label;
    }
}

impl<const SIGN: i8> BananaTree<SIGN> {
    /// Fixes the tree after the value of the maximum `item` increased,
    /// reporting every interchange (and the global-max hand-over) to
    /// `callback` as `(risen node, displaced node)`.
    pub(crate) fn on_increase_value_of_maximum(
        &mut self,
        s: &mut Store,
        item: ItemId,
        mut callback: impl FnMut(&mut Store, NodeId, NodeId),
    ) {
        let the_node = s.items.node::<SIGN>(item);
        debug_assert!(
            is_internal::<SIGN>(s, the_node),
            "increasing a maximum requires an internal node"
        );
        if s.items.is_right_endpoint(item) {
            self.assign_hook_from_endpoint(s, false, item);
        }
        if s.items.is_left_endpoint(item) {
            self.assign_hook_from_endpoint(s, true, item);
        }
        let mut the_parent = s.nodes::<SIGN>()[the_node].up;
        while node_value::<SIGN>(s, the_parent) < s.items.value::<SIGN>(item) {
            max_interchange_with_parent::<SIGN>(s, the_node);
            callback(s, the_node, the_parent);
            the_parent = s.nodes::<SIGN>()[the_node].up;
        }
        // If the item passes the global maximum, the special root now stands
        // for a new one; report it as a pretend interchange with the node of
        // the old global maximum.
        if the_parent == self.special_root(s)
            && s.items.value::<SIGN>(item) > s.items.value::<SIGN>(self.global_max)
        {
            let old_global = s.items.node::<SIGN>(self.global_max);
            callback(s, the_node, old_global);
        }
        self.update_global_max(s, item);
    }

    /// Fixes the tree after the value of the maximum `item` decreased; the
    /// callback contract matches [`Self::on_increase_value_of_maximum`].
    pub(crate) fn on_decrease_value_of_maximum(
        &mut self,
        s: &mut Store,
        item: ItemId,
        mut callback: impl FnMut(&mut Store, NodeId, NodeId),
    ) {
        let the_node = s.items.node::<SIGN>(item);
        debug_assert!(
            is_internal::<SIGN>(s, the_node),
            "decreasing a maximum requires an internal node"
        );
        if s.items.is_right_endpoint(item) {
            self.assign_hook_from_endpoint(s, false, item);
        }
        if s.items.is_left_endpoint(item) {
            self.assign_hook_from_endpoint(s, true, item);
        }
        // Update the global max first. Candidates are the special root's
        // other child, the node below, and the tops of the trails.
        if item == self.global_max {
            let special_root = self.special_root(s);
            if the_node == s.nodes::<SIGN>()[special_root].r#in {
                let mid_item = node_item::<SIGN>(s, s.nodes::<SIGN>()[special_root].mid);
                self.update_global_max(s, mid_item);
            } else {
                let in_item = node_item::<SIGN>(s, s.nodes::<SIGN>()[special_root].r#in);
                self.update_global_max(s, in_item);
            }
            let down_item = node_item::<SIGN>(s, s.nodes::<SIGN>()[the_node].down);
            self.update_global_max(s, down_item);
            let birth_item = node_item::<SIGN>(s, birth::<SIGN>(s, the_node));
            if birth_item != self.right_hook_item && birth_item != self.left_hook_item {
                let in_item = node_item::<SIGN>(s, s.nodes::<SIGN>()[the_node].r#in);
                let mid_item = node_item::<SIGN>(s, s.nodes::<SIGN>()[the_node].mid);
                self.update_global_max(s, in_item);
                self.update_global_max(s, mid_item);
            }
            if item != self.global_max {
                let new_global = s.items.node::<SIGN>(self.global_max);
                callback(s, new_global, the_node);
            }
        }
        // Interchange with the largest-valued of down/in/mid until the item
        // sinks into place. The loop ends when that child is no longer a
        // maximum, i.e. when its low pointer points to itself.
        loop {
            let nodes = s.nodes::<SIGN>();
            let candidates = [nodes[the_node].down, nodes[the_node].r#in, nodes[the_node].mid];
            let mut max_child = candidates[0];
            for &c in &candidates[1..] {
                if node_value::<SIGN>(s, c) > node_value::<SIGN>(s, max_child) {
                    max_child = c;
                }
            }
            if s.nodes::<SIGN>()[max_child].low == max_child
                || node_value::<SIGN>(s, max_child) <= node_value::<SIGN>(s, the_node)
            {
                break;
            }
            debug_assert_eq!(
                s.nodes::<SIGN>()[max_child].up,
                the_node,
                "interchanged node must be a child of the sinking maximum"
            );
            max_interchange_with_parent::<SIGN>(s, max_child);
            callback(s, max_child, the_node);
        }
    }

    /// Creates a banana from the neighbouring pair `(pair_min, pair_max)`,
    /// whose values are close enough that they pair with each other.
    /// `next_max` is the maximum closest to `pair_min` such that `pair_min`
    /// lies between `next_max` and `pair_max`.
    pub(crate) fn anticancel(
        &mut self,
        s: &mut Store,
        next_max: ItemId,
        pair_min: ItemId,
        pair_max: ItemId,
    ) {
        debug_assert!(
            s.items.is_minimum::<SIGN>(pair_min),
            "first item of an anticancelled pair has to be a minimum"
        );
        debug_assert!(
            s.items.is_maximum::<SIGN>(pair_max),
            "second item of an anticancelled pair has to be a maximum"
        );
        debug_assert!(
            s.items.is_maximum::<SIGN>(next_max) || s.items.is_down_type::<SIGN>(next_max),
            "anticancellation happens next to a maximum or down-type item"
        );

        s.metrics.anticancellations[sign_index::<SIGN>()] += 1;

        let new_min_node = self.allocate_node(s, pair_min);
        let new_max_node = self.allocate_node(s, pair_max);

        let next_max_node = s.items.node::<SIGN>(next_max);
        let next_max_birth = birth::<SIGN>(s, next_max_node);
        let birth_item = node_item::<SIGN>(s, next_max_birth);

        let mut node_q = if s.items.is_between(pair_min, next_max, birth_item) {
            s.nodes::<SIGN>()[next_max_node].mid
        } else {
            s.nodes::<SIGN>()[next_max_node].down
        };
        while node_value::<SIGN>(s, node_q) > s.items.value::<SIGN>(pair_max) {
            node_q = s.nodes::<SIGN>()[node_q].r#in;
        }
        if is_leaf::<SIGN>(s, node_q) {
            if node_q == next_max_birth {
                insert_node_on_bottom_of_mid::<SIGN>(s, node_q, new_max_node);
            } else {
                let q_item = node_item::<SIGN>(s, node_q);
                let q_death_item = node_item::<SIGN>(s, s.nodes::<SIGN>()[node_q].death);
                if s.items.is_between(pair_max, q_item, q_death_item) {
                    insert_node_on_bottom_of_mid::<SIGN>(s, node_q, new_max_node);
                } else {
                    insert_node_on_bottom_of_in::<SIGN>(s, node_q, new_max_node);
                }
            }
        } else {
            insert_above::<SIGN>(s, new_max_node, node_q);
        }
        let nodes = s.nodes_mut::<SIGN>();
        nodes[new_max_node].r#in = new_min_node;
        nodes[new_max_node].mid = new_min_node;
        nodes[new_min_node].r#in = new_max_node;
        nodes[new_min_node].mid = new_max_node;
        nodes[new_min_node].death = new_max_node;
        nodes[new_min_node].low = new_min_node;
    }

    /// Moves the maximum role from `old_max` to its neighbour `new_max`,
    /// whose value just passed it.
    pub(crate) fn max_slide(&mut self, s: &mut Store, old_max: ItemId, new_max: ItemId) {
        debug_assert!(s.items.is_internal(new_max), "the new maximum must be internal");
        debug_assert!(
            s.items.left_neighbor(old_max) == new_max || s.items.right_neighbor(old_max) == new_max,
            "slid items have to be neighbours"
        );
        debug_assert!(
            s.items.value::<SIGN>(old_max) < s.items.value::<SIGN>(new_max),
            "the new maximum must already be the higher one"
        );

        s.metrics.max_slides[sign_index::<SIGN>()] += 1;

        let old_max_node = s.items.node::<SIGN>(old_max);
        debug_assert!(is_internal::<SIGN>(s, old_max_node), "old maximum must be internal");
        replace_node_item::<SIGN>(s, old_max_node, new_max);

        if old_max == self.global_max {
            self.global_max = new_max;
        }

        // An endpoint that stops being a down-type maximum takes over its
        // hook's leaf; the hook disappears.
        if s.items.is_right_endpoint(old_max) {
            let hook_node = s.items.node::<SIGN>(self.right_hook_item);
            replace_node_item::<SIGN>(s, hook_node, old_max);
        } else if s.items.is_left_endpoint(old_max) {
            let hook_node = s.items.node::<SIGN>(self.left_hook_item);
            replace_node_item::<SIGN>(s, hook_node, old_max);
        }
    }

    /// Moves the minimum role from `old_min` to its neighbour `new_min`,
    /// whose value just dropped below it.
    pub(crate) fn min_slide(&mut self, s: &mut Store, old_min: ItemId, new_min: ItemId) {
        debug_assert!(s.items.is_internal(new_min), "the new minimum must be internal");
        debug_assert!(
            s.items.left_neighbor(old_min) == new_min || s.items.right_neighbor(old_min) == new_min,
            "slid items have to be neighbours"
        );
        debug_assert!(
            s.items.value::<SIGN>(old_min) > s.items.value::<SIGN>(new_min),
            "the new minimum must already be the lower one"
        );

        s.metrics.min_slides[sign_index::<SIGN>()] += 1;

        let old_min_node = s.items.node::<SIGN>(old_min);
        debug_assert!(is_leaf::<SIGN>(s, old_min_node), "old minimum must be a leaf");
        replace_node_item::<SIGN>(s, old_min_node, new_min);

        // An endpoint that stops being an up-type minimum becomes down-type:
        // it gets an internal node paired with a freshly materialised hook.
        if s.items.is_endpoint(old_min) {
            let is_left = s.items.is_left_endpoint(old_min);
            self.assign_hook_from_endpoint(s, is_left, old_min);
            let hook_item = if is_left { self.left_hook_item } else { self.right_hook_item };
            let hook_node = self.allocate_node(s, hook_item);
            let endpoint_node = self.allocate_node(s, old_min);
            {
                let old_death = s.nodes::<SIGN>()[old_min_node].death;
                let nodes = s.nodes_mut::<SIGN>();
                nodes[endpoint_node].up = old_death;
                nodes[endpoint_node].down = old_min_node;
                nodes[endpoint_node].r#in = hook_node;
                nodes[endpoint_node].mid = hook_node;
                nodes[endpoint_node].low = old_min_node;
                nodes[endpoint_node].death = NodeId::NONE;
                nodes[hook_node].up = NodeId::NONE;
                nodes[hook_node].down = NodeId::NONE;
                nodes[hook_node].r#in = endpoint_node;
                nodes[hook_node].mid = endpoint_node;
                nodes[hook_node].low = hook_node;
                nodes[hook_node].death = endpoint_node;
                let old_spine = nodes[old_min_node].spine;
                nodes[endpoint_node].spine = old_spine;
                nodes[hook_node].spine = old_spine;
                nodes[old_min_node].spine = SpineLabel::NotOnSpine;
            }
            let death = s.nodes::<SIGN>()[old_min_node].death;
            if is_special_root::<SIGN>(s, death) {
                if s.items.order(old_min) > s.items.order(new_min) {
                    insert_node_on_bottom_of_mid::<SIGN>(s, old_min_node, endpoint_node);
                } else {
                    insert_node_on_bottom_of_in::<SIGN>(s, old_min_node, endpoint_node);
                }
            } else {
                let death_item = node_item::<SIGN>(s, death);
                if s.items.is_between(old_min, death_item, new_min) {
                    insert_node_on_bottom_of_mid::<SIGN>(s, old_min_node, endpoint_node);
                } else {
                    debug_assert!(
                        s.items.is_between(new_min, death_item, old_min),
                        "endpoint must sit in one of the panels of the slid banana"
                    );
                    insert_node_on_bottom_of_in::<SIGN>(s, old_min_node, endpoint_node);
                }
            }
            // The death of the slid leaf has higher value than the endpoint,
            // so the endpoint node is in its final position on the trail.
        }
    }

    /// Cancels the maximum `item` with its birth. The banana must be empty.
    pub(crate) fn cancel_maximum(&mut self, s: &mut Store, item: ItemId) {
        s.metrics.cancellations[sign_index::<SIGN>()] += 1;

        let the_node = s.items.node::<SIGN>(item);
        debug_assert!(is_internal::<SIGN>(s, the_node), "cancelled item must be a maximum");
        debug_assert!(
            has_empty_banana::<SIGN>(s, the_node),
            "cancelled banana may not have nested bananas"
        );

        unlink_from_trail::<SIGN>(s, the_node);
        let the_birth = s.nodes::<SIGN>()[the_node].r#in;
        self.free_node(s, the_node);
        self.free_node(s, the_birth);
    }

    /// Cancels the maximum `item` against the neighbouring endpoint: the
    /// endpoint takes over `item`'s internal node and its old leaf becomes
    /// the hook. Assumes `item`'s value has been moved close enough to the
    /// endpoint's that no further adjustment is needed.
    pub(crate) fn cancel_max_with_endpoint(&mut self, s: &mut Store, item: ItemId, endpoint: ItemId) {
        debug_assert!(s.items.is_internal(item), "cancelled maximum must be internal");
        debug_assert!(s.items.is_endpoint(endpoint), "collision partner must be an endpoint");

        s.metrics.cancellations[sign_index::<SIGN>()] += 1;

        let endpoint_node = s.items.node::<SIGN>(endpoint);
        debug_assert!(is_leaf::<SIGN>(s, endpoint_node), "endpoint must be a leaf here");
        let item_node = s.items.node::<SIGN>(item);
        s.items.set_node::<SIGN>(endpoint, item_node);
        s.nodes_mut::<SIGN>()[item_node].item = endpoint;
        if s.items.is_left_endpoint(endpoint) {
            self.assign_hook_from_endpoint(s, true, endpoint);
            s.items.set_node::<SIGN>(self.left_hook_item, endpoint_node);
            s.nodes_mut::<SIGN>()[endpoint_node].item = self.left_hook_item;
        } else {
            self.assign_hook_from_endpoint(s, false, endpoint);
            s.items.set_node::<SIGN>(self.right_hook_item, endpoint_node);
            s.nodes_mut::<SIGN>()[endpoint_node].item = self.right_hook_item;
        }
        s.items.set_node::<SIGN>(item, NodeId::NONE);
        // The endpoint inherits the global maximum, being value-adjacent.
        if item == self.global_max {
            self.global_max = endpoint;
        }
    }

    /// Cancels the minimum `item` against the neighbouring endpoint: the
    /// endpoint's internal node and its hook disappear and the endpoint
    /// takes over `item`'s leaf.
    pub(crate) fn cancel_min_with_endpoint(&mut self, s: &mut Store, item: ItemId, endpoint: ItemId) {
        debug_assert!(s.items.is_endpoint(endpoint), "collision partner must be an endpoint");

        s.metrics.cancellations[sign_index::<SIGN>()] += 1;

        let hook_item = if s.items.is_left_endpoint(endpoint) {
            self.left_hook_item
        } else {
            self.right_hook_item
        };
        let hook_node = s.items.node::<SIGN>(hook_item);
        let endpoint_node = s.items.node::<SIGN>(endpoint);
        debug_assert!(
            is_internal::<SIGN>(s, endpoint_node),
            "endpoint must be represented by an internal node"
        );
        let endpoint_spine = s.nodes::<SIGN>()[endpoint_node].spine;
        debug_assert_eq!(
            birth::<SIGN>(s, endpoint_node),
            hook_node,
            "endpoint must be paired with its hook"
        );
        unlink_from_trail::<SIGN>(s, endpoint_node);
        self.free_node(s, endpoint_node);
        self.free_node(s, hook_node);

        let item_node = s.items.node::<SIGN>(item);
        debug_assert!(is_leaf::<SIGN>(s, item_node), "cancelled minimum must be a leaf");
        s.nodes_mut::<SIGN>()[item_node].item = endpoint;
        s.items.set_node::<SIGN>(item, NodeId::NONE);
        s.items.set_node::<SIGN>(endpoint, item_node);
        s.nodes_mut::<SIGN>()[item_node].spine = endpoint_spine;
    }

    /// Replaces the right endpoint by `new_endpoint`, which must be
    /// value-adjacent to the old one.
    pub(crate) fn replace_right_endpoint(&mut self, s: &mut Store, new_endpoint: ItemId) {
        let endpoint_node = s.items.node::<SIGN>(self.right_endpoint);
        replace_node_item::<SIGN>(s, endpoint_node, new_endpoint);
        if self.right_endpoint == self.global_max {
            self.global_max = new_endpoint;
        }
        self.right_endpoint = new_endpoint;
        if s.items.is_down_type::<SIGN>(new_endpoint) {
            self.assign_hook_from_death(s, false);
        }
    }

    /// Replaces the left endpoint by `new_endpoint`, which must be
    /// value-adjacent to the old one.
    pub(crate) fn replace_left_endpoint(&mut self, s: &mut Store, new_endpoint: ItemId) {
        let endpoint_node = s.items.node::<SIGN>(self.left_endpoint);
        replace_node_item::<SIGN>(s, endpoint_node, new_endpoint);
        if self.left_endpoint == self.global_max {
            self.global_max = new_endpoint;
        }
        self.left_endpoint = new_endpoint;
        if s.items.is_down_type::<SIGN>(new_endpoint) {
            self.assign_hook_from_death(s, true);
        }
    }

    /// Nudges the value of the dummy or hook leaf `n` to sit just below
    /// (`dir = -1`) or above (`dir = +1`) `reference` under this sign.
    pub(crate) fn nudge_leaf_value(s: &mut Store, n: NodeId, reference: ItemId, dir: i8) {
        let item = node_item::<SIGN>(s, n);
        let target = tiny_offset(dir, s.items.value::<SIGN>(reference));
        s.items.assign_value(item, raw_from_signed::<SIGN>(target));
    }
}

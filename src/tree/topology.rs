// Copyright (c) 2025-present, banana-tree contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Topological maintenance: gluing two trees and cutting one in two.
//!
//! Gluing walks the facing spines of the two trees bottom-up and undoes the
//! injuries, fatalities and scares that separate them. Cutting loads five
//! stacks of bananas crossed by the cut (three of this sign, two of the
//! opposite sign) and pops them in order of decreasing maximum value,
//! applying the forward rewrites against a dummy hook in the new tree.

use super::local::min_interchange_below;
use super::{
    birth, fatality_swap, has_empty_banana, is_hook, is_internal, is_leaf, is_special_root,
    node_item, node_value, replace_node_item, set_in_or_down, set_in_or_up, set_mid_or_down,
    set_mid_or_up, unlink_from_trail, BananaTree, SpineLabel,
};
use crate::arena::{Handle, ItemId, NodeId};
use crate::dictionary::Dictionary;
use crate::metrics::sign_index;
use crate::store::Store;
use crate::types::{signed, tiny_offset, Order, Value};

/// A min–max pair of items, under the sign of the stack that holds it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct Banana {
    pub(crate) min: ItemId,
    pub(crate) max: ItemId,
}

/// The point between two samples at which a tree is cut. Only its order and
/// value matter; it is never materialised as a sample.
#[derive(Copy, Clone, Debug)]
pub(crate) struct CutProbe {
    pub(crate) order: Order,
    pub(crate) raw_value: Value,
}

impl CutProbe {
    pub(crate) fn value<const SIGN: i8>(&self) -> Value {
        signed::<SIGN>(self.raw_value)
    }
}

/// A stack of bananas for the cutting algorithm. `pop` only moves a cursor,
/// so the same stack can be replayed for the second tree; `actually_pop`
/// removes for good.
#[derive(Default)]
pub(crate) struct BananaStack {
    live: Vec<Banana>,
    cursor: usize,
}

impl BananaStack {
    pub(crate) fn push(&mut self, banana: Banana) {
        self.live.push(banana);
        self.cursor = 0;
    }

    pub(crate) fn pop(&mut self) {
        assert!(!self.is_empty(), "popped an exhausted banana stack");
        self.cursor += 1;
    }

    pub(crate) fn actually_pop(&mut self) {
        assert!(!self.live.is_empty(), "nothing on the stack to remove");
        self.live.pop();
        self.cursor = 0;
    }

    pub(crate) fn top(&self) -> Banana {
        assert!(!self.is_empty(), "peeked an exhausted banana stack");
        self.live[self.live.len() - 1 - self.cursor]
    }

    pub(crate) fn reset_top(&mut self) {
        self.cursor = 0;
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.cursor == self.live.len()
    }
}

/// Which of the five stacks currently holds the banana with the largest
/// maximum.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum StackRef {
    L,
    M,
    R,
    LInv,
    RInv,
}

/// Picks the stack whose top banana has the largest maximum value under
/// `SIGN`. For the inverse (opposite-sign) stacks that maximum is the pair's
/// `min` field.
pub(crate) fn top_banana<const SIGN: i8>(
    s: &Store,
    l: &BananaStack,
    m: &BananaStack,
    r: &BananaStack,
    l_inv: &BananaStack,
    r_inv: &BananaStack,
) -> Option<StackRef> {
    let mut result = None;
    let mut top_value = f64::NEG_INFINITY;
    for (stack, which) in [(l, StackRef::L), (m, StackRef::M), (r, StackRef::R)] {
        if !stack.is_empty() {
            let v = s.items.value::<SIGN>(stack.top().max);
            if v > top_value {
                result = Some(which);
                top_value = v;
            }
        }
    }
    for (stack, which) in [(l_inv, StackRef::LInv), (r_inv, StackRef::RInv)] {
        if !stack.is_empty() {
            let v = s.items.value::<SIGN>(stack.top().min);
            if v > top_value {
                result = Some(which);
                top_value = v;
            }
        }
    }
    result
}

/// The top banana of the selected stack, normalised to `SIGN`: for inverse
/// stacks the pair's roles swap.
fn top_under<const SIGN: i8>(
    which: StackRef,
    l: &BananaStack,
    m: &BananaStack,
    r: &BananaStack,
    l_inv: &BananaStack,
    r_inv: &BananaStack,
) -> Banana {
    match which {
        StackRef::L => l.top(),
        StackRef::M => m.top(),
        StackRef::R => r.top(),
        StackRef::LInv => {
            let b = l_inv.top();
            Banana { min: b.max, max: b.min }
        }
        StackRef::RInv => {
            let b = r_inv.top();
            Banana { min: b.max, max: b.min }
        }
    }
}

fn pop_from(which: StackRef, l: &mut BananaStack, m: &mut BananaStack, r: &mut BananaStack, l_inv: &mut BananaStack, r_inv: &mut BananaStack) {
    match which {
        StackRef::L => l.pop(),
        StackRef::M => m.pop(),
        StackRef::R => r.pop(),
        StackRef::LInv => l_inv.pop(),
        StackRef::RInv => r_inv.pop(),
    }
}

/// Adds the short-wave banana the stack loader cannot see, if it exists:
/// the next banana down the spine whose birth lies below the cut value and
/// below both candidate stack tops. It is processed as a scare by the
/// opposite-sign tree, so it goes onto an inverse stack.
#[allow(clippy::too_many_arguments)]
fn add_missing_short_wave_banana<const SIGN: i8>(
    s: &Store,
    l: &mut BananaStack,
    m: &mut BananaStack,
    r: &mut BananaStack,
    l_inv: &mut BananaStack,
    r_inv: &mut BananaStack,
    cut_value: Value,
) -> Option<StackRef> {
    let top = top_banana::<SIGN>(s, l, m, r, l_inv, r_inv).expect("stacks cannot all be empty");
    debug_assert!(
        matches!(top, StackRef::L | StackRef::M | StackRef::R),
        "the topmost banana must come from this tree"
    );
    let top_pair = top_under::<SIGN>(top, l, m, r, l_inv, r_inv);
    let highest_max = s.items.node::<SIGN>(top_pair.max);
    // A top banana cut in its mid-panel that is not the special banana rules
    // out a short-wave window with the cut in its out-panel.
    if !is_special_root::<SIGN>(s, highest_max) && top == StackRef::M {
        return None;
    }
    if is_special_root::<SIGN>(s, highest_max) {
        return add_missing_short_wave_banana_sr::<SIGN>(s, top, top_pair, m, l_inv, r_inv, cut_value);
    }
    let cuts_left = s.nodes::<SIGN>()[highest_max].spine.on_left();
    let next_on_spine = s.nodes::<SIGN>()[highest_max].r#in;
    if is_internal::<SIGN>(s, next_on_spine) {
        let mup_top_min = if m.is_empty() { ItemId::NONE } else { m.top().min };
        let dn_top_min = if cuts_left && !l_inv.is_empty() {
            l_inv.top().max
        } else if !cuts_left && !r_inv.is_empty() {
            r_inv.top().max
        } else {
            ItemId::NONE
        };
        let mup_min_value = if mup_top_min.is_some() {
            s.items.value::<SIGN>(mup_top_min)
        } else {
            f64::INFINITY
        };
        let dn_min_value = if dn_top_min.is_some() {
            s.items.value::<SIGN>(dn_top_min)
        } else {
            f64::INFINITY
        };
        let birth_node = birth::<SIGN>(s, next_on_spine);
        let birth_value = node_value::<SIGN>(s, birth_node);
        if birth_value < mup_min_value && birth_value < dn_min_value && birth_value < cut_value {
            let banana = Banana {
                min: node_item::<SIGN>(s, next_on_spine),
                max: node_item::<SIGN>(s, birth_node),
            };
            if cuts_left {
                l_inv.push(banana);
                return Some(StackRef::LInv);
            }
            r_inv.push(banana);
            return Some(StackRef::RInv);
        }
    }
    None
}

/// Special case of [`add_missing_short_wave_banana`] where the topmost
/// banana's maximum is the special root.
fn add_missing_short_wave_banana_sr<const SIGN: i8>(
    s: &Store,
    top: StackRef,
    top_pair: Banana,
    m: &mut BananaStack,
    l_inv: &mut BananaStack,
    r_inv: &mut BananaStack,
    cut_value: Value,
) -> Option<StackRef> {
    let top_max_node = s.items.node::<SIGN>(top_pair.max);
    debug_assert!(
        is_special_root::<SIGN>(s, top_max_node),
        "special-root handling invoked for a plain banana"
    );
    debug_assert!(
        matches!(top, StackRef::M | StackRef::R),
        "a special banana cannot have its in-panel on the right"
    );
    let cuts_left = top == StackRef::R;
    let next_on_spine = if cuts_left {
        s.nodes::<SIGN>()[top_max_node].r#in
    } else {
        s.nodes::<SIGN>()[top_max_node].mid
    };
    if is_internal::<SIGN>(s, next_on_spine) {
        if top == StackRef::M {
            m.pop();
        }
        let mup_top_min = if m.is_empty() { ItemId::NONE } else { m.top().min };
        m.reset_top();
        let dn_top_min = if cuts_left && !l_inv.is_empty() {
            l_inv.top().max
        } else if !cuts_left && !r_inv.is_empty() {
            r_inv.top().max
        } else {
            ItemId::NONE
        };
        let mup_min_value = if mup_top_min.is_some() {
            s.items.value::<SIGN>(mup_top_min)
        } else {
            f64::INFINITY
        };
        let dn_min_value = if dn_top_min.is_some() {
            s.items.value::<SIGN>(dn_top_min)
        } else {
            f64::INFINITY
        };
        let birth_node = birth::<SIGN>(s, next_on_spine);
        let birth_value = node_value::<SIGN>(s, birth_node);
        if birth_value < mup_min_value && birth_value < dn_min_value && birth_value < cut_value {
            let banana = Banana {
                min: node_item::<SIGN>(s, next_on_spine),
                max: node_item::<SIGN>(s, birth_node),
            };
            if cuts_left {
                l_inv.push(banana);
                return Some(StackRef::LInv);
            }
            r_inv.push(banana);
            return Some(StackRef::RInv);
        }
    }
    None
}

impl<const SIGN: i8> BananaTree<SIGN> {
    /// Glues `right_tree` onto the right end of this tree.
    ///
    /// Requires every sample of `right_tree` to lie strictly to the right of
    /// every sample of this tree. `min_dict` is the already-joined
    /// dictionary of the minima under this sign.
    pub(crate) fn glue_to_right(
        &mut self,
        s: &mut Store,
        right_tree: &mut Self,
        min_dict: &mut Dictionary,
    ) {
        assert!(
            s.items.order(self.right_endpoint) < s.items.order(right_tree.left_endpoint),
            "glued trees must be ordered and disjoint"
        );
        log::trace!("gluing banana trees (sign {SIGN})");

        // Establish the up/down assumption: one inner endpoint is up-type,
        // the other down-type, and the up-type one lies below.
        let (left_glue_node, right_glue_node) = self.prepare_gluing_to_right(s, right_tree, min_dict);
        let left_special_root = self.special_root(s);
        let right_special_root = right_tree.special_root(s);

        let left_glue_birth = birth::<SIGN>(s, left_glue_node);
        let dummy_node = if is_hook::<SIGN>(s, left_glue_birth) {
            left_glue_birth
        } else {
            birth::<SIGN>(s, right_glue_node)
        };

        let mut left_max = if is_leaf::<SIGN>(s, left_glue_node) {
            s.nodes::<SIGN>()[left_glue_node].death
        } else {
            left_glue_node
        };
        let mut right_max = if is_leaf::<SIGN>(s, right_glue_node) {
            s.nodes::<SIGN>()[right_glue_node].death
        } else {
            right_glue_node
        };

        // Move the left special root to -inf so the right spine of the left
        // tree consists of in-trails; swap in/mid for consistency.
        s.items.assign_order(self.special_root_item, f64::NEG_INFINITY);
        {
            let low = s.nodes::<SIGN>()[left_special_root].low;
            let nodes = s.nodes_mut::<SIGN>();
            let n = &mut nodes[left_special_root];
            std::mem::swap(&mut n.r#in, &mut n.mid);
            let n = &mut nodes[low];
            std::mem::swap(&mut n.r#in, &mut n.mid);
        }

        let mut terminate_left;
        let mut terminate_right;
        loop {
            let candidate_is_left =
                node_value::<SIGN>(s, left_max) < node_value::<SIGN>(s, right_max);
            let (candidate_max, other_max) = if candidate_is_left {
                (left_max, right_max)
            } else {
                (right_max, left_max)
            };
            let min_low = s.nodes::<SIGN>()[candidate_max].low;
            let candidate_birth = birth::<SIGN>(s, candidate_max);
            let min_bth = if candidate_birth != dummy_node {
                candidate_birth
            } else {
                birth::<SIGN>(s, other_max)
            };

            s.nodes_mut::<SIGN>()[min_bth].spine = SpineLabel::NotOnSpine;

            debug_assert!(is_leaf::<SIGN>(s, min_low), "trail lows are leaves");
            debug_assert!(is_leaf::<SIGN>(s, min_bth), "births are leaves");
            debug_assert!(!is_hook::<SIGN>(s, min_bth), "the dummy never plays this part");
            debug_assert!(is_internal::<SIGN>(s, candidate_max), "maxima are internal");

            // Special roots act as if their low had value -inf, which is the
            // dummy the paper glues the trees with; comparing with >= also
            // avoids scares when the candidate is a root without a hook.
            let low_value = if is_special_root::<SIGN>(s, candidate_max) {
                f64::NEG_INFINITY
            } else {
                node_value::<SIGN>(s, min_low)
            };
            if node_value::<SIGN>(s, min_bth) >= low_value {
                if min_bth == candidate_birth {
                    let other_birth = birth::<SIGN>(s, other_max);
                    self.undo_injury(s, candidate_max, other_birth);
                } else {
                    self.undo_fatality(s, candidate_birth, candidate_max, min_bth);
                }
            } else {
                debug_assert_eq!(
                    candidate_birth, dummy_node,
                    "a scare involves the maximum paired with the dummy"
                );
                self.undo_scare(s, candidate_birth);
            }
            if candidate_is_left {
                let low = s.nodes::<SIGN>()[left_max].low;
                left_max = s.nodes::<SIGN>()[low].death;
            } else {
                let low = s.nodes::<SIGN>()[right_max].low;
                right_max = s.nodes::<SIGN>()[low].death;
            }

            // A tree is exhausted once its special root hangs onto only the
            // dummy.
            let nodes = s.nodes::<SIGN>();
            terminate_left = nodes[left_special_root].r#in == nodes[left_special_root].mid
                && nodes[left_special_root].r#in == dummy_node;
            terminate_right = nodes[right_special_root].r#in == nodes[right_special_root].mid
                && nodes[right_special_root].r#in == dummy_node;
            if terminate_left || terminate_right {
                break;
            }
        }

        if terminate_left {
            // The left tree ran empty; its special root takes over the
            // surviving right tree.
            self.ensure_glued_tree_is_this(s, right_special_root, dummy_node);
        }

        // Discard the empty tree: first the dummy, then its special root.
        self.free_node(s, dummy_node);
        let right_sr_node = right_tree.special_root(s);
        right_tree.free_node(s, right_sr_node);

        // The right hook, if any, now belongs to the glued tree.
        let right_hook_node = right_tree.right_hook(s);
        if right_hook_node.is_some() {
            replace_node_item::<SIGN>(s, right_hook_node, self.right_hook_item);
            self.assign_hook_from_death(s, false);
        }

        // Reset the left special root to +inf and restore the in/mid
        // orientation if needed.
        s.items.assign_order(self.special_root_item, f64::INFINITY);
        {
            let sr = left_special_root;
            let in_item = node_item::<SIGN>(s, s.nodes::<SIGN>()[sr].r#in);
            let mid_item = node_item::<SIGN>(s, s.nodes::<SIGN>()[sr].mid);
            if s.items.is_between(in_item, mid_item, self.special_root_item) {
                let low = s.nodes::<SIGN>()[sr].low;
                let nodes = s.nodes_mut::<SIGN>();
                let n = &mut nodes[sr];
                std::mem::swap(&mut n.r#in, &mut n.mid);
                let n = &mut nodes[low];
                std::mem::swap(&mut n.r#in, &mut n.mid);
            }
        }

        if s.items.value::<SIGN>(self.global_max) < s.items.value::<SIGN>(right_tree.global_max) {
            self.global_max = right_tree.global_max;
        }
        self.right_endpoint = right_tree.right_endpoint;
        right_tree.left_endpoint = ItemId::NONE;
        right_tree.right_endpoint = ItemId::NONE;
        right_tree.global_max = ItemId::NONE;

        // The undo loop clears the label of every birth it touches, and some
        // of those return to a spine of the glued tree; one pass along the
        // two spines restores them.
        self.init_spine_labels(s);

        debug_assert!(
            is_special_root::<SIGN>(s, self.special_root(s)),
            "gluing must leave a well-formed special root"
        );
    }

    /// Removes the nodes that become non-critical when gluing, so that one
    /// inner endpoint is up-type, the other down-type, and the up-type one
    /// has the lower value. Returns the nodes of the outermost surviving
    /// critical items of (left, right).
    fn prepare_gluing_to_right(
        &mut self,
        s: &mut Store,
        right_tree: &mut Self,
        min_dict: &mut Dictionary,
    ) -> (NodeId, NodeId) {
        let end_of_left = self.right_endpoint;
        let end_of_right = right_tree.left_endpoint;
        let left_value = s.items.value::<SIGN>(end_of_left);
        let right_value = s.items.value::<SIGN>(end_of_right);
        let left_node = s.items.node::<SIGN>(end_of_left);
        let right_node = s.items.node::<SIGN>(end_of_right);

        let mut left_glue = left_node;
        let mut right_glue = right_node;

        let left_ends_in_down = s.items.is_down_type::<SIGN>(end_of_left);
        let left_ends_in_up = s.items.is_up_type::<SIGN>(end_of_left);
        let right_begins_with_down = s.items.is_down_type::<SIGN>(end_of_right);
        let right_begins_with_up = s.items.is_up_type::<SIGN>(end_of_right);

        let boundary = s.items.order(end_of_left);
        if left_ends_in_down && right_begins_with_down {
            // Remove the lower of the two, along with its hook.
            if left_value < right_value {
                let prev = min_dict
                    .prev_before(boundary)
                    .expect("another minimum exists to the left");
                left_glue = s.items.node::<SIGN>(prev);
                self.remove_node_with_hook(s, left_node);
            } else {
                let next = min_dict
                    .next_after(boundary)
                    .expect("another minimum exists to the right");
                right_glue = s.items.node::<SIGN>(next);
                self.remove_node_with_hook(s, right_node);
            }
        } else if left_ends_in_up && right_begins_with_up {
            // Turn the higher of the two into a hook.
            if left_value > right_value {
                left_glue = self.turn_node_into_hook(s, false, left_node);
            } else {
                right_glue = right_tree.turn_node_into_hook(s, true, right_node);
            }
        } else if left_ends_in_up && left_value > right_value {
            left_glue = self.turn_node_into_hook(s, false, left_node);
            let next = min_dict
                .next_after(boundary)
                .expect("another minimum exists to the right");
            right_glue = s.items.node::<SIGN>(next);
            self.remove_node_with_hook(s, right_node);
        } else if right_begins_with_up && right_value > left_value {
            right_glue = right_tree.turn_node_into_hook(s, true, right_node);
            let prev = min_dict
                .prev_before(boundary)
                .expect("another minimum exists to the left");
            left_glue = s.items.node::<SIGN>(prev);
            self.remove_node_with_hook(s, left_node);
        }
        // The preprocessing may have removed a global max.
        self.update_global_max_from_root(s);
        right_tree.update_global_max_from_root(s);
        (left_glue, right_glue)
    }

    /// Removes an internal node paired with a hook; both trails must be
    /// empty.
    fn remove_node_with_hook(&mut self, s: &mut Store, node_with_hook: NodeId) {
        debug_assert!(!is_special_root::<SIGN>(s, node_with_hook), "cannot remove a special root");
        debug_assert!(is_internal::<SIGN>(s, node_with_hook), "expected an internal node");
        debug_assert!(has_empty_banana::<SIGN>(s, node_with_hook), "trails must be empty");
        let b = birth::<SIGN>(s, node_with_hook);
        debug_assert!(is_hook::<SIGN>(s, b), "node must be paired with a hook");
        unlink_from_trail::<SIGN>(s, node_with_hook);
        self.free_node(s, node_with_hook);
        self.free_node(s, b);
    }

    /// Makes `new_hook_node` (so far a proper leaf) into this tree's left or
    /// right hook. Returns the node of the now outermost proper critical
    /// item.
    fn turn_node_into_hook(&mut self, s: &mut Store, left: bool, new_hook_node: NodeId) -> NodeId {
        let endpoint = if left { self.left_endpoint } else { self.right_endpoint };
        self.assign_hook_from_endpoint(s, left, endpoint);
        let hook_item = if left { self.left_hook_item } else { self.right_hook_item };
        replace_node_item::<SIGN>(s, new_hook_node, hook_item);
        s.nodes::<SIGN>()[new_hook_node].death
    }

    /// Hands the surviving right tree over to this tree's special root, and
    /// parks the other special root on the dummy for disposal.
    fn ensure_glued_tree_is_this(
        &mut self,
        s: &mut Store,
        other_special_root: NodeId,
        dummy_node: NodeId,
    ) {
        let this_special_root = self.special_root(s);
        debug_assert!(
            has_empty_banana::<SIGN>(s, this_special_root),
            "the emptied special root must have bare trails"
        );

        let (other_in, other_mid, other_low) = {
            let nodes = s.nodes::<SIGN>();
            (nodes[other_special_root].r#in, nodes[other_special_root].mid, nodes[other_special_root].low)
        };
        {
            let nodes = s.nodes_mut::<SIGN>();
            nodes[this_special_root].r#in = other_in;
            nodes[this_special_root].mid = other_mid;
            nodes[this_special_root].low = other_low;
            nodes[this_special_root].death = NodeId::NONE;
            nodes[this_special_root].up = NodeId::NONE;
            nodes[this_special_root].down = NodeId::NONE;
        }
        set_in_or_up::<SIGN>(s, other_in, this_special_root);
        set_mid_or_up::<SIGN>(s, other_mid, this_special_root);
        s.nodes_mut::<SIGN>()[other_low].death = this_special_root;

        let nodes = s.nodes_mut::<SIGN>();
        nodes[other_special_root].r#in = dummy_node;
        nodes[other_special_root].mid = dummy_node;
        nodes[other_special_root].low = dummy_node;
        nodes[dummy_node].r#in = other_special_root;
        nodes[dummy_node].mid = other_special_root;
    }

    /// Reverse of an injury: moves the section of the dummy's mid-trail
    /// whose values lie below `max_node` back into `max_node`'s in-trail.
    fn undo_injury(&mut self, s: &mut Store, max_node: NodeId, other_min_node: NodeId) {
        debug_assert!(is_internal::<SIGN>(s, max_node), "injured maxima are internal");
        debug_assert!(is_leaf::<SIGN>(s, other_min_node), "trail donor must be a leaf");
        debug_assert!(is_hook::<SIGN>(s, other_min_node), "trail donor must be a hook");

        s.metrics.undone_injuries[sign_index::<SIGN>()] += 1;

        let cut_value = node_value::<SIGN>(s, max_node);
        let max_birth = birth::<SIGN>(s, max_node);
        let mut cut_node = s.nodes::<SIGN>()[other_min_node].mid;
        if node_value::<SIGN>(s, cut_node) > cut_value {
            s.nodes_mut::<SIGN>()[max_node].spine = SpineLabel::NotOnSpine;
            return;
        }
        while node_value::<SIGN>(s, cut_node) < cut_value {
            s.nodes_mut::<SIGN>()[cut_node].low = max_birth;
            cut_node = s.nodes::<SIGN>()[cut_node].up;
        }
        let other_death = s.nodes::<SIGN>()[other_min_node].death;
        let node_below_cut = if cut_node == other_death {
            s.nodes::<SIGN>()[cut_node].mid
        } else {
            s.nodes::<SIGN>()[cut_node].down
        };
        let low_end_of_cut_trail = s.nodes::<SIGN>()[other_min_node].mid;

        // Remove the section between the low end and `node_below_cut`.
        set_mid_or_down::<SIGN>(s, cut_node, other_min_node, cut_node == other_death);
        s.nodes_mut::<SIGN>()[other_min_node].mid = cut_node;

        // Insert the section below `max_node`.
        let insert_point = s.nodes::<SIGN>()[max_node].r#in;
        s.nodes_mut::<SIGN>()[max_node].r#in = node_below_cut;
        s.nodes_mut::<SIGN>()[node_below_cut].up = max_node;
        set_in_or_up::<SIGN>(s, insert_point, low_end_of_cut_trail);
        s.nodes_mut::<SIGN>()[low_end_of_cut_trail].down = insert_point;

        if !is_special_root::<SIGN>(s, cut_node) {
            s.nodes_mut::<SIGN>()[max_node].spine = SpineLabel::NotOnSpine;
        }
    }

    /// Reverse of a fatality: swaps the dummy against the minimum whose
    /// banana `max_node` should close.
    fn undo_fatality(&mut self, s: &mut Store, min_node: NodeId, max_node: NodeId, other_min_node: NodeId) {
        debug_assert!(is_leaf::<SIGN>(s, min_node) && is_hook::<SIGN>(s, min_node));
        debug_assert!(is_internal::<SIGN>(s, max_node));
        debug_assert_eq!(s.nodes::<SIGN>()[min_node].death, max_node);
        debug_assert!(is_leaf::<SIGN>(s, other_min_node));
        debug_assert!(
            node_value::<SIGN>(s, max_node) > node_value::<SIGN>(s, other_min_node),
            "a fatality undone must pair a minimum with a higher maximum"
        );

        s.metrics.undone_fatalities[sign_index::<SIGN>()] += 1;

        // If a special root is involved its low pointer needs fixing at the
        // end; detect that before rewiring.
        let max_is_special_root = is_special_root::<SIGN>(s, max_node);
        let other_death = s.nodes::<SIGN>()[other_min_node].death;
        let other_mins_death_is_special_root = is_special_root::<SIGN>(s, other_death);

        let cut_value = node_value::<SIGN>(s, max_node);
        let mut top_of_in = s.nodes::<SIGN>()[other_death].r#in;
        while node_value::<SIGN>(s, top_of_in) >= cut_value {
            top_of_in = s.nodes::<SIGN>()[top_of_in].down;
        }
        let mut top_of_mid = s.nodes::<SIGN>()[other_death].mid;
        let mut cuts_mid_below_special_root = other_mins_death_is_special_root;
        while node_value::<SIGN>(s, top_of_mid) >= cut_value {
            cuts_mid_below_special_root = is_special_root::<SIGN>(s, top_of_mid);
            top_of_mid = s.nodes::<SIGN>()[top_of_mid].down;
        }
        debug_assert_eq!(s.nodes::<SIGN>()[top_of_in].low, other_min_node);
        debug_assert_eq!(s.nodes::<SIGN>()[top_of_mid].low, other_min_node);
        fatality_swap::<SIGN>(s, top_of_in, top_of_mid, min_node);

        if !cuts_mid_below_special_root {
            s.nodes_mut::<SIGN>()[max_node].spine = SpineLabel::NotOnSpine;
        }
        if max_is_special_root {
            let b = birth::<SIGN>(s, max_node);
            s.nodes_mut::<SIGN>()[max_node].low = b;
        }
        if other_mins_death_is_special_root {
            let d = s.nodes::<SIGN>()[min_node].death;
            s.nodes_mut::<SIGN>()[d].low = min_node;
        }
    }

    /// Reverse of a scare: the hook-dummy paired with a maximum drops below
    /// the next minimum.
    fn undo_scare(&mut self, s: &mut Store, min_node: NodeId) {
        let max_node = s.nodes::<SIGN>()[min_node].death;
        debug_assert!(!is_special_root::<SIGN>(s, max_node), "the special banana is never scared");
        debug_assert!(is_internal::<SIGN>(s, max_node));
        debug_assert!(is_leaf::<SIGN>(s, min_node) && is_hook::<SIGN>(s, min_node));
        debug_assert!(
            s.nodes::<SIGN>()[max_node].low != min_node,
            "the dummy must have a minimum to drop below"
        );

        s.metrics.undone_scares[sign_index::<SIGN>()] += 1;

        let drop_below = s.nodes::<SIGN>()[max_node].low;
        let reference = node_item::<SIGN>(s, drop_below);
        Self::nudge_leaf_value(s, min_node, reference, -1);
        min_interchange_below::<SIGN>(s, min_node, drop_below);
        // The interchange assumed the usual orientation of the special
        // banana, which gluing temporarily breaks; re-derive the label from
        // the position relative to the trail's low.
        let max_up = s.nodes::<SIGN>()[max_node].up;
        if is_special_root::<SIGN>(s, max_up) {
            debug_assert!(s.nodes::<SIGN>()[max_node].spine.on_spine());
            let max_item = node_item::<SIGN>(s, max_node);
            let low_item = node_item::<SIGN>(s, s.nodes::<SIGN>()[max_node].low);
            s.nodes_mut::<SIGN>()[max_node].spine = if s.items.order(max_item) < s.items.order(low_item)
            {
                SpineLabel::OnLeftSpine
            } else {
                SpineLabel::OnRightSpine
            };
        }
    }

    //
    // Cutting
    //

    /// Finds the smallest banana containing the probe in its in- or
    /// mid-panel. Both sides of the probe must carry a minimum and a
    /// maximum; interval-level cutting guarantees this by anticancelling a
    /// fresh pair at the cut first.
    pub(crate) fn smallest_banana(
        &self,
        s: &mut Store,
        probe: &CutProbe,
        min_dict: &mut Dictionary,
        max_dict: &mut Dictionary,
    ) -> Banana {
        let left_min = min_dict
            .prev_before(probe.order)
            .expect("a minimum exists to the left of the cut");
        let right_min = min_dict
            .next_after(probe.order)
            .expect("a minimum exists to the right of the cut");
        let left_max = max_dict
            .prev_before(probe.order)
            .expect("a maximum exists to the left of the cut");
        let right_max = max_dict
            .next_after(probe.order)
            .expect("a maximum exists to the right of the cut");

        // Work from the side whose maximum is interior relative to the cut.
        let (node_a, node_b, compare_less) =
            if s.items.order(left_min) < s.items.order(left_max) && s.items.order(left_max) < probe.order {
                (s.items.node::<SIGN>(right_min), s.items.node::<SIGN>(left_max), false)
            } else {
                (s.items.node::<SIGN>(left_min), s.items.node::<SIGN>(right_max), true)
            };
        debug_assert!(is_internal::<SIGN>(s, node_b), "expected a maximum");
        debug_assert!(is_leaf::<SIGN>(s, node_a), "expected a minimum");

        let before = |s: &Store, a: ItemId, b: ItemId| {
            if compare_less {
                s.items.order(a) < s.items.order(b)
            } else {
                s.items.order(a) > s.items.order(b)
            }
        };
        let b_down_item = node_item::<SIGN>(s, s.nodes::<SIGN>()[node_b].down);
        let b_item = node_item::<SIGN>(s, node_b);
        let (mut node_q, mut node_r) = if before(s, b_down_item, b_item) {
            let low = s.nodes::<SIGN>()[node_b].low;
            (s.nodes::<SIGN>()[low].death, s.nodes::<SIGN>()[node_b].down)
        } else {
            (node_b, s.nodes::<SIGN>()[node_b].mid)
        };
        while node_r != node_a && probe.value::<SIGN>() < node_value::<SIGN>(s, node_r) {
            node_q = node_r;
            node_r = s.nodes::<SIGN>()[node_r].r#in;
        }
        debug_assert!(is_internal::<SIGN>(s, node_q), "search must end at a maximum");
        let q_birth = birth::<SIGN>(s, node_q);
        Banana {
            min: node_item::<SIGN>(s, q_birth),
            max: node_item::<SIGN>(s, node_q),
        }
    }

    /// Loads the three same-sign stacks with the bananas crossed by the
    /// probe, from the smallest enclosing banana up to the spine.
    pub(crate) fn load_stacks(
        &self,
        s: &Store,
        probe: &CutProbe,
        smallest: Banana,
        l: &mut BananaStack,
        m: &mut BananaStack,
        r: &mut BananaStack,
    ) {
        log::trace!("loading cut stacks (sign {SIGN}) at order {}", probe.order);
        let mut node_p = s.items.node::<SIGN>(smallest.min);
        let mut node_q = s.items.node::<SIGN>(smallest.max);
        loop {
            let p_left = s.items.order(node_item::<SIGN>(s, node_p)) < probe.order;
            let q_left = s.items.order(node_item::<SIGN>(s, node_q)) < probe.order;
            let banana = Banana {
                min: node_item::<SIGN>(s, node_p),
                max: node_item::<SIGN>(s, node_q),
            };
            match (p_left, q_left) {
                (true, true) => l.push(banana),
                (false, false) => r.push(banana),
                _ => m.push(banana),
            }
            if s.nodes::<SIGN>()[node_q].spine.on_spine() {
                break;
            }
            node_p = s.nodes::<SIGN>()[node_q].low;
            node_q = s.nodes::<SIGN>()[node_p].death;
        }
    }

    /// Prepares this (empty) tree as the target of a cut. With `left` the
    /// special root parks at -inf and the right hook serves as the dummy;
    /// otherwise the left hook does.
    pub(crate) fn initialize_empty_cut_tree(&mut self, s: &mut Store, left: bool) {
        let special_root_node = self.allocate_node(s, self.special_root_item);
        let hook_node = if left {
            s.items.assign_order(self.special_root_item, f64::NEG_INFINITY);
            let hook = self.allocate_node(s, self.right_hook_item);
            s.nodes_mut::<SIGN>()[hook].spine = SpineLabel::OnRightSpine;
            hook
        } else {
            s.items.assign_order(self.special_root_item, f64::INFINITY);
            let hook = self.allocate_node(s, self.left_hook_item);
            s.nodes_mut::<SIGN>()[hook].spine = SpineLabel::OnLeftSpine;
            hook
        };
        let nodes = s.nodes_mut::<SIGN>();
        nodes[special_root_node].r#in = hook_node;
        nodes[special_root_node].mid = hook_node;
        nodes[special_root_node].low = hook_node;
        nodes[special_root_node].spine = SpineLabel::OnBothSpines;
        nodes[hook_node].r#in = special_root_node;
        nodes[hook_node].mid = special_root_node;
        nodes[hook_node].low = hook_node;
        nodes[hook_node].death = special_root_node;
    }

    /// Cuts this tree at the probe, moving one side into `other_tree`.
    /// Returns `true` if the cut separates along the left spine (the new
    /// tree receives the left part).
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn cut(
        &mut self,
        s: &mut Store,
        probe: &CutProbe,
        left_of_cut: ItemId,
        right_of_cut: ItemId,
        other_tree: &mut Self,
        l: &mut BananaStack,
        m: &mut BananaStack,
        r: &mut BananaStack,
        l_inv: &mut BananaStack,
        r_inv: &mut BananaStack,
    ) -> bool {
        log::trace!("cutting banana tree (sign {SIGN}) at order {}", probe.order);

        // A top banana of an inverse stack whose minimum under this sign has
        // no node here (it names the other tree's special root or a hook)
        // is not a banana of this tree and cannot be processed; set it aside
        // and push it back after postprocessing so the opposite-sign cut
        // still sees it. Anything with a node here is a genuine short-wave
        // banana of this tree and must stay for its scare.
        let mut l_inv_stash = None;
        if !l_inv.is_empty() {
            let top = l_inv.top();
            if s.items.node::<SIGN>(top.max).is_none() {
                l_inv_stash = Some(top);
                l_inv.actually_pop();
            }
        }
        let mut r_inv_stash = None;
        if !r_inv.is_empty() {
            let top = r_inv.top();
            if s.items.node::<SIGN>(top.max).is_none() {
                r_inv_stash = Some(top);
                r_inv.actually_pop();
            }
        }

        let modified_stack =
            add_missing_short_wave_banana::<SIGN>(s, l, m, r, l_inv, r_inv, probe.value::<SIGN>());

        // Decide which spine the cut separates from.
        let top_var =
            top_banana::<SIGN>(s, l, m, r, l_inv, r_inv).expect("cut stacks cannot be empty");
        let top_pair = top_under::<SIGN>(top_var, l, m, r, l_inv, r_inv);
        let top_max_node = s.items.node::<SIGN>(top_pair.max);
        let cuts_left = if is_special_root::<SIGN>(s, top_max_node) {
            // Trivially left for a cut in the in-panel; a cut in the
            // mid-panel moves the global minimum with everything attached.
            true
        } else if s.nodes::<SIGN>()[top_max_node].spine.on_left() {
            true
        } else {
            debug_assert!(s.nodes::<SIGN>()[top_max_node].spine.on_right());
            false
        };

        other_tree.initialize_empty_cut_tree(s, cuts_left);
        // The dummy starts just below the lowest minimum on the stacks.
        let dummy_node = birth::<SIGN>(s, other_tree.special_root(s));
        Self::nudge_leaf_value(s, dummy_node, top_pair.min, -1);

        if cuts_left {
            other_tree.left_endpoint = self.left_endpoint;
            other_tree.right_endpoint = left_of_cut;
            self.left_endpoint = right_of_cut;
        } else {
            other_tree.left_endpoint = right_of_cut;
            other_tree.right_endpoint = self.right_endpoint;
            self.right_endpoint = left_of_cut;
        }

        if s.items.is_up_type::<SIGN>(left_of_cut) {
            let n = s.items.node::<SIGN>(left_of_cut);
            s.nodes_mut::<SIGN>()[n].spine = SpineLabel::OnRightSpine;
        } else {
            let n = s.items.node::<SIGN>(right_of_cut);
            s.nodes_mut::<SIGN>()[n].spine = SpineLabel::OnLeftSpine;
        }

        self.cut_loop(s, probe, dummy_node, l, m, r, l_inv, r_inv);

        other_tree.fix_special_root_after_cut(s, cuts_left);
        // The loop labels every popped maximum, including a special root
        // popped from the M stack; restore its both-spines label.
        let self_special_root = self.special_root(s);
        s.nodes_mut::<SIGN>()[self_special_root].spine = SpineLabel::OnBothSpines;
        debug_assert!(
            is_special_root::<SIGN>(s, self_special_root),
            "cutting must leave a well-formed special root"
        );
        self.update_hooks_after_cut(s, other_tree, left_of_cut, right_of_cut, dummy_node, cuts_left);
        self.update_global_max_from_root(s);

        if let Some(which) = modified_stack {
            match which {
                StackRef::LInv => l_inv.actually_pop(),
                StackRef::RInv => r_inv.actually_pop(),
                _ => unreachable!("only inverse stacks receive the missing banana"),
            }
        }
        if let Some(banana) = l_inv_stash {
            l_inv.push(banana);
        }
        if let Some(banana) = r_inv_stash {
            r_inv.push(banana);
        }

        // As with gluing, one pass along the spines of both results settles
        // the labels the loop could not assign locally.
        self.init_spine_labels(s);
        other_tree.init_spine_labels(s);

        cuts_left
    }

    /// Pops the five stacks in order of decreasing maximum value, applying
    /// the matching rewrite.
    #[allow(clippy::too_many_arguments)]
    fn cut_loop(
        &mut self,
        s: &mut Store,
        probe: &CutProbe,
        dummy_node: NodeId,
        l: &mut BananaStack,
        m: &mut BananaStack,
        r: &mut BananaStack,
        l_inv: &mut BananaStack,
        r_inv: &mut BananaStack,
    ) {
        while let Some(which) = top_banana::<SIGN>(s, l, m, r, l_inv, r_inv) {
            let pair = top_under::<SIGN>(which, l, m, r, l_inv, r_inv);
            let min_node = s.items.node::<SIGN>(pair.min);
            let max_node = s.items.node::<SIGN>(pair.max);
            pop_from(which, l, m, r, l_inv, r_inv);
            match which {
                StackRef::L => {
                    s.nodes_mut::<SIGN>()[max_node].spine = SpineLabel::OnRightSpine;
                    self.do_injury(s, probe, max_node, dummy_node);
                }
                StackRef::M => {
                    let max_item = node_item::<SIGN>(s, max_node);
                    s.nodes_mut::<SIGN>()[max_node].spine = if probe.order < s.items.order(max_item) {
                        SpineLabel::OnLeftSpine
                    } else {
                        SpineLabel::OnRightSpine
                    };
                    self.do_fatality(s, probe, min_node, max_node, dummy_node);
                }
                StackRef::R => {
                    s.nodes_mut::<SIGN>()[max_node].spine = SpineLabel::OnLeftSpine;
                    self.do_injury(s, probe, max_node, dummy_node);
                }
                StackRef::LInv | StackRef::RInv => {
                    self.do_scare(s, min_node, dummy_node);
                }
            }
        }
    }

    /// Restores the convention that the new tree's special root sits at
    /// +inf, relabels its spine children and recomputes the global max.
    fn fix_special_root_after_cut(&mut self, s: &mut Store, cuts_left: bool) {
        if cuts_left {
            debug_assert!(
                s.items.order(self.special_root_item) == f64::NEG_INFINITY,
                "a left cut parks the special root at -inf during the loop"
            );
            s.items.assign_order(self.special_root_item, f64::INFINITY);
            let sr = self.special_root(s);
            let low = s.nodes::<SIGN>()[sr].low;
            let nodes = s.nodes_mut::<SIGN>();
            let n = &mut nodes[sr];
            std::mem::swap(&mut n.r#in, &mut n.mid);
            let n = &mut nodes[low];
            std::mem::swap(&mut n.r#in, &mut n.mid);
        }
        let sr = self.special_root(s);
        let (in_child, mid_child) = {
            let nodes = s.nodes::<SIGN>();
            (nodes[sr].r#in, nodes[sr].mid)
        };
        let nodes = s.nodes_mut::<SIGN>();
        nodes[sr].spine = SpineLabel::OnBothSpines;
        nodes[in_child].spine = SpineLabel::OnLeftSpine;
        nodes[mid_child].spine = SpineLabel::OnRightSpine;
        self.update_global_max_from_root(s);
        debug_assert!(self.global_max.is_some(), "a cut tree has a global max");
    }

    /// Reassigns the hooks of both trees after the cut and gives the dummy
    /// its final role and order.
    fn update_hooks_after_cut(
        &mut self,
        s: &mut Store,
        other_tree: &mut Self,
        left_of_cut: ItemId,
        right_of_cut: ItemId,
        dummy_node: NodeId,
        cuts_left: bool,
    ) {
        if cuts_left {
            let left_hook_node = self.left_hook(s);
            if left_hook_node.is_some() {
                // The old left hook moves to the new (left) tree.
                replace_node_item::<SIGN>(s, left_hook_node, other_tree.left_hook_item);
                other_tree.assign_hook_from_death(s, true);
            }
            if s.items.is_maximum::<SIGN>(right_of_cut) || s.items.is_down_type::<SIGN>(right_of_cut) {
                // The new down-type endpoint stays in this tree, so the
                // dummy becomes its hook here.
                replace_node_item::<SIGN>(s, dummy_node, self.left_hook_item);
                s.nodes_mut::<SIGN>()[dummy_node].spine = SpineLabel::OnLeftSpine;
                self.assign_hook_from_death(s, true);
            } else {
                debug_assert_eq!(
                    other_tree.right_hook(s),
                    dummy_node,
                    "the dummy serves as the new tree's right hook on a left cut"
                );
                other_tree.assign_hook_from_death(s, false);
                s.nodes_mut::<SIGN>()[dummy_node].spine = SpineLabel::OnRightSpine;
            }
        } else {
            let right_hook_node = self.right_hook(s);
            if right_hook_node.is_some() {
                replace_node_item::<SIGN>(s, right_hook_node, other_tree.right_hook_item);
                other_tree.assign_hook_from_death(s, false);
            }
            if s.items.is_maximum::<SIGN>(left_of_cut) || s.items.is_down_type::<SIGN>(left_of_cut) {
                replace_node_item::<SIGN>(s, dummy_node, self.right_hook_item);
                s.nodes_mut::<SIGN>()[dummy_node].spine = SpineLabel::OnRightSpine;
                self.assign_hook_from_death(s, false);
            } else {
                debug_assert_eq!(
                    other_tree.left_hook(s),
                    dummy_node,
                    "the dummy serves as the new tree's left hook on a right cut"
                );
                other_tree.assign_hook_from_death(s, true);
                s.nodes_mut::<SIGN>()[dummy_node].spine = SpineLabel::OnLeftSpine;
            }
        }
    }

    fn probe_between(s: &Store, probe: &CutProbe, a: ItemId, b: ItemId) -> bool {
        let (ao, bo) = (s.items.order(a), s.items.order(b));
        (ao < probe.order && probe.order < bo) || (bo < probe.order && probe.order < ao)
    }

    /// Moves the in-trail section of `max_node` on the far side of the cut
    /// into the dummy's mid-trail.
    fn do_injury(&mut self, s: &mut Store, probe: &CutProbe, max_node: NodeId, dummy_node: NodeId) {
        debug_assert!(is_internal::<SIGN>(s, max_node));
        debug_assert!(is_hook::<SIGN>(s, dummy_node), "the target must be the dummy");

        s.metrics.injuries[sign_index::<SIGN>()] += 1;

        let in_item = node_item::<SIGN>(s, s.nodes::<SIGN>()[max_node].r#in);
        let max_item = node_item::<SIGN>(s, max_node);
        if !Self::probe_between(s, probe, in_item, max_item) {
            return;
        }
        debug_assert!(
            s.nodes::<SIGN>()[max_node].r#in != birth::<SIGN>(s, max_node),
            "an injury moves a non-empty trail section"
        );

        let top_of_in = s.nodes::<SIGN>()[max_node].r#in;
        let mut node_below_cut = top_of_in;
        loop {
            let below_item = node_item::<SIGN>(s, node_below_cut);
            if !Self::probe_between(s, probe, below_item, max_item) {
                break;
            }
            // The node moves to a new trail; update its low now.
            s.nodes_mut::<SIGN>()[node_below_cut].low = dummy_node;
            node_below_cut = s.nodes::<SIGN>()[node_below_cut].down;
        }
        let node_above_cut = if is_leaf::<SIGN>(s, node_below_cut) {
            s.nodes::<SIGN>()[node_below_cut].r#in
        } else {
            s.nodes::<SIGN>()[node_below_cut].up
        };
        debug_assert!(
            node_above_cut != birth::<SIGN>(s, max_node),
            "min and max of an injured banana lie on the same side of the cut"
        );

        // Close the old trail.
        s.nodes_mut::<SIGN>()[max_node].r#in = node_below_cut;
        set_in_or_up::<SIGN>(s, node_below_cut, max_node);

        // Insert the moved section into the dummy's mid-trail.
        let dummy_mid = s.nodes::<SIGN>()[dummy_node].mid;
        let dummy_death = s.nodes::<SIGN>()[dummy_node].death;
        set_mid_or_down::<SIGN>(s, dummy_mid, top_of_in, dummy_mid == dummy_death);
        s.nodes_mut::<SIGN>()[top_of_in].up = dummy_mid;
        s.nodes_mut::<SIGN>()[dummy_node].mid = node_above_cut;
        s.nodes_mut::<SIGN>()[node_above_cut].down = dummy_node;

        self.update_dummy_position_in_cut(s, dummy_node);
    }

    /// Swaps the trail sections of `max_node` on the far side of the cut
    /// against the dummy; `max_node` ends up paired with the dummy.
    fn do_fatality(
        &mut self,
        s: &mut Store,
        probe: &CutProbe,
        min_node: NodeId,
        max_node: NodeId,
        dummy_node: NodeId,
    ) {
        debug_assert!(is_leaf::<SIGN>(s, min_node));
        debug_assert!(is_internal::<SIGN>(s, max_node));
        debug_assert_eq!(s.nodes::<SIGN>()[min_node].death, max_node);
        debug_assert!(is_hook::<SIGN>(s, dummy_node), "the target must be the dummy");

        s.metrics.fatalities[sign_index::<SIGN>()] += 1;

        // Special roots need their low pointers fixed; detect before any
        // rewiring.
        let dummy_death = s.nodes::<SIGN>()[dummy_node].death;
        if is_special_root::<SIGN>(s, dummy_death) {
            s.nodes_mut::<SIGN>()[dummy_death].low = min_node;
        }
        if is_special_root::<SIGN>(s, max_node) {
            s.nodes_mut::<SIGN>()[max_node].low = dummy_node;
        }

        // Select the moved tops and update low pointers of the nodes that
        // stay on the mid-trail.
        let max_item = node_item::<SIGN>(s, max_node);
        let top_of_in = s.nodes::<SIGN>()[max_node].r#in;
        let mut above_top_of_mid = max_node;
        let mut top_of_mid = s.nodes::<SIGN>()[max_node].mid;
        loop {
            let mid_item = node_item::<SIGN>(s, top_of_mid);
            let (po, mo, xo) = (probe.order, s.items.order(mid_item), s.items.order(max_item));
            let between = (po < mo && mo < xo) || (xo < mo && mo < po);
            if !between {
                break;
            }
            s.nodes_mut::<SIGN>()[top_of_mid].low = dummy_node;
            above_top_of_mid = top_of_mid;
            top_of_mid = s.nodes::<SIGN>()[top_of_mid].down;
        }
        // The in-trail becomes a mid-trail and vice versa.
        {
            let n = &mut s.nodes_mut::<SIGN>()[min_node];
            std::mem::swap(&mut n.r#in, &mut n.mid);
        }
        let dummy_mid = s.nodes::<SIGN>()[dummy_node].mid;
        let dummy_death = s.nodes::<SIGN>()[dummy_node].death;
        set_mid_or_down::<SIGN>(s, dummy_mid, top_of_in, dummy_mid == dummy_death);
        set_mid_or_up::<SIGN>(s, top_of_in, dummy_mid);
        let dummy_in = s.nodes::<SIGN>()[dummy_node].r#in;
        // The dummy's in-trail is empty, so this always lands on its `in`.
        set_in_or_down::<SIGN>(s, dummy_in, top_of_mid, true);
        set_in_or_up::<SIGN>(s, top_of_mid, dummy_in);

        // The dummy becomes the top of `max_node`'s in-trail.
        s.nodes_mut::<SIGN>()[dummy_node].r#in = max_node;
        s.nodes_mut::<SIGN>()[max_node].r#in = dummy_node;
        s.nodes_mut::<SIGN>()[dummy_node].mid = above_top_of_mid;
        set_mid_or_down::<SIGN>(s, above_top_of_mid, dummy_node, above_top_of_mid == max_node);

        // Exchange the pairings of the two leaves.
        {
            let nodes = s.nodes_mut::<SIGN>();
            let dd = nodes[dummy_node].death;
            let md = nodes[min_node].death;
            nodes[dummy_node].death = md;
            nodes[min_node].death = dd;
        }

        // Low pointers above the moved tops now point at `min_node`. The
        // in-trail above `top_of_mid` is empty (the dummy's was), so only
        // the mid side is walked.
        let min_death = s.nodes::<SIGN>()[min_node].death;
        let mut up_node = if top_of_in == min_node {
            s.nodes::<SIGN>()[top_of_in].mid
        } else {
            s.nodes::<SIGN>()[top_of_in].up
        };
        while up_node != min_death {
            s.nodes_mut::<SIGN>()[up_node].low = min_node;
            up_node = s.nodes::<SIGN>()[up_node].up;
        }

        self.update_dummy_position_in_cut(s, dummy_node);
    }

    /// Drops the dummy below `min_node` via a min-interchange.
    fn do_scare(&mut self, s: &mut Store, min_node: NodeId, dummy_node: NodeId) {
        debug_assert!(is_leaf::<SIGN>(s, min_node));
        debug_assert!(is_hook::<SIGN>(s, dummy_node), "the target must be the dummy");

        s.metrics.scares[sign_index::<SIGN>()] += 1;

        let reference = node_item::<SIGN>(s, min_node);
        Self::nudge_leaf_value(s, dummy_node, reference, 1);
        min_interchange_below::<SIGN>(s, min_node, dummy_node);
    }

    /// Keeps the dummy's order just outside the trail section it currently
    /// terminates.
    fn update_dummy_position_in_cut(&self, s: &mut Store, dummy_node: NodeId) {
        let nodes = s.nodes::<SIGN>();
        let is_left_end = if nodes[dummy_node].death != nodes[dummy_node].mid {
            let mid = nodes[dummy_node].mid;
            let mid_up = nodes[mid].up;
            s.items.order(nodes[mid].item) < s.items.order(nodes[mid_up].item)
        } else {
            let death = nodes[dummy_node].death;
            let death_low = nodes[death].low;
            s.items.order(nodes[death].item) < s.items.order(nodes[death_low].item)
        };
        let base = s.items.order(nodes[nodes[dummy_node].mid].item);
        let dummy_item = nodes[dummy_node].item;
        let order = tiny_offset(if is_left_end { -1 } else { 1 }, base);
        s.items.assign_order(dummy_item, order);
    }
}

// Copyright (c) 2025-present, banana-tree contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! The coupled pair of banana trees.
//!
//! Every structural change to the up-tree is mirrored in the down-tree in
//! lock-step: the interchange loops report each max-interchange through a
//! callback that immediately performs the corresponding min-interchange on
//! the opposite-sign nodes. The mirroring must happen inside the loop, since the
//! next iteration reads the coupled state; the callback is never
//! deferred.

use crate::arena::{Handle, ItemId, NodeId};
use crate::diagram::{PersistenceDiagram, SubDiagram};
use crate::dictionary::Dictionary;
use crate::store::Store;
use crate::tree::topology::{Banana, BananaStack, CutProbe};
use crate::tree::{birth, is_hook, local::min_interchange_below, node_item, BananaTree, DownTree, UpTree};
use crate::types::{DOWN, UP};

pub(crate) struct Persistence {
    pub(crate) up: UpTree,
    pub(crate) down: DownTree,
}

/// Mirrors an up-tree max-interchange of `(above, below)` as a down-tree
/// min-interchange. Flipping the sign swaps above and below: the node that
/// rose past its parent drops below it in the other tree.
fn mirror_in_down(s: &mut Store, above: NodeId, below: NodeId) {
    let above_item = s.nodes::<UP>()[above].item;
    let below_item = s.nodes::<UP>()[below].item;
    let down_above = s.items.node::<DOWN>(above_item);
    let down_below = s.items.node::<DOWN>(below_item);
    min_interchange_below::<DOWN>(s, down_above, down_below);
}

/// Mirrors a down-tree max-interchange as an up-tree min-interchange.
fn mirror_in_up(s: &mut Store, above: NodeId, below: NodeId) {
    let above_item = s.nodes::<DOWN>()[above].item;
    let below_item = s.nodes::<DOWN>()[below].item;
    let up_above = s.items.node::<UP>(above_item);
    let up_below = s.items.node::<UP>(below_item);
    min_interchange_below::<UP>(s, up_above, up_below);
}

impl Persistence {
    pub(crate) fn new(s: &mut Store) -> Self {
        Self {
            up: BananaTree::new(s),
            down: BananaTree::new(s),
        }
    }

    pub(crate) fn construct(&mut self, s: &mut Store, left_endpoint: ItemId, right_endpoint: ItemId) {
        self.up.construct(s, left_endpoint, right_endpoint);
        self.down.construct(s, left_endpoint, right_endpoint);
    }

    //
    // Local maintenance
    //

    pub(crate) fn on_increase_value_of_maximum(&mut self, s: &mut Store, max_item: ItemId) {
        self.up.on_increase_value_of_maximum(s, max_item, mirror_in_down);
    }

    pub(crate) fn on_decrease_value_of_maximum(&mut self, s: &mut Store, max_item: ItemId) {
        self.up.on_decrease_value_of_maximum(s, max_item, mirror_in_down);
    }

    pub(crate) fn on_increase_value_of_minimum(&mut self, s: &mut Store, min_item: ItemId) {
        // An increasing minimum is a decreasing maximum of the down-tree.
        self.down.on_decrease_value_of_maximum(s, min_item, mirror_in_up);
    }

    pub(crate) fn on_decrease_value_of_minimum(&mut self, s: &mut Store, min_item: ItemId) {
        self.down.on_increase_value_of_maximum(s, min_item, mirror_in_up);
    }

    /// Anticancels the neighbouring pair `(pair_min, pair_max)`, assumed
    /// close enough in value to pair with each other in both trees.
    pub(crate) fn anticancel(
        &mut self,
        s: &mut Store,
        min_dict: &mut Dictionary,
        max_dict: &mut Dictionary,
        pair_min: ItemId,
        pair_max: ItemId,
    ) {
        debug_assert!(
            s.items.left_neighbor(pair_min) == pair_max || s.items.right_neighbor(pair_min) == pair_max,
            "anticancelled items have to be neighbours"
        );
        let min_order = s.items.order(pair_min);
        let max_order = s.items.order(pair_max);
        let closest_max = max_dict
            .closest_on_opposite_side(min_order, max_order)
            .expect("insertion at an endpoint is not an anticancellation");
        let closest_min = min_dict
            .closest_on_opposite_side(max_order, min_order)
            .expect("insertion at an endpoint is not an anticancellation");

        self.up.anticancel(s, closest_max, pair_min, pair_max);
        self.down.anticancel(s, closest_min, pair_max, pair_min);
    }

    /// Removes the paired items `min_item` and `max_item`, whose banana is
    /// empty in both trees.
    pub(crate) fn cancel(&mut self, s: &mut Store, min_item: ItemId, max_item: ItemId) {
        self.up.cancel_maximum(s, max_item);
        self.down.cancel_maximum(s, min_item);
    }

    pub(crate) fn cancel_max_with_endpoint(&mut self, s: &mut Store, item: ItemId, endpoint: ItemId) {
        self.up.cancel_max_with_endpoint(s, item, endpoint);
        self.down.cancel_min_with_endpoint(s, item, endpoint);
    }

    pub(crate) fn cancel_min_with_endpoint(&mut self, s: &mut Store, item: ItemId, endpoint: ItemId) {
        self.up.cancel_min_with_endpoint(s, item, endpoint);
        self.down.cancel_max_with_endpoint(s, item, endpoint);
    }

    pub(crate) fn max_slide(&mut self, s: &mut Store, old_max: ItemId, new_max: ItemId) {
        self.up.max_slide(s, old_max, new_max);
        self.down.min_slide(s, old_max, new_max);
    }

    pub(crate) fn min_slide(&mut self, s: &mut Store, old_min: ItemId, new_min: ItemId) {
        self.up.min_slide(s, old_min, new_min);
        self.down.max_slide(s, old_min, new_min);
    }

    /// Processes an endpoint changing from down-type to up-type.
    pub(crate) fn change_down_to_up(&mut self, s: &mut Store, endpoint: ItemId, neighbor: ItemId) {
        if s.items.is_noncritical::<UP>(neighbor) {
            self.up.cancel_min_with_endpoint(s, neighbor, endpoint);
            self.down.cancel_max_with_endpoint(s, neighbor, endpoint);
        } else {
            self.up.max_slide(s, endpoint, neighbor);
            self.down.min_slide(s, endpoint, neighbor);
        }
    }

    /// Processes an endpoint changing from up-type to down-type.
    pub(crate) fn change_up_to_down(&mut self, s: &mut Store, endpoint: ItemId, neighbor: ItemId) {
        if s.items.is_noncritical::<UP>(neighbor) {
            self.up.cancel_max_with_endpoint(s, neighbor, endpoint);
            self.down.cancel_min_with_endpoint(s, neighbor, endpoint);
        } else {
            self.up.min_slide(s, endpoint, neighbor);
            self.down.max_slide(s, endpoint, neighbor);
        }
    }

    pub(crate) fn replace_right_endpoint(&mut self, s: &mut Store, new_endpoint: ItemId) {
        self.up.replace_right_endpoint(s, new_endpoint);
        self.down.replace_right_endpoint(s, new_endpoint);
    }

    pub(crate) fn replace_left_endpoint(&mut self, s: &mut Store, new_endpoint: ItemId) {
        self.up.replace_left_endpoint(s, new_endpoint);
        self.down.replace_left_endpoint(s, new_endpoint);
    }

    //
    // Topological maintenance
    //

    /// Glues `right` onto this pair. `min_dict` and `max_dict` are the
    /// already-joined dictionaries of minima and maxima.
    pub(crate) fn glue_to_right(
        &mut self,
        s: &mut Store,
        right: &mut Persistence,
        min_dict: &mut Dictionary,
        max_dict: &mut Dictionary,
    ) {
        self.up.glue_to_right(s, &mut right.up, min_dict);
        self.down.glue_to_right(s, &mut right.down, max_dict);
    }

    /// Cuts between `left_of_cut` and `right_of_cut`, two fresh neighbouring
    /// samples forming a min–max window at the cut. Returns the pair for the
    /// part that is cut off; the list link between the two samples is cut
    /// here.
    pub(crate) fn cut(
        &mut self,
        s: &mut Store,
        left_of_cut: ItemId,
        right_of_cut: ItemId,
        min_dict: &mut Dictionary,
        max_dict: &mut Dictionary,
    ) -> Persistence {
        let mut other = Persistence::new(s);

        let probe = CutProbe {
            order: (s.items.order(left_of_cut) + s.items.order(right_of_cut)) / 2.0,
            raw_value: (s.items.raw_value(left_of_cut) + s.items.raw_value(right_of_cut)) / 2.0,
        };

        let left_is_min = s.items.is_minimum::<UP>(left_of_cut);
        assert!(
            (left_is_min && s.items.is_maximum::<UP>(right_of_cut))
                || (s.items.is_maximum::<UP>(left_of_cut) && s.items.is_minimum::<UP>(right_of_cut)),
            "cutting needs a minimum and a maximum on either side of the cut"
        );
        assert!(
            s.items.right_neighbor(left_of_cut) == right_of_cut,
            "the samples around the cut must be neighbours"
        );

        if left_is_min {
            self.anticancel(s, min_dict, max_dict, left_of_cut, right_of_cut);
        } else {
            self.anticancel(s, min_dict, max_dict, right_of_cut, left_of_cut);
        }
        debug_assert_eq!(
            self.up.smallest_banana(s, &probe, min_dict, max_dict),
            if left_is_min {
                Banana { min: left_of_cut, max: right_of_cut }
            } else {
                Banana { min: right_of_cut, max: left_of_cut }
            },
            "the anticancelled pair is the smallest banana at the cut"
        );
        let smallest_up = if left_is_min {
            Banana { min: left_of_cut, max: right_of_cut }
        } else {
            Banana { min: right_of_cut, max: left_of_cut }
        };
        let smallest_down = if left_is_min {
            Banana { min: right_of_cut, max: left_of_cut }
        } else {
            Banana { min: left_of_cut, max: right_of_cut }
        };

        s.items.cut_right(left_of_cut);

        let mut l_up = BananaStack::default();
        let mut m_up = BananaStack::default();
        let mut r_up = BananaStack::default();
        let mut l_down = BananaStack::default();
        let mut m_down = BananaStack::default();
        let mut r_down = BananaStack::default();
        self.up.load_stacks(s, &probe, smallest_up, &mut l_up, &mut m_up, &mut r_up);
        self.down
            .load_stacks(s, &probe, smallest_down, &mut l_down, &mut m_down, &mut r_down);

        let up_cuts_left = self.up.cut(
            s,
            &probe,
            left_of_cut,
            right_of_cut,
            &mut other.up,
            &mut l_up,
            &mut m_up,
            &mut r_up,
            &mut l_down,
            &mut r_down,
        );
        for stack in [&mut l_up, &mut m_up, &mut r_up, &mut l_down, &mut m_down, &mut r_down] {
            stack.reset_top();
        }
        let down_cuts_left = self.down.cut(
            s,
            &probe,
            left_of_cut,
            right_of_cut,
            &mut other.down,
            &mut l_down,
            &mut m_down,
            &mut r_down,
            &mut l_up,
            &mut r_up,
        );
        if up_cuts_left != down_cuts_left {
            self.down.swap_contents(&mut other.down, s);
        }

        other
    }

    //
    // Extraction
    //

    /// Appends this pair's diagram to `diagram`.
    pub(crate) fn extract_diagram(&self, s: &Store, diagram: &mut PersistenceDiagram) {
        extract_tree::<UP>(s, &self.up, diagram);
        extract_tree::<DOWN>(s, &self.down, diagram);
    }

    //
    // Queries
    //

    pub(crate) fn global_max(&self) -> ItemId {
        self.up.global_max
    }

    pub(crate) fn global_min(&self) -> ItemId {
        self.down.global_max
    }

    pub(crate) fn left_endpoint(&self) -> ItemId {
        self.up.left_endpoint
    }

    pub(crate) fn right_endpoint(&self) -> ItemId {
        self.up.right_endpoint
    }

    /// Releases the sentinel nodes and items of both trees.
    pub(crate) fn release(&mut self, s: &mut Store) {
        self.up.release(s);
        self.down.release(s);
    }
}

/// Walks one tree, emitting pairs and nesting arrows.
///
/// The up-tree contributes the essential pair (global minimum paired with
/// the global maximum) and the ordinary pairs; the down-tree contributes the
/// relative pairs. Bananas born at a hook contribute nothing; their nested
/// bananas inherit the enclosing parent.
fn extract_tree<const SIGN: i8>(s: &Store, tree: &BananaTree<SIGN>, diagram: &mut PersistenceDiagram) {
    let special_root = tree.special_root(s);
    if special_root.is_none() {
        return;
    }
    let mut stack: Vec<(NodeId, ItemId)> = vec![(special_root, ItemId::NONE)];
    while let Some((q, parent)) = stack.pop() {
        let p = birth::<SIGN>(s, q);
        let p_item = node_item::<SIGN>(s, p);
        let q_item = node_item::<SIGN>(s, q);

        let child_parent = if q == special_root {
            // Both trees agree on the essential birth: the up-tree's special
            // banana is born at the global minimum, and the down-tree's
            // global max field holds that same item.
            if SIGN == 1 {
                diagram.add_pair(SubDiagram::Essential, p_item, tree.global_max);
                p_item
            } else {
                tree.global_max
            }
        } else if is_hook::<SIGN>(s, p) {
            parent
        } else {
            let sub = if SIGN == 1 { SubDiagram::Ordinary } else { SubDiagram::Relative };
            diagram.add_pair(sub, p_item, q_item);
            if parent.is_some() {
                diagram.add_arrow(p_item, parent);
            }
            p_item
        };

        let nodes = s.nodes::<SIGN>();
        let mut c = nodes[q].r#in;
        while c != p {
            stack.push((c, child_parent));
            c = nodes[c].down;
        }
        let mut c = nodes[q].mid;
        while c != p {
            stack.push((c, child_parent));
            c = nodes[c].down;
        }
    }
}

// Copyright (c) 2025-present, banana-tree contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! An interval: one sample list, one coupled tree pair, three dictionaries.
//!
//! This layer owns the case analysis of value updates (which transitions
//! between non-critical, minimum, maximum and endpoint types an update
//! triggers) and sequences the atomic tree operations accordingly. Values
//! are staged through tiny offsets so that every intermediate state the
//! trees see is a valid generic configuration.

use crate::arena::{Handle, ItemId};
use crate::diagram::PersistenceDiagram;
use crate::dictionary::Dictionary;
use crate::persistence::Persistence;
use crate::store::Store;
use crate::types::{tiny_offset, Order, Value, DOWN, UP};

pub(crate) struct Interval {
    pub(crate) persistence: Persistence,
    pub(crate) min_dict: Dictionary,
    pub(crate) max_dict: Dictionary,
    pub(crate) nc_dict: Dictionary,
    pub(crate) left_endpoint: ItemId,
    pub(crate) right_endpoint: ItemId,
}

/// Moves `item` from one dictionary to another.
fn move_in_dictionaries(s: &Store, item: ItemId, from: &mut Dictionary, to: &mut Dictionary) {
    let key = s.items.order(item);
    let moved = from.remove(key);
    debug_assert_eq!(moved, Some(item), "item was not in the expected dictionary");
    to.insert(key, item);
}

impl Interval {
    pub(crate) fn new(s: &mut Store) -> Self {
        Self {
            persistence: Persistence::new(s),
            min_dict: Dictionary::default(),
            max_dict: Dictionary::default(),
            nc_dict: Dictionary::default(),
            left_endpoint: ItemId::NONE,
            right_endpoint: ItemId::NONE,
        }
    }

    /// Wraps the tree pair produced by a cut; the dictionaries are filled in
    /// by the caller.
    fn from_persistence(persistence: Persistence) -> Self {
        let left_endpoint = persistence.left_endpoint();
        let right_endpoint = persistence.right_endpoint();
        Self {
            persistence,
            min_dict: Dictionary::default(),
            max_dict: Dictionary::default(),
            nc_dict: Dictionary::default(),
            left_endpoint,
            right_endpoint,
        }
    }

    /// Builds the trees and dictionaries for the linked samples between the
    /// two endpoints.
    pub(crate) fn construct(&mut self, s: &mut Store, left_endpoint: ItemId, right_endpoint: ItemId) {
        self.left_endpoint = left_endpoint;
        self.right_endpoint = right_endpoint;
        self.persistence.construct(s, left_endpoint, right_endpoint);
        self.insert_into_dicts(s);
    }

    fn insert_into_dicts(&mut self, s: &Store) {
        let mut cursor = self.left_endpoint;
        while cursor.is_some() {
            let key = s.items.order(cursor);
            if s.items.is_minimum::<UP>(cursor) || s.items.is_up_type::<UP>(cursor) {
                self.min_dict.insert(key, cursor);
            } else if s.items.is_maximum::<UP>(cursor) || s.items.is_down_type::<UP>(cursor) {
                self.max_dict.insert(key, cursor);
            } else {
                self.nc_dict.insert(key, cursor);
            }
            cursor = s.items.right_neighbor(cursor);
        }
    }

    //
    // Value updates
    //

    /// Sets the value of `item` to `value`, maintaining both trees.
    pub(crate) fn update_value(&mut self, s: &mut Store, item: ItemId, value: Value) {
        if s.items.raw_value(item) == value {
            return;
        }
        if s.items.is_endpoint(item) {
            self.update_value_of_endpoint(s, item, value);
        } else if s.items.is_noncritical::<UP>(item) {
            self.update_non_critical_value(s, item, value);
        } else {
            self.update_critical_value(s, item, value);
        }
    }

    fn update_non_critical_value(&mut self, s: &mut Store, item: ItemId, value: Value) {
        let left_value = s.items.raw_value(s.items.left_neighbor(item));
        let right_value = s.items.raw_value(s.items.right_neighbor(item));
        if (left_value < value && value < right_value) || (left_value > value && value > right_value) {
            // The item stays non-critical.
            s.items.assign_value(item, value);
            return;
        }
        if value > s.items.raw_value(item) {
            self.increase_non_critical_value(s, item, value);
        } else {
            self.decrease_non_critical_value(s, item, value);
        }
    }

    /// Raises a non-critical item until it becomes a maximum: either the
    /// higher neighbour's maximum slides onto it, or the pair anticancels
    /// into a fresh banana.
    fn increase_non_critical_value(&mut self, s: &mut Store, item: ItemId, value: Value) {
        debug_assert!(s.items.is_noncritical::<UP>(item));
        debug_assert!(value > s.items.raw_value(item), "the value must increase");
        let high_neighbor = s.items.high_neighbor(item);
        if s.items.is_maximum::<UP>(high_neighbor) || s.items.is_down_type::<UP>(high_neighbor) {
            s.items.assign_value(item, value);
            self.persistence.max_slide(s, high_neighbor, item);
            self.persistence.on_increase_value_of_maximum(s, item);
            if s.items.is_endpoint(high_neighbor) {
                move_in_dictionaries(s, high_neighbor, &mut self.max_dict, &mut self.min_dict);
            } else {
                move_in_dictionaries(s, high_neighbor, &mut self.max_dict, &mut self.nc_dict);
            }
            move_in_dictionaries(s, item, &mut self.nc_dict, &mut self.max_dict);
        } else {
            // Anticancellation: `item` becomes a maximum, the higher
            // neighbour a minimum.
            let neighbor_value = s.items.raw_value(high_neighbor);
            s.items.assign_value(item, tiny_offset(1, neighbor_value));
            self.persistence
                .anticancel(s, &mut self.min_dict, &mut self.max_dict, high_neighbor, item);

            s.items.assign_value(item, value);
            self.persistence.on_increase_value_of_maximum(s, item);
            move_in_dictionaries(s, item, &mut self.nc_dict, &mut self.max_dict);
            move_in_dictionaries(s, high_neighbor, &mut self.nc_dict, &mut self.min_dict);
        }
    }

    /// Lowers a non-critical item until it becomes a minimum; mirror of
    /// [`Self::increase_non_critical_value`].
    fn decrease_non_critical_value(&mut self, s: &mut Store, item: ItemId, value: Value) {
        debug_assert!(s.items.is_noncritical::<UP>(item));
        debug_assert!(value < s.items.raw_value(item), "the value must decrease");
        let low_neighbor = s.items.low_neighbor(item);
        if s.items.is_minimum::<UP>(low_neighbor) || s.items.is_up_type::<UP>(low_neighbor) {
            s.items.assign_value(item, value);
            self.persistence.min_slide(s, low_neighbor, item);
            self.persistence.on_decrease_value_of_minimum(s, item);
            if s.items.is_endpoint(low_neighbor) {
                move_in_dictionaries(s, low_neighbor, &mut self.min_dict, &mut self.max_dict);
            } else {
                move_in_dictionaries(s, low_neighbor, &mut self.min_dict, &mut self.nc_dict);
            }
            move_in_dictionaries(s, item, &mut self.nc_dict, &mut self.min_dict);
        } else {
            let neighbor_value = s.items.raw_value(low_neighbor);
            s.items.assign_value(item, tiny_offset(-1, neighbor_value));
            self.persistence
                .anticancel(s, &mut self.min_dict, &mut self.max_dict, item, low_neighbor);

            s.items.assign_value(item, value);
            self.persistence.on_decrease_value_of_minimum(s, item);
            move_in_dictionaries(s, item, &mut self.nc_dict, &mut self.min_dict);
            move_in_dictionaries(s, low_neighbor, &mut self.nc_dict, &mut self.max_dict);
        }
    }

    fn update_critical_value(&mut self, s: &mut Store, item: ItemId, value: Value) {
        assert!(s.items.is_internal(item), "endpoints take the endpoint path");
        let value_increased = value > s.items.raw_value(item);
        if value_increased {
            if s.items.is_maximum::<UP>(item) {
                // Criticality cannot change going up.
                s.items.assign_value(item, value);
                self.persistence.on_increase_value_of_maximum(s, item);
            } else {
                self.increase_minimum(s, item, value);
            }
        } else if s.items.is_maximum::<UP>(item) {
            self.decrease_maximum(s, item, value);
        } else {
            s.items.assign_value(item, value);
            self.persistence.on_decrease_value_of_minimum(s, item);
        }
    }

    fn increase_minimum(&mut self, s: &mut Store, item: ItemId, value: Value) {
        debug_assert!(s.items.is_minimum::<UP>(item));
        let left_value = s.items.raw_value(s.items.left_neighbor(item));
        let right_value = s.items.raw_value(s.items.right_neighbor(item));
        if left_value > value && right_value > value {
            // Still a minimum afterwards.
            s.items.assign_value(item, value);
            self.persistence.on_increase_value_of_minimum(s, item);
            debug_assert!(s.items.is_minimum::<UP>(item));
            return;
        }
        // The minimum dies: raise it to just below the lower neighbour,
        // resolve the collision, then continue as a non-critical update.
        let low_neighbor = s.items.low_neighbor(item);
        let need_to_slide = s.items.is_noncritical::<UP>(low_neighbor);
        let neighbor_value = s.items.raw_value(low_neighbor);
        s.items.assign_value(item, tiny_offset(-1, neighbor_value));
        self.persistence.on_increase_value_of_minimum(s, item);
        if need_to_slide {
            s.items.assign_value(item, tiny_offset(1, neighbor_value));
            self.persistence.min_slide(s, item, low_neighbor);
            s.items.interpolate_neighbors(item);
            move_in_dictionaries(s, item, &mut self.min_dict, &mut self.nc_dict);
            move_in_dictionaries(s, low_neighbor, &mut self.nc_dict, &mut self.min_dict);
        } else if s.items.is_internal(low_neighbor) {
            self.persistence.cancel(s, item, low_neighbor);
            s.items.interpolate_neighbors(item);
            move_in_dictionaries(s, item, &mut self.min_dict, &mut self.nc_dict);
            move_in_dictionaries(s, low_neighbor, &mut self.max_dict, &mut self.nc_dict);
        } else {
            self.persistence.cancel_min_with_endpoint(s, item, low_neighbor);
            s.items.interpolate_neighbors(item);
            move_in_dictionaries(s, low_neighbor, &mut self.max_dict, &mut self.min_dict);
            move_in_dictionaries(s, item, &mut self.min_dict, &mut self.nc_dict);
        }
        self.update_non_critical_value(s, item, value);
    }

    fn decrease_maximum(&mut self, s: &mut Store, item: ItemId, value: Value) {
        debug_assert!(s.items.is_maximum::<UP>(item));
        let left_value = s.items.raw_value(s.items.left_neighbor(item));
        let right_value = s.items.raw_value(s.items.right_neighbor(item));
        if left_value < value && right_value < value {
            s.items.assign_value(item, value);
            self.persistence.on_decrease_value_of_maximum(s, item);
            debug_assert!(s.items.is_maximum::<UP>(item));
            return;
        }
        let high_neighbor = s.items.high_neighbor(item);
        let need_to_slide = s.items.is_noncritical::<UP>(high_neighbor);
        let neighbor_value = s.items.raw_value(high_neighbor);
        s.items.assign_value(item, tiny_offset(1, neighbor_value));
        self.persistence.on_decrease_value_of_maximum(s, item);
        if need_to_slide {
            s.items.assign_value(item, tiny_offset(-1, neighbor_value));
            self.persistence.max_slide(s, item, high_neighbor);
            s.items.interpolate_neighbors(item);
            move_in_dictionaries(s, item, &mut self.max_dict, &mut self.nc_dict);
            move_in_dictionaries(s, high_neighbor, &mut self.nc_dict, &mut self.max_dict);
        } else if s.items.is_internal(high_neighbor) {
            self.persistence.cancel(s, high_neighbor, item);
            s.items.interpolate_neighbors(item);
            move_in_dictionaries(s, item, &mut self.max_dict, &mut self.nc_dict);
            move_in_dictionaries(s, high_neighbor, &mut self.min_dict, &mut self.nc_dict);
        } else {
            self.persistence.cancel_max_with_endpoint(s, item, high_neighbor);
            s.items.interpolate_neighbors(item);
            move_in_dictionaries(s, high_neighbor, &mut self.min_dict, &mut self.max_dict);
            move_in_dictionaries(s, item, &mut self.max_dict, &mut self.nc_dict);
        }
        self.update_non_critical_value(s, item, value);
    }

    fn update_value_of_endpoint(&mut self, s: &mut Store, item: ItemId, value: Value) {
        assert!(s.items.is_endpoint(item), "item is not an endpoint");
        let value_increased = value > s.items.raw_value(item);
        let is_left = s.items.is_left_endpoint(item);
        let neighbor_item = if is_left {
            s.items.right_neighbor(item)
        } else {
            s.items.left_neighbor(item)
        };
        let neighbor_value = s.items.raw_value(neighbor_item);
        if value_increased {
            if s.items.is_down_type::<UP>(item) {
                // No change in criticality.
                s.items.assign_value(item, value);
                self.persistence.on_increase_value_of_maximum(s, item);
            } else if value > neighbor_value {
                // Up-type turns down-type. First close in on the neighbour
                // (two offsets, to leave room for the hook), then flip.
                s.items
                    .assign_value(item, tiny_offset(-1, tiny_offset(-1, neighbor_value)));
                self.persistence.on_increase_value_of_minimum(s, item);
                s.items.assign_value(item, value);
                self.persistence.change_up_to_down(s, item, neighbor_item);
                self.persistence.on_increase_value_of_maximum(s, item);
                move_in_dictionaries(s, item, &mut self.min_dict, &mut self.max_dict);
                if s.items.is_minimum::<UP>(neighbor_item) {
                    move_in_dictionaries(s, neighbor_item, &mut self.nc_dict, &mut self.min_dict);
                } else {
                    debug_assert!(
                        s.items.is_noncritical::<UP>(neighbor_item),
                        "the displaced neighbour is non-critical unless it became a minimum"
                    );
                    move_in_dictionaries(s, neighbor_item, &mut self.max_dict, &mut self.nc_dict);
                }
            } else {
                // Still up-type.
                s.items.assign_value(item, value);
                self.persistence.on_increase_value_of_minimum(s, item);
            }
        } else if s.items.is_down_type::<UP>(item) {
            if value < neighbor_value {
                // Down-type turns up-type.
                s.items
                    .assign_value(item, tiny_offset(1, tiny_offset(1, neighbor_value)));
                self.persistence.on_decrease_value_of_maximum(s, item);
                s.items.assign_value(item, value);
                self.persistence.change_down_to_up(s, item, neighbor_item);
                self.persistence.on_decrease_value_of_minimum(s, item);
                move_in_dictionaries(s, item, &mut self.max_dict, &mut self.min_dict);
                if s.items.is_maximum::<UP>(neighbor_item) {
                    move_in_dictionaries(s, neighbor_item, &mut self.nc_dict, &mut self.max_dict);
                } else {
                    debug_assert!(
                        s.items.is_noncritical::<UP>(neighbor_item),
                        "the displaced neighbour is non-critical unless it became a maximum"
                    );
                    move_in_dictionaries(s, neighbor_item, &mut self.min_dict, &mut self.nc_dict);
                }
            } else {
                s.items.assign_value(item, value);
                self.persistence.on_decrease_value_of_maximum(s, item);
            }
        } else {
            // Up-type going down keeps its type.
            s.items.assign_value(item, value);
            self.persistence.on_decrease_value_of_minimum(s, item);
        }
    }

    //
    // Insertion and deletion
    //

    /// Inserts a new sample at `order`, strictly between the endpoints. Its
    /// value interpolates the neighbours, so it starts non-critical.
    pub(crate) fn insert_item(&mut self, s: &mut Store, order: Order) -> ItemId {
        assert!(
            s.items.order(self.left_endpoint) < order && order < s.items.order(self.right_endpoint),
            "inserted samples must be interior"
        );
        let new_item = s.items.alloc(order, 0.0);
        let prev_min = self.min_dict.prev_before(order);
        let prev_max = self.max_dict.prev_before(order);
        let prev_nc = self.nc_dict.prev_before(order);
        let order_of = |s: &Store, it: Option<ItemId>| {
            it.map_or(f64::NEG_INFINITY, |it| s.items.order(it))
        };
        let prev_min_order = order_of(s, prev_min);
        let prev_max_order = order_of(s, prev_max);
        let prev_nc_order = order_of(s, prev_nc);
        assert!(
            prev_min.is_some() || prev_max.is_some() || prev_nc.is_some(),
            "an interior order has items to its left"
        );

        let left_neighbor = if prev_nc_order > prev_min_order && prev_nc_order > prev_max_order {
            prev_nc.expect("largest order exists")
        } else if prev_min_order > prev_nc_order && prev_min_order > prev_max_order {
            prev_min.expect("largest order exists")
        } else {
            prev_max.expect("largest order exists")
        };
        let right_neighbor = s.items.right_neighbor(left_neighbor);
        s.items.cut_right(left_neighbor);
        s.items.link(left_neighbor, new_item);
        s.items.link(new_item, right_neighbor);
        s.items.interpolate_neighbors(new_item);
        self.nc_dict.insert(order, new_item);
        new_item
    }

    /// Inserts a new sample between `item` and its right neighbour, order
    /// and value interpolated.
    pub(crate) fn insert_item_right_of(&mut self, s: &mut Store, item: ItemId) -> ItemId {
        let right_neighbor = s.items.right_neighbor(item);
        assert!(right_neighbor.is_some(), "cannot insert to the right of the right endpoint");
        let order = (s.items.order(item) + s.items.order(right_neighbor)) / 2.0;
        let new_item = s.items.alloc(order, 0.0);
        s.items.cut_right(item);
        s.items.link(item, new_item);
        s.items.link(new_item, right_neighbor);
        s.items.interpolate_neighbors(new_item);
        self.nc_dict.insert(order, new_item);
        new_item
    }

    pub(crate) fn insert_right_endpoint(&mut self, s: &mut Store, value: Value, offset: Order) -> ItemId {
        self.insert_endpoint(s, false, value, offset)
    }

    pub(crate) fn insert_left_endpoint(&mut self, s: &mut Store, value: Value, offset: Order) -> ItemId {
        self.insert_endpoint(s, true, value, -offset)
    }

    fn insert_endpoint(&mut self, s: &mut Store, left: bool, value: Value, offset: Order) -> ItemId {
        let old_endpoint = if left { self.left_endpoint } else { self.right_endpoint };
        let old_value = s.items.raw_value(old_endpoint);
        let was_down = s.items.is_down_type::<UP>(old_endpoint);
        // The new endpoint enters value-adjacent to the old one and takes
        // over its criticality; the real value is applied afterwards.
        let temp_value = if was_down {
            tiny_offset(1, old_value)
        } else {
            tiny_offset(-1, old_value)
        };
        let new_item = s.items.alloc(s.items.order(old_endpoint) + offset, temp_value);
        if left {
            s.items.link(new_item, old_endpoint);
        } else {
            s.items.link(old_endpoint, new_item);
        }
        if was_down {
            move_in_dictionaries(s, old_endpoint, &mut self.max_dict, &mut self.nc_dict);
            self.max_dict.insert(s.items.order(new_item), new_item);
        } else {
            move_in_dictionaries(s, old_endpoint, &mut self.min_dict, &mut self.nc_dict);
            self.min_dict.insert(s.items.order(new_item), new_item);
        }
        if left {
            self.persistence.replace_left_endpoint(s, new_item);
            self.left_endpoint = new_item;
        } else {
            self.persistence.replace_right_endpoint(s, new_item);
            self.right_endpoint = new_item;
        }
        self.update_value_of_endpoint(s, new_item, value);
        new_item
    }

    /// Deletes a non-endpoint sample, making it non-critical first if
    /// needed. The item is unlinked but not freed; the context owns that.
    pub(crate) fn delete_internal_item(&mut self, s: &mut Store, item: ItemId) {
        assert!(s.items.is_internal(item), "endpoint deletion takes the endpoint path");
        let left_neighbor = s.items.left_neighbor(item);
        let right_neighbor = s.items.right_neighbor(item);
        if s.items.is_critical::<UP>(item) {
            let target =
                (s.items.raw_value(left_neighbor) + s.items.raw_value(right_neighbor)) / 2.0;
            self.update_critical_value(s, item, target);
        }
        debug_assert!(
            s.items.is_noncritical::<UP>(item),
            "the item must be non-critical after forcing it"
        );
        let removed = self.nc_dict.remove(s.items.order(item));
        debug_assert_eq!(removed, Some(item));
        s.items.cut_right(left_neighbor);
        s.items.cut_left(right_neighbor);
        s.items.link(left_neighbor, right_neighbor);
    }

    pub(crate) fn delete_right_endpoint(&mut self, s: &mut Store) -> ItemId {
        self.delete_endpoint(s, false)
    }

    pub(crate) fn delete_left_endpoint(&mut self, s: &mut Store) -> ItemId {
        self.delete_endpoint(s, true)
    }

    fn delete_endpoint(&mut self, s: &mut Store, left: bool) -> ItemId {
        let old_endpoint = if left { self.left_endpoint } else { self.right_endpoint };
        let new_endpoint = if left {
            s.items.right_neighbor(old_endpoint)
        } else {
            s.items.left_neighbor(old_endpoint)
        };
        assert!(
            s.items.is_internal(new_endpoint),
            "deleting an endpoint needs at least three samples"
        );
        let next_neighbor = if left {
            s.items.right_neighbor(new_endpoint)
        } else {
            s.items.left_neighbor(new_endpoint)
        };
        let is_down = s.items.raw_value(new_endpoint) > s.items.raw_value(next_neighbor);
        // Collapse the old endpoint onto its neighbour so the neighbour is
        // non-critical at the moment of unlinking.
        let temp_value = if is_down {
            tiny_offset(1, s.items.raw_value(new_endpoint))
        } else {
            tiny_offset(-1, s.items.raw_value(new_endpoint))
        };
        self.update_value_of_endpoint(s, old_endpoint, temp_value);
        if s.items.is_down_type::<UP>(old_endpoint) {
            let removed = self.max_dict.remove(s.items.order(old_endpoint));
            debug_assert_eq!(removed, Some(old_endpoint));
        } else {
            let removed = self.min_dict.remove(s.items.order(old_endpoint));
            debug_assert_eq!(removed, Some(old_endpoint));
        }
        debug_assert!(
            s.items.is_noncritical::<UP>(new_endpoint),
            "the surviving neighbour must be non-critical before the unlink"
        );
        if left {
            s.items.cut_left(new_endpoint);
        } else {
            s.items.cut_right(new_endpoint);
        }
        if is_down {
            move_in_dictionaries(s, new_endpoint, &mut self.nc_dict, &mut self.max_dict);
        } else {
            move_in_dictionaries(s, new_endpoint, &mut self.nc_dict, &mut self.min_dict);
        }
        if left {
            self.persistence.replace_left_endpoint(s, new_endpoint);
            self.left_endpoint = new_endpoint;
        } else {
            self.persistence.replace_right_endpoint(s, new_endpoint);
            self.right_endpoint = new_endpoint;
        }
        old_endpoint
    }

    //
    // Topological maintenance
    //

    /// Glues `right` onto `left`; afterwards `left` is the combined interval
    /// and `right` is hollow.
    pub(crate) fn glue(s: &mut Store, left: &mut Interval, right: &mut Interval) {
        assert!(
            s.items.order(left.right_endpoint) < s.items.order(right.left_endpoint),
            "glued intervals must be ordered and disjoint"
        );
        log::trace!("gluing intervals");

        left.max_dict.join(&mut right.max_dict);
        left.min_dict.join(&mut right.min_dict);
        left.nc_dict.join(&mut right.nc_dict);

        left.persistence
            .glue_to_right(s, &mut right.persistence, &mut left.min_dict, &mut left.max_dict);

        let endpoint_l = left.right_endpoint;
        let endpoint_r = right.left_endpoint;

        s.items.link(endpoint_l, endpoint_r);
        left.right_endpoint = right.right_endpoint;
        right.left_endpoint = ItemId::NONE;
        right.right_endpoint = ItemId::NONE;

        Self::update_dicts_on_glue(
            s,
            endpoint_l,
            endpoint_r,
            &mut left.min_dict,
            &mut left.max_dict,
            &mut left.nc_dict,
        );
    }

    /// Moves the inner endpoints that lost their criticality during gluing
    /// into the non-critical dictionary.
    fn update_dicts_on_glue(
        s: &Store,
        endpoint_l: ItemId,
        endpoint_r: ItemId,
        min_dict: &mut Dictionary,
        max_dict: &mut Dictionary,
        nc_dict: &mut Dictionary,
    ) {
        let l_is_down =
            s.items.raw_value(endpoint_l) > s.items.raw_value(s.items.left_neighbor(endpoint_l));
        let r_is_down =
            s.items.raw_value(endpoint_r) > s.items.raw_value(s.items.right_neighbor(endpoint_r));
        let l_value = s.items.raw_value(endpoint_l);
        let r_value = s.items.raw_value(endpoint_r);
        if l_is_down && r_is_down {
            if l_value > r_value {
                move_in_dictionaries(s, endpoint_r, max_dict, nc_dict);
            } else {
                move_in_dictionaries(s, endpoint_l, max_dict, nc_dict);
            }
        } else if l_is_down && !r_is_down {
            if l_value < r_value {
                // Both melt into the glued slope.
                move_in_dictionaries(s, endpoint_l, max_dict, nc_dict);
                move_in_dictionaries(s, endpoint_r, min_dict, nc_dict);
            }
        } else if !l_is_down && r_is_down {
            if l_value > r_value {
                move_in_dictionaries(s, endpoint_l, min_dict, nc_dict);
                move_in_dictionaries(s, endpoint_r, max_dict, nc_dict);
            }
        } else if l_value > r_value {
            move_in_dictionaries(s, endpoint_l, min_dict, nc_dict);
        } else {
            move_in_dictionaries(s, endpoint_r, min_dict, nc_dict);
        }
    }

    /// Cuts this interval between `cut_item` and its right neighbour. Two
    /// fresh samples become the endpoints of the two results. Returns the
    /// interval that was cut off (left part iff the cut separated along the
    /// left spine).
    pub(crate) fn cut(&mut self, s: &mut Store, cut_item: ItemId) -> Interval {
        let right_neighbor = s.items.right_neighbor(cut_item);
        assert!(right_neighbor.is_some(), "cannot cut to the right of the right endpoint");
        assert!(
            !s.items.is_endpoint(right_neighbor),
            "cutting right of the second-to-last sample would strand an endpoint"
        );
        log::trace!("cutting interval right of order {}", s.items.order(cut_item));

        let cut_order = s.items.order(cut_item);
        let neighbor_order = s.items.order(right_neighbor);
        let mid_value = (s.items.raw_value(cut_item) + s.items.raw_value(right_neighbor)) / 2.0;
        let left_of_cut = s.items.alloc((2.0 * cut_order + neighbor_order) / 3.0, mid_value);
        let right_of_cut = s.items.alloc((cut_order + 2.0 * neighbor_order) / 3.0, mid_value);

        s.items.cut_right(cut_item);
        s.items.link(cut_item, left_of_cut);
        s.items.link(left_of_cut, right_of_cut);
        s.items.link(right_of_cut, right_neighbor);

        // Force one fresh sample to be a minimum and the other a maximum.
        if s.items.raw_value(cut_item) < s.items.raw_value(right_neighbor) {
            s.items.assign_value(left_of_cut, tiny_offset(1, mid_value));
            s.items.assign_value(right_of_cut, tiny_offset(-1, mid_value));
            self.max_dict.insert(s.items.order(left_of_cut), left_of_cut);
            self.min_dict.insert(s.items.order(right_of_cut), right_of_cut);
        } else {
            s.items.assign_value(left_of_cut, tiny_offset(-1, mid_value));
            s.items.assign_value(right_of_cut, tiny_offset(1, mid_value));
            self.min_dict.insert(s.items.order(left_of_cut), left_of_cut);
            self.max_dict.insert(s.items.order(right_of_cut), right_of_cut);
        }
        // The fresh pair needs value room strictly inside the gap; a gap of
        // two representable steps or less (cutting right between the
        // artifacts of an earlier cut) admits none.
        let gap_lo = s.items.raw_value(cut_item).min(s.items.raw_value(right_neighbor));
        let gap_hi = s.items.raw_value(cut_item).max(s.items.raw_value(right_neighbor));
        for fresh in [left_of_cut, right_of_cut] {
            let value = s.items.raw_value(fresh);
            assert!(
                gap_lo < value && value < gap_hi,
                "cutting needs value room between the neighbouring samples"
            );
        }

        let other = self.persistence.cut(
            s,
            left_of_cut,
            right_of_cut,
            &mut self.min_dict,
            &mut self.max_dict,
        );
        let mut new_interval = Interval::from_persistence(other);

        // Split the dictionaries and update the endpoints.
        let boundary = s.items.order(right_of_cut);
        if new_interval.left_endpoint == self.left_endpoint {
            // The new interval holds the left part.
            let keep_min = self.min_dict.split_at(boundary);
            new_interval.min_dict = std::mem::replace(&mut self.min_dict, keep_min);
            let keep_max = self.max_dict.split_at(boundary);
            new_interval.max_dict = std::mem::replace(&mut self.max_dict, keep_max);
            let keep_nc = self.nc_dict.split_at(boundary);
            new_interval.nc_dict = std::mem::replace(&mut self.nc_dict, keep_nc);
            self.left_endpoint = right_of_cut;
            debug_assert_eq!(new_interval.right_endpoint, left_of_cut);
        } else {
            new_interval.min_dict = self.min_dict.split_at(boundary);
            new_interval.max_dict = self.max_dict.split_at(boundary);
            new_interval.nc_dict = self.nc_dict.split_at(boundary);
            self.right_endpoint = left_of_cut;
            debug_assert_eq!(new_interval.left_endpoint, right_of_cut);
        }

        new_interval
    }

    //
    // Queries
    //

    pub(crate) fn compute_persistence_diagram(&self, s: &Store, diagram: &mut PersistenceDiagram) {
        self.persistence.extract_diagram(s, diagram);
    }

    /// All samples of this interval, left to right.
    pub(crate) fn items(&self, s: &Store) -> Vec<ItemId> {
        let mut out = Vec::new();
        let mut cursor = self.left_endpoint;
        while cursor.is_some() {
            out.push(cursor);
            cursor = s.items.right_neighbor(cursor);
        }
        out
    }

    /// Frees every node and sample owned by this interval: tree nodes
    /// first (they reference samples), then the samples.
    pub(crate) fn destroy(mut self, s: &mut Store) {
        let items = if self.left_endpoint.is_some() { self.items(s) } else { Vec::new() };
        for &item in &items {
            let up_node = s.items.node::<UP>(item);
            if up_node.is_some() {
                self.persistence.up.free_node(s, up_node);
            }
            let down_node = s.items.node::<DOWN>(item);
            if down_node.is_some() {
                self.persistence.down.free_node(s, down_node);
            }
        }
        self.persistence.release(s);
        for item in items {
            s.items.free(item);
        }
    }
}

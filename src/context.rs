// Copyright (c) 2025-present, banana-tree contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! The context façade: owns the arenas and the live intervals, and exposes
//! every operation of the engine.

use crate::arena::{Arena, ArenaStats, Handle, IntervalId, ItemId, NodeId};
use crate::diagram::PersistenceDiagram;
use crate::interval::Interval;
use crate::metrics::Metrics;
use crate::store::Store;
use crate::tree::{walk, BananaTree, SpineLabel};
use crate::types::{Criticality, Order, Sign, Value, DOWN, UP};
use rustc_hash::FxHashSet;

/// Names a node of one banana tree for inspection: either the node of a
/// sample, or one of the three sentinels.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum NodeRef {
    /// The node representing a sample.
    Item(ItemId),
    /// The special root sentinel.
    SpecialRoot,
    /// The left hook sentinel.
    LeftHook,
    /// The right hook sentinel.
    RightHook,
}

/// A read-only snapshot of one tree node's links, expressed as [`NodeRef`]s.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeView {
    /// Next node upwards on the trail (`None` for leaves).
    pub up: Option<NodeRef>,
    /// Next node downwards on the trail (`None` for leaves).
    pub down: Option<NodeRef>,
    /// Top of the in-trail (for leaves: first node up the in-trail).
    pub r#in: Option<NodeRef>,
    /// Top of the mid-trail (for leaves: first node up the mid-trail).
    pub mid: Option<NodeRef>,
    /// Lower end of the trail this node sits on.
    pub low: Option<NodeRef>,
    /// For leaves, the maximum this leaf is paired with.
    pub death: Option<NodeRef>,
    /// Spine label of the node.
    pub spine: SpineLabel,
    /// True iff the node is a leaf.
    pub is_leaf: bool,
    /// True iff the node lies on the in-trail of its trail's banana.
    pub on_in_trail: bool,
    /// True iff the node lies on the mid-trail of its trail's banana.
    pub on_mid_trail: bool,
}

/// The persistence engine: a set of intervals over shared arenas.
///
/// All operations assume their preconditions and panic loudly when they are
/// violated; see the individual methods.
pub struct PersistenceContext {
    store: Store,
    intervals: Arena<IntervalId, Interval>,
    live: FxHashSet<IntervalId>,
}

impl Default for PersistenceContext {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistenceContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: Store::default(),
            intervals: Arena::default(),
            live: FxHashSet::default(),
        }
    }

    /// Creates an interval from `values`, with sample orders starting at 0.
    ///
    /// # Panics
    ///
    /// Panics if fewer than two values are given.
    pub fn new_interval(&mut self, values: &[Value]) -> IntervalId {
        self.new_interval_at(values, 0.0).0
    }

    /// Creates an interval from `values` with sample orders
    /// `start_order, start_order + 1, ...`; also returns the sample handles.
    ///
    /// # Panics
    ///
    /// Panics if fewer than two values are given.
    pub fn new_interval_at(&mut self, values: &[Value], start_order: Order) -> (IntervalId, Vec<ItemId>) {
        assert!(values.len() >= 2, "an interval needs at least two samples");
        log::debug!("creating interval with {} samples", values.len());

        let mut handles = Vec::with_capacity(values.len());
        let mut previous = ItemId::NONE;
        for (idx, &value) in values.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let item = self.store.items.alloc(start_order + idx as f64, value);
            if previous.is_some() {
                self.store.items.link(previous, item);
            }
            handles.push(item);
            previous = item;
        }

        let mut interval = Interval::new(&mut self.store);
        interval.construct(&mut self.store, handles[0], previous);
        let id = self.intervals.alloc(interval);
        self.live.insert(id);
        (id, handles)
    }

    /// Sets the value of `item` to `value`.
    pub fn change_value(&mut self, interval: IntervalId, item: ItemId, value: Value) {
        self.intervals[interval].update_value(&mut self.store, item, value);
    }

    /// Inserts a sample at `order`, strictly between the endpoints; its
    /// value interpolates its neighbours.
    pub fn insert_item(&mut self, interval: IntervalId, order: Order) -> ItemId {
        self.intervals[interval].insert_item(&mut self.store, order)
    }

    /// Inserts a sample between `item` and its right neighbour, order and
    /// value interpolated.
    pub fn insert_item_right_of(&mut self, interval: IntervalId, item: ItemId) -> ItemId {
        self.intervals[interval].insert_item_right_of(&mut self.store, item)
    }

    /// Appends a new right endpoint with the given value; its order is the
    /// old endpoint's order plus `order_offset`.
    pub fn insert_right_endpoint(
        &mut self,
        interval: IntervalId,
        order_offset: Order,
        value: Value,
    ) -> ItemId {
        self.intervals[interval].insert_right_endpoint(&mut self.store, value, order_offset)
    }

    /// Prepends a new left endpoint with the given value; its order is the
    /// old endpoint's order minus `order_offset`.
    pub fn insert_left_endpoint(
        &mut self,
        interval: IntervalId,
        order_offset: Order,
        value: Value,
    ) -> ItemId {
        self.intervals[interval].insert_left_endpoint(&mut self.store, value, order_offset)
    }

    /// Deletes a sample (endpoint or interior) and frees it.
    pub fn delete_item(&mut self, interval: IntervalId, item: ItemId) {
        let ival = &mut self.intervals[interval];
        if item == ival.right_endpoint {
            ival.delete_right_endpoint(&mut self.store);
        } else if item == ival.left_endpoint {
            ival.delete_left_endpoint(&mut self.store);
        } else {
            ival.delete_internal_item(&mut self.store, item);
        }
        self.store.items.free(item);
    }

    /// Deletes the right endpoint.
    ///
    /// # Panics
    ///
    /// Panics if the interval has fewer than three samples.
    pub fn delete_right_endpoint(&mut self, interval: IntervalId) {
        let deleted = self.intervals[interval].delete_right_endpoint(&mut self.store);
        self.store.items.free(deleted);
    }

    /// Deletes the left endpoint.
    ///
    /// # Panics
    ///
    /// Panics if the interval has fewer than three samples.
    pub fn delete_left_endpoint(&mut self, interval: IntervalId) {
        let deleted = self.intervals[interval].delete_left_endpoint(&mut self.store);
        self.store.items.free(deleted);
    }

    /// Cuts `interval` between `cut_item` and its right neighbour. Returns
    /// the (left, right) interval handles; one of them is `interval`.
    ///
    /// # Panics
    ///
    /// Panics if `cut_item` is the right endpoint or its right neighbour is
    /// an endpoint.
    pub fn cut_interval(&mut self, interval: IntervalId, cut_item: ItemId) -> (IntervalId, IntervalId) {
        assert!(
            !self.store.items.is_right_endpoint(cut_item),
            "cannot cut to the right of the right endpoint"
        );
        let new_interval = self.intervals[interval].cut(&mut self.store, cut_item);
        let new_is_left = self.store.items.order(new_interval.left_endpoint)
            < self.store.items.order(self.intervals[interval].left_endpoint);
        let new_id = self.intervals.alloc(new_interval);
        self.live.insert(new_id);
        if new_is_left {
            (new_id, interval)
        } else {
            (interval, new_id)
        }
    }

    /// Glues `right_interval` onto `left_interval` and destroys the hollow
    /// right interval handle.
    ///
    /// # Panics
    ///
    /// Panics if the intervals coincide or are not ordered left-to-right.
    pub fn glue_intervals(&mut self, left_interval: IntervalId, right_interval: IntervalId) {
        assert!(left_interval != right_interval, "cannot glue an interval to itself");
        let mut right = self.intervals.free(right_interval);
        self.live.remove(&right_interval);
        let left = &mut self.intervals[left_interval];
        Interval::glue(&mut self.store, left, &mut right);
        right.destroy(&mut self.store);
    }

    /// Destroys `interval` and frees all of its samples and nodes.
    pub fn delete_interval(&mut self, interval: IntervalId) {
        let ival = self.intervals.free(interval);
        self.live.remove(&interval);
        ival.destroy(&mut self.store);
    }

    /// Extracts the diagrams of all live intervals into `diagram` (cleared
    /// first).
    pub fn compute_persistence_diagram(&self, diagram: &mut PersistenceDiagram) {
        diagram.clear();
        for &id in &self.live {
            self.intervals[id].compute_persistence_diagram(&self.store, diagram);
        }
    }

    /// Extracts the diagram of one interval into `diagram` (cleared first).
    pub fn compute_interval_diagram(&self, interval: IntervalId, diagram: &mut PersistenceDiagram) {
        diagram.clear();
        self.intervals[interval].compute_persistence_diagram(&self.store, diagram);
    }

    //
    // Reporter queries
    //

    /// Criticality of `item` under sign +1.
    #[must_use]
    pub fn criticality(&self, item: ItemId) -> Criticality {
        self.store.items.criticality(item)
    }

    /// Criticality of `item` as a short string ("min", "max" or "nc").
    #[must_use]
    pub fn criticality_as_str(&self, item: ItemId) -> &'static str {
        self.criticality(item).as_str()
    }

    /// The value of a sample.
    #[must_use]
    pub fn item_value(&self, item: ItemId) -> Value {
        self.store.items.raw_value(item)
    }

    /// The position key of a sample.
    #[must_use]
    pub fn item_order(&self, item: ItemId) -> Order {
        self.store.items.order(item)
    }

    /// The left endpoint of an interval.
    #[must_use]
    pub fn left_endpoint(&self, interval: IntervalId) -> ItemId {
        self.intervals[interval].left_endpoint
    }

    /// The right endpoint of an interval.
    #[must_use]
    pub fn right_endpoint(&self, interval: IntervalId) -> ItemId {
        self.intervals[interval].right_endpoint
    }

    /// All samples of an interval, left to right.
    #[must_use]
    pub fn interval_items(&self, interval: IntervalId) -> Vec<ItemId> {
        self.intervals[interval].items(&self.store)
    }

    /// The sample holding the global maximum of an interval.
    #[must_use]
    pub fn global_max_item(&self, interval: IntervalId) -> ItemId {
        self.intervals[interval].persistence.global_max()
    }

    /// The sample holding the global minimum of an interval.
    #[must_use]
    pub fn global_min_item(&self, interval: IntervalId) -> ItemId {
        self.intervals[interval].persistence.global_min()
    }

    /// Position of the global maximum.
    #[must_use]
    pub fn global_max_order(&self, interval: IntervalId) -> Order {
        self.item_order(self.global_max_item(interval))
    }

    /// Value of the global maximum.
    #[must_use]
    pub fn global_max_value(&self, interval: IntervalId) -> Value {
        self.item_value(self.global_max_item(interval))
    }

    /// Position of the global minimum.
    #[must_use]
    pub fn global_min_order(&self, interval: IntervalId) -> Order {
        self.item_order(self.global_min_item(interval))
    }

    /// Value of the global minimum.
    #[must_use]
    pub fn global_min_value(&self, interval: IntervalId) -> Value {
        self.item_value(self.global_min_item(interval))
    }

    /// Number of live intervals.
    #[must_use]
    pub fn num_intervals(&self) -> usize {
        self.live.len()
    }

    /// Sanity check: both trees represent exactly the critical samples of
    /// the interval.
    #[must_use]
    pub fn validate_item_counts(&self, interval: IntervalId) -> bool {
        let ival = &self.intervals[interval];
        let critical = ival
            .items(&self.store)
            .iter()
            .filter(|&&item| self.store.items.is_critical::<UP>(item))
            .count();
        let count_up = walk::count_string_nodes::<UP>(&ival.persistence.up, &self.store);
        let count_down = walk::count_string_nodes::<DOWN>(&ival.persistence.down, &self.store);
        if count_up != critical {
            log::debug!("up-tree node count {count_up} does not match {critical} critical samples");
        }
        if count_down != critical {
            log::debug!("down-tree node count {count_down} does not match {critical} critical samples");
        }
        count_up == critical && count_down == critical
    }

    /// Operation counters.
    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.store.metrics
    }

    /// Allocation counters of the sample arena.
    #[must_use]
    pub fn item_arena_stats(&self) -> ArenaStats {
        self.store.items.stats()
    }

    /// Allocation counters of the node arena for `sign`.
    #[must_use]
    pub fn node_arena_stats(&self, sign: Sign) -> ArenaStats {
        match sign {
            Sign::Up => self.store.up_nodes.stats(),
            Sign::Down => self.store.down_nodes.stats(),
        }
    }

    //
    // Inspection
    //

    /// A snapshot of the tree node standing for `at`, or `None` if nothing
    /// represents it.
    #[must_use]
    pub fn node_view(&self, interval: IntervalId, sign: Sign, at: NodeRef) -> Option<NodeView> {
        let ival = &self.intervals[interval];
        match sign {
            Sign::Up => view_node::<UP>(&self.store, &ival.persistence.up, at),
            Sign::Down => view_node::<DOWN>(&self.store, &ival.persistence.down, at),
        }
    }

    /// The bananas of one tree in walk order, as `(birth, max)` pairs.
    #[must_use]
    pub fn walk_pairs(&self, interval: IntervalId, sign: Sign) -> Vec<(NodeRef, NodeRef)> {
        let ival = &self.intervals[interval];
        match sign {
            Sign::Up => walk_refs::<UP>(&self.store, &ival.persistence.up),
            Sign::Down => walk_refs::<DOWN>(&self.store, &ival.persistence.down),
        }
    }

    pub(crate) fn store(&self) -> &Store {
        &self.store
    }

    pub(crate) fn interval(&self, id: IntervalId) -> &Interval {
        &self.intervals[id]
    }
}

fn item_to_ref<const SIGN: i8>(tree: &BananaTree<SIGN>, item: ItemId) -> NodeRef {
    if item == tree.special_root_item {
        NodeRef::SpecialRoot
    } else if item == tree.left_hook_item {
        NodeRef::LeftHook
    } else if item == tree.right_hook_item {
        NodeRef::RightHook
    } else {
        NodeRef::Item(item)
    }
}

fn resolve<const SIGN: i8>(s: &Store, tree: &BananaTree<SIGN>, at: NodeRef) -> NodeId {
    let item = match at {
        NodeRef::Item(item) => item,
        NodeRef::SpecialRoot => tree.special_root_item,
        NodeRef::LeftHook => tree.left_hook_item,
        NodeRef::RightHook => tree.right_hook_item,
    };
    s.items.node::<SIGN>(item)
}

fn view_node<const SIGN: i8>(s: &Store, tree: &BananaTree<SIGN>, at: NodeRef) -> Option<NodeView> {
    let n = resolve(s, tree, at);
    if n.is_none() {
        return None;
    }
    let to_ref = |link: NodeId| -> Option<NodeRef> {
        if link.is_none() {
            None
        } else {
            Some(item_to_ref(tree, s.nodes::<SIGN>()[link].item))
        }
    };
    let node = &s.nodes::<SIGN>()[n];
    Some(NodeView {
        up: to_ref(node.up),
        down: to_ref(node.down),
        r#in: to_ref(node.r#in),
        mid: to_ref(node.mid),
        low: to_ref(node.low),
        death: to_ref(node.death),
        spine: node.spine,
        is_leaf: crate::tree::is_leaf::<SIGN>(s, n),
        on_in_trail: crate::tree::is_on_in_trail::<SIGN>(s, n),
        on_mid_trail: crate::tree::is_on_mid_trail::<SIGN>(s, n),
    })
}

fn walk_refs<const SIGN: i8>(s: &Store, tree: &BananaTree<SIGN>) -> Vec<(NodeRef, NodeRef)> {
    walk::collect_walk(tree, s)
        .into_iter()
        .map(|(p, q)| {
            (
                item_to_ref(tree, s.nodes::<SIGN>()[p].item),
                item_to_ref(tree, s.nodes::<SIGN>()[q].item),
            )
        })
        .collect()
}

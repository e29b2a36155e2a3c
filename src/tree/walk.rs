// Copyright (c) 2025-present, banana-tree contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Read-only traversals of a banana tree.
//!
//! The banana walk lists bananas in nesting order: for each banana the
//! nested bananas hanging off the in-trail come first, bottom-up, then those
//! off the mid-trail. The string walk lists nodes in the order their items
//! appear along the interval, special root first.

use super::BananaTree;
use crate::arena::{Handle, ItemId, NodeId};
use crate::store::Store;

/// Iterator over the bananas of a tree, as `(birth, max)` node pairs.
pub(crate) struct BananaWalk<'a> {
    store: &'a Store,
    stack: Vec<NodeId>,
}

impl<const SIGN: i8> BananaTree<SIGN> {
    /// Walks all bananas starting from the special banana.
    pub(crate) fn walk<'a>(&self, s: &'a Store) -> BananaWalk<'a> {
        let mut stack = Vec::new();
        let sr = self.special_root(s);
        if sr.is_some() {
            stack.push(sr);
        }
        BananaWalk { store: s, stack }
    }

    /// Nodes in item order along the interval: the special root, then the
    /// left hook (if any), the critical items, and the right hook (if any).
    pub(crate) fn string<'a>(&self, s: &'a Store) -> StringWalk<'a> {
        StringWalk {
            store: s,
            state: StringState::Root {
                root: self.special_root(s),
                left_hook: self.left_hook(s),
                first_item: self.left_endpoint,
                right_hook: self.right_hook(s),
            },
            sign_is_up: SIGN == 1,
        }
    }
}

// The walk is sign-generic only through pointer reads, so one non-generic
// advance function serves both trees; the sign decides which arena to read.
fn walk_next(store: &Store, stack: &mut Vec<NodeId>, up: bool) -> Option<(NodeId, NodeId)> {
    let nodes = if up { &store.up_nodes } else { &store.down_nodes };
    let q = stack.pop()?;
    let p = nodes[nodes[q].r#in].low;
    // Children pop in in-trail-bottom-up, then mid-trail-bottom-up order.
    let mut c = nodes[q].mid;
    while c != p {
        stack.push(c);
        c = nodes[c].down;
    }
    let mut c = nodes[q].r#in;
    while c != p {
        stack.push(c);
        c = nodes[c].down;
    }
    Some((p, q))
}

impl BananaWalk<'_> {
    pub(crate) fn next_up(&mut self) -> Option<(NodeId, NodeId)> {
        walk_next(self.store, &mut self.stack, true)
    }

    pub(crate) fn next_down(&mut self) -> Option<(NodeId, NodeId)> {
        walk_next(self.store, &mut self.stack, false)
    }
}

/// Collects the walk of the tree with sign `SIGN` into `(birth, max)` pairs.
pub(crate) fn collect_walk<const SIGN: i8>(
    tree: &BananaTree<SIGN>,
    s: &Store,
) -> Vec<(NodeId, NodeId)> {
    let mut walk = tree.walk(s);
    let mut out = Vec::new();
    while let Some(pair) = if SIGN == 1 { walk.next_up() } else { walk.next_down() } {
        out.push(pair);
    }
    out
}

enum StringState {
    Root {
        root: NodeId,
        left_hook: NodeId,
        first_item: ItemId,
        right_hook: NodeId,
    },
    LeftHook {
        left_hook: NodeId,
        first_item: ItemId,
        right_hook: NodeId,
    },
    Items {
        cursor: ItemId,
        right_hook: NodeId,
    },
    RightHook {
        right_hook: NodeId,
    },
    Done,
}

/// Iterator over the nodes of one tree in item order.
pub(crate) struct StringWalk<'a> {
    store: &'a Store,
    state: StringState,
    sign_is_up: bool,
}

impl StringWalk<'_> {
    fn node_of(&self, item: ItemId) -> NodeId {
        if self.sign_is_up {
            self.store.items.node::<1>(item)
        } else {
            self.store.items.node::<{ -1 }>(item)
        }
    }
}

impl Iterator for StringWalk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            match self.state {
                StringState::Root { root, left_hook, first_item, right_hook } => {
                    self.state = StringState::LeftHook { left_hook, first_item, right_hook };
                    if root.is_some() {
                        return Some(root);
                    }
                }
                StringState::LeftHook { left_hook, first_item, right_hook } => {
                    self.state = StringState::Items { cursor: first_item, right_hook };
                    if left_hook.is_some() {
                        return Some(left_hook);
                    }
                }
                StringState::Items { cursor, right_hook } => {
                    if cursor.is_none() {
                        self.state = StringState::RightHook { right_hook };
                        continue;
                    }
                    let next = self.store.items.right_neighbor(cursor);
                    self.state = StringState::Items { cursor: next, right_hook };
                    let node = self.node_of(cursor);
                    if node.is_some() {
                        return Some(node);
                    }
                }
                StringState::RightHook { right_hook } => {
                    self.state = StringState::Done;
                    if right_hook.is_some() {
                        return Some(right_hook);
                    }
                }
                StringState::Done => return None,
            }
        }
    }
}

/// Counts the non-hook nodes along the string of the tree with sign `SIGN`,
/// excluding the special root.
pub(crate) fn count_string_nodes<const SIGN: i8>(tree: &BananaTree<SIGN>, s: &Store) -> usize {
    tree.string(s)
        .skip(1)
        .filter(|&n| !super::is_hook::<SIGN>(s, n))
        .count()
}

/// The string order of items represented in the tree (hooks and special
/// root excluded), used to validate that it matches the interval.
pub(crate) fn string_items<const SIGN: i8>(tree: &BananaTree<SIGN>, s: &Store) -> Vec<ItemId> {
    tree.string(s)
        .skip(1)
        .filter(|&n| !super::is_hook::<SIGN>(s, n))
        .map(|n| s.nodes::<SIGN>()[n].item)
        .collect()
}

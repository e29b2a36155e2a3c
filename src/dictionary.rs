// Copyright (c) 2025-present, banana-tree contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Ordered dictionaries over critical samples, keyed by position.
//!
//! Each interval keeps three of these (minima, maxima, non-critical). Cutting
//! and gluing intervals needs whole-dictionary split and join in logarithmic
//! time, so the implementation is a top-down splay tree: split splays the
//! boundary to the root and detaches one subtree, join splays the maximum of
//! the left tree to the root and hangs the right tree off it.

use crate::arena::ItemId;
use crate::types::Order;
use std::cmp::Ordering;

struct SplayNode {
    key: Order,
    item: ItemId,
    left: Link,
    right: Link,
}

type Link = Option<Box<SplayNode>>;

/// Splays `key` to the root: afterwards the root is the last node on the
/// search path for `key`: the key itself if present, otherwise its
/// predecessor or successor.
fn splay(key: Order, root: Link) -> Link {
    let mut t = root?;
    // Nodes peeled off to the left (all < key) and right (all > key) of the
    // search path; reassembled below the final root at the end.
    let mut left_spine: Vec<Box<SplayNode>> = Vec::new();
    let mut right_spine: Vec<Box<SplayNode>> = Vec::new();
    loop {
        match key.total_cmp(&t.key) {
            Ordering::Less => {
                let Some(mut l) = t.left.take() else { break };
                if key.total_cmp(&l.key) == Ordering::Less {
                    // Zig-zig: rotate right before descending.
                    t.left = l.right.take();
                    l.right = Some(t);
                    t = l;
                    let Some(next) = t.left.take() else { break };
                    right_spine.push(t);
                    t = next;
                } else {
                    right_spine.push(t);
                    t = l;
                }
            }
            Ordering::Greater => {
                let Some(mut r) = t.right.take() else { break };
                if key.total_cmp(&r.key) == Ordering::Greater {
                    // Zag-zag: rotate left before descending.
                    t.right = r.left.take();
                    r.left = Some(t);
                    t = r;
                    let Some(next) = t.right.take() else { break };
                    left_spine.push(t);
                    t = next;
                } else {
                    left_spine.push(t);
                    t = r;
                }
            }
            Ordering::Equal => break,
        }
    }
    let mut acc = t.left.take();
    for mut n in left_spine.into_iter().rev() {
        n.right = acc;
        acc = Some(n);
    }
    t.left = acc;
    let mut acc = t.right.take();
    for mut n in right_spine.into_iter().rev() {
        n.left = acc;
        acc = Some(n);
    }
    t.right = acc;
    Some(t)
}

fn leftmost(mut node: &SplayNode) -> &SplayNode {
    while let Some(ref l) = node.left {
        node = l;
    }
    node
}

fn rightmost(mut node: &SplayNode) -> &SplayNode {
    while let Some(ref r) = node.right {
        node = r;
    }
    node
}

/// An ordered set of samples keyed by position.
#[derive(Default)]
pub(crate) struct Dictionary {
    root: Link,
}

impl Dictionary {
    pub(crate) fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Inserts `item` under `key`. Keys are unique; inserting a present key
    /// is a caller error.
    pub(crate) fn insert(&mut self, key: Order, item: ItemId) {
        let root = splay(key, self.root.take());
        let Some(mut r) = root else {
            self.root = Some(Box::new(SplayNode { key, item, left: None, right: None }));
            return;
        };
        match key.total_cmp(&r.key) {
            Ordering::Equal => panic!("inserted a duplicate key into a dictionary"),
            Ordering::Less => {
                let left = r.left.take();
                self.root = Some(Box::new(SplayNode { key, item, left, right: Some(r) }));
            }
            Ordering::Greater => {
                let right = r.right.take();
                self.root = Some(Box::new(SplayNode { key, item, left: Some(r), right }));
            }
        }
    }

    /// Removes the entry under `key`, if present.
    pub(crate) fn remove(&mut self, key: Order) -> Option<ItemId> {
        let root = splay(key, self.root.take())?;
        if key.total_cmp(&root.key) != Ordering::Equal {
            self.root = Some(root);
            return None;
        }
        let SplayNode { item, left, right, .. } = *root;
        self.root = Self::join_links(left, right);
        Some(item)
    }

    pub(crate) fn contains(&mut self, key: Order) -> bool {
        self.root = splay(key, self.root.take());
        matches!(&self.root, Some(r) if r.key.total_cmp(&key) == Ordering::Equal)
    }

    /// The item with the least key strictly greater than `key`.
    pub(crate) fn next_after(&mut self, key: Order) -> Option<ItemId> {
        self.root = splay(key, self.root.take());
        let root = self.root.as_ref()?;
        if root.key.total_cmp(&key) == Ordering::Greater {
            return Some(root.item);
        }
        // Root is the key itself or its predecessor; the successor is the
        // leftmost entry of the right subtree.
        root.right.as_ref().map(|r| leftmost(r).item)
    }

    /// The item with the greatest key strictly less than `key`.
    pub(crate) fn prev_before(&mut self, key: Order) -> Option<ItemId> {
        self.root = splay(key, self.root.take());
        let root = self.root.as_ref()?;
        if root.key.total_cmp(&key) == Ordering::Less {
            return Some(root.item);
        }
        root.left.as_ref().map(|l| rightmost(l).item)
    }

    /// The item closest to `center` that is not on the same side of `center`
    /// as `other`: `next_after(center)` if `other < center`, otherwise
    /// `prev_before(center)`.
    pub(crate) fn closest_on_opposite_side(&mut self, center: Order, other: Order) -> Option<ItemId> {
        if other < center {
            self.next_after(center)
        } else {
            self.prev_before(center)
        }
    }

    fn join_links(left: Link, right: Link) -> Link {
        let Some(left) = left else { return right };
        let mut left = splay(f64::INFINITY, Some(left)).expect("splay keeps the tree non-empty");
        debug_assert!(left.right.is_none(), "splaying +inf must surface the maximum");
        left.right = right;
        Some(left)
    }

    /// Joins `right` onto this dictionary. Every key in `right` must be
    /// strictly greater than every key in `self`; `right` is drained.
    pub(crate) fn join(&mut self, right: &mut Self) {
        debug_assert!(
            match (&self.root, &right.root) {
                (Some(l), Some(r)) => rightmost(l).key < leftmost(r).key,
                _ => true,
            },
            "joined dictionaries must have disjoint, ordered key ranges"
        );
        self.root = Self::join_links(self.root.take(), right.root.take());
    }

    /// Splits off and returns every entry with key `>= at`.
    pub(crate) fn split_at(&mut self, at: Order) -> Self {
        let Some(mut root) = splay(at, self.root.take()) else {
            return Self::default();
        };
        if root.key.total_cmp(&at) != Ordering::Less {
            // Root belongs to the right part.
            self.root = root.left.take();
            Self { root: Some(root) }
        } else {
            let right = Self { root: root.right.take() };
            self.root = Some(root);
            right
        }
    }

    /// All items in key order. Intended for validation and tests.
    pub(crate) fn items_in_order(&self) -> Vec<ItemId> {
        let mut out = Vec::new();
        let mut stack: Vec<&SplayNode> = Vec::new();
        let mut cur = self.root.as_deref();
        while cur.is_some() || !stack.is_empty() {
            while let Some(n) = cur {
                stack.push(n);
                cur = n.left.as_deref();
            }
            let n = stack.pop().expect("stack is non-empty here");
            out.push(n.item);
            cur = n.right.as_deref();
        }
        out
    }
}

// Copyright (c) 2025-present, banana-tree contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! The shared backing store: one item arena and one node arena per tree
//! sign, owned by the context and threaded through every operation.
//!
//! Intervals produced by cutting share the arenas of their parent, so
//! handles stay valid across topological maintenance.

use crate::arena::{Arena, NodeId};
use crate::item::ItemList;
use crate::metrics::Metrics;
use crate::tree::Node;

pub(crate) struct Store {
    pub(crate) items: ItemList,
    pub(crate) up_nodes: Arena<NodeId, Node>,
    pub(crate) down_nodes: Arena<NodeId, Node>,
    pub(crate) metrics: Metrics,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            items: ItemList::default(),
            up_nodes: Arena::default(),
            down_nodes: Arena::default(),
            metrics: Metrics::default(),
        }
    }
}

impl Store {
    /// Node arena of the tree with sign `SIGN`.
    #[inline]
    pub(crate) fn nodes<const SIGN: i8>(&self) -> &Arena<NodeId, Node> {
        if SIGN == 1 {
            &self.up_nodes
        } else {
            &self.down_nodes
        }
    }

    #[inline]
    pub(crate) fn nodes_mut<const SIGN: i8>(&mut self) -> &mut Arena<NodeId, Node> {
        if SIGN == 1 {
            &mut self.up_nodes
        } else {
            &mut self.down_nodes
        }
    }

}

// Copyright (c) 2025-present, banana-tree contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Dynamically maintained persistence diagrams for time series.
//!
//! This crate maintains the persistence diagram of a real-valued function
//! sampled along an interval under local value edits, insertion and deletion
//! of samples, cutting an interval in two and gluing two adjacent intervals.
//! The diagram is never recomputed from scratch: it is stored implicitly in
//! a pair of linked trees, the *banana trees*, whose pointer structure
//! mirrors the pairing of extrema into birth/death pairs. Each update
//! touches only the nodes whose pairings change.
//!
//! The engine is strictly single-threaded and in-memory; it assumes its
//! preconditions and fails loudly (panics) when they are violated.
//!
//! # Example
//!
//! ```
//! use banana_tree::{PersistenceContext, PersistenceDiagram};
//!
//! let mut ctx = PersistenceContext::new();
//! let values = [6.0, 2.0, 12.0, 5.0, 8.0, 4.0, 7.0, 1.0, 11.0, 9.0, 10.0, 3.0, 13.0];
//! let (interval, items) = ctx.new_interval_at(&values, 0.0);
//!
//! let mut diagram = PersistenceDiagram::default();
//! ctx.compute_persistence_diagram(&mut diagram);
//! // The global minimum pairs with the global maximum.
//! assert_eq!(diagram.death_of(items[7]), Some(items[12]));
//!
//! // A value round trip restores the diagram exactly.
//! ctx.change_value(interval, items[1], 12.5);
//! ctx.change_value(interval, items[1], 2.0);
//! let mut restored = PersistenceDiagram::default();
//! ctx.compute_persistence_diagram(&mut restored);
//! let diff = PersistenceDiagram::symmetric_difference(&diagram, &restored);
//! assert_eq!(diff.points, 0);
//! assert_eq!(diff.arrows, 0);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs, clippy::cargo)]
#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::similar_names)]

mod arena;
mod context;
mod diagram;
mod dictionary;
mod interval;
mod item;
mod metrics;
mod persistence;
mod store;
mod tree;
mod types;

pub mod validation;

pub use arena::{ArenaStats, IntervalId, ItemId};
pub use context::{NodeRef, NodeView, PersistenceContext};
pub use diagram::{DiagramDifference, PersistenceDiagram, PersistentPair, SubDiagram};
pub use metrics::Metrics;
pub use tree::SpineLabel;
pub use types::{tiny_offset, Criticality, Order, Sign, Value};

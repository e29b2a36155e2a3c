// Copyright (c) 2025-present, banana-tree contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// Per-sign operation counters.
///
/// Index 0 counts up-tree events, index 1 down-tree events. The engine is
/// single-threaded, so these are plain integers updated through the store.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Metrics {
    /// Interchanges of two maxima along a trail.
    pub max_interchanges: [u64; 2],
    /// Interchanges of two nested minima.
    pub min_interchanges: [u64; 2],
    /// Anticancellations (insertions of an empty banana).
    pub anticancellations: [u64; 2],
    /// Cancellations (removals of an empty banana).
    pub cancellations: [u64; 2],
    /// Maximum slides onto a neighbouring item.
    pub max_slides: [u64; 2],
    /// Minimum slides onto a neighbouring item.
    pub min_slides: [u64; 2],
    /// Injuries performed while cutting.
    pub injuries: [u64; 2],
    /// Fatalities performed while cutting.
    pub fatalities: [u64; 2],
    /// Scares performed while cutting.
    pub scares: [u64; 2],
    /// Injuries undone while gluing.
    pub undone_injuries: [u64; 2],
    /// Fatalities undone while gluing.
    pub undone_fatalities: [u64; 2],
    /// Scares undone while gluing.
    pub undone_scares: [u64; 2],
}

#[inline]
pub(crate) fn sign_index<const SIGN: i8>() -> usize {
    usize::from(SIGN != 1)
}

impl Metrics {
    /// Total interchanges across both trees; the dominant cost of local
    /// maintenance.
    #[must_use]
    pub fn total_interchanges(&self) -> u64 {
        self.max_interchanges.iter().sum::<u64>() + self.min_interchanges.iter().sum::<u64>()
    }
}

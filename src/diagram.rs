// Copyright (c) 2025-present, banana-tree contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Persistence diagrams extracted from the trees.
//!
//! A diagram holds three sets of birth–death pairs (ordinary, essential,
//! relative) plus the nesting arrows between births, and supports a
//! structural symmetric difference for comparing two diagrams.

use crate::arena::ItemId;
use rustc_hash::{FxHashMap, FxHashSet};

/// One birth–death pair of samples.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct PersistentPair {
    /// The sample whose extremum gives birth to the feature.
    pub birth: ItemId,
    /// The sample whose extremum kills it.
    pub death: ItemId,
}

/// Which sub-diagram a pair belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SubDiagram {
    /// An internal maximum killing an internal minimum.
    Ordinary,
    /// The pair involving the special root: global minimum and maximum.
    Essential,
    /// A pair read off the down-tree (relative homology).
    Relative,
}

/// Sizes of the structural difference between two diagrams.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct DiagramDifference {
    /// Pairs present in exactly one of the diagrams.
    pub points: usize,
    /// Arrows present in exactly one of the diagrams.
    pub arrows: usize,
}

/// A persistence diagram.
#[derive(Debug, Default, Clone)]
pub struct PersistenceDiagram {
    ordinary: FxHashSet<PersistentPair>,
    essential: FxHashSet<PersistentPair>,
    relative: FxHashSet<PersistentPair>,
    arrows: FxHashMap<ItemId, ItemId>,
    birth_map: FxHashMap<ItemId, PersistentPair>,
}

impl PersistenceDiagram {
    /// Records a pair in the given sub-diagram.
    pub(crate) fn add_pair(&mut self, sub: SubDiagram, birth: ItemId, death: ItemId) {
        let pair = PersistentPair { birth, death };
        match sub {
            SubDiagram::Ordinary => self.ordinary.insert(pair),
            SubDiagram::Essential => self.essential.insert(pair),
            SubDiagram::Relative => self.relative.insert(pair),
        };
        self.birth_map.insert(birth, pair);
    }

    /// Records that the pair born at `birth_child` nests directly inside the
    /// pair born at `birth_parent`.
    pub(crate) fn add_arrow(&mut self, birth_child: ItemId, birth_parent: ItemId) {
        self.arrows.insert(birth_child, birth_parent);
    }

    /// Forgets all pairs and arrows.
    pub fn clear(&mut self) {
        self.ordinary.clear();
        self.essential.clear();
        self.relative.clear();
        self.arrows.clear();
        self.birth_map.clear();
    }

    /// The death paired with `birth`, if `birth` starts a pair.
    #[must_use]
    pub fn death_of(&self, birth: ItemId) -> Option<ItemId> {
        self.birth_map.get(&birth).map(|pair| pair.death)
    }

    /// The pair that the pair born at `birth` nests directly inside of.
    #[must_use]
    pub fn parent_of(&self, birth: ItemId) -> Option<PersistentPair> {
        let parent_birth = self.arrows.get(&birth)?;
        self.birth_map.get(parent_birth).copied()
    }

    /// The pairs of one sub-diagram, in no particular order.
    #[must_use]
    pub fn pairs(&self, sub: SubDiagram) -> Vec<PersistentPair> {
        let set = match sub {
            SubDiagram::Ordinary => &self.ordinary,
            SubDiagram::Essential => &self.essential,
            SubDiagram::Relative => &self.relative,
        };
        let mut pairs: Vec<_> = set.iter().copied().collect();
        pairs.sort_unstable();
        pairs
    }

    /// Number of pairs across all three sub-diagrams.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ordinary.len() + self.essential.len() + self.relative.len()
    }

    /// True iff no pair has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counts the pairs and arrows present in exactly one of `a` and `b`.
    #[must_use]
    pub fn symmetric_difference(a: &Self, b: &Self) -> DiagramDifference {
        fn set_difference(a: &FxHashSet<PersistentPair>, b: &FxHashSet<PersistentPair>) -> usize {
            a.symmetric_difference(b).count()
        }
        let points = set_difference(&a.ordinary, &b.ordinary)
            + set_difference(&a.essential, &b.essential)
            + set_difference(&a.relative, &b.relative);
        let mut arrows = 0;
        for (child, parent) in &a.arrows {
            if b.arrows.get(child) != Some(parent) {
                arrows += 1;
            }
        }
        for (child, parent) in &b.arrows {
            if a.arrows.get(child) != Some(parent) {
                arrows += 1;
            }
        }
        DiagramDifference { points, arrows }
    }
}

#[cfg(test)]
mod tests {
    use super::{DiagramDifference, PersistenceDiagram, SubDiagram};
    use crate::arena::Handle;
    use crate::arena::ItemId;

    fn id(n: usize) -> ItemId {
        ItemId::from_index(n)
    }

    #[test]
    fn symmetric_difference_counts_points_and_arrows() {
        let (a, b, c, d, e, f) = (id(0), id(1), id(2), id(3), id(4), id(5));

        let mut pd_1 = PersistenceDiagram::default();
        pd_1.add_pair(SubDiagram::Essential, a, b);
        pd_1.add_pair(SubDiagram::Essential, c, d);
        pd_1.add_pair(SubDiagram::Essential, e, f);
        pd_1.add_arrow(a, e);
        pd_1.add_arrow(c, e);

        let mut pd_2 = PersistenceDiagram::default();
        pd_2.add_pair(SubDiagram::Essential, a, b);
        pd_2.add_pair(SubDiagram::Essential, c, e);
        pd_2.add_arrow(a, c);

        let diff = PersistenceDiagram::symmetric_difference(&pd_1, &pd_2);
        assert_eq!(diff, DiagramDifference { points: 3, arrows: 3 });
    }

    #[test]
    fn queries_answer_from_the_birth_map() {
        let (a, b, c, d) = (id(0), id(1), id(2), id(3));
        let mut dgm = PersistenceDiagram::default();
        dgm.add_pair(SubDiagram::Ordinary, a, b);
        dgm.add_pair(SubDiagram::Essential, c, d);
        dgm.add_arrow(a, c);

        assert_eq!(dgm.death_of(a), Some(b));
        assert_eq!(dgm.death_of(b), None);
        assert_eq!(dgm.parent_of(a).map(|p| p.birth), Some(c));
        assert_eq!(dgm.parent_of(c), None);
        assert_eq!(dgm.len(), 2);
    }
}

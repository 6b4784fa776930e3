//! Node state: the per-transformation property bitset and the node
//! struct itself.

use serde::{Deserialize, Serialize};

use crate::{InformationLoss, NodeId};

/// Closed set of per-node state flags.
///
/// `Anonymous`/`NotAnonymous` and `KAnonymous`/`NotKAnonymous` are two
/// independent verdict pairs so a two-phase search can test a weaker
/// predicate first and the full predicate second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeProperty {
    /// A full check has been run on this node.
    Checked,
    /// The node satisfies the full privacy predicate.
    Anonymous,
    /// The node is known not to satisfy the full privacy predicate.
    NotAnonymous,
    /// The node satisfies the weaker (first-phase) predicate.
    KAnonymous,
    /// The node is known not to satisfy the weaker predicate.
    NotKAnonymous,
    /// The snapshot cache must retain this node's intermediate state.
    ForceSnapshot,
    /// Verdict was derived by propagation, without a check.
    Tagged,
}

impl NodeProperty {
    const fn bit(self) -> u8 {
        match self {
            Self::Checked => 1,
            Self::Anonymous => 1 << 1,
            Self::NotAnonymous => 1 << 2,
            Self::KAnonymous => 1 << 3,
            Self::NotKAnonymous => 1 << 4,
            Self::ForceSnapshot => 1 << 5,
            Self::Tagged => 1 << 6,
        }
    }
}

/// Fixed-size bitset over [`NodeProperty`] with O(1) test/set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertySet(u8);

impl PropertySet {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn of(property: NodeProperty) -> Self {
        Self(property.bit())
    }

    #[must_use]
    pub const fn with(self, property: NodeProperty) -> Self {
        Self(self.0 | property.bit())
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn contains(self, property: NodeProperty) -> bool {
        self.0 & property.bit() != 0
    }

    /// True when any property in `other` is present in `self`.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// True when every property in `other` is present in `self`.
    #[must_use]
    pub const fn contains_all(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, property: NodeProperty) {
        self.0 |= property.bit();
    }

    pub fn insert_all(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, property: NodeProperty) {
        self.0 &= !property.bit();
    }
}

impl From<NodeProperty> for PropertySet {
    fn from(property: NodeProperty) -> Self {
        Self::of(property)
    }
}

/// One candidate transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Dense index into the lattice's node table.
    pub id: NodeId,
    /// Generalization height (sum of the transformation vector).
    pub level: usize,
    /// Per-attribute generalization levels.
    pub transformation: Vec<u32>,
    /// Immediately more general nodes. Membership is fixed at
    /// construction; only the order may be rewritten for traversal.
    pub successors: Vec<NodeId>,
    /// State flags, mutated by the traversal.
    pub properties: PropertySet,
    /// Utility cost, set once computed or estimated.
    pub information_loss: Option<InformationLoss>,
}

impl Node {
    #[must_use]
    pub const fn has_property(&self, property: NodeProperty) -> bool {
        self.properties.contains(property)
    }

    pub fn set_property(&mut self, property: NodeProperty) {
        self.properties.insert(property);
    }

    /// Total generalization applied, as a fraction of the maximum
    /// possible for this transformation's arity. Useful as a sort
    /// criterion.
    #[must_use]
    pub fn generalization_degree(&self, heights: &[u32]) -> f64 {
        let max: u32 = heights.iter().sum();
        if max == 0 {
            return 0.0;
        }
        f64::from(self.transformation.iter().sum::<u32>()) / f64::from(max)
    }
}

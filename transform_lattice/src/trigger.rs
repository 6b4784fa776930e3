//! Node triggers: the predicates and actions that drive processing
//! decisions during a traversal.
//!
//! The set of trigger shapes actually needed is small and fixed, so
//! triggers are a closed combinator enum rather than an open trait.

use serde::{Deserialize, Serialize};

use crate::{
    lattice::Lattice,
    node::{Node, PropertySet},
    NodeId,
};

/// Predicate over node state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeTrigger {
    /// Applies to no node.
    Never,
    /// Applies to every node.
    Always,
    /// Applies when the node carries at least one of the properties.
    AnyOf(PropertySet),
    /// Applies when the node carries all of the properties.
    AllOf(PropertySet),
    Not(Box<NodeTrigger>),
    Or(Box<NodeTrigger>, Box<NodeTrigger>),
    And(Box<NodeTrigger>, Box<NodeTrigger>),
}

impl NodeTrigger {
    #[must_use]
    pub fn any_of(properties: impl Into<PropertySet>) -> Self {
        Self::AnyOf(properties.into())
    }

    #[must_use]
    pub fn all_of(properties: impl Into<PropertySet>) -> Self {
        Self::AllOf(properties.into())
    }

    #[must_use]
    pub fn negated(self) -> Self {
        Self::Not(Box::new(self))
    }

    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn applies_to(&self, node: &Node) -> bool {
        match self {
            Self::Never => false,
            Self::Always => true,
            Self::AnyOf(properties) => node.properties.intersects(*properties),
            Self::AllOf(properties) => node.properties.contains_all(*properties),
            Self::Not(inner) => !inner.applies_to(node),
            Self::Or(a, b) => a.applies_to(node) || b.applies_to(node),
            Self::And(a, b) => a.applies_to(node) && b.applies_to(node),
        }
    }
}

/// How a tag action spreads through the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Propagation {
    /// Only the node itself is tagged.
    Local,
    /// The tag spreads to everything reachable through successor
    /// edges. Sound only for monotone verdicts.
    Upwards,
}

/// Conditional tagging action: when the guard applies to a node, a set
/// of properties is written to it and, optionally, propagated upward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagTrigger {
    /// Guard deciding whether the action fires.
    pub when: NodeTrigger,
    /// Properties written when the guard fires.
    pub set: PropertySet,
    /// Whether the triggering node itself receives the properties.
    pub include_self: bool,
    pub propagation: Propagation,
}

impl TagTrigger {
    /// A tag trigger that never fires.
    #[must_use]
    pub const fn noop() -> Self {
        Self {
            when: NodeTrigger::Never,
            set: PropertySet::empty(),
            include_self: false,
            propagation: Propagation::Local,
        }
    }

    pub fn apply(&self, lattice: &mut Lattice, id: NodeId) {
        if !self.when.applies_to(lattice.node(id)) {
            return;
        }
        match self.propagation {
            Propagation::Local => {
                if self.include_self {
                    lattice.node_mut(id).properties.insert_all(self.set);
                }
            },
            Propagation::Upwards => {
                lattice.set_property_upwards(id, self.include_self, self.set);
            },
        }
    }
}

//! Generalization lattice data model.
//!
//! A lattice node is one candidate transformation of a dataset: a
//! vector of per-attribute generalization levels. Nodes are partially
//! ordered by the generalization relation; successor edges point to
//! the immediately more general nodes. The search engine built on top
//! of this crate only mutates node properties, information loss, and
//! the order of successor lists; lattice membership is fixed at
//! construction.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::uninlined_format_args)]

mod error;
mod lattice;
mod node;
mod trigger;

pub use error::{LatticeError, Result};
pub use lattice::Lattice;
pub use node::{Node, NodeProperty, PropertySet};
pub use trigger::{NodeTrigger, Propagation, TagTrigger};

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Dense node index, stable for the node's lifetime. Used to index
/// per-node side arrays.
pub type NodeId = usize;

/// Utility cost of a transformation. Higher means more information
/// destroyed by generalization.
///
/// Carries a total order (NaN sorts first) so it can be used as a sort
/// key; which of two losses counts as "better" for optimum tracking is
/// decided by the metric, not by this order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InformationLoss(pub f64);

impl PartialEq for InformationLoss {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for InformationLoss {}

impl PartialOrd for InformationLoss {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InformationLoss {
    fn cmp(&self, other: &Self) -> Ordering {
        // NaN sorts first (smallest), then normal ordering
        match (self.0.is_nan(), other.0.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal),
        }
    }
}

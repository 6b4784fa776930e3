//! Trait seams to the external evaluation engine.
//!
//! The search treats the privacy predicate and the utility metric as
//! opaque: a checker runs the expensive per-node check against the
//! dataset and reports verdict flags plus information loss; a metric
//! estimates loss cheaply and decides which of two losses is better.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use snapshot_history::History;
use transform_lattice::{InformationLoss, Lattice, NodeId, PropertySet};

use crate::error::Result;

/// Outcome of a full per-node check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Verdict flags to record on the node, e.g. `Anonymous` or
    /// `NotAnonymous` (and the weak-predicate pair when the checker
    /// evaluates one). `Checked` is added by the engine.
    pub properties: PropertySet,
    /// Exact information loss of the transformation.
    pub information_loss: InformationLoss,
}

/// Utility-cost metric.
pub trait Metric {
    /// Whether loss never decreases along successor edges. Licenses
    /// the top-node fallback in the driver.
    fn is_monotonic(&self) -> bool;

    /// Whether loss can be computed from the transformation alone,
    /// without building equivalence classes over the dataset.
    fn is_independent(&self) -> bool;

    /// Cheap loss estimate for a node.
    fn evaluate(&self, lattice: &Lattice, node: NodeId) -> InformationLoss;

    /// Decides which loss is better; `Ordering::Less` means `a` is
    /// preferable. Defaults to "lower is better".
    fn compare(&self, a: &InformationLoss, b: &InformationLoss) -> Ordering {
        a.cmp(b)
    }
}

/// The expensive per-node evaluation engine.
///
/// A check may consult and populate the snapshot [`History`]; the
/// search reconfigures that history's triggers per phase but never
/// reads snapshots itself.
pub trait NodeChecker {
    /// Runs a full check of `node` against the dataset.
    ///
    /// `force_snapshot` asks the checker to retain this node's
    /// intermediate state regardless of the current storage policy
    /// (the node also carries `ForceSnapshot` in that case).
    ///
    /// # Errors
    ///
    /// A failure here aborts the whole run.
    fn check(&mut self, lattice: &Lattice, node: NodeId, force_snapshot: bool)
        -> Result<CheckResult>;

    fn metric(&self) -> &dyn Metric;

    /// Maximum fraction of records that may be suppressed as outliers.
    fn max_outliers(&self) -> f64;

    fn history_mut(&mut self) -> &mut History;
}

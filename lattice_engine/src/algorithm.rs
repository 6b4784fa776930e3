//! The hybrid lattice search.
//!
//! Exhaustively checking every transformation is prohibitively
//! expensive, so the search leans on monotonicity of the privacy
//! predicate: a verdict established for one node resolves whole
//! regions of the lattice above it. Two cooperating traversals exploit
//! this:
//!
//! - the **binary phase** greedily extends a path from a queue head
//!   toward the top and binary-searches the path for the lowest
//!   satisfying node, re-queueing frontier nodes that branch off;
//! - the **linear phase** runs a depth-first traversal whose tagging
//!   action resolves successors of satisfying nodes before they are
//!   ever visited.
//!
//! Either phase can run alone; when both are active, every boundary
//! node the binary phase finds is handed to the linear phase for
//! predictive exploration of the region above it.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};
use transform_lattice::{InformationLoss, Lattice, NodeId, NodeProperty, NodeTrigger};

use crate::{
    checker::{CheckResult, NodeChecker},
    config::PhaseConfig,
    error::{Result, SearchError},
    strategy::{OrderingStrategy, StrategyKey},
};

/// Which phase's configuration governs an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Binary,
    Linear,
}

/// Entry in the binary phase's priority queue.
#[derive(Debug, Clone, PartialEq, Eq)]
struct QueueEntry {
    key: StrategyKey,
    node: NodeId,
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for a min-heap (lowest key = highest priority)
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Work counters for one search run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Full checks delegated to the checker.
    pub checks: u64,
    /// Cheap metric evaluations.
    pub evaluations: u64,
    /// Successor lists actually sorted (each list is sorted at most
    /// once per run).
    pub successor_sorts: u64,
    /// Greedy paths discovered by the binary phase.
    pub paths_explored: u64,
}

/// Result of a search run.
///
/// The full effect of a run is the mutated node state across the
/// lattice; this struct carries the tracked optimum and the work
/// counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Best privacy-compliant node found, if any.
    pub optimum: Option<NodeId>,
    /// Information loss of the optimum.
    pub optimal_loss: Option<InformationLoss>,
    pub stats: SearchStats,
}

impl SearchOutcome {
    #[must_use]
    pub const fn found(&self) -> bool {
        self.optimum.is_some()
    }
}

/// One traversal over one lattice. Holds per-run state (sort cache,
/// optimum tracker); not reusable across runs.
pub struct HybridSearch<'a, C: NodeChecker> {
    lattice: &'a mut Lattice,
    checker: &'a mut C,
    strategy: &'a dyn OrderingStrategy,
    binary: PhaseConfig,
    linear: PhaseConfig,
    /// Property a node must carry to qualify as the optimum.
    result_property: NodeProperty,
    /// Sort-once cache for successor lists, indexed by node id.
    sorted: Vec<bool>,
    optimum: Option<NodeId>,
    optimal_loss: Option<InformationLoss>,
    stats: SearchStats,
}

impl<'a, C: NodeChecker> HybridSearch<'a, C> {
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidConfig`] when neither phase is
    /// active.
    pub fn new(
        lattice: &'a mut Lattice,
        checker: &'a mut C,
        strategy: &'a dyn OrderingStrategy,
        binary: PhaseConfig,
        linear: PhaseConfig,
    ) -> Result<Self> {
        if !binary.active && !linear.active {
            return Err(SearchError::InvalidConfig("no active phase".into()));
        }
        let result_property = if linear.active {
            linear.anonymity_property
        } else {
            binary.anonymity_property
        };
        let sorted = vec![false; lattice.len()];
        Ok(Self {
            lattice,
            checker,
            strategy,
            binary,
            linear,
            result_property,
            sorted,
            optimum: None,
            optimal_loss: None,
            stats: SearchStats::default(),
        })
    }

    /// Runs the search to completion.
    ///
    /// # Errors
    ///
    /// A checker failure aborts the run and is propagated unchanged.
    #[instrument(skip(self), fields(nodes = self.lattice.len()))]
    pub fn run(mut self) -> Result<SearchOutcome> {
        // The bottom node anchors snapshot reuse for every later check
        // and provides the baseline information loss.
        let bottom = self.lattice.bottom();
        if !self.lattice.node(bottom).has_property(NodeProperty::Checked) {
            debug!(node = bottom, "checking bottom node");
            self.lattice
                .node_mut(bottom)
                .set_property(NodeProperty::ForceSnapshot);
            let result = self.checker.check(self.lattice, bottom, true)?;
            self.stats.checks += 1;
            self.apply_check_result(bottom, &result);
            self.track_optimum(bottom);
        }

        // The outer loop only ever sees nodes the outer configuration
        // does not skip.
        let outer = if self.binary.active {
            Phase::Binary
        } else {
            Phase::Linear
        };
        let outer_skip = self.config(outer).trigger_skip.clone();

        let mut queue = BinaryHeap::new();
        for level in 0..self.lattice.levels().len() {
            for node in self.level_nodes(level, &outer_skip) {
                self.apply_history_triggers(outer);
                match outer {
                    Phase::Binary => self.binary_search(node, &mut queue)?,
                    Phase::Linear => self.linear_search(node)?,
                }
            }
        }

        // Pruning may leave the top node unvisited; its loss bounds
        // the loss of tagged nodes, so close the gap when the metric
        // semantics allow it.
        let top = self.lattice.top();
        if (self.checker.metric().is_monotonic() || self.checker.max_outliers() == 0.0)
            && self.lattice.node(top).information_loss.is_none()
        {
            if self.checker.metric().is_independent() {
                let loss = self.checker.metric().evaluate(self.lattice, top);
                self.stats.evaluations += 1;
                self.lattice.node_mut(top).information_loss = Some(loss);
            } else {
                let result = self.checker.check(self.lattice, top, true)?;
                self.stats.checks += 1;
                self.apply_check_result(top, &result);
            }
            self.track_optimum(top);
        }

        debug!(
            checks = self.stats.checks,
            evaluations = self.stats.evaluations,
            optimum = ?self.optimum,
            "search finished"
        );
        Ok(SearchOutcome {
            optimum: self.optimum,
            optimal_loss: self.optimal_loss,
            stats: self.stats,
        })
    }

    /// Binary phase: drains a priority queue seeded with `start`,
    /// binary-searching one greedy path per queue head.
    fn binary_search(&mut self, start: NodeId, queue: &mut BinaryHeap<QueueEntry>) -> Result<()> {
        queue.push(self.queue_entry(start));

        while let Some(entry) = queue.pop() {
            let head = entry.node;
            // Entries may have been resolved since they were queued.
            if self
                .binary
                .trigger_skip
                .applies_to(self.lattice.node(head))
            {
                continue;
            }

            let path = self.find_path(head);
            let found = self.check_path_binary(&path, queue)?;

            if self.linear.active {
                if let Some(found) = found {
                    trace!(node = found, "handing boundary node to linear phase");
                    self.apply_history_triggers(Phase::Linear);
                    self.linear_search(found)?;
                    self.apply_history_triggers(Phase::Binary);
                }
            }
        }
        Ok(())
    }

    /// Linear phase: depth-first traversal with predictive tagging.
    /// Tagging a satisfying node resolves its successors, so they are
    /// skip-triggered by the time the recursion reaches them.
    fn linear_search(&mut self, node: NodeId) -> Result<()> {
        let skip = self.linear.trigger_skip.clone();
        if skip.applies_to(self.lattice.node(node)) {
            return Ok(());
        }

        self.sort_successors(node);
        self.check_and_tag(node, Phase::Linear)?;

        // Recursion depth is bounded by the lattice height.
        let successors = self.lattice.successors(node).to_vec();
        for successor in successors {
            if !skip.applies_to(self.lattice.node(successor)) {
                self.linear_search(successor)?;
            }
        }
        Ok(())
    }

    /// Greedily extends a path from `start` toward the top: always the
    /// first unskipped successor under the strategy order. The path
    /// contains no skip-triggered nodes at discovery time.
    fn find_path(&mut self, start: NodeId) -> Vec<NodeId> {
        self.stats.paths_explored += 1;
        let skip = self.binary.trigger_skip.clone();
        let mut path = vec![start];
        let mut current = start;
        loop {
            self.sort_successors(current);
            let next = self
                .lattice
                .successors(current)
                .iter()
                .copied()
                .find(|&candidate| !skip.applies_to(self.lattice.node(candidate)));
            match next {
                Some(candidate) => {
                    path.push(candidate);
                    current = candidate;
                },
                None => break,
            }
        }
        path
    }

    /// Binary search over a path for the lowest node satisfying the
    /// binary phase's anonymity property. Successors of non-satisfying
    /// midpoints are frontier candidates unreachable via this path and
    /// are pushed onto the queue.
    ///
    /// A midpoint can have become skip-triggered since path discovery
    /// (tag propagation from a lower midpoint reaches nodes higher on
    /// the same path); such nodes are resolved from their recorded
    /// verdict instead of being re-processed, and the bounds always
    /// advance, so the loop terminates unconditionally.
    fn check_path_binary(
        &mut self,
        path: &[NodeId],
        queue: &mut BinaryHeap<QueueEntry>,
    ) -> Result<Option<NodeId>> {
        let skip = self.binary.trigger_skip.clone();
        let anonymity = self.binary.anonymity_property;

        let mut low: isize = 0;
        let mut high: isize = path.len() as isize - 1;
        let mut lowest = None;

        while low <= high {
            let mid = ((low + high) / 2) as usize;
            let node = path[mid];

            let satisfied = if skip.applies_to(self.lattice.node(node)) {
                self.lattice.node(node).has_property(anonymity)
            } else {
                self.check_and_tag(node, Phase::Binary)?;
                let satisfied = self.lattice.node(node).has_property(anonymity);
                if !satisfied {
                    // The region above this node is still unresolved.
                    let successors = self.lattice.successors(node).to_vec();
                    for successor in successors {
                        if !skip.applies_to(self.lattice.node(successor)) {
                            queue.push(self.queue_entry(successor));
                        }
                    }
                }
                satisfied
            };

            if satisfied {
                lowest = Some(node);
                high = mid as isize - 1;
            } else {
                low = mid as isize + 1;
            }
        }
        Ok(lowest)
    }

    /// Resolves one node under a phase configuration: estimate or
    /// check, track the optimum, apply the tagging action.
    ///
    /// Idempotent with respect to information loss: a previously
    /// computed loss is never overwritten when a node is re-visited in
    /// a later phase.
    fn check_and_tag(&mut self, node: NodeId, phase: Phase) -> Result<()> {
        let config = self.config(phase).clone();

        if config.trigger_evaluate.applies_to(self.lattice.node(node)) {
            if self.lattice.node(node).information_loss.is_none() {
                let loss = self.checker.metric().evaluate(self.lattice, node);
                self.stats.evaluations += 1;
                self.lattice.node_mut(node).information_loss = Some(loss);
            }
        } else if config.trigger_check.applies_to(self.lattice.node(node)) {
            trace!(node, ?phase, "full check");
            let result = self.checker.check(self.lattice, node, false)?;
            self.stats.checks += 1;
            self.apply_check_result(node, &result);
        }

        self.track_optimum(node);
        config.trigger_tag.apply(self.lattice, node);
        Ok(())
    }

    /// Records a check's verdict flags and, unless one is already
    /// present, its information loss.
    fn apply_check_result(&mut self, node: NodeId, result: &CheckResult) {
        let entry = self.lattice.node_mut(node);
        entry.properties.insert(NodeProperty::Checked);
        entry.properties.insert_all(result.properties);
        if entry.information_loss.is_none() {
            entry.information_loss = Some(result.information_loss);
        }
    }

    /// Updates the running optimum with `node` if it qualifies and its
    /// loss is better under the metric.
    fn track_optimum(&mut self, node: NodeId) {
        let entry = self.lattice.node(node);
        if !entry.has_property(self.result_property) {
            return;
        }
        let Some(loss) = entry.information_loss else {
            return;
        };
        let better = match self.optimal_loss.as_ref() {
            None => true,
            Some(best) => self.checker.metric().compare(&loss, best) == Ordering::Less,
        };
        if better {
            trace!(node, loss = loss.0, "new optimum");
            self.optimum = Some(node);
            self.optimal_loss = Some(loss);
        }
    }

    /// Sorts a node's successor list under the strategy order, at most
    /// once per run.
    fn sort_successors(&mut self, node: NodeId) {
        if self.sorted[node] {
            return;
        }
        self.sorted[node] = true;
        self.stats.successor_sorts += 1;

        let mut successors = std::mem::take(&mut self.lattice.node_mut(node).successors);
        successors.sort_by_cached_key(|&s| self.strategy.priority(self.lattice, s));
        self.lattice.node_mut(node).successors = successors;
    }

    /// Unskipped nodes of one level, in strategy order.
    fn level_nodes(&self, level: usize, skip: &NodeTrigger) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.lattice.levels()[level]
            .iter()
            .copied()
            .filter(|&id| !skip.applies_to(self.lattice.node(id)))
            .collect();
        nodes.sort_by_cached_key(|&id| self.strategy.priority(self.lattice, id));
        nodes
    }

    /// Re-applies a phase's snapshot policy to the checker's history.
    /// Called before every dispatch and around every hand-off, so the
    /// policy in effect is always the dispatching phase's.
    fn apply_history_triggers(&mut self, phase: Phase) {
        let config = self.config(phase);
        let store = config.trigger_snapshot_store.clone();
        let evict = config.trigger_snapshot_evict.clone();
        let history = self.checker.history_mut();
        history.set_storage_trigger(store);
        history.set_eviction_trigger(evict);
    }

    fn queue_entry(&self, node: NodeId) -> QueueEntry {
        QueueEntry {
            key: self.strategy.priority(self.lattice, node),
            node,
        }
    }

    const fn config(&self, phase: Phase) -> &PhaseConfig {
        match phase {
            Phase::Binary => &self.binary,
            Phase::Linear => &self.linear,
        }
    }
}

//! Scenario tests for the hybrid search, driven by a scripted checker
//! over small hypercube lattices.

use transform_lattice::{InformationLoss, Lattice, NodeProperty, NodeTrigger};

use crate::{
    strategy::HeightStrategy, HybridSearch, PhaseConfig, SearchError, SearchOutcome,
};

pub(crate) mod support {
    use snapshot_history::{History, HistoryConfig, Snapshot};
    use transform_lattice::{InformationLoss, Lattice, NodeId, NodeProperty, PropertySet};

    use crate::{
        checker::{CheckResult, Metric, NodeChecker},
        error::{Result, SearchError},
    };

    /// Metric returning losses from a table, "lower is better".
    pub(crate) struct TableMetric {
        pub monotonic: bool,
        pub independent: bool,
        pub losses: Vec<f64>,
    }

    impl Metric for TableMetric {
        fn is_monotonic(&self) -> bool {
            self.monotonic
        }

        fn is_independent(&self) -> bool {
            self.independent
        }

        fn evaluate(&self, _lattice: &Lattice, node: NodeId) -> InformationLoss {
            InformationLoss(self.losses[node])
        }
    }

    /// Checker whose verdicts come from a table. Records every full
    /// check in visitation order.
    pub(crate) struct ScriptedChecker {
        pub metric: TableMetric,
        /// Full-predicate verdict per node.
        pub anonymous: Vec<bool>,
        /// Weak-predicate verdict per node; `Some` makes the checker
        /// record the `KAnonymous` pair, and the full pair only where
        /// the weak verdict holds.
        pub weak: Option<Vec<bool>>,
        pub max_outliers: f64,
        pub history: History,
        pub checked: Vec<NodeId>,
        pub fail_on: Option<NodeId>,
    }

    impl NodeChecker for ScriptedChecker {
        fn check(
            &mut self,
            lattice: &Lattice,
            node: NodeId,
            _force_snapshot: bool,
        ) -> Result<CheckResult> {
            if self.fail_on == Some(node) {
                return Err(SearchError::Checker("scripted failure".into()));
            }
            self.checked.push(node);

            let mut properties = PropertySet::empty();
            match &self.weak {
                Some(weak) => {
                    if weak[node] {
                        properties.insert(NodeProperty::KAnonymous);
                        properties.insert(if self.anonymous[node] {
                            NodeProperty::Anonymous
                        } else {
                            NodeProperty::NotAnonymous
                        });
                    } else {
                        properties.insert(NodeProperty::NotKAnonymous);
                    }
                },
                None => {
                    properties.insert(if self.anonymous[node] {
                        NodeProperty::Anonymous
                    } else {
                        NodeProperty::NotAnonymous
                    });
                },
            }

            let _ = self
                .history
                .store(lattice, node, Snapshot::new(vec![node as u32]));

            Ok(CheckResult {
                properties,
                information_loss: InformationLoss(self.metric.losses[node]),
            })
        }

        fn metric(&self) -> &dyn Metric {
            &self.metric
        }

        fn max_outliers(&self) -> f64 {
            self.max_outliers
        }

        fn history_mut(&mut self) -> &mut History {
            &mut self.history
        }
    }

    /// Monotone, independent single-predicate checker.
    pub(crate) fn checker(anonymous: Vec<bool>, losses: Vec<f64>) -> ScriptedChecker {
        ScriptedChecker {
            metric: TableMetric {
                monotonic: true,
                independent: true,
                losses,
            },
            anonymous,
            weak: None,
            max_outliers: 0.0,
            history: History::new(HistoryConfig::new().capacity(64)).unwrap(),
            checked: Vec::new(),
            fail_on: None,
        }
    }
}

use support::checker;

fn run(
    lattice: &mut Lattice,
    scripted: &mut support::ScriptedChecker,
    binary: PhaseConfig,
    linear: PhaseConfig,
) -> SearchOutcome {
    let strategy = HeightStrategy::new();
    HybridSearch::new(lattice, scripted, &strategy, binary, linear)
        .unwrap()
        .run()
        .unwrap()
}

// Diamond lattice, predicate false at the bottom only, independent
// metric: both middle nodes get checked, the top's loss is estimated
// without a check, and the optimum is the cheaper middle node.
#[test]
fn scenario_diamond_with_independent_metric() {
    let mut lattice = Lattice::hypercube(&[1, 1]).unwrap();
    let mut scripted = checker(
        vec![false, true, true, true],
        vec![0.0, 10.0, 20.0, 30.0],
    );

    let outcome = run(
        &mut lattice,
        &mut scripted,
        PhaseConfig::inactive(),
        PhaseConfig::linear_default(),
    );

    assert_eq!(scripted.checked, vec![0, 1, 2]);
    let top = lattice.node(lattice.top());
    assert!(!top.has_property(NodeProperty::Checked));
    assert_eq!(top.information_loss, Some(InformationLoss(30.0)));
    assert_eq!(outcome.stats.evaluations, 1);
    assert_eq!(outcome.optimum, Some(1));
    assert_eq!(outcome.optimal_loss, Some(InformationLoss(10.0)));
}

// Binary phase alone on a chain of five nodes with the anonymity
// boundary at position 3: the boundary is located with a logarithmic
// number of checks.
#[test]
fn scenario_chain_binary_only() {
    let mut lattice = Lattice::hypercube(&[4]).unwrap();
    let mut scripted = checker(
        vec![false, false, false, true, true],
        vec![0.0, 1.0, 2.0, 3.0, 4.0],
    );

    let outcome = run(
        &mut lattice,
        &mut scripted,
        PhaseConfig::binary_default(),
        PhaseConfig::inactive(),
    );

    // Bottom plus two path midpoints: ceil(log2(5)) = 3 checks total.
    assert_eq!(scripted.checked, vec![0, 2, 3]);
    assert_eq!(outcome.stats.checks, 3);
    assert_eq!(outcome.optimum, Some(3));

    // Everything above the boundary was resolved by propagation.
    let above = lattice.node(4);
    assert!(above.has_property(NodeProperty::Tagged));
    assert!(above.has_property(NodeProperty::Anonymous));
    assert!(!above.has_property(NodeProperty::Checked));
}

// Linear phase alone on a diamond where only one middle node
// satisfies the predicate: the top is resolved by tagging, never
// checked.
#[test]
fn scenario_diamond_predictive_tagging() {
    let mut lattice = Lattice::hypercube(&[1, 1]).unwrap();
    let mut scripted = checker(
        vec![false, true, false, true],
        vec![0.0, 10.0, 20.0, 30.0],
    );

    let outcome = run(
        &mut lattice,
        &mut scripted,
        PhaseConfig::inactive(),
        PhaseConfig::linear_default(),
    );

    assert_eq!(scripted.checked, vec![0, 1, 2]);
    let top = lattice.node(lattice.top());
    assert!(top.has_property(NodeProperty::Tagged));
    assert!(top.has_property(NodeProperty::Anonymous));
    assert!(!top.has_property(NodeProperty::Checked));
    assert_eq!(outcome.optimum, Some(1));
}

// With a zero outlier budget the driver must close the top-node gap
// with exactly one evaluation, even for a non-monotone metric.
#[test]
fn scenario_top_fallback_with_zero_outliers() {
    let mut lattice = Lattice::hypercube(&[1, 1]).unwrap();
    let mut scripted = checker(vec![false; 4], vec![0.0, 10.0, 20.0, 30.0]);
    scripted.metric.monotonic = false;

    let outcome = run(
        &mut lattice,
        &mut scripted,
        PhaseConfig::inactive(),
        PhaseConfig::linear_default().skip(NodeTrigger::Always),
    );

    // Only the bottom bootstrap check ran; the main loop skipped
    // everything, so the fallback fired exactly once.
    assert_eq!(outcome.stats.checks, 1);
    assert_eq!(outcome.stats.evaluations, 1);
    assert_eq!(
        lattice.node(lattice.top()).information_loss,
        Some(InformationLoss(30.0))
    );
}

#[test]
fn scenario_top_fallback_checks_when_metric_dependent() {
    let mut lattice = Lattice::hypercube(&[1, 1]).unwrap();
    let mut scripted = checker(vec![false; 4], vec![0.0, 10.0, 20.0, 30.0]);
    scripted.metric.monotonic = false;
    scripted.metric.independent = false;

    let outcome = run(
        &mut lattice,
        &mut scripted,
        PhaseConfig::inactive(),
        PhaseConfig::linear_default().skip(NodeTrigger::Always),
    );

    assert_eq!(outcome.stats.checks, 2);
    assert_eq!(outcome.stats.evaluations, 0);
    assert!(lattice.node(lattice.top()).has_property(NodeProperty::Checked));
}

#[test]
fn top_fallback_does_not_fire_with_outlier_budget() {
    let mut lattice = Lattice::hypercube(&[1, 1]).unwrap();
    let mut scripted = checker(vec![false; 4], vec![0.0, 10.0, 20.0, 30.0]);
    scripted.metric.monotonic = false;
    scripted.max_outliers = 0.25;

    let outcome = run(
        &mut lattice,
        &mut scripted,
        PhaseConfig::inactive(),
        PhaseConfig::linear_default().skip(NodeTrigger::Always),
    );

    assert_eq!(outcome.stats.evaluations, 0);
    assert_eq!(lattice.node(lattice.top()).information_loss, None);
}

// For a monotone predicate the hybrid search checks strictly fewer
// nodes than exhaustive enumeration and still finds the exhaustive
// optimum.
#[test]
fn monotone_pruning_matches_exhaustive_optimum() {
    let mut lattice = Lattice::hypercube(&[2, 2]).unwrap();
    let anonymous: Vec<bool> = (0..lattice.len())
        .map(|id| lattice.node(id).level >= 2)
        .collect();
    let losses: Vec<f64> = (0..lattice.len())
        .map(|id| 10.0 * lattice.node(id).level as f64 + id as f64)
        .collect();

    // Exhaustive reference: minimum loss over satisfying nodes.
    let exhaustive = anonymous
        .iter()
        .zip(&losses)
        .enumerate()
        .filter(|(_, (&a, _))| a)
        .min_by(|(_, (_, a)), (_, (_, b))| a.partial_cmp(b).unwrap())
        .map(|(id, (_, &loss))| (id, loss))
        .unwrap();

    let mut scripted = checker(anonymous, losses);
    let outcome = run(
        &mut lattice,
        &mut scripted,
        PhaseConfig::binary_default(),
        PhaseConfig::linear_default(),
    );

    assert_eq!(outcome.optimum, Some(exhaustive.0));
    assert_eq!(outcome.optimal_loss, Some(InformationLoss(exhaustive.1)));
    assert!(
        (outcome.stats.checks as usize) < lattice.len(),
        "expected pruning, got {} checks for {} nodes",
        outcome.stats.checks,
        lattice.len()
    );

    // No node is ever fully checked twice.
    let mut seen = scripted.checked.clone();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), scripted.checked.len());
}

// Two-phase run: the binary phase locates the weak boundary, the
// hand-off explores the weak region for the full predicate, and the
// binary phase's snapshot policy is restored after each hand-off.
#[test]
fn two_phase_handoff_and_history_policy() {
    let mut lattice = Lattice::hypercube(&[4]).unwrap();
    let mut scripted = checker(
        vec![false, false, false, true, true],
        vec![0.0, 1.0, 2.0, 3.0, 4.0],
    );
    scripted.weak = Some(vec![false, false, true, true, true]);

    let (binary, linear) = PhaseConfig::two_phase_pair();
    let expected_store = binary.trigger_snapshot_store.clone();
    let expected_evict = binary.trigger_snapshot_evict.clone();
    let outcome = run(&mut lattice, &mut scripted, binary, linear);

    assert_eq!(outcome.optimum, Some(3));
    assert_eq!(outcome.optimal_loss, Some(InformationLoss(3.0)));

    // Node 4 was resolved by linear-phase propagation.
    let above = lattice.node(4);
    assert!(above.has_property(NodeProperty::Tagged));
    assert!(above.has_property(NodeProperty::Anonymous));
    assert!(!above.has_property(NodeProperty::Checked));

    // The last policy in effect is the binary phase's.
    assert_eq!(scripted.history.storage_trigger(), &expected_store);
    assert_eq!(scripted.history.eviction_trigger(), &expected_evict);
}

// Hand-off to an already resolved node is a no-op rather than an
// error when both phases share one predicate.
#[test]
fn single_predicate_two_phase_agrees_with_linear_only() {
    let anonymous = vec![false, true, true, true];
    let losses = vec![0.0, 10.0, 20.0, 30.0];

    let mut lattice_a = Lattice::hypercube(&[1, 1]).unwrap();
    let mut scripted_a = checker(anonymous.clone(), losses.clone());
    let hybrid = run(
        &mut lattice_a,
        &mut scripted_a,
        PhaseConfig::binary_default(),
        PhaseConfig::linear_default(),
    );

    let mut lattice_b = Lattice::hypercube(&[1, 1]).unwrap();
    let mut scripted_b = checker(anonymous, losses);
    let linear_only = run(
        &mut lattice_b,
        &mut scripted_b,
        PhaseConfig::inactive(),
        PhaseConfig::linear_default(),
    );

    assert_eq!(hybrid.optimum, linear_only.optimum);
    assert_eq!(hybrid.optimal_loss, linear_only.optimal_loss);
}

#[test]
fn checker_failure_aborts_run() {
    let mut lattice = Lattice::hypercube(&[1, 1]).unwrap();
    let mut scripted = checker(vec![false, true, true, true], vec![0.0; 4]);
    scripted.fail_on = Some(1);

    let strategy = HeightStrategy::new();
    let err = HybridSearch::new(
        &mut lattice,
        &mut scripted,
        &strategy,
        PhaseConfig::inactive(),
        PhaseConfig::linear_default(),
    )
    .unwrap()
    .run()
    .unwrap_err();
    assert_eq!(err, SearchError::Checker("scripted failure".into()));
}

#[test]
fn checker_failure_at_bottom_aborts_immediately() {
    let mut lattice = Lattice::hypercube(&[2]).unwrap();
    let mut scripted = checker(vec![true; 3], vec![0.0; 3]);
    scripted.fail_on = Some(0);

    let strategy = HeightStrategy::new();
    let err = HybridSearch::new(
        &mut lattice,
        &mut scripted,
        &strategy,
        PhaseConfig::binary_default(),
        PhaseConfig::inactive(),
    )
    .unwrap()
    .run()
    .unwrap_err();
    assert!(matches!(err, SearchError::Checker(_)));
    assert!(scripted.checked.is_empty());
}

#[test]
fn single_node_lattice_bottom_is_optimum() {
    let mut lattice = Lattice::hypercube(&[0]).unwrap();
    let mut scripted = checker(vec![true], vec![7.0]);

    let outcome = run(
        &mut lattice,
        &mut scripted,
        PhaseConfig::inactive(),
        PhaseConfig::linear_default(),
    );

    assert!(outcome.found());
    assert_eq!(outcome.optimum, Some(0));
    assert_eq!(outcome.optimal_loss, Some(InformationLoss(7.0)));
    // The bootstrap check covered the whole lattice.
    assert_eq!(outcome.stats.checks, 1);
    assert_eq!(outcome.stats.evaluations, 0);
}

// Snapshots produced during checks flow through the history under the
// active phase's policy.
#[test]
fn history_receives_snapshots_during_run() {
    let mut lattice = Lattice::hypercube(&[1, 1]).unwrap();
    let mut scripted = checker(vec![false, true, true, true], vec![0.0, 1.0, 2.0, 3.0]);

    run(
        &mut lattice,
        &mut scripted,
        PhaseConfig::inactive(),
        PhaseConfig::linear_default(),
    );

    // The pinned bottom snapshot is always retained.
    assert!(scripted.history.contains(0));
    assert!(scripted.history.stats().snapshot().stores >= 1);
}

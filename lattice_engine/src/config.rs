//! Phase configurations: the trigger bundle that defines how one
//! search phase treats each node it encounters.

use serde::{Deserialize, Serialize};
use transform_lattice::{NodeProperty, NodeTrigger, PropertySet, Propagation, TagTrigger};

/// Configuration for one search phase.
///
/// The ready-made constructors cover the common setups; all fields are
/// public so callers with unusual predicates can compose their own
/// trigger sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    /// Whether this phase runs at all.
    pub active: bool,
    /// The property meaning "satisfies this phase's privacy
    /// predicate".
    pub anonymity_property: NodeProperty,
    /// Nodes this phase does not process at all.
    pub trigger_skip: NodeTrigger,
    /// Nodes whose loss is estimated cheaply instead of checked.
    pub trigger_evaluate: NodeTrigger,
    /// Nodes that receive a full check.
    pub trigger_check: NodeTrigger,
    /// Tagging action applied after a node is checked or evaluated.
    pub trigger_tag: TagTrigger,
    /// Snapshot admission policy while this phase runs.
    pub trigger_snapshot_store: NodeTrigger,
    /// Snapshot eviction policy while this phase runs.
    pub trigger_snapshot_evict: NodeTrigger,
}

impl PhaseConfig {
    /// A phase that never runs. Used as the counterpart of a
    /// single-phase setup.
    #[must_use]
    pub fn inactive() -> Self {
        Self {
            active: false,
            anonymity_property: NodeProperty::Anonymous,
            trigger_skip: NodeTrigger::Always,
            trigger_evaluate: NodeTrigger::Never,
            trigger_check: NodeTrigger::Never,
            trigger_tag: TagTrigger::noop(),
            trigger_snapshot_store: NodeTrigger::Always,
            trigger_snapshot_evict: NodeTrigger::Always,
        }
    }

    /// Standard binary phase for a single monotone predicate: check
    /// unresolved nodes, propagate positive verdicts upward.
    #[must_use]
    pub fn binary_default() -> Self {
        let resolved = PropertySet::of(NodeProperty::Checked).with(NodeProperty::Tagged);
        Self {
            active: true,
            anonymity_property: NodeProperty::Anonymous,
            trigger_skip: NodeTrigger::any_of(resolved),
            trigger_evaluate: NodeTrigger::Never,
            trigger_check: NodeTrigger::any_of(NodeProperty::Checked).negated(),
            trigger_tag: TagTrigger {
                when: NodeTrigger::any_of(NodeProperty::Anonymous),
                set: PropertySet::of(NodeProperty::Anonymous).with(NodeProperty::Tagged),
                include_self: false,
                propagation: Propagation::Upwards,
            },
            trigger_snapshot_store: NodeTrigger::Always,
            trigger_snapshot_evict: NodeTrigger::Always,
        }
    }

    /// Standard linear phase for a single monotone predicate. Same
    /// trigger set as [`Self::binary_default`]; only the traversal
    /// differs.
    #[must_use]
    pub fn linear_default() -> Self {
        Self {
            trigger_snapshot_store: NodeTrigger::any_of(NodeProperty::Checked),
            trigger_snapshot_evict: NodeTrigger::any_of(NodeProperty::Tagged),
            ..Self::binary_default()
        }
    }

    /// Two-phase setup for a monotone weak predicate combined with a
    /// full predicate evaluated inside the weak region: the binary
    /// phase locates the weak boundary, the linear phase explores the
    /// region above it for the full predicate. Returns
    /// `(binary, linear)`.
    ///
    /// Expects the checker to record the weak verdict pair
    /// (`KAnonymous`/`NotKAnonymous`) on every check and the full pair
    /// (`Anonymous`/`NotAnonymous`) whenever the weak verdict holds.
    #[must_use]
    pub fn two_phase_pair() -> (Self, Self) {
        let binary = Self {
            active: true,
            anonymity_property: NodeProperty::KAnonymous,
            trigger_skip: NodeTrigger::any_of(
                PropertySet::of(NodeProperty::KAnonymous).with(NodeProperty::NotKAnonymous),
            ),
            trigger_evaluate: NodeTrigger::Never,
            trigger_check: NodeTrigger::any_of(NodeProperty::Checked).negated(),
            trigger_tag: TagTrigger {
                when: NodeTrigger::any_of(NodeProperty::KAnonymous),
                set: PropertySet::of(NodeProperty::KAnonymous),
                include_self: false,
                propagation: Propagation::Upwards,
            },
            trigger_snapshot_store: NodeTrigger::Always,
            trigger_snapshot_evict: NodeTrigger::Always,
        };
        let linear = Self {
            active: true,
            anonymity_property: NodeProperty::Anonymous,
            // Not `NotAnonymous`: a checked non-anonymous node is
            // still walked through (never re-checked) so the region
            // above it stays reachable under a non-monotone full
            // predicate.
            trigger_skip: NodeTrigger::any_of(
                PropertySet::of(NodeProperty::NotKAnonymous).with(NodeProperty::Tagged),
            ),
            trigger_evaluate: NodeTrigger::Never,
            trigger_check: NodeTrigger::any_of(NodeProperty::Checked).negated(),
            trigger_tag: TagTrigger {
                when: NodeTrigger::any_of(NodeProperty::Anonymous),
                set: PropertySet::of(NodeProperty::Anonymous).with(NodeProperty::Tagged),
                include_self: false,
                propagation: Propagation::Upwards,
            },
            trigger_snapshot_store: NodeTrigger::any_of(NodeProperty::Checked),
            trigger_snapshot_evict: NodeTrigger::any_of(NodeProperty::Tagged),
        };
        (binary, linear)
    }

    #[must_use]
    pub const fn anonymity_property(mut self, property: NodeProperty) -> Self {
        self.anonymity_property = property;
        self
    }

    #[must_use]
    pub fn skip(mut self, trigger: NodeTrigger) -> Self {
        self.trigger_skip = trigger;
        self
    }

    #[must_use]
    pub fn evaluate(mut self, trigger: NodeTrigger) -> Self {
        self.trigger_evaluate = trigger;
        self
    }

    #[must_use]
    pub fn check(mut self, trigger: NodeTrigger) -> Self {
        self.trigger_check = trigger;
        self
    }

    #[must_use]
    pub fn tag(mut self, trigger: TagTrigger) -> Self {
        self.trigger_tag = trigger;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_is_inert() {
        let config = PhaseConfig::inactive();
        assert!(!config.active);
        assert_eq!(config.trigger_tag, TagTrigger::noop());
    }

    #[test]
    fn defaults_check_unchecked_nodes_only() {
        let config = PhaseConfig::binary_default();
        assert!(config.active);
        assert_eq!(
            config.trigger_check,
            NodeTrigger::any_of(NodeProperty::Checked).negated()
        );
        assert_eq!(config.trigger_evaluate, NodeTrigger::Never);
    }

    #[test]
    fn two_phase_pair_uses_distinct_predicates() {
        let (binary, linear) = PhaseConfig::two_phase_pair();
        assert_eq!(binary.anonymity_property, NodeProperty::KAnonymous);
        assert_eq!(linear.anonymity_property, NodeProperty::Anonymous);
        assert!(binary.active && linear.active);
        assert_ne!(binary.trigger_snapshot_evict, linear.trigger_snapshot_evict);
    }

    #[test]
    fn builder_overrides() {
        let config = PhaseConfig::binary_default()
            .anonymity_property(NodeProperty::KAnonymous)
            .evaluate(NodeTrigger::any_of(NodeProperty::Tagged));
        assert_eq!(config.anonymity_property, NodeProperty::KAnonymous);
        assert_eq!(
            config.trigger_evaluate,
            NodeTrigger::any_of(NodeProperty::Tagged)
        );
    }
}

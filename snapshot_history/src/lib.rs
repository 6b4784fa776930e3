// SPDX-License-Identifier: MIT OR Apache-2.0
//! Snapshot history for anonymization checks.
//!
//! An expensive per-node check can reuse the intermediate state of a
//! previously checked, less general node instead of starting from the
//! raw dataset. This crate keeps those intermediate states (snapshots)
//! in a bounded store whose admission and eviction behavior is
//! governed by swappable node triggers, so a search algorithm can
//! switch retention policy between traversal phases.
//!
//! # Policy model
//!
//! - The **storage trigger** decides which checked nodes are worth
//!   keeping a snapshot for.
//! - The **eviction trigger** decides which stored snapshots may be
//!   dropped when the store is full.
//! - Nodes carrying [`NodeProperty::ForceSnapshot`] bypass both: they
//!   are always stored and never evicted.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]

mod config;
mod error;
mod stats;

pub use config::HistoryConfig;
pub use error::{HistoryError, Result};
pub use stats::{HistoryStats, StatsSnapshot};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use transform_lattice::{Lattice, NodeId, NodeProperty, NodeTrigger};

/// Opaque intermediate state of a check, keyed by node.
///
/// The history does not interpret the payload; the checker that stored
/// it knows how to resume from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub data: Vec<u32>,
}

impl Snapshot {
    #[must_use]
    pub fn new(data: Vec<u32>) -> Self {
        Self { data }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    snapshot: Snapshot,
    pinned: bool,
    last_access: u64,
}

/// Bounded, trigger-governed snapshot store.
#[derive(Debug)]
pub struct History {
    config: HistoryConfig,
    entries: HashMap<NodeId, Entry>,
    storage_trigger: NodeTrigger,
    eviction_trigger: NodeTrigger,
    clock: u64,
    stats: HistoryStats,
}

impl History {
    /// # Errors
    ///
    /// Returns [`HistoryError::InvalidConfig`] for a zero capacity.
    pub fn new(config: HistoryConfig) -> Result<Self> {
        if config.capacity == 0 {
            return Err(HistoryError::InvalidConfig(
                "capacity must be non-zero".into(),
            ));
        }
        Ok(Self {
            config,
            entries: HashMap::new(),
            storage_trigger: NodeTrigger::Always,
            eviction_trigger: NodeTrigger::Always,
            clock: 0,
            stats: HistoryStats::new(),
        })
    }

    /// Replaces the admission policy.
    pub fn set_storage_trigger(&mut self, trigger: NodeTrigger) {
        self.storage_trigger = trigger;
    }

    /// Replaces the eviction policy.
    pub fn set_eviction_trigger(&mut self, trigger: NodeTrigger) {
        self.eviction_trigger = trigger;
    }

    pub fn storage_trigger(&self) -> &NodeTrigger {
        &self.storage_trigger
    }

    pub fn eviction_trigger(&self) -> &NodeTrigger {
        &self.eviction_trigger
    }

    /// Offers a snapshot for storage. Returns whether it was kept.
    ///
    /// Admission is decided by the storage trigger unless the node is
    /// pinned via `ForceSnapshot`. When the store is at capacity, a
    /// least-recently-used victim is evicted from among the entries
    /// the eviction trigger applies to; if no entry is evictable the
    /// offer is rejected. Pinned offers are always kept and live
    /// outside the capacity budget.
    pub fn store(&mut self, lattice: &Lattice, id: NodeId, snapshot: Snapshot) -> bool {
        let node = lattice.node(id);
        let pinned = node.has_property(NodeProperty::ForceSnapshot);

        if !pinned && !self.storage_trigger.applies_to(node) {
            self.stats.record_rejected();
            return false;
        }

        let replacing = self.entries.contains_key(&id);
        if !pinned && !replacing && self.unpinned_len() >= self.config.capacity {
            if !self.evict_one(lattice) {
                self.stats.record_rejected();
                return false;
            }
        }

        self.clock += 1;
        self.entries.insert(
            id,
            Entry {
                snapshot,
                pinned,
                last_access: self.clock,
            },
        );
        self.stats.record_store();
        true
    }

    /// Looks up the snapshot for a node, refreshing its recency.
    pub fn get(&mut self, id: NodeId) -> Option<&Snapshot> {
        self.clock += 1;
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.last_access = self.clock;
                self.stats.record_hit();
                Some(&entry.snapshot)
            },
            None => {
                self.stats.record_miss();
                None
            },
        }
    }

    /// Drops the snapshot for a node, pinned or not.
    pub fn remove(&mut self, id: NodeId) -> Option<Snapshot> {
        self.entries.remove(&id).map(|entry| entry.snapshot)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> &HistoryStats {
        &self.stats
    }

    fn unpinned_len(&self) -> usize {
        self.entries.values().filter(|e| !e.pinned).count()
    }

    /// Evicts the least recently used entry the eviction trigger
    /// allows. Returns whether an entry was removed.
    fn evict_one(&mut self, lattice: &Lattice) -> bool {
        let victim = self
            .entries
            .iter()
            .filter(|(&id, entry)| {
                !entry.pinned && self.eviction_trigger.applies_to(lattice.node(id))
            })
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(&id, _)| id);

        match victim {
            Some(id) => {
                self.entries.remove(&id);
                self.stats.record_eviction();
                true
            },
            None => false,
        }
    }
}

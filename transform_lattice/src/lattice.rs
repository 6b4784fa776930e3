//! The lattice structure: id-indexed node storage with level
//! partitions and upward property propagation.

use serde::{Deserialize, Serialize};

use crate::{
    error::{LatticeError, Result},
    node::{Node, PropertySet},
    NodeId,
};

/// Hard cap on hypercube size; beyond this the search space should be
/// reduced before building a materialized lattice.
const MAX_NODES: usize = 1 << 24;

/// Generalization lattice over per-attribute transformation levels.
///
/// Nodes carry dense ids equal to their index in the node table, so
/// callers can keep per-node side arrays as plain vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    nodes: Vec<Node>,
    levels: Vec<Vec<NodeId>>,
    heights: Vec<u32>,
    bottom: NodeId,
    top: NodeId,
}

impl Lattice {
    /// Builds the full hypercube lattice for the given per-attribute
    /// maximum generalization heights.
    ///
    /// A transformation is a vector `t` with `0 <= t[i] <= heights[i]`;
    /// its successors raise exactly one coordinate by one. The bottom
    /// node is the all-zero vector, the top node the all-max vector.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::EmptyHierarchy`] for an empty height
    /// slice and [`LatticeError::TooLarge`] when the product of
    /// `heights[i] + 1` exceeds the node limit.
    pub fn hypercube(heights: &[u32]) -> Result<Self> {
        if heights.is_empty() {
            return Err(LatticeError::EmptyHierarchy);
        }

        let mut total: u128 = 1;
        for &h in heights {
            total *= u128::from(h) + 1;
        }
        if total > MAX_NODES as u128 {
            return Err(LatticeError::TooLarge {
                nodes: total,
                limit: MAX_NODES,
            });
        }
        let total = total as usize;

        // Mixed-radix enumeration: the last attribute varies fastest.
        let mut strides = vec![1usize; heights.len()];
        for i in (0..heights.len() - 1).rev() {
            strides[i] = strides[i + 1] * (heights[i + 1] as usize + 1);
        }

        let max_level: usize = heights.iter().map(|&h| h as usize).sum();
        let mut nodes = Vec::with_capacity(total);
        let mut levels: Vec<Vec<NodeId>> = vec![Vec::new(); max_level + 1];

        let mut transformation = vec![0u32; heights.len()];
        for id in 0..total {
            let level: usize = transformation.iter().map(|&t| t as usize).sum();
            let mut successors = Vec::new();
            for (i, &t) in transformation.iter().enumerate() {
                if t < heights[i] {
                    successors.push(id + strides[i]);
                }
            }
            levels[level].push(id);
            nodes.push(Node {
                id,
                level,
                transformation: transformation.clone(),
                successors,
                properties: PropertySet::empty(),
                information_loss: None,
            });

            // Advance to the next transformation vector.
            for i in (0..transformation.len()).rev() {
                if transformation[i] < heights[i] {
                    transformation[i] += 1;
                    break;
                }
                transformation[i] = 0;
            }
        }

        Ok(Self {
            nodes,
            levels,
            heights: heights.to_vec(),
            bottom: 0,
            top: total - 1,
        })
    }

    /// Number of nodes in the lattice.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Level partitions in ascending generalization height; level 0
    /// holds only the bottom node.
    pub fn levels(&self) -> &[Vec<NodeId>] {
        &self.levels
    }

    /// Per-attribute maximum generalization heights.
    pub fn heights(&self) -> &[u32] {
        &self.heights
    }

    pub fn bottom(&self) -> NodeId {
        self.bottom
    }

    pub fn top(&self) -> NodeId {
        self.top
    }

    /// # Panics
    ///
    /// Panics if `id` is out of range; ids handed out by this lattice
    /// are always valid.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn successors(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].successors
    }

    /// Sets `properties` on every node reachable from `id` through
    /// successor edges. Sound for verdict flags only when the
    /// predicate they encode is monotone.
    pub fn set_property_upwards(&mut self, id: NodeId, include_self: bool, properties: PropertySet) {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = Vec::new();

        if include_self {
            stack.push(id);
        } else {
            seen[id] = true;
            stack.extend_from_slice(&self.nodes[id].successors);
        }

        while let Some(current) = stack.pop() {
            if seen[current] {
                continue;
            }
            seen[current] = true;
            self.nodes[current].properties.insert_all(properties);
            stack.extend_from_slice(&self.nodes[current].successors);
        }
    }
}

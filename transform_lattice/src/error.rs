//! Error types for lattice construction.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error type for lattice operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LatticeError {
    /// A lattice needs at least one attribute.
    EmptyHierarchy,
    /// The requested lattice would exceed the node limit.
    TooLarge { nodes: u128, limit: usize },
}

impl fmt::Display for LatticeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyHierarchy => write!(f, "lattice requires at least one attribute"),
            Self::TooLarge { nodes, limit } => {
                write!(f, "lattice of {nodes} nodes exceeds limit of {limit}")
            },
        }
    }
}

impl std::error::Error for LatticeError {}

/// Result type alias for lattice operations.
pub type Result<T> = std::result::Result<T, LatticeError>;

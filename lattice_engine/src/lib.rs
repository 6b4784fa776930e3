//! Hybrid lattice search for optimal anonymizing transformations.
//!
//! Given a generalization lattice, a checker for the (expensive)
//! privacy predicate, and a utility metric, the engine finds the
//! privacy-compliant transformation with the least information loss
//! while checking as few nodes as possible. Pruning relies on
//! monotonicity of the predicate: a satisfying node resolves all of
//! its generalizations, a violating node resolves nothing above it
//! but narrows the boundary.
//!
//! # Example
//!
//! ```ignore
//! use lattice_engine::{HybridSearch, HeightStrategy, PhaseConfig};
//! use transform_lattice::Lattice;
//!
//! let mut lattice = Lattice::hypercube(&[2, 3, 1])?;
//! let strategy = HeightStrategy::new();
//! let outcome = HybridSearch::new(
//!     &mut lattice,
//!     &mut checker,
//!     &strategy,
//!     PhaseConfig::binary_default(),
//!     PhaseConfig::linear_default(),
//! )?
//! .run()?;
//!
//! if let Some(node) = outcome.optimum {
//!     println!("optimum: {:?}", lattice.node(node).transformation);
//! }
//! ```
//!
//! # Preconditions
//!
//! The engine trusts monotonicity of the anonymity properties it is
//! configured with; it does not verify it. A non-monotone verdict
//! behind a propagating tag trigger produces incorrect pruning, not a
//! crash.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_wrap)] // path indices fit isize
#![allow(clippy::cast_sign_loss)] // midpoints are non-negative
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::uninlined_format_args)]

mod algorithm;
mod checker;
mod config;
mod error;
mod strategy;

pub use algorithm::{HybridSearch, SearchOutcome, SearchStats};
pub use checker::{CheckResult, Metric, NodeChecker};
pub use config::PhaseConfig;
pub use error::{Result, SearchError};
pub use strategy::{HeightStrategy, OrderedValue, OrderingStrategy, StrategyKey};

#[cfg(test)]
mod tests;

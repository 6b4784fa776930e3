//! Error types for the search engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error type for search operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchError {
    /// The external checker or metric failed. Fatal to the run, never
    /// retried.
    Checker(String),
    /// A phase configuration was rejected at construction time.
    InvalidConfig(String),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checker(e) => write!(f, "checker failed: {e}"),
            Self::InvalidConfig(e) => write!(f, "invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for SearchError {}

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

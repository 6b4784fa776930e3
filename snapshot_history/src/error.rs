use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("snapshot not found for node {0}")]
    NotFound(usize),
}

pub type Result<T> = std::result::Result<T, HistoryError>;

//! Error type for index construction, insertion and search.

use thiserror::Error;

/// Errors reported synchronously by [`HnswIndex`](crate::hnsw::HnswIndex) and
/// [`Collection`](crate::collection::Collection).
///
/// Every variant is a precondition violation detected before the graph is
/// touched, so the index is unchanged after any of them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    /// Vector length disagrees with the index's established dimension.
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Zero-length vector passed to insert.
    #[error("Vector must have at least one component")]
    EmptyVector,

    /// A component is NaN or infinite.
    #[error("Vector component at position {position} is not finite")]
    NonFiniteComponent { position: usize },

    /// Node ids are `u32`; the arena cannot grow further.
    #[error("Index is full: {0} nodes")]
    CapacityExceeded(usize),

    /// Construction-time configuration was rejected.
    #[error("Invalid index configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, IndexError>;

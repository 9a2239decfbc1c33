//! Point types stored in and returned by the index.
//!
//! A [`Point`] is a labelled vector. Search returns [`ScoredPoint`]s that share
//! the stored point through an `Arc`, so results stay cheap to clone and valid
//! after a collection lock is released.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A labelled vector. Equality compares both the vector and the label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Opaque identifier supplied by the caller.
    pub label: String,
    /// Vector components.
    pub vector: Vec<f32>,
}

impl Point {
    /// Creates a point from a label and its components.
    pub fn new(label: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            label: label.into(),
            vector,
        }
    }

    /// Number of components.
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// A stored point together with its distance to the query.
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    /// The matched point (shared with the index arena).
    pub point: Arc<Point>,
    /// Distance under the index metric; lower is closer.
    pub distance: f32,
}

impl ScoredPoint {
    /// Label of the matched point.
    pub fn label(&self) -> &str {
        &self.point.label
    }
}

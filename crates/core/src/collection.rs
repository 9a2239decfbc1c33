//! Thread-safe handle around an [`HnswIndex`].
//!
//! A [`Collection`] serializes insertions behind the write half of a
//! `parking_lot::RwLock` and lets any number of searches share the read half.
//! Clones share the same index.

use crate::error::Result;
use crate::hnsw::diagnostics::GraphStats;
use crate::hnsw::distance::{DistanceMetric, Metric};
use crate::hnsw::graph::{HnswConfig, HnswIndex};
use crate::point::{Point, ScoredPoint};
use parking_lot::RwLock;
use std::sync::Arc;

/// Shared HNSW index: exclusive insertion, concurrent search.
pub struct Collection<M: Metric = DistanceMetric> {
    pub index: Arc<RwLock<HnswIndex<M>>>,
}

impl<M: Metric> Clone for Collection<M> {
    fn clone(&self) -> Self {
        Self {
            index: Arc::clone(&self.index),
        }
    }
}

impl Collection<DistanceMetric> {
    /// Creates an empty collection from a configuration.
    pub fn new(config: HnswConfig) -> Result<Self> {
        Ok(Self::from_index(HnswIndex::new(config)?))
    }
}

impl<M: Metric> Collection<M> {
    /// Wraps an existing index.
    pub fn from_index(index: HnswIndex<M>) -> Self {
        Self {
            index: Arc::new(RwLock::new(index)),
        }
    }

    /// Inserts a point while holding the write lock for the whole insertion.
    pub fn insert(&self, point: Point) -> Result<u32> {
        self.index.write().insert(point)
    }

    /// Inserts points in order, stopping at the first failure.
    /// Returns the number inserted before the failure or the end.
    pub fn insert_batch<I>(&self, points: I) -> Result<usize>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut index = self.index.write();
        let mut inserted = 0;
        for point in points {
            index.insert(point)?;
            inserted += 1;
        }
        tracing::debug!(count = inserted, "Batch inserted");
        Ok(inserted)
    }

    /// K nearest points under a read lock.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredPoint>> {
        self.index.read().search(query, k)
    }

    /// K nearest points with an explicit beam width.
    pub fn search_with_ef(&self, query: &[f32], k: usize, ef: usize) -> Result<Vec<ScoredPoint>> {
        self.index.read().search_with_ef(query, k, ef)
    }

    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    pub fn stats(&self) -> GraphStats {
        self.index.read().stats()
    }

    /// Diagnostic listing of every node (see `Display` on [`HnswIndex`]).
    pub fn render(&self) -> String {
        self.index.read().to_string()
    }
}

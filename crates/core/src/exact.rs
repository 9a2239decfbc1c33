//! Brute-force nearest neighbors, used to verify HNSW results.

use crate::error::Result;
use crate::hnsw::distance::{checked_distance, Metric};
use crate::hnsw::graph::HnswIndex;
use crate::hnsw::search::NearestSet;
use crate::point::{Point, ScoredPoint};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::sync::Arc;

/// Exact k-NN by linear scan. Returns `(distance, position in points)` pairs,
/// ascending by distance then position. Fails on the first point whose
/// dimension disagrees with `query`.
pub fn exact_knn<M, P>(metric: &M, points: &[P], query: &[f32], k: usize) -> Result<Vec<(f32, usize)>>
where
    M: Metric + ?Sized,
    P: Borrow<Point>,
{
    if k == 0 {
        return Ok(Vec::new());
    }
    let mut nearest = NearestSet::new(k);
    for (pos, p) in points.iter().enumerate() {
        let dist = checked_distance(metric, query, &p.borrow().vector)?;
        if nearest.admits(dist) {
            nearest.push(dist, pos as u32);
        }
    }
    Ok(nearest
        .into_sorted_vec()
        .into_iter()
        .map(|(d, pos)| (d, pos as usize))
        .collect())
}

/// Fraction of `expected` ids present in `found`. 1.0 when `expected` is empty.
pub fn recall(expected: &[u32], found: &[u32]) -> f64 {
    if expected.is_empty() {
        return 1.0;
    }
    let found: HashSet<u32> = found.iter().copied().collect();
    let hits = expected.iter().filter(|id| found.contains(id)).count();
    hits as f64 / expected.len() as f64
}

impl<M: Metric> HnswIndex<M> {
    /// Exact k-NN over every stored point, ignoring the graph.
    pub fn exact_search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredPoint>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        self.validate_vector(query)?;
        let hits = exact_knn(&self.metric, &self.points, query, k)?;
        Ok(hits
            .into_iter()
            .map(|(distance, pos)| ScoredPoint {
                point: Arc::clone(&self.points[pos]),
                distance,
            })
            .collect())
    }
}

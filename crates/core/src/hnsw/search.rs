//! HNSW search algorithms: single-layer beam search and multi-layer KNN.
//!
//! [`search_layer`] is the only graph traversal primitive. Insertion calls it
//! with `ef = 1` for greedy descent and `ef = ef_construction` for linking;
//! [`knn_search`] calls it with `ef = 1` on upper layers and `max(k, ef)` on
//! layer 0.

use crate::error::Result;
use crate::hnsw::distance::Metric;
use crate::hnsw::graph::HnswIndex;
use crate::hnsw::visited::VisitedSet;
use crate::point::ScoredPoint;
use ordered_float::OrderedFloat;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

thread_local! {
    /// Per-thread visited set reused by queries, so `search` can take `&self`.
    static SEARCH_VISITED: RefCell<VisitedSet> = RefCell::new(VisitedSet::new(0));
}

/// A frontier entry. Reversed ordering turns `BinaryHeap` into a min-heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    distance: OrderedFloat<f32>,
    id: u32,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.distance, other.id).cmp(&(self.distance, self.id))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A kept result. Max-heap by (distance, id) so the worst sits on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct ResultEntry {
    distance: OrderedFloat<f32>,
    id: u32,
}

/// Bounded accumulator of the `capacity` nearest nodes seen so far.
///
/// The worst kept entry is always at the top for O(1) comparison and
/// O(log n) eviction. Consumers get ascending order via [`into_sorted_vec`].
///
/// [`into_sorted_vec`]: NearestSet::into_sorted_vec
#[derive(Debug, Clone)]
pub struct NearestSet {
    heap: BinaryHeap<ResultEntry>,
    capacity: usize,
}

impl NearestSet {
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            heap: BinaryHeap::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// Distance of the worst kept entry.
    pub fn worst(&self) -> Option<f32> {
        self.heap.peek().map(|e| e.distance.0)
    }

    /// Whether an entry at `distance` would be kept.
    pub fn admits(&self, distance: f32) -> bool {
        !self.is_full() || self.worst().map_or(true, |w| distance < w)
    }

    /// Adds an entry, evicting the worst when over capacity.
    pub fn push(&mut self, distance: f32, id: u32) {
        self.heap.push(ResultEntry {
            distance: OrderedFloat(distance),
            id,
        });
        if self.heap.len() > self.capacity {
            self.heap.pop();
        }
    }

    /// Kept entries in ascending (distance, id) order.
    pub fn into_sorted_vec(self) -> Vec<(f32, u32)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|e| (e.distance.0, e.id))
            .collect()
    }
}

/// Search a single layer of the HNSW graph.
///
/// Returns up to `ef` nodes closest to `query` reachable from `entry_points`
/// at `layer`, ascending by distance. `visited` is cleared on entry.
pub fn search_layer<M: Metric>(
    index: &HnswIndex<M>,
    query: &[f32],
    entry_points: &[u32],
    ef: usize,
    layer: usize,
    visited: &mut VisitedSet,
) -> Vec<(f32, u32)> {
    visited.clear();
    let mut frontier: BinaryHeap<Candidate> = BinaryHeap::with_capacity(ef.max(1) * 2);
    let mut results = NearestSet::new(ef);

    for &ep in entry_points {
        if visited.insert(ep) {
            let dist = index.distance_to(query, ep);
            frontier.push(Candidate {
                distance: OrderedFloat(dist),
                id: ep,
            });
            results.push(dist, ep);
        }
    }

    while let Some(candidate) = frontier.pop() {
        // Closest unexplored candidate is worse than everything kept: converged.
        if results.is_full() && results.worst().map_or(false, |w| candidate.distance.0 > w) {
            break;
        }

        for &neighbor_id in index.neighbors(candidate.id, layer) {
            if !visited.insert(neighbor_id) {
                continue;
            }
            let dist = index.distance_to(query, neighbor_id);
            if results.admits(dist) {
                frontier.push(Candidate {
                    distance: OrderedFloat(dist),
                    id: neighbor_id,
                });
                results.push(dist, neighbor_id);
            }
        }
    }

    results.into_sorted_vec()
}

/// Multi-layer KNN search through the HNSW graph.
///
/// Greedy descent (ef = 1) from the entry point to layer 1, then a beam search
/// on layer 0 with `max(k, ef)`. Returns at most `k` `(distance, id)` pairs,
/// ascending. The query dimension is assumed to be validated.
pub fn knn_search<M: Metric>(
    index: &HnswIndex<M>,
    query: &[f32],
    k: usize,
    ef: usize,
) -> Vec<(f32, u32)> {
    let entry_point = match index.entry_point {
        Some(ep) => ep,
        None => return Vec::new(),
    };
    if k == 0 {
        return Vec::new();
    }

    SEARCH_VISITED.with(|cell| {
        let mut visited = cell.borrow_mut();
        visited.ensure_capacity(index.len());

        let mut current_ep = entry_point;
        for layer in (1..=index.max_layer).rev() {
            let results = search_layer(
                index,
                query,
                std::slice::from_ref(&current_ep),
                1,
                layer,
                &mut visited,
            );
            if let Some(&(_, nearest)) = results.first() {
                current_ep = nearest;
            }
        }

        let mut results = search_layer(
            index,
            query,
            std::slice::from_ref(&current_ep),
            ef.max(k),
            0,
            &mut visited,
        );
        results.truncate(k);
        results
    })
}

impl<M: Metric> HnswIndex<M> {
    /// Returns the `k` stored points nearest to `query`, ascending by distance,
    /// using `ef_search` as the layer-0 beam width.
    ///
    /// An empty index yields an empty result for any query.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredPoint>> {
        self.search_with_ef(query, k, self.config.ef_search)
    }

    /// Like [`search`](Self::search) with an explicit beam width.
    /// `ef` is raised to `k` when smaller.
    pub fn search_with_ef(&self, query: &[f32], k: usize, ef: usize) -> Result<Vec<ScoredPoint>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        self.validate_vector(query)?;

        let hits = knn_search(self, query, k, ef);
        tracing::trace!(k, ef, hits = hits.len(), "knn search");
        Ok(hits
            .into_iter()
            .map(|(distance, id)| ScoredPoint {
                point: Arc::clone(&self.points[id as usize]),
                distance,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexError;
    use crate::hnsw::graph::HnswConfig;
    use crate::point::Point;

    fn line_index(n: usize) -> HnswIndex {
        let mut index = HnswIndex::new(HnswConfig::with_max_neighbors(4)).unwrap();
        for i in 0..n {
            index
                .insert(Point::new(format!("p{i}"), vec![i as f32, 0.0]))
                .unwrap();
        }
        index
    }

    // ── NearestSet ─────────────────────────────────────────────────────

    #[test]
    fn test_nearest_set_evicts_worst() {
        let mut set = NearestSet::new(2);
        set.push(3.0, 0);
        set.push(1.0, 1);
        assert!(set.is_full());
        assert_eq!(set.worst(), Some(3.0));
        assert!(set.admits(2.0));
        assert!(!set.admits(3.5));

        set.push(2.0, 2);
        assert_eq!(set.len(), 2);
        assert_eq!(set.into_sorted_vec(), vec![(1.0, 1), (2.0, 2)]);
    }

    #[test]
    fn test_nearest_set_ties_by_id() {
        let mut set = NearestSet::new(2);
        set.push(1.0, 9);
        set.push(1.0, 3);
        set.push(1.0, 5);
        assert_eq!(set.into_sorted_vec(), vec![(1.0, 3), (1.0, 5)]);
    }

    #[test]
    fn test_nearest_set_zero_capacity_keeps_one() {
        let mut set = NearestSet::new(0);
        set.push(4.0, 0);
        set.push(2.0, 1);
        assert_eq!(set.into_sorted_vec(), vec![(2.0, 1)]);
    }

    // ── search_layer ───────────────────────────────────────────────────

    #[test]
    fn test_search_layer_bounded_and_ascending() {
        let index = line_index(20);
        let mut visited = VisitedSet::new(index.len());
        let entry = index.entry_point().unwrap();
        let results = search_layer(&index, &[7.2, 0.0], &[entry], 5, 0, &mut visited);
        assert_eq!(results.len(), 5);
        for w in results.windows(2) {
            assert!(w[0].0 <= w[1].0);
        }
        assert_eq!(results[0].1, 7);
    }

    #[test]
    fn test_search_layer_full_width_finds_everything() {
        let index = line_index(12);
        let mut visited = VisitedSet::new(index.len());
        let entry = index.entry_point().unwrap();
        let results = search_layer(&index, &[0.0, 0.0], &[entry], 100, 0, &mut visited);
        assert_eq!(results.len(), 12);
        let ids: Vec<u32> = results.iter().map(|&(_, id)| id).collect();
        assert_eq!(ids, (0..12).collect::<Vec<u32>>());
    }

    #[test]
    fn test_search_layer_greedy_returns_single() {
        let index = line_index(10);
        let mut visited = VisitedSet::new(index.len());
        let entry = index.entry_point().unwrap();
        let results = search_layer(&index, &[3.0, 0.0], &[entry], 1, 0, &mut visited);
        assert_eq!(results.len(), 1);
    }

    // ── knn_search / search ────────────────────────────────────────────

    #[test]
    fn test_knn_search_empty_index() {
        let index = HnswIndex::new(HnswConfig::default()).unwrap();
        assert!(knn_search(&index, &[1.0], 3, 10).is_empty());
        assert!(index.search(&[1.0, 2.0, 3.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_search_k_zero() {
        let index = line_index(5);
        assert!(index.search(&[1.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_search_raises_ef_to_k() {
        let index = line_index(30);
        let results = index.search_with_ef(&[15.0, 0.0], 10, 1).unwrap();
        assert_eq!(results.len(), 10);
    }

    #[test]
    fn test_search_dimension_mismatch() {
        let index = line_index(3);
        assert_eq!(
            index.search(&[1.0, 2.0, 3.0], 1).unwrap_err(),
            IndexError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn test_search_returns_shared_points() {
        let index = line_index(4);
        let results = index.search(&[2.1, 0.0], 1).unwrap();
        assert_eq!(results[0].label(), "p2");
        assert!(Arc::ptr_eq(&results[0].point, index.point(2).unwrap()));
    }
}

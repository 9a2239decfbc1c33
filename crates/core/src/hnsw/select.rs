//! Neighbor selection: reduces a candidate set to at most `M` neighbor ids.

use crate::hnsw::distance::Metric;
use crate::hnsw::graph::{HnswIndex, NeighborSelection};
use ordered_float::OrderedFloat;
use std::collections::HashSet;

/// Selects up to `m` distinct neighbors from `(distance_to_base, id)` candidates.
///
/// Candidates are ordered by (distance, id) first, so equal distances resolve
/// to the smaller id and the outcome is deterministic.
pub fn select_neighbors<M: Metric>(
    index: &HnswIndex<M>,
    candidates: &[(f32, u32)],
    m: usize,
    policy: NeighborSelection,
) -> Vec<(f32, u32)> {
    let mut sorted = candidates.to_vec();
    sorted.sort_unstable_by_key(|&(d, id)| (OrderedFloat(d), id));
    sorted.dedup_by_key(|&mut (_, id)| id);

    match policy {
        NeighborSelection::Simple => {
            sorted.truncate(m);
            sorted
        }
        NeighborSelection::Heuristic => select_diverse(index, &sorted, m),
    }
}

/// Heuristic selection (Algorithm 4 from the HNSW paper).
/// A candidate is kept only if it is closer to the base node than to any
/// already kept neighbor; unfilled slots take the closest leftovers.
fn select_diverse<M: Metric>(
    index: &HnswIndex<M>,
    sorted: &[(f32, u32)],
    m: usize,
) -> Vec<(f32, u32)> {
    let mut selected: Vec<(f32, u32)> = Vec::with_capacity(m);

    for &(dist_to_base, cid) in sorted {
        if selected.len() >= m {
            break;
        }
        let is_diverse = selected
            .iter()
            .all(|&(_, sid)| dist_to_base <= index.distance_between(cid, sid));
        if is_diverse {
            selected.push((dist_to_base, cid));
        }
    }

    if selected.len() < m {
        let taken: HashSet<u32> = selected.iter().map(|&(_, id)| id).collect();
        for &(dist, cid) in sorted {
            if selected.len() >= m {
                break;
            }
            if !taken.contains(&cid) {
                selected.push((dist, cid));
            }
        }
    }

    selected
}

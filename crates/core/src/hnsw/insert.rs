//! HNSW insertion algorithm.
//!
//! Inserts a point with symmetric connections at every layer it shares with the
//! existing graph. All validation happens before the first mutation, so a
//! rejected insert leaves the graph untouched.

use crate::error::{IndexError, Result};
use crate::hnsw::distance::Metric;
use crate::hnsw::graph::HnswIndex;
use crate::hnsw::search::search_layer;
use crate::hnsw::select::select_neighbors;
use crate::hnsw::visited::VisitedSet;
use crate::point::Point;
use std::collections::VecDeque;
use std::sync::Arc;

impl<M: Metric> HnswIndex<M> {
    /// Insert a point and return its internal id.
    ///
    /// Fails with `DimensionMismatch` when the vector length differs from the
    /// established dimension; the first successful insert establishes it.
    pub fn insert(&mut self, point: Point) -> Result<u32> {
        self.validate_vector(&point.vector)?;
        let internal_id = u32::try_from(self.points.len())
            .map_err(|_| IndexError::CapacityExceeded(self.points.len()))?;

        let level = self.sampler.sample_level();
        if self.dimension.is_none() {
            self.dimension = Some(point.vector.len());
        }
        let point = Arc::new(point);

        // First node becomes the entry point
        let entry_point = match self.entry_point {
            Some(ep) => ep,
            None => {
                self.points.push(point);
                self.neighbors.push(vec![Vec::new(); level + 1]);
                self.layers.push(level as u8);
                self.entry_point = Some(internal_id);
                self.max_layer = level;
                tracing::debug!(node = internal_id, level, "Inserted first node");
                return Ok(internal_id);
            }
        };

        let query = point.vector.as_slice();
        let mut visited = VisitedSet::new(self.points.len());

        // Phase 1: greedy descent through layers the new node does not reach
        let mut current_ep = entry_point;
        for layer in (level + 1..=self.max_layer).rev() {
            let results = search_layer(
                self,
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

        // Phase 2: beam search each shared layer and choose the new node's neighbors
        let top = level.min(self.max_layer);
        let mut node_neighbors: Vec<Vec<u32>> = vec![Vec::new(); level + 1];
        let mut layer_eps: Vec<u32> = vec![current_ep];
        for layer in (0..=top).rev() {
            let candidates = search_layer(
                self,
                query,
                &layer_eps,
                self.config.ef_construction,
                layer,
                &mut visited,
            );
            let selected = select_neighbors(
                self,
                &candidates,
                self.config.max_neighbors,
                self.config.neighbor_selection,
            );
            node_neighbors[layer] = selected.iter().map(|&(_, id)| id).collect();

            // Candidates at this layer seed the next one down
            layer_eps.clear();
            layer_eps.extend(candidates.iter().map(|&(_, id)| id));
            if layer_eps.is_empty() {
                layer_eps.push(current_ep);
            }
        }

        self.points.push(point);
        self.neighbors.push(node_neighbors);
        self.layers.push(level as u8);

        // Phase 3: back-edges, then prune lists they pushed over M
        for layer in 0..=top {
            let my_neighbors = self.neighbors[internal_id as usize][layer].clone();
            for &neighbor_id in &my_neighbors {
                self.neighbors[neighbor_id as usize][layer].push(internal_id);
            }
            if self.config.prune_overflow {
                for &neighbor_id in &my_neighbors {
                    if self.neighbors[neighbor_id as usize][layer].len() > self.config.max_neighbors {
                        self.prune_neighbor_list(neighbor_id, layer);
                    }
                }
            }
        }

        if level > self.max_layer {
            self.max_layer = level;
            self.entry_point = Some(internal_id);
            tracing::info!(node = internal_id, layer = level, "Entry point promoted");
        }

        tracing::debug!(
            node = internal_id,
            level,
            degree = self.neighbors[internal_id as usize][0].len(),
            "Inserted node"
        );
        Ok(internal_id)
    }

    /// Shrinks `node`'s list at `layer` back to `max_neighbors` with the
    /// configured selection policy. A dropped edge is removed on both sides
    /// unless it is the only path between its endpoints at `layer`; such
    /// edges stay, so the layer never splits into disconnected parts.
    fn prune_neighbor_list(&mut self, node: u32, layer: usize) {
        let candidates: Vec<(f32, u32)> = self.neighbors[node as usize][layer]
            .iter()
            .map(|&cid| (self.distance_between(node, cid), cid))
            .collect();
        let kept: Vec<u32> = select_neighbors(
            self,
            &candidates,
            self.config.max_neighbors,
            self.config.neighbor_selection,
        )
        .into_iter()
        .map(|(_, id)| id)
        .collect();

        let mut pinned = 0usize;
        for &(_, cid) in &candidates {
            if kept.contains(&cid) {
                continue;
            }
            self.neighbors[node as usize][layer].retain(|&x| x != cid);
            self.neighbors[cid as usize][layer].retain(|&x| x != node);
            if !self.is_reachable(cid, node, layer) {
                self.neighbors[node as usize][layer].push(cid);
                self.neighbors[cid as usize][layer].push(node);
                pinned += 1;
            }
        }

        tracing::trace!(
            node,
            layer,
            before = candidates.len(),
            after = self.neighbors[node as usize][layer].len(),
            pinned,
            "Pruned neighbor list"
        );
    }

    /// Breadth-first walk over `layer` from `from`, stopping at `to`.
    fn is_reachable(&self, from: u32, to: u32, layer: usize) -> bool {
        let mut visited = VisitedSet::new(self.points.len());
        let mut queue = VecDeque::from([from]);
        visited.insert(from);
        while let Some(id) = queue.pop_front() {
            for &nb in self.neighbors(id, layer) {
                if nb == to {
                    return true;
                }
                if visited.insert(nb) {
                    queue.push_back(nb);
                }
            }
        }
        false
    }
}

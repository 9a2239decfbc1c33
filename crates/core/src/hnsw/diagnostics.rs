//! Graph diagnostics: structural invariant checks, per-layer statistics, and a
//! human-readable listing of every node's neighbors.

use crate::hnsw::distance::Metric;
use crate::hnsw::graph::HnswIndex;
use crate::hnsw::visited::VisitedSet;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Per-layer node and edge counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayerStats {
    pub layer: usize,
    /// Nodes whose top layer is at least `layer`.
    pub nodes: usize,
    /// Undirected edges at this layer.
    pub edges: usize,
    pub max_degree: usize,
    /// Connected parts of the layer; 1 for a navigable graph.
    pub components: usize,
}

/// Summary of the graph shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub dimension: Option<usize>,
    pub max_layer: usize,
    pub entry_point: Option<u32>,
    pub layers: Vec<LayerStats>,
}

impl<M: Metric> HnswIndex<M> {
    /// Verify internal invariants.
    ///
    /// Checks that parallel arrays agree in length, neighbor ids are in bounds
    /// and reach the layer they are listed on, edges are symmetric without
    /// self-loops or duplicates, layer-0 lists are non-empty once two nodes
    /// exist, every layer is one connected component, and the entry point
    /// sits on `max_layer`.
    pub fn check_invariants(&self) -> Result<(), String> {
        let n = self.points.len();
        if self.neighbors.len() != n || self.layers.len() != n {
            return Err(format!(
                "array lengths disagree: points={}, neighbors={}, layers={}",
                n,
                self.neighbors.len(),
                self.layers.len()
            ));
        }

        match self.entry_point {
            None if n > 0 => return Err("non-empty index has no entry point".into()),
            Some(ep) if ep as usize >= n => {
                return Err(format!("entry point {ep} out of bounds (n={n})"))
            }
            Some(ep) if self.layers[ep as usize] as usize != self.max_layer => {
                return Err(format!(
                    "entry point {} has layer {} but max_layer is {}",
                    ep, self.layers[ep as usize], self.max_layer
                ))
            }
            _ => {}
        }
        let top = self.layers.iter().copied().max().unwrap_or(0) as usize;
        if top != self.max_layer {
            return Err(format!(
                "max_layer {} != highest node layer {}",
                self.max_layer, top
            ));
        }

        for (id, per_layer) in self.neighbors.iter().enumerate() {
            let node_layer = self.layers[id] as usize;
            if per_layer.len() != node_layer + 1 {
                return Err(format!(
                    "node {} has {} neighbor lists but layer {}",
                    id,
                    per_layer.len(),
                    node_layer
                ));
            }
            if let Some(dim) = self.dimension {
                if self.points[id].vector.len() != dim {
                    return Err(format!("node {id} has wrong dimension"));
                }
            }
            if n >= 2 && per_layer[0].is_empty() {
                return Err(format!("node {id} has no layer-0 neighbors"));
            }

            for (layer, list) in per_layer.iter().enumerate() {
                let mut seen = HashSet::with_capacity(list.len());
                for &nb in list {
                    let nbu = nb as usize;
                    if nbu >= n {
                        return Err(format!("node {id} layer {layer}: neighbor {nb} out of bounds"));
                    }
                    if nbu == id {
                        return Err(format!("node {id} layer {layer}: self-loop"));
                    }
                    if !seen.insert(nb) {
                        return Err(format!("node {id} layer {layer}: duplicate neighbor {nb}"));
                    }
                    if (self.layers[nbu] as usize) < layer {
                        return Err(format!(
                            "node {id} layer {layer}: neighbor {nb} only reaches layer {}",
                            self.layers[nbu]
                        ));
                    }
                    if !self.neighbors[nbu][layer].contains(&(id as u32)) {
                        return Err(format!(
                            "edge {id} -> {nb} at layer {layer} has no reverse edge"
                        ));
                    }
                }
            }
        }

        if n > 0 {
            for layer in 0..=self.max_layer {
                let parts = self.layer_components(layer);
                if parts != 1 {
                    return Err(format!("layer {layer} splits into {parts} components"));
                }
            }
        }
        Ok(())
    }

    /// Number of connected components among the nodes that reach `layer`.
    pub fn layer_components(&self, layer: usize) -> usize {
        let mut visited = VisitedSet::new(self.points.len());
        let mut stack = Vec::new();
        let mut components = 0;
        for (id, &top) in self.layers.iter().enumerate() {
            let id = id as u32;
            if (top as usize) < layer || !visited.insert(id) {
                continue;
            }
            components += 1;
            stack.push(id);
            while let Some(cur) = stack.pop() {
                for &nb in self.neighbors(cur, layer) {
                    if visited.insert(nb) {
                        stack.push(nb);
                    }
                }
            }
        }
        components
    }

    /// Node, edge and degree counts per layer.
    pub fn stats(&self) -> GraphStats {
        let layer_count = if self.is_empty() { 0 } else { self.max_layer + 1 };
        let mut layers: Vec<LayerStats> = (0..layer_count)
            .map(|layer| LayerStats {
                layer,
                ..LayerStats::default()
            })
            .collect();

        let mut half_edges = vec![0usize; layer_count];
        for per_layer in &self.neighbors {
            for (layer, list) in per_layer.iter().enumerate() {
                let entry = &mut layers[layer];
                entry.nodes += 1;
                entry.max_degree = entry.max_degree.max(list.len());
                half_edges[layer] += list.len();
            }
        }
        for (entry, half) in layers.iter_mut().zip(half_edges) {
            entry.edges = half / 2;
            entry.components = self.layer_components(entry.layer);
        }

        GraphStats {
            nodes: self.len(),
            dimension: self.dimension,
            max_layer: self.max_layer,
            entry_point: self.entry_point,
            layers,
        }
    }
}

/// Lists every node with its coordinates and per-layer neighbor labels:
///
/// ```text
/// Node(A: 1, 2, 3, 4) -> Levels: 0
///   Level 0 neighbors: B C
/// ```
impl<M: Metric> fmt::Display for HnswIndex<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, point) in self.points.iter().enumerate() {
            write!(f, "Node({}: ", point.label)?;
            for (i, x) in point.vector.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{x}")?;
            }
            writeln!(f, ") -> Levels: {}", self.layers[id])?;
            for (layer, list) in self.neighbors[id].iter().enumerate() {
                write!(f, "  Level {layer} neighbors:")?;
                for &nb in list {
                    write!(f, " {}", self.points[nb as usize].label)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::hnsw::graph::HnswConfig;
    use crate::hnsw::HnswIndex;
    use crate::point::Point;

    fn flat_index() -> HnswIndex {
        // level_multiplier 0 keeps every node on layer 0
        let mut index = HnswIndex::new(HnswConfig {
            level_multiplier: 0.0,
            ..HnswConfig::with_max_neighbors(4)
        })
        .unwrap();
        index.insert(Point::new("A", vec![1.0, 2.0])).unwrap();
        index.insert(Point::new("B", vec![3.0, 4.0])).unwrap();
        index
    }

    #[test]
    fn test_invariants_hold_on_empty_index() {
        let index = HnswIndex::new(HnswConfig::default()).unwrap();
        assert!(index.check_invariants().is_ok());
        assert_eq!(index.stats().layers.len(), 0);
    }

    #[test]
    fn test_invariants_detect_asymmetric_edge() {
        let mut index = flat_index();
        index.neighbors[1][0].clear();
        let err = index.check_invariants().unwrap_err();
        assert!(err.contains("no layer-0 neighbors") || err.contains("reverse edge"), "{err}");
    }

    #[test]
    fn test_invariants_detect_self_loop() {
        let mut index = flat_index();
        index.neighbors[0][0].push(0);
        assert!(index.check_invariants().unwrap_err().contains("self-loop"));
    }

    #[test]
    fn test_invariants_detect_split_layer() {
        let mut index = HnswIndex::new(HnswConfig {
            level_multiplier: 0.0,
            ..HnswConfig::with_max_neighbors(4)
        })
        .unwrap();
        for (i, x) in [0.0, 1.0, 10.0, 11.0].into_iter().enumerate() {
            index.insert(Point::new(format!("p{i}"), vec![x])).unwrap();
        }
        assert_eq!(index.layer_components(0), 1);

        index.neighbors[0][0] = vec![1];
        index.neighbors[1][0] = vec![0];
        index.neighbors[2][0] = vec![3];
        index.neighbors[3][0] = vec![2];
        assert_eq!(index.layer_components(0), 2);
        assert!(index.check_invariants().unwrap_err().contains("2 components"));
    }

    #[test]
    fn test_stats_counts_edges_once() {
        let index = flat_index();
        let stats = index.stats();
        assert_eq!(stats.nodes, 2);
        assert_eq!(stats.layers.len(), 1);
        assert_eq!(stats.layers[0].nodes, 2);
        assert_eq!(stats.layers[0].edges, 1);
        assert_eq!(stats.layers[0].max_degree, 1);
        assert_eq!(stats.layers[0].components, 1);
    }

    #[test]
    fn test_listing_format() {
        let index = flat_index();
        let listing = index.to_string();
        assert_eq!(
            listing,
            "Node(A: 1, 2) -> Levels: 0\n  Level 0 neighbors: B\n\
             Node(B: 3, 4) -> Levels: 0\n  Level 0 neighbors: A\n"
        );
    }
}

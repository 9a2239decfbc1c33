//! Hierarchical Navigable Small World (HNSW) approximate nearest neighbor index.
//!
//! Every node lives on layer 0 and on each layer up to a randomly drawn top
//! layer, so upper layers are sparse "expressways" and layer 0 is the full
//! graph. Queries descend greedily from the entry point on the top layer and
//! finish with a beam search on layer 0.
//!
//! The graph is an arena: points, neighbor id lists and top layers are stored
//! in parallel arrays addressed by `u32` node id.

/// Graph diagnostics: invariant checks, statistics, and a text listing.
pub mod diagnostics;
/// Distance metrics: the `Metric` trait and built-in euclidean / cosine metrics.
pub mod distance;
/// HNSW graph structure, configuration, and data storage.
pub mod graph;
/// HNSW insertion algorithm with symmetric connections and optional pruning.
pub mod insert;
/// Random layer assignment with an explicit seeded generator.
pub mod level;
/// HNSW search: single-layer beam search and multi-layer KNN.
pub mod search;
/// Neighbor selection policies: closest-M and diversity heuristic.
pub mod select;
/// Epoch-based visited set for graph traversal.
pub mod visited;

pub use diagnostics::{GraphStats, LayerStats};
pub use distance::{checked_distance, DistanceMetric, Metric};
pub use graph::{HnswConfig, HnswIndex, NeighborSelection};
pub use search::{knn_search, search_layer, NearestSet};

//! HNSW graph structure and configuration.
//!
//! [`HnswConfig`] defines tuning parameters (M, ef_construction, ef_search, metric).
//! [`HnswIndex`] stores the graph using a Struct-of-Arrays layout: a point arena,
//! per-node per-layer neighbor id lists, and per-node top layers.

use crate::config;
use crate::error::{IndexError, Result};
use crate::hnsw::distance::{DistanceMetric, Metric};
use crate::hnsw::level::LevelSampler;
use crate::point::Point;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How a candidate set is reduced to a node's neighbor list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborSelection {
    /// Keep the `M` closest candidates (ties broken by node id).
    #[default]
    Simple,
    /// Keep a candidate only if it is closer to the base node than to every
    /// neighbor already kept; fill leftover slots with the closest unused ones.
    Heuristic,
}

/// Configuration parameters for an HNSW index. Fixed for the index lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HnswConfig {
    /// Maximum neighbors a node selects per layer (`M`).
    pub max_neighbors: usize,
    /// Candidate list size during index construction.
    pub ef_construction: usize,
    /// Candidate list size during search (raised to `k` when smaller).
    pub ef_search: usize,
    /// Layer decay factor; conventionally `1 / ln(max_neighbors)`.
    pub level_multiplier: f64,
    /// Maximum number of layers in the graph.
    pub max_layers: usize,
    /// Seed for the level sampler.
    pub seed: u64,
    /// Fixed vector dimension. `None` lets the first insert establish it.
    pub dimension: Option<usize>,
    /// Distance function used by [`HnswIndex::new`].
    pub distance_metric: DistanceMetric,
    /// Neighbor selection policy.
    pub neighbor_selection: NeighborSelection,
    /// Prune a neighbor's list back to `max_neighbors` when a back-edge
    /// pushes it over. Off by default: incoming degree is unbounded.
    pub prune_overflow: bool,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self::with_max_neighbors(config::HNSW_DEFAULT_M)
    }
}

impl HnswConfig {
    /// Default configuration with `M = m` and the matching level multiplier.
    pub fn with_max_neighbors(m: usize) -> Self {
        Self {
            max_neighbors: m,
            ef_construction: config::HNSW_DEFAULT_EF_CONSTRUCTION,
            ef_search: config::HNSW_DEFAULT_EF_SEARCH,
            level_multiplier: config::level_multiplier_for(m),
            max_layers: config::HNSW_DEFAULT_MAX_LAYERS,
            seed: config::HNSW_DEFAULT_SEED,
            dimension: None,
            distance_metric: DistanceMetric::default(),
            neighbor_selection: NeighborSelection::default(),
            prune_overflow: false,
        }
    }

    /// Rejects parameter combinations the graph cannot be built with.
    pub fn validate(&self) -> Result<()> {
        if self.max_neighbors == 0 {
            return Err(IndexError::InvalidConfig(
                "max_neighbors must be greater than 0".into(),
            ));
        }
        if self.ef_construction == 0 {
            return Err(IndexError::InvalidConfig(
                "ef_construction must be greater than 0".into(),
            ));
        }
        if self.max_layers == 0 || self.max_layers > config::HNSW_MAX_LAYERS_LIMIT {
            return Err(IndexError::InvalidConfig(format!(
                "max_layers must be in 1..={}, got {}",
                config::HNSW_MAX_LAYERS_LIMIT,
                self.max_layers
            )));
        }
        if !self.level_multiplier.is_finite() || self.level_multiplier < 0.0 {
            return Err(IndexError::InvalidConfig(format!(
                "level_multiplier must be finite and >= 0, got {}",
                self.level_multiplier
            )));
        }
        if self.dimension == Some(0) {
            return Err(IndexError::InvalidConfig(
                "dimension must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// HNSW index over labelled `f32` vectors.
///
/// Nodes live in parallel arrays addressed by `u32` id; neighbor lists hold ids,
/// never references, so the cyclic neighbor relation needs no shared ownership.
pub struct HnswIndex<M: Metric = DistanceMetric> {
    pub(crate) config: HnswConfig,
    pub(crate) metric: M,
    pub(crate) sampler: LevelSampler,
    // SoA: one entry per node
    pub(crate) points: Vec<Arc<Point>>,
    pub(crate) neighbors: Vec<Vec<Vec<u32>>>, // [node_id][layer][neighbor_ids]
    pub(crate) layers: Vec<u8>,
    // Index metadata
    pub(crate) entry_point: Option<u32>,
    pub(crate) max_layer: usize,
    pub(crate) dimension: Option<usize>,
}

impl HnswIndex<DistanceMetric> {
    /// Creates an empty index using `config.distance_metric` and `config.seed`.
    pub fn new(config: HnswConfig) -> Result<Self> {
        let metric = config.distance_metric;
        Self::with_metric(config, metric)
    }
}

impl<M: Metric> HnswIndex<M> {
    /// Creates an empty index with a caller-supplied metric.
    /// `config.distance_metric` is ignored.
    pub fn with_metric(config: HnswConfig, metric: M) -> Result<Self> {
        let rng = StdRng::seed_from_u64(config.seed);
        Self::with_rng(config, metric, rng)
    }

    /// Creates an empty index with a caller-supplied metric and level generator.
    pub fn with_rng(config: HnswConfig, metric: M, rng: StdRng) -> Result<Self> {
        config.validate()?;
        let sampler = LevelSampler::new(rng, config.level_multiplier, config.max_layers);
        Ok(Self {
            dimension: config.dimension,
            config,
            metric,
            sampler,
            points: Vec::new(),
            neighbors: Vec::new(),
            layers: Vec::new(),
            entry_point: None,
            max_layer: 0,
        })
    }

    /// Number of nodes in the index.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn config(&self) -> &HnswConfig {
        &self.config
    }

    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// Established vector dimension, if any.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Highest layer any node reaches. 0 for an empty index.
    pub fn max_layer(&self) -> usize {
        self.max_layer
    }

    /// Node every descent starts from.
    pub fn entry_point(&self) -> Option<u32> {
        self.entry_point
    }

    /// The stored point for `id`, or `None` if out of range.
    pub fn point(&self, id: u32) -> Option<&Arc<Point>> {
        self.points.get(id as usize)
    }

    /// Top layer of the given node.
    pub fn node_layer(&self, id: u32) -> Option<usize> {
        self.layers.get(id as usize).map(|&l| l as usize)
    }

    /// Neighbor ids of `id` at `layer`. Empty when the node does not reach `layer`.
    pub fn neighbors(&self, id: u32, layer: usize) -> &[u32] {
        self.neighbors
            .get(id as usize)
            .and_then(|per_layer| per_layer.get(layer))
            .map_or(&[], |list| list.as_slice())
    }

    /// Iterates over `(id, point)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Arc<Point>)> + '_ {
        self.points.iter().enumerate().map(|(i, p)| (i as u32, p))
    }

    /// Distance between the query and a stored node.
    #[inline]
    pub(crate) fn distance_to(&self, query: &[f32], id: u32) -> f32 {
        self.metric.distance(query, &self.points[id as usize].vector)
    }

    /// Distance between two stored nodes.
    #[inline]
    pub(crate) fn distance_between(&self, a: u32, b: u32) -> f32 {
        self.metric
            .distance(&self.points[a as usize].vector, &self.points[b as usize].vector)
    }

    /// Checks a caller vector against the established dimension. While no
    /// dimension is established any non-empty finite vector passes.
    pub(crate) fn validate_vector(&self, vector: &[f32]) -> Result<()> {
        if let Some(expected) = self.dimension {
            if vector.len() != expected {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }
        if vector.is_empty() {
            return Err(IndexError::EmptyVector);
        }
        if let Some(position) = vector.iter().position(|x| !x.is_finite()) {
            return Err(IndexError::NonFiniteComponent { position });
        }
        Ok(())
    }
}

impl<M: Metric> std::fmt::Debug for HnswIndex<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HnswIndex")
            .field("config", &self.config)
            .field("len", &self.points.len())
            .field("dimension", &self.dimension)
            .field("max_layer", &self.max_layer)
            .field("entry_point", &self.entry_point)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = HnswConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_neighbors, config::HNSW_DEFAULT_M);
        assert!((cfg.level_multiplier - 1.0 / 16f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_validate_rejects_zero_m() {
        let cfg = HnswConfig {
            max_neighbors: 0,
            ..HnswConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(IndexError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_bad_multiplier() {
        for ml in [f64::NAN, f64::INFINITY, -1.0] {
            let cfg = HnswConfig {
                level_multiplier: ml,
                ..HnswConfig::default()
            };
            assert!(cfg.validate().is_err(), "multiplier {ml} accepted");
        }
    }

    #[test]
    fn test_validate_rejects_layer_bounds() {
        for max_layers in [0, 257] {
            let cfg = HnswConfig {
                max_layers,
                ..HnswConfig::default()
            };
            assert!(cfg.validate().is_err());
        }
    }

    #[test]
    fn test_new_index_is_empty() {
        let index = HnswIndex::new(HnswConfig::default()).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert_eq!(index.entry_point(), None);
        assert_eq!(index.max_layer(), 0);
        assert_eq!(index.dimension(), None);
        assert!(index.neighbors(0, 0).is_empty());
    }

    #[test]
    fn test_fixed_dimension_from_config() {
        let index = HnswIndex::new(HnswConfig {
            dimension: Some(3),
            ..HnswConfig::default()
        })
        .unwrap();
        assert_eq!(index.dimension(), Some(3));
        assert!(index.validate_vector(&[1.0, 2.0]).is_err());
        assert!(index.validate_vector(&[1.0, 2.0, 3.0]).is_ok());
    }

    #[test]
    fn test_validate_vector_rejects_nan() {
        let index = HnswIndex::new(HnswConfig::default()).unwrap();
        assert_eq!(
            index.validate_vector(&[1.0, f32::NAN]),
            Err(IndexError::NonFiniteComponent { position: 1 })
        );
        assert_eq!(index.validate_vector(&[]), Err(IndexError::EmptyVector));
    }

    #[test]
    fn test_config_json_defaults_missing_fields() {
        let cfg: HnswConfig =
            serde_json::from_str(r#"{"max_neighbors": 4, "neighbor_selection": "heuristic"}"#)
                .unwrap();
        assert_eq!(cfg.max_neighbors, 4);
        assert_eq!(cfg.neighbor_selection, NeighborSelection::Heuristic);
        assert_eq!(cfg.ef_construction, config::HNSW_DEFAULT_EF_CONSTRUCTION);
    }
}

//! Default tuning parameters and validation limits for smallworld.
//!
//! These are compile-time constants; per-index configuration is carried by
//! [`HnswConfig`](crate::hnsw::HnswConfig), whose `Default` impl reads them.

/// Default maximum number of neighbors per node per layer (`M`).
///
/// Higher values improve recall but increase memory and build time.
/// Typical range: 4–64. Default: 16.
pub const HNSW_DEFAULT_M: usize = 16;

/// Default ef parameter during HNSW index construction.
///
/// Controls the size of the dynamic candidate list during insertion.
/// Higher values produce a better graph but slow down build time.
pub const HNSW_DEFAULT_EF_CONSTRUCTION: usize = 200;

/// Default ef parameter during HNSW search.
///
/// Raised to `k` at query time when smaller.
pub const HNSW_DEFAULT_EF_SEARCH: usize = 50;

/// Maximum number of layers in the HNSW graph.
pub const HNSW_DEFAULT_MAX_LAYERS: usize = 16;

/// Upper bound accepted for `max_layers` (layer numbers are stored as `u8`).
pub const HNSW_MAX_LAYERS_LIMIT: usize = 256;

/// Default seed for the level sampler's generator.
pub const HNSW_DEFAULT_SEED: u64 = 42;

/// Level multiplier conventionally paired with a given `M`: `1 / ln(M)`.
///
/// Nodes are assigned to layer `floor(-ln(uniform) * multiplier)`.
/// Returns 0.0 for `M <= 1`, which keeps every node on layer 0.
pub fn level_multiplier_for(m: usize) -> f64 {
    if m <= 1 {
        0.0
    } else {
        1.0 / (m as f64).ln()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_multiplier_for_m16() {
        let ml = level_multiplier_for(16);
        assert!((ml - 1.0 / 16f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_level_multiplier_degenerate_m() {
        assert_eq!(level_multiplier_for(0), 0.0);
        assert_eq!(level_multiplier_for(1), 0.0);
    }
}

//! Distance functions for HNSW search.
//!
//! Search and insertion only see the [`Metric`] trait; the index takes its
//! metric as a constructor value. [`DistanceMetric`] is the built-in,
//! serde-selectable implementation.

use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};

/// A dissimilarity function over equal-length vectors.
///
/// Implementations must be symmetric and non-negative. Callers guarantee
/// `a.len() == b.len()`; use [`checked_distance`] at API boundaries.
pub trait Metric: Send + Sync {
    fn distance(&self, a: &[f32], b: &[f32]) -> f32;
}

/// Built-in distance metrics. All return a value where **lower is closer**.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Euclidean (L2) distance. Range: \[0, ∞).
    #[default]
    Euclidean,
    /// Squared Euclidean distance (L2²). Same ordering as `Euclidean`, no sqrt.
    SquaredEuclidean,
    /// Cosine distance: `1 - cosine_similarity`. Range: \[0, 2\].
    /// A zero-norm vector is at distance 1.0 from everything.
    Cosine,
}

impl Metric for DistanceMetric {
    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Euclidean => euclidean_sq(a, b).sqrt() as f32,
            DistanceMetric::SquaredEuclidean => euclidean_sq(a, b) as f32,
            DistanceMetric::Cosine => cosine_distance(a, b) as f32,
        }
    }
}

impl<F> Metric for F
where
    F: Fn(&[f32], &[f32]) -> f32 + Send + Sync,
{
    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        self(a, b)
    }
}

/// Distance with a length check. Fails with `DimensionMismatch` when the
/// vectors disagree, taking `a` as the expected dimension.
pub fn checked_distance<M: Metric + ?Sized>(metric: &M, a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(IndexError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(metric.distance(a, b))
}

// Accumulated in f64: squares of finite components near f32::MAX overflow f32.
#[inline]
fn euclidean_sq(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = f64::from(x) - f64::from(y);
            d * d
        })
        .sum()
}

#[inline]
fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    // Rounding can push the similarity slightly past ±1.
    let sim = (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0);
    1.0 - sim
}

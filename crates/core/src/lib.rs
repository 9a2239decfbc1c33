//! # smallworld-core
//!
//! In-memory approximate nearest neighbor index built as a hierarchical
//! navigable small-world (HNSW) graph over fixed-dimension `f32` vectors.
//!
//! ```
//! use smallworld_core::{HnswConfig, HnswIndex, Point};
//!
//! let mut index = HnswIndex::new(HnswConfig::with_max_neighbors(4)).unwrap();
//! index.insert(Point::new("A", vec![1.0, 2.0, 3.0, 4.0])).unwrap();
//! index.insert(Point::new("B", vec![5.0, 6.0, 7.0, 8.0])).unwrap();
//! index.insert(Point::new("C", vec![9.0, 10.0, 11.0, 12.0])).unwrap();
//!
//! let hits = index.search(&[4.0, 5.0, 6.0, 7.0], 2).unwrap();
//! assert_eq!(hits[0].label(), "B");
//! assert_eq!(hits[1].label(), "A");
//! ```
//!
//! This crate has no async dependencies. [`Collection`] adds a reader-writer
//! lock for sharing one index between threads.

/// Shared, lock-protected index handle.
pub mod collection;
/// Global configuration constants: defaults and limits.
pub mod config;
/// Error type for construction, insertion and search.
pub mod error;
/// Brute-force k-NN and recall measurement.
pub mod exact;
/// HNSW approximate nearest neighbor index: graph structure, search, insertion, and distance metrics.
pub mod hnsw;
/// Point types: `Point` and `ScoredPoint`.
pub mod point;

pub use collection::Collection;
pub use error::{IndexError, Result};
pub use hnsw::{DistanceMetric, HnswConfig, HnswIndex, Metric, NeighborSelection};
pub use point::{Point, ScoredPoint};

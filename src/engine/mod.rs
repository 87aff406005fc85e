//! Parallel K-means engine.
//!
//! Each iteration runs one assignment pass on a fixed worker pool, folds the
//! per-cluster sums into new centroids and checks the fraction of objects that
//! changed cluster against the convergence threshold.

pub mod accumulator;
pub mod atomic;
pub mod distance;
pub mod driver;
pub mod local;
pub mod nearest;
pub mod strategy;

pub use accumulator::{Accumulator, AtomicAccumulator};
pub use distance::squared_euclidean;
pub use driver::{
    DEFAULT_MAX_ITERATIONS, DEFAULT_THRESHOLD, EngineConfig, IterationEvent, KMeans,
    MIN_MEMBERS_FOR_UPDATE,
};
pub use nearest::nearest_centroid;
pub use strategy::{Reduction, Strategy};

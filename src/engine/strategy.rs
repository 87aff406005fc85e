use super::accumulator::Accumulator;
use super::atomic::AtomicReduction;
use super::local::LocalReduction;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How per-cluster statistics are combined across workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One shared accumulator updated with atomic adds.
    Atomic,
    /// One private accumulator per worker, merged sequentially after the pass.
    #[default]
    Local,
}

impl Strategy {
    /// Builds the reducer for this strategy with buffers sized for the run.
    pub fn reducer(self, workers: usize, n_clusters: usize, n_coords: usize) -> Box<dyn Reduction> {
        match self {
            Strategy::Atomic => Box::new(AtomicReduction::new(n_clusters, n_coords)),
            Strategy::Local => Box::new(LocalReduction::new(workers, n_clusters, n_coords)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Atomic => write!(f, "ATOMIC"),
            Strategy::Local => write!(f, "LOCAL"),
        }
    }
}

/// One parallel assignment pass over every object.
pub trait Reduction: Send {
    /// Assigns every object to its nearest centroid.
    ///
    /// `objects` and `centroids` are row-major buffers of width
    /// `totals.n_coords()`. `membership` is overwritten in full, `totals`
    /// receives the per-cluster sums and counts of this pass, and the return
    /// value is the number of objects whose cluster changed.
    fn assign(
        &mut self,
        pool: &ThreadPool,
        objects: &[f32],
        centroids: &[f32],
        membership: &mut [usize],
        totals: &mut Accumulator,
    ) -> usize;
}

/// Contiguous range length giving each of `workers` one partition.
pub(crate) fn partition_len(n_objs: usize, workers: usize) -> usize {
    n_objs.div_ceil(workers.max(1)).max(1)
}

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense object matrix (rows = objects, columns = coordinates).
pub type ObjectSet = Array2<f32>;

/// Membership value of an object that has not been through a pass yet.
pub const UNASSIGNED: usize = usize::MAX;

/// Why the driver stopped iterating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The fraction of changed assignments fell to or below the threshold.
    Converged,
    /// The iteration cap was hit first.
    MaxIterationsReached,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Converged => write!(f, "converged"),
            Termination::MaxIterationsReached => write!(f, "max iterations reached"),
        }
    }
}

/// Final state of a clustering run.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// `n_clusters × n_coords` centroid matrix.
    pub centroids: Array2<f32>,
    /// Cluster index of every object, in input order.
    pub membership: Vec<usize>,
    /// Number of assignment passes performed.
    pub iterations: usize,
    pub termination: Termination,
    /// Fraction of objects that changed cluster in the last pass.
    pub last_delta: f32,
}

impl Clustering {
    pub fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }

    /// Number of objects assigned to each cluster.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters()];
        for &cluster in &self.membership {
            if cluster != UNASSIGNED {
                sizes[cluster] += 1;
            }
        }
        sizes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn cluster_sizes_count_members() {
        let clustering = Clustering {
            centroids: array![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]],
            membership: vec![0, 2, 2, 0, 2],
            iterations: 3,
            termination: Termination::Converged,
            last_delta: 0.0,
        };
        assert_eq!(clustering.n_clusters(), 3);
        assert_eq!(clustering.cluster_sizes(), vec![2, 0, 3]);
    }

    #[test]
    fn termination_serializes_snake_case() {
        let json = serde_json::to_string(&Termination::MaxIterationsReached).unwrap();
        assert_eq!(json, "\"max_iterations_reached\"");
    }
}

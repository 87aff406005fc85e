use super::accumulator::Accumulator;
use super::strategy::{Reduction, Strategy};
use crate::domain::{Clustering, KMeansError, ObjectSet, Termination, UNASSIGNED};
use ndarray::{Array2, ArrayView2, s};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, warn};

pub const DEFAULT_THRESHOLD: f32 = 0.001;
pub const DEFAULT_MAX_ITERATIONS: usize = 500;

/// Clusters with fewer members than this keep their previous centroid.
///
/// Singletons are retained as well as empty clusters.
pub const MIN_MEMBERS_FOR_UPDATE: usize = 2;

/// Scalars controlling one clustering run.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub n_clusters: usize,
    /// Stop once the fraction of changed assignments is at or below this value.
    pub threshold: f32,
    pub max_iterations: usize,
    pub strategy: Strategy,
    /// Worker pool size.
    pub workers: usize,
}

impl EngineConfig {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            threshold: DEFAULT_THRESHOLD,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            strategy: Strategy::default(),
            workers: num_cpus::get(),
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn validate(&self) -> Result<(), KMeansError> {
        if self.n_clusters < 1 {
            return Err(KMeansError::InvalidConfiguration(
                "n_clusters must be at least 1".to_string(),
            ));
        }
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(KMeansError::InvalidConfiguration(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        if self.max_iterations == 0 {
            return Err(KMeansError::InvalidConfiguration(
                "max_iterations must be greater than 0".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(KMeansError::InvalidConfiguration(
                "workers must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Snapshot handed to observers after every completed iteration.
#[derive(Debug)]
pub struct IterationEvent<'a> {
    pub iteration: usize,
    pub changed: usize,
    pub delta: f32,
    /// Member count of each cluster in this pass.
    pub counts: &'a [usize],
    /// Centroids after the update of this iteration.
    pub centroids: ArrayView2<'a, f32>,
    pub membership: &'a [usize],
}

/// Parallel K-means engine bound to a dedicated worker pool.
pub struct KMeans {
    config: EngineConfig,
    pool: ThreadPool,
}

impl KMeans {
    pub fn new(config: EngineConfig) -> Result<Self, KMeansError> {
        config.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("kmeans-worker-{i}"))
            .build()?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn fit(&self, objects: &ObjectSet) -> Result<Clustering, KMeansError> {
        self.fit_with(objects, |_| {})
    }

    /// Runs the clustering, calling `observer` after each iteration.
    ///
    /// The run is seeded from the first `n_clusters` objects, then iterates
    /// until the changed fraction drops to the threshold or the iteration cap
    /// is reached. Either way the state of the last completed iteration is
    /// returned.
    pub fn fit_with<F>(
        &self,
        objects: &ObjectSet,
        mut observer: F,
    ) -> Result<Clustering, KMeansError>
    where
        F: FnMut(&IterationEvent<'_>),
    {
        let (n_objs, n_coords) = objects.dim();
        let n_clusters = self.config.n_clusters;
        check_shape(n_objs, n_coords, n_clusters)?;

        let objects = objects.as_standard_layout();
        let flat = objects.as_slice().ok_or_else(|| {
            KMeansError::InvalidConfiguration("object matrix is not contiguous".to_string())
        })?;

        info!(
            n_objs,
            n_coords,
            n_clusters,
            strategy = %self.config.strategy,
            workers = self.config.workers,
            threshold = self.config.threshold,
            "starting k-means"
        );

        let mut run = Run::seed(&self.config, objects.view(), n_coords);

        let (termination, last_delta) = loop {
            let (changed, delta) = run.step(&self.pool, flat);

            debug!(iteration = run.iterations, changed, delta, "iteration completed");
            observer(&IterationEvent {
                iteration: run.iterations,
                changed,
                delta,
                counts: &run.last_counts,
                centroids: ArrayView2::from_shape((n_clusters, n_coords), &run.centroids)?,
                membership: &run.membership,
            });

            if delta <= self.config.threshold {
                info!(iterations = run.iterations, delta, "k-means converged");
                break (Termination::Converged, delta);
            }
            if run.iterations >= self.config.max_iterations {
                warn!(
                    iterations = run.iterations,
                    delta, "k-means stopped at the iteration cap"
                );
                break (Termination::MaxIterationsReached, delta);
            }
        };

        Ok(Clustering {
            centroids: Array2::from_shape_vec((n_clusters, n_coords), run.centroids)?,
            membership: run.membership,
            iterations: run.iterations,
            termination,
            last_delta,
        })
    }
}

fn check_shape(n_objs: usize, n_coords: usize, n_clusters: usize) -> Result<(), KMeansError> {
    if n_objs == 0 {
        return Err(KMeansError::EmptyInput("object set has no rows".to_string()));
    }
    if n_coords == 0 {
        return Err(KMeansError::EmptyInput(
            "objects have no coordinates".to_string(),
        ));
    }
    if n_clusters > n_objs {
        return Err(KMeansError::InvalidConfiguration(format!(
            "n_clusters ({n_clusters}) exceeds n_objs ({n_objs})"
        )));
    }
    Ok(())
}

/// Mutable state of one run between passes.
struct Run {
    /// Row-major `n_clusters × n_coords`.
    centroids: Vec<f32>,
    membership: Vec<usize>,
    totals: Accumulator,
    last_counts: Vec<usize>,
    reducer: Box<dyn Reduction>,
    iterations: usize,
}

impl Run {
    /// Centroids start as the first `n_clusters` objects, in input order.
    fn seed(config: &EngineConfig, objects: ArrayView2<'_, f32>, n_coords: usize) -> Self {
        let n_clusters = config.n_clusters;
        Self {
            centroids: objects.slice(s![..n_clusters, ..]).iter().copied().collect(),
            membership: vec![UNASSIGNED; objects.nrows()],
            totals: Accumulator::new(n_clusters, n_coords),
            last_counts: vec![0; n_clusters],
            reducer: config
                .strategy
                .reducer(config.workers, n_clusters, n_coords),
            iterations: 0,
        }
    }

    /// One assignment pass plus centroid update. Returns `(changed, delta)`.
    fn step(&mut self, pool: &ThreadPool, objects: &[f32]) -> (usize, f32) {
        let changed = self.reducer.assign(
            pool,
            objects,
            &self.centroids,
            &mut self.membership,
            &mut self.totals,
        );
        debug_assert_eq!(self.totals.total_count(), self.membership.len());

        self.last_counts.copy_from_slice(self.totals.counts());
        update_centroids(&mut self.centroids, &mut self.totals);
        self.iterations += 1;

        (changed, changed as f32 / self.membership.len() as f32)
    }
}

/// Folds the pass totals into the centroids and zeroes the totals.
fn update_centroids(centroids: &mut [f32], totals: &mut Accumulator) {
    let rows = centroids.chunks_exact_mut(totals.n_coords());
    for (cluster, centroid) in rows.enumerate() {
        let count = totals.count(cluster);
        if count < MIN_MEMBERS_FOR_UPDATE {
            continue;
        }
        for (coord, &sum) in centroid.iter_mut().zip(totals.sums(cluster)) {
            *coord = sum / count as f32;
        }
    }
    totals.reset();
}

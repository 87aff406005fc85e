use super::accumulator::Accumulator;
use super::nearest::nearest_centroid;
use super::strategy::{Reduction, partition_len};
use rayon::ThreadPool;
use rayon::prelude::*;

/// Assignment pass where each worker fills a private accumulator.
///
/// The private buffers live as long as the reducer and are zeroed by the
/// sequential merge at the end of every pass.
#[derive(Debug)]
pub struct LocalReduction {
    locals: Vec<Accumulator>,
}

impl LocalReduction {
    pub fn new(workers: usize, n_clusters: usize, n_coords: usize) -> Self {
        Self {
            locals: (0..workers.max(1))
                .map(|_| Accumulator::new(n_clusters, n_coords))
                .collect(),
        }
    }

    fn merge_into(&mut self, totals: &mut Accumulator) {
        for local in &mut self.locals {
            totals.drain_from(local);
        }
    }
}

impl Reduction for LocalReduction {
    fn assign(
        &mut self,
        pool: &ThreadPool,
        objects: &[f32],
        centroids: &[f32],
        membership: &mut [usize],
        totals: &mut Accumulator,
    ) -> usize {
        let n_coords = totals.n_coords();
        let chunk = partition_len(membership.len(), self.locals.len());

        let changed = pool.install(|| {
            self.locals
                .par_iter_mut()
                .zip(objects.par_chunks(chunk * n_coords))
                .zip(membership.par_chunks_mut(chunk))
                .map(|((local, rows), members)| {
                    let mut changed = 0usize;
                    for (object, member) in rows.chunks_exact(n_coords).zip(members.iter_mut()) {
                        let index = nearest_centroid(object, centroids);
                        if *member != index {
                            changed += 1;
                        }
                        *member = index;
                        local.add(index, object);
                    }
                    changed
                })
                .sum::<usize>()
        });

        self.merge_into(totals);
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UNASSIGNED;
    use rayon::ThreadPoolBuilder;

    #[test]
    fn merges_private_buffers_into_totals() {
        let pool = ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let objects = [0.0, 0.0, 1.0, 1.0, 10.0, 10.0, 11.0, 11.0];
        let centroids = [0.0, 0.0, 10.0, 10.0];
        let mut membership = vec![UNASSIGNED; 4];
        let mut totals = Accumulator::new(2, 2);

        let mut reduction = LocalReduction::new(2, 2, 2);
        let changed = reduction.assign(&pool, &objects, &centroids, &mut membership, &mut totals);

        assert_eq!(changed, 4);
        assert_eq!(membership, vec![0, 0, 1, 1]);
        assert_eq!(totals.counts(), &[2, 2]);
        assert_eq!(totals.sums(0), &[1.0, 1.0]);
        assert_eq!(totals.sums(1), &[21.0, 21.0]);
        assert!(reduction.locals.iter().all(|local| local.total_count() == 0));
    }

    #[test]
    fn more_workers_than_objects_leaves_spare_buffers_idle() {
        let pool = ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let objects = [1.0, 9.0];
        let centroids = [0.0, 10.0];
        let mut membership = vec![UNASSIGNED; 2];
        let mut totals = Accumulator::new(2, 1);

        let mut reduction = LocalReduction::new(6, 2, 1);
        assert_eq!(reduction.locals.len(), 6);
        reduction.assign(&pool, &objects, &centroids, &mut membership, &mut totals);

        assert_eq!(membership, vec![0, 1]);
        assert_eq!(totals.total_count(), 2);
    }
}

use super::accumulator::{Accumulator, AtomicAccumulator};
use super::nearest::nearest_centroid;
use super::strategy::{Reduction, partition_len};
use rayon::ThreadPool;
use rayon::prelude::*;

/// Assignment pass where all workers add into one shared accumulator.
#[derive(Debug)]
pub struct AtomicReduction {
    shared: AtomicAccumulator,
}

impl AtomicReduction {
    pub fn new(n_clusters: usize, n_coords: usize) -> Self {
        Self {
            shared: AtomicAccumulator::new(n_clusters, n_coords),
        }
    }
}

impl Reduction for AtomicReduction {
    fn assign(
        &mut self,
        pool: &ThreadPool,
        objects: &[f32],
        centroids: &[f32],
        membership: &mut [usize],
        totals: &mut Accumulator,
    ) -> usize {
        let n_coords = totals.n_coords();
        let chunk = partition_len(membership.len(), pool.current_num_threads());
        let shared = &self.shared;

        let changed = pool.install(|| {
            objects
                .par_chunks(chunk * n_coords)
                .zip(membership.par_chunks_mut(chunk))
                .map(|(rows, members)| {
                    let mut changed = 0usize;
                    for (object, member) in rows.chunks_exact(n_coords).zip(members.iter_mut()) {
                        let index = nearest_centroid(object, centroids);
                        if *member != index {
                            changed += 1;
                        }
                        *member = index;
                        shared.add(index, object);
                    }
                    changed
                })
                .sum::<usize>()
        });

        shared.drain_into(totals);
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UNASSIGNED;
    use rayon::ThreadPoolBuilder;

    #[test]
    fn first_pass_counts_every_object_as_changed() {
        let pool = ThreadPoolBuilder::new().num_threads(3).build().unwrap();
        let objects = [0.0, 0.0, 1.0, 1.0, 10.0, 10.0, 11.0, 11.0];
        let centroids = [0.0, 0.0, 1.0, 1.0];
        let mut membership = vec![UNASSIGNED; 4];
        let mut totals = Accumulator::new(2, 2);

        let mut reduction = AtomicReduction::new(2, 2);
        let changed = reduction.assign(&pool, &objects, &centroids, &mut membership, &mut totals);

        assert_eq!(changed, 4);
        assert_eq!(membership, vec![0, 1, 1, 1]);
        assert_eq!(totals.counts(), &[1, 3]);
        assert_eq!(totals.sums(1), &[22.0, 22.0]);
    }

    #[test]
    fn shared_buffer_is_empty_after_each_pass() {
        let pool = ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let objects = [1.0, 2.0, 3.0];
        let centroids = [0.0, 4.0];
        let mut membership = vec![UNASSIGNED; 3];
        let mut reduction = AtomicReduction::new(2, 1);

        let mut first = Accumulator::new(2, 1);
        reduction.assign(&pool, &objects, &centroids, &mut membership, &mut first);
        let mut second = Accumulator::new(2, 1);
        let changed = reduction.assign(&pool, &objects, &centroids, &mut membership, &mut second);

        assert_eq!(changed, 0);
        assert_eq!(first, second);
        assert_eq!(second.total_count(), 3);
    }
}

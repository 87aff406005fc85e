use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Per-cluster coordinate sums and member counts for one assignment pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator {
    n_coords: usize,
    sums: Vec<f32>,
    counts: Vec<usize>,
}

impl Accumulator {
    pub fn new(n_clusters: usize, n_coords: usize) -> Self {
        Self {
            n_coords,
            sums: vec![0.0; n_clusters * n_coords],
            counts: vec![0; n_clusters],
        }
    }

    pub fn n_coords(&self) -> usize {
        self.n_coords
    }

    #[inline]
    pub fn add(&mut self, cluster: usize, object: &[f32]) {
        self.counts[cluster] += 1;
        let start = cluster * self.n_coords;
        for (sum, value) in self.sums[start..start + self.n_coords]
            .iter_mut()
            .zip(object)
        {
            *sum += value;
        }
    }

    /// Adds `other` into `self` and zeroes `other` for reuse.
    pub fn drain_from(&mut self, other: &mut Accumulator) {
        debug_assert_eq!(self.sums.len(), other.sums.len());
        for (count, local) in self.counts.iter_mut().zip(other.counts.iter_mut()) {
            *count += *local;
            *local = 0;
        }
        for (sum, local) in self.sums.iter_mut().zip(other.sums.iter_mut()) {
            *sum += *local;
            *local = 0.0;
        }
    }

    pub fn reset(&mut self) {
        self.sums.fill(0.0);
        self.counts.fill(0);
    }

    pub fn count(&self, cluster: usize) -> usize {
        self.counts[cluster]
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn sums(&self, cluster: usize) -> &[f32] {
        let start = cluster * self.n_coords;
        &self.sums[start..start + self.n_coords]
    }

    pub fn total_count(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Accumulator shared by every worker; each scalar cell is updated atomically.
///
/// Coordinate sums are `f32` values stored as raw bits.
#[derive(Debug)]
pub struct AtomicAccumulator {
    n_coords: usize,
    sums: Vec<AtomicU32>,
    counts: Vec<AtomicUsize>,
}

impl AtomicAccumulator {
    pub fn new(n_clusters: usize, n_coords: usize) -> Self {
        Self {
            n_coords,
            sums: (0..n_clusters * n_coords)
                .map(|_| AtomicU32::new(0.0f32.to_bits()))
                .collect(),
            counts: (0..n_clusters).map(|_| AtomicUsize::new(0)).collect(),
        }
    }

    #[inline]
    pub fn add(&self, cluster: usize, object: &[f32]) {
        self.counts[cluster].fetch_add(1, Ordering::Relaxed);
        let start = cluster * self.n_coords;
        for (cell, &value) in self.sums[start..start + self.n_coords].iter().zip(object) {
            atomic_add_f32(cell, value);
        }
    }

    /// Moves the accumulated values into `target` and zeroes every cell.
    ///
    /// Must only be called once all writers have joined.
    pub fn drain_into(&self, target: &mut Accumulator) {
        for (count, cell) in target.counts.iter_mut().zip(&self.counts) {
            *count += cell.swap(0, Ordering::Relaxed);
        }
        for (sum, cell) in target.sums.iter_mut().zip(&self.sums) {
            *sum += f32::from_bits(cell.swap(0.0f32.to_bits(), Ordering::Relaxed));
        }
    }
}

#[inline]
fn atomic_add_f32(cell: &AtomicU32, value: f32) {
    let mut current = cell.load(Ordering::Relaxed);
    loop {
        let next = (f32::from_bits(current) + value).to_bits();
        match cell.compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return,
            Err(actual) => current = actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn add_tracks_sums_and_counts_per_cluster() {
        let mut acc = Accumulator::new(2, 2);
        acc.add(1, &[1.0, 2.0]);
        acc.add(1, &[3.0, 4.0]);
        acc.add(0, &[-1.0, 0.5]);

        assert_eq!(acc.count(0), 1);
        assert_eq!(acc.count(1), 2);
        assert_eq!(acc.sums(0), &[-1.0, 0.5]);
        assert_eq!(acc.sums(1), &[4.0, 6.0]);
        assert_eq!(acc.total_count(), 3);
    }

    #[test]
    fn drain_from_merges_and_zeroes_the_source() {
        let mut global = Accumulator::new(2, 1);
        let mut local = Accumulator::new(2, 1);
        global.add(0, &[1.0]);
        local.add(0, &[2.0]);
        local.add(1, &[5.0]);

        global.drain_from(&mut local);

        assert_eq!(global.counts(), &[2, 1]);
        assert_eq!(global.sums(0), &[3.0]);
        assert_eq!(global.sums(1), &[5.0]);
        assert_eq!(local, Accumulator::new(2, 1));
    }

    #[test]
    fn atomic_accumulator_survives_concurrent_writers() {
        let shared = Arc::new(AtomicAccumulator::new(2, 3));
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        shared.add(worker % 2, &[1.0, 0.5, 0.25]);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut totals = Accumulator::new(2, 3);
        shared.drain_into(&mut totals);

        assert_eq!(totals.counts(), &[4000, 4000]);
        // Small integers and binary fractions add exactly in f32.
        assert_eq!(totals.sums(0), &[4000.0, 2000.0, 1000.0]);
        assert_eq!(totals.sums(1), &[4000.0, 2000.0, 1000.0]);

        let mut again = Accumulator::new(2, 3);
        shared.drain_into(&mut again);
        assert_eq!(again.total_count(), 0);
    }
}

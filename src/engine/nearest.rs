use super::distance::squared_euclidean;

/// Returns the index of the centroid closest to `object`.
///
/// `centroids` is a row-major `n_clusters × n_coords` buffer with
/// `n_coords == object.len()`. Ties resolve to the lowest index because only a
/// strictly smaller distance replaces the running minimum.
pub fn nearest_centroid(object: &[f32], centroids: &[f32]) -> usize {
    let n_coords = object.len();
    if n_coords == 0 {
        return 0;
    }
    let mut rows = centroids.chunks_exact(n_coords);

    let Some(first) = rows.next() else {
        return 0;
    };

    let mut index = 0;
    let mut min_dist = squared_euclidean(object, first);

    for (i, centroid) in rows.enumerate() {
        let dist = squared_euclidean(object, centroid);
        if dist < min_dist {
            min_dist = dist;
            index = i + 1;
        }
    }

    index
}

/// Squared Euclidean distance between two coordinate vectors of equal length.
#[inline]
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_are_at_zero_distance() {
        let v = [1.5, -2.0, 3.25];
        assert_eq!(squared_euclidean(&v, &v), 0.0);
    }

    #[test]
    fn distance_is_not_square_rooted() {
        assert_eq!(squared_euclidean(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
    }

    #[test]
    fn empty_vectors_have_zero_distance() {
        assert_eq!(squared_euclidean(&[], &[]), 0.0);
    }
}

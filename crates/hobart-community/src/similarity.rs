//! Partition similarity.

use crate::strategy::{ClusteringError, Partition};

/// Adjusted Rand index between two partitions of the same nodes.
///
/// Computed from the contingency table of the two partitions:
///
/// ARI = (Σ C(n_ij, 2) - E) / (½ (Σ C(a_i, 2) + Σ C(b_j, 2)) - E)
///
/// with E = Σ C(a_i, 2) · Σ C(b_j, 2) / C(n, 2). Identical partitions score 1,
/// independent ones about 0. When the denominator vanishes (both partitions
/// trivial, e.g. all singletons or a single community) the score is 1.
pub fn adjusted_rand_index(a: &Partition, b: &Partition) -> Result<f64, ClusteringError> {
    if a.len() != b.len() {
        return Err(ClusteringError::SizeMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let n = a.len();
    if n < 2 {
        return Ok(1.0);
    }

    let rows = a.community_count();
    let cols = b.community_count();
    let mut table = vec![0usize; rows * cols];
    for (&i, &j) in a.labels().iter().zip(b.labels()) {
        table[i * cols + j] += 1;
    }

    let pairs = |count: usize| (count * count.saturating_sub(1)) as f64 / 2.0;

    let index: f64 = table.iter().map(|&c| pairs(c)).sum();
    let row_sum: f64 = (0..rows)
        .map(|i| pairs(table[i * cols..(i + 1) * cols].iter().sum()))
        .sum();
    let col_sum: f64 = (0..cols)
        .map(|j| pairs((0..rows).map(|i| table[i * cols + j]).sum()))
        .sum();

    let expected = row_sum * col_sum / pairs(n);
    let max_index = 0.5 * (row_sum + col_sum);
    let denominator = max_index - expected;
    if denominator == 0.0 {
        return Ok(1.0);
    }

    Ok((index - expected) / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    fn p(labels: &[usize]) -> Partition {
        Partition::from_labels(labels)
    }

    #[rstest]
    #[case(&[0, 0, 1, 1, 2, 2])]
    #[case(&[0, 1, 2, 3])]
    #[case(&[5, 5, 5])]
    fn test_identical_partitions(#[case] labels: &[usize]) {
        assert_eq!(adjusted_rand_index(&p(labels), &p(labels)).unwrap(), 1.0);
    }

    #[test]
    fn test_label_permutation_is_irrelevant() {
        let a = p(&[0, 0, 1, 1, 2]);
        let b = p(&[2, 2, 0, 0, 1]);
        assert_eq!(adjusted_rand_index(&a, &b).unwrap(), 1.0);
    }

    #[test]
    fn test_known_value() {
        // sklearn: adjusted_rand_score([0, 0, 1, 1], [0, 0, 1, 2]) == 0.5714285714285715
        let a = p(&[0, 0, 1, 1]);
        let b = p(&[0, 0, 1, 2]);
        assert_abs_diff_eq!(adjusted_rand_index(&a, &b).unwrap(), 4.0 / 7.0, epsilon = 1e-12);
    }

    #[test]
    fn test_disagreement_is_negative() {
        // sklearn: adjusted_rand_score([0, 0, 1, 1], [0, 1, 0, 1]) == -0.5
        let a = p(&[0, 0, 1, 1]);
        let b = p(&[0, 1, 0, 1]);
        assert_abs_diff_eq!(adjusted_rand_index(&a, &b).unwrap(), -0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_symmetric() {
        let a = p(&[0, 0, 0, 1, 1, 2, 2, 2]);
        let b = p(&[0, 1, 0, 1, 1, 2, 2, 0]);
        assert_abs_diff_eq!(
            adjusted_rand_index(&a, &b).unwrap(),
            adjusted_rand_index(&b, &a).unwrap(),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_size_mismatch() {
        assert!(adjusted_rand_index(&p(&[0, 1]), &p(&[0, 1, 2])).is_err());
    }
}

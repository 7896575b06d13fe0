//! Spearman rank correlation with significance.

use crate::report::ReportError;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Spearman's ρ, its two-sided p-value and the sample size used
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankCorrelation {
    /// Rank correlation coefficient in [-1, 1]
    pub rho: f64,
    /// Two-sided p-value under the null of no association
    pub p_value: f64,
    /// Number of pairs
    pub n: usize,
}

/// Ranks starting at 1, ties receiving the average of their positions.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end hold ranks start+1..=end
        let rank = (start + 1 + end) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = rank;
        }
        start = end;
    }
    ranks
}

fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    Some((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}

/// Spearman rank correlation between paired samples.
///
/// Pairs where either value is not finite are dropped before ranking. The
/// p-value uses `t = ρ √((n - 2) / (1 - ρ²))` against Student's t with `n - 2`
/// degrees of freedom.
pub fn spearman(x: &[f64], y: &[f64]) -> Result<RankCorrelation, ReportError> {
    if x.len() != y.len() {
        return Err(ReportError::LengthMismatch {
            expected: x.len(),
            actual: y.len(),
        });
    }

    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .unzip();

    let n = xs.len();
    if n < 3 {
        return Err(ReportError::InsufficientData {
            required: 3,
            actual: n,
        });
    }

    let rho = pearson(&average_ranks(&xs), &average_ranks(&ys)).ok_or(ReportError::ConstantInput)?;

    let df = (n - 2) as f64;
    let p_value = if rho.abs() >= 1.0 {
        0.0
    } else {
        let t = rho * (df / (1.0 - rho * rho)).sqrt();
        let dist = StudentsT::new(0.0, 1.0, df)
            .map_err(|e| ReportError::Distribution(e.to_string()))?;
        (2.0 * dist.sf(t.abs())).min(1.0)
    };

    Ok(RankCorrelation { rho, p_value, n })
}

//! Two-sided paired t-test.

use crate::error::{CellDistError, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Result of a paired t-test between two matched sequences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairedTTest {
    /// Number of pairs.
    pub n: usize,
    /// Mean of `a - b`.
    pub mean_difference: f64,
    /// t-statistic.
    pub statistic: f64,
    /// Degrees of freedom (n - 1).
    pub df: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

/// Test H0: mean(a - b) = 0 against the two-sided alternative.
///
/// Requires equal lengths and at least two pairs. Fails with `Numerical` when
/// every difference is identical, since the statistic is then undefined.
pub fn paired_t_test(a: &[f64], b: &[f64]) -> Result<PairedTTest> {
    if a.len() != b.len() {
        return Err(CellDistError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    let n = a.len();
    if n < 2 {
        return Err(CellDistError::InsufficientData(format!(
            "Paired test needs at least 2 pairs, got {}",
            n
        )));
    }

    let diffs: Vec<f64> = a.iter().zip(b).map(|(x, y)| x - y).collect();
    let mean_difference = diffs.iter().sum::<f64>() / n as f64;
    let variance =
        diffs.iter().map(|d| (d - mean_difference).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std_error = (variance / n as f64).sqrt();

    if !(std_error > 0.0 && std_error.is_finite()) {
        return Err(CellDistError::Numerical(
            "Paired differences have zero variance".to_string(),
        ));
    }

    let statistic = mean_difference / std_error;
    let df = (n - 1) as f64;
    let t_dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| CellDistError::Numerical(format!("t-distribution: {}", e)))?;
    let p_value = (2.0 * (1.0 - t_dist.cdf(statistic.abs()))).clamp(0.0, 1.0);

    Ok(PairedTTest {
        n,
        mean_difference,
        statistic,
        df,
        p_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_known_value() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [2.0, 2.0, 4.0, 5.0, 7.0];
        let result = paired_t_test(&a, &b).unwrap();
        assert_eq!(result.n, 5);
        assert_relative_eq!(result.mean_difference, -1.0);
        assert_relative_eq!(result.statistic, -(10.0f64).sqrt(), epsilon = 1e-10);
        assert_relative_eq!(result.p_value, 0.034109, epsilon = 1e-5);
    }

    #[test]
    fn test_symmetric_in_order() {
        let a = [3.0, 1.0, 4.0, 1.0, 5.0];
        let b = [2.0, 7.0, 1.0, 8.0, 2.0];
        let ab = paired_t_test(&a, &b).unwrap();
        let ba = paired_t_test(&b, &a).unwrap();
        assert_relative_eq!(ab.p_value, ba.p_value, epsilon = 1e-12);
        assert_relative_eq!(ab.statistic, -ba.statistic, epsilon = 1e-12);
    }

    #[test]
    fn test_too_few_pairs() {
        let err = paired_t_test(&[1.0], &[2.0]).unwrap_err();
        assert!(matches!(err, CellDistError::InsufficientData(_)));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(paired_t_test(&[1.0, 2.0], &[1.0]).is_err());
    }

    #[test]
    fn test_constant_difference() {
        let err = paired_t_test(&[1.0, 2.0, 3.0], &[0.0, 1.0, 2.0]).unwrap_err();
        assert!(matches!(err, CellDistError::Numerical(_)));
    }
}

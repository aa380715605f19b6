//! Collapse per-field matrices into one sample-level statistic.
//!
//! Means and variances are averaged across fields without weighting by field
//! size; counts are summed. Missing entries are excluded from both.

use crate::data::{LabelMatrix, Vocabulary};
use crate::error::{CellDistError, Result};
use crate::neighbor::field::{finite, FieldMatrices};
use std::sync::Arc;

/// Sample-level mean, variance, count and standard-error matrices.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleStat {
    pub mean: LabelMatrix<Option<f64>>,
    pub variance: LabelMatrix<Option<f64>>,
    pub count: LabelMatrix<usize>,
    pub std_error: LabelMatrix<Option<f64>>,
}

impl SampleStat {
    /// Shared vocabulary of all four matrices.
    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        self.mean.vocabulary()
    }
}

/// Average of the present values, `None` when nothing is present.
fn mean_present<I: Iterator<Item = Option<f64>>>(values: I) -> Option<f64> {
    let (sum, n) = values
        .flatten()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        None
    } else {
        finite(sum / n as f64)
    }
}

/// `sqrt(variance) / sqrt(count)`, missing on any missing operand or zero count.
pub fn standard_error(variance: Option<f64>, count: usize) -> Option<f64> {
    let variance = variance?;
    if count == 0 {
        return None;
    }
    finite(variance.sqrt() / (count as f64).sqrt())
}

/// Combine the field matrices of one sample.
///
/// Requires at least one field, and every field must share one vocabulary.
pub fn collapse(fields: &[FieldMatrices]) -> Result<SampleStat> {
    let first = fields
        .first()
        .ok_or_else(|| CellDistError::EmptyData("Cannot collapse zero fields".to_string()))?;
    let vocabulary = Arc::clone(first.vocabulary());
    if fields.iter().any(|f| {
        !f.mean.same_vocabulary(&first.mean)
            || !f.variance.same_vocabulary(&first.mean)
            || !f.count.same_vocabulary(&first.mean)
    }) {
        return Err(CellDistError::VocabularyMismatch);
    }

    let variance = LabelMatrix::from_fn(Arc::clone(&vocabulary), |i, j| {
        mean_present(fields.iter().map(|f| *f.variance.at(i, j)))
    });
    let count = LabelMatrix::from_fn(Arc::clone(&vocabulary), |i, j| {
        fields.iter().map(|f| *f.count.at(i, j)).sum::<usize>()
    });
    // A mean is only reported where its standard error can be computed.
    let mean = LabelMatrix::from_fn(Arc::clone(&vocabulary), |i, j| {
        standard_error(*variance.at(i, j), *count.at(i, j))?;
        mean_present(fields.iter().map(|f| *f.mean.at(i, j)))
    });
    let std_error = LabelMatrix::from_fn(vocabulary, |i, j| {
        mean.at(i, j).as_ref()?;
        standard_error(*variance.at(i, j), *count.at(i, j))
    });

    Ok(SampleStat {
        mean,
        variance,
        count,
        std_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn vocab() -> Arc<Vocabulary> {
        Arc::new(Vocabulary::new(vec!["A".into(), "B".into()]).unwrap())
    }

    fn field(
        vocab: &Arc<Vocabulary>,
        mean: [Option<f64>; 4],
        variance: [Option<f64>; 4],
        count: [usize; 4],
    ) -> FieldMatrices {
        FieldMatrices {
            mean: LabelMatrix::from_fn(Arc::clone(vocab), |i, j| mean[i * 2 + j]),
            variance: LabelMatrix::from_fn(Arc::clone(vocab), |i, j| variance[i * 2 + j]),
            count: LabelMatrix::from_fn(Arc::clone(vocab), |i, j| count[i * 2 + j]),
        }
    }

    #[test]
    fn test_single_field_identity() {
        let v = vocab();
        let f = field(
            &v,
            [Some(2.0), None, Some(4.0), Some(5.0)],
            [Some(1.0), None, Some(9.0), Some(4.0)],
            [10, 0, 16, 25],
        );
        let stat = collapse(std::slice::from_ref(&f)).unwrap();
        assert_eq!(stat.mean, f.mean);
        assert_eq!(stat.variance, f.variance);
        assert_eq!(stat.count, f.count);
        assert_relative_eq!(stat.std_error.at(1, 0).unwrap(), 3.0 / 4.0);
        assert_relative_eq!(stat.std_error.at(1, 1).unwrap(), 2.0 / 5.0);
    }

    #[test]
    fn test_missing_excluded_from_average() {
        let v = vocab();
        let f1 = field(
            &v,
            [Some(6.5), None, None, None],
            [Some(13.0), None, None, None],
            [12, 0, 0, 0],
        );
        let f2 = field(&v, [None; 4], [None; 4], [3, 0, 0, 0]);
        let stat = collapse(&[f1, f2]).unwrap();
        assert_relative_eq!(stat.mean.at(0, 0).unwrap(), 6.5);
        assert_relative_eq!(stat.variance.at(0, 0).unwrap(), 13.0);
        assert_eq!(*stat.count.at(0, 0), 15);
        assert_relative_eq!(stat.std_error.at(0, 0).unwrap(), (13.0f64 / 15.0).sqrt());
    }

    #[test]
    fn test_unweighted_average() {
        let v = vocab();
        let f1 = field(&v, [Some(2.0); 4], [Some(1.0); 4], [100; 4]);
        let f2 = field(&v, [Some(4.0); 4], [Some(3.0); 4], [10; 4]);
        let stat = collapse(&[f1, f2]).unwrap();
        assert_relative_eq!(stat.mean.at(0, 1).unwrap(), 3.0);
        assert_relative_eq!(stat.variance.at(0, 1).unwrap(), 2.0);
        assert_eq!(*stat.count.at(0, 1), 110);
    }

    #[test]
    fn test_missing_variance_forces_missing_mean() {
        let v = vocab();
        let f = field(&v, [Some(1.0); 4], [None, Some(1.0), Some(1.0), Some(1.0)], [5; 4]);
        let stat = collapse(&[f]).unwrap();
        assert!(stat.mean.at(0, 0).is_none());
        assert!(stat.std_error.at(0, 0).is_none());
        assert!(stat.mean.at(0, 1).is_some());
    }

    #[test]
    fn test_std_error_missing_iff_mean_missing() {
        let v = vocab();
        let f1 = field(
            &v,
            [Some(1.0), None, Some(3.0), None],
            [Some(0.5), Some(2.0), None, None],
            [4, 0, 7, 2],
        );
        let f2 = field(
            &v,
            [None, Some(2.0), Some(1.0), None],
            [None, Some(1.0), Some(1.5), None],
            [0, 0, 1, 0],
        );
        let stat = collapse(&[f1, f2]).unwrap();
        for i in 0..2 {
            for j in 0..2 {
                assert_eq!(
                    stat.mean.at(i, j).is_none(),
                    stat.std_error.at(i, j).is_none(),
                    "entry ({}, {})",
                    i,
                    j
                );
            }
        }
    }

    #[test]
    fn test_zero_count_gives_missing_se() {
        assert_eq!(standard_error(Some(4.0), 0), None);
        assert_eq!(standard_error(None, 4), None);
        assert_relative_eq!(standard_error(Some(4.0), 4).unwrap(), 1.0);
    }

    #[test]
    fn test_rejects_empty_and_mismatched() {
        assert!(matches!(collapse(&[]), Err(CellDistError::EmptyData(_))));
        let other = Arc::new(Vocabulary::new(vec!["X".into(), "Y".into()]).unwrap());
        let f1 = field(&vocab(), [None; 4], [None; 4], [0; 4]);
        let f2 = field(&other, [None; 4], [None; 4], [0; 4]);
        assert!(matches!(
            collapse(&[f1, f2]),
            Err(CellDistError::VocabularyMismatch)
        ));
    }
}

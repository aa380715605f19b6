//! Per-field pair statistics and the full label × label field matrices.

use crate::data::{Field, LabelMatrix, Vocabulary};
use crate::neighbor::query::{nearest_distances, NearestNeighbor};
use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default minimum population for either label before distances are computed.
pub const DEFAULT_MIN_NUM_CELLS: usize = 10;

/// Nearest-neighbor summary for one ordered label pair in one field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairStat {
    /// Mean nearest distance, in pixels.
    pub mean: Option<f64>,
    /// Sample variance of the nearest distances.
    pub variance: Option<f64>,
    /// Raw population of the source label, recorded whether or not the gate fired.
    pub count: usize,
}

/// Mean, variance and count matrices for one field, indexed `[to, from]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMatrices {
    pub mean: LabelMatrix<Option<f64>>,
    pub variance: LabelMatrix<Option<f64>>,
    pub count: LabelMatrix<usize>,
}

impl FieldMatrices {
    /// Shared vocabulary of the three matrices.
    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        self.mean.vocabulary()
    }
}

/// `None` for NaN or infinite values.
#[inline]
pub(crate) fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Arithmetic mean, `None` for an empty slice.
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    finite(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance (n - 1 denominator), `None` below two observations.
pub(crate) fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    finite(ss / (values.len() - 1) as f64)
}

/// Statistics for one ordered `(from, to)` pair in a field.
///
/// Distances are only queried when both labels reach `min_num_cells`. A query
/// failure is logged and treated like a gated pair. When the variance is
/// missing and exactly one source cell exists, the mean is dropped too.
pub fn field_pair_stat<N: NearestNeighbor + ?Sized>(
    nn: &N,
    field: &Field,
    from: &str,
    to: &str,
    min_num_cells: usize,
) -> PairStat {
    let n_from = field.count(from);
    let n_to = field.count(to);

    let distances = if n_from < min_num_cells || n_to < min_num_cells {
        None
    } else {
        match nearest_distances(nn, field, from, to) {
            Ok(d) => Some(d),
            Err(e) => {
                warn!(
                    "Field '{}': distance query {} -> {} failed: {}",
                    field.id(),
                    from,
                    to,
                    e
                );
                None
            }
        }
    };

    let (mut avg, variance) = match &distances {
        Some(d) => (mean(d), sample_variance(d)),
        None => (None, None),
    };
    if variance.is_none() && n_from == 1 {
        avg = None;
    }

    PairStat {
        mean: avg,
        variance,
        count: n_from,
    }
}

/// Pair statistics for every ordered label pair of the vocabulary.
pub fn aggregate_field<N: NearestNeighbor + ?Sized>(
    nn: &N,
    field: &Field,
    vocabulary: &Arc<Vocabulary>,
    min_num_cells: usize,
) -> FieldMatrices {
    let mut mean = LabelMatrix::filled(Arc::clone(vocabulary), None);
    let mut variance = LabelMatrix::filled(Arc::clone(vocabulary), None);
    let mut count = LabelMatrix::filled(Arc::clone(vocabulary), 0usize);

    for (j, from) in vocabulary.labels().iter().enumerate() {
        for (i, to) in vocabulary.labels().iter().enumerate() {
            let stat = field_pair_stat(nn, field, from, to, min_num_cells);
            mean.set(i, j, stat.mean);
            variance.set(i, j, stat.variance);
            count.set(i, j, stat.count);
        }
    }

    FieldMatrices {
        mean,
        variance,
        count,
    }
}

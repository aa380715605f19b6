//! Label-indexed matrices and label × sample tables.

use crate::data::Vocabulary;
use crate::error::{CellDistError, Result};
use nalgebra::{DMatrix, Scalar};
use std::sync::Arc;

/// Square matrix indexed `[to, from]` by a shared vocabulary.
///
/// Rows are target labels, columns are source labels, both in vocabulary
/// order. Matrices are only comparable or combinable when they were built
/// against the same vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMatrix<T: Scalar> {
    vocabulary: Arc<Vocabulary>,
    data: DMatrix<T>,
}

impl<T: Scalar> LabelMatrix<T> {
    /// Matrix with every entry set to `value`.
    pub fn filled(vocabulary: Arc<Vocabulary>, value: T) -> Self {
        let n = vocabulary.len();
        Self {
            data: DMatrix::from_element(n, n, value),
            vocabulary,
        }
    }

    /// Matrix built from a function of `(to, from)` indices.
    pub fn from_fn<F>(vocabulary: Arc<Vocabulary>, f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let n = vocabulary.len();
        Self {
            data: DMatrix::from_fn(n, n, f),
            vocabulary,
        }
    }

    /// The vocabulary both axes are indexed by.
    #[inline]
    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    /// Underlying dense matrix.
    #[inline]
    pub fn data(&self) -> &DMatrix<T> {
        &self.data
    }

    /// Entry at `(to, from)` positions.
    #[inline]
    pub fn at(&self, to: usize, from: usize) -> &T {
        &self.data[(to, from)]
    }

    /// Entry addressed by label.
    pub fn get(&self, to: &str, from: &str) -> Result<&T> {
        let i = self.vocabulary.require(to)?;
        let j = self.vocabulary.require(from)?;
        Ok(self.at(i, j))
    }

    /// Overwrite the entry at `(to, from)` positions.
    #[inline]
    pub fn set(&mut self, to: usize, from: usize, value: T) {
        self.data[(to, from)] = value;
    }

    /// Values for every target label, from one source label.
    pub fn column(&self, from: usize) -> Vec<T> {
        self.data.column(from).iter().cloned().collect()
    }

    /// Values from every source label, to one target label.
    pub fn row(&self, to: usize) -> Vec<T> {
        self.data.row(to).iter().cloned().collect()
    }

    /// Check whether two matrices share a vocabulary.
    pub fn same_vocabulary<U: Scalar>(&self, other: &LabelMatrix<U>) -> bool {
        Arc::ptr_eq(&self.vocabulary, &other.vocabulary) || self.vocabulary == other.vocabulary
    }

    /// Apply `f` entry-wise, keeping the vocabulary.
    pub fn map<U: Scalar, F: FnMut(T) -> U>(&self, f: F) -> LabelMatrix<U> {
        LabelMatrix {
            vocabulary: Arc::clone(&self.vocabulary),
            data: self.data.map(f),
        }
    }
}

/// Table of optional values with labelled rows and one column per sample.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelTable {
    row_labels: Vec<String>,
    sample_ids: Vec<String>,
    data: DMatrix<Option<f64>>,
}

impl LabelTable {
    /// Build a table from row-major rows.
    pub fn from_rows(
        row_labels: Vec<String>,
        sample_ids: Vec<String>,
        rows: &[Vec<Option<f64>>],
    ) -> Result<Self> {
        if rows.len() != row_labels.len() {
            return Err(CellDistError::DimensionMismatch {
                expected: row_labels.len(),
                actual: rows.len(),
            });
        }
        if let Some(bad) = rows.iter().find(|r| r.len() != sample_ids.len()) {
            return Err(CellDistError::DimensionMismatch {
                expected: sample_ids.len(),
                actual: bad.len(),
            });
        }
        let data = DMatrix::from_fn(row_labels.len(), sample_ids.len(), |i, j| rows[i][j]);
        Ok(Self {
            row_labels,
            sample_ids,
            data,
        })
    }

    /// Row labels.
    #[inline]
    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    /// Sample identifiers (column names).
    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Number of rows.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of samples.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    /// Entry at positions.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> Option<f64> {
        self.data[(row, col)]
    }

    /// Entry addressed by row label and sample id.
    pub fn get(&self, row_label: &str, sample_id: &str) -> Option<f64> {
        let i = self.row_labels.iter().position(|l| l == row_label)?;
        let j = self.sample_ids.iter().position(|s| s == sample_id)?;
        self.at(i, j)
    }

    /// Whole row for a label.
    pub fn row(&self, row_label: &str) -> Result<Vec<Option<f64>>> {
        let i = self
            .row_labels
            .iter()
            .position(|l| l == row_label)
            .ok_or_else(|| CellDistError::UnknownLabel(row_label.to_string()))?;
        Ok(self.data.row(i).iter().copied().collect())
    }
}

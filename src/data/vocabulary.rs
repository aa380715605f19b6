//! Study-wide marker vocabulary.

use crate::error::{CellDistError, Result};
use std::collections::HashMap;

/// Ordered set of cell-type labels with a reverse index.
///
/// Every matrix in a study is built against one shared vocabulary, so the
/// position of a label is fixed once the vocabulary exists.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Create a vocabulary from an ordered list of labels.
    ///
    /// Fails on an empty list or on duplicate labels.
    pub fn new(labels: Vec<String>) -> Result<Self> {
        if labels.is_empty() {
            return Err(CellDistError::EmptyData(
                "Vocabulary must contain at least one label".to_string(),
            ));
        }
        let mut index = HashMap::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            if index.insert(label.clone(), i).is_some() {
                return Err(CellDistError::InvalidParameter(format!(
                    "Duplicate label '{}' in vocabulary",
                    label
                )));
            }
        }
        Ok(Self { labels, index })
    }

    /// Build a vocabulary from labels in order of first appearance.
    pub fn from_appearance<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = Vec::new();
        for label in labels {
            let label = label.as_ref();
            if !seen.iter().any(|s: &String| s == label) {
                seen.push(label.to_string());
            }
        }
        Self::new(seen)
    }

    /// Number of labels.
    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Check if empty (never true for a constructed vocabulary).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in vocabulary order.
    #[inline]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Label at a position, if in range.
    #[inline]
    pub fn label(&self, idx: usize) -> Option<&str> {
        self.labels.get(idx).map(String::as_str)
    }

    /// Position of a label, if present.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Position of a label, failing with `UnknownLabel` if absent.
    pub fn require(&self, label: &str) -> Result<usize> {
        self.index_of(label)
            .ok_or_else(|| CellDistError::UnknownLabel(label.to_string()))
    }

    /// Check whether a label is part of the vocabulary.
    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }
}

impl PartialEq for Vocabulary {
    fn eq(&self, other: &Self) -> bool {
        self.labels == other.labels
    }
}

impl Eq for Vocabulary {}

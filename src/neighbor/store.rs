//! Study-wide store of sample-level neighbor statistics.

use crate::data::{LabelMatrix, LabelTable, Vocabulary};
use crate::error::{CellDistError, Result};
use crate::neighbor::collapse::SampleStat;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// Which matrix axis the requested label selects when slicing the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SliceAxis {
    /// The label is the source: distances *from* it to every other label.
    #[default]
    From,
    /// The label is the target: distances from every other label *to* it.
    To,
}

/// Aggregated `(mean, SE)` tables per sample, in sample order.
#[derive(Debug, Clone)]
pub struct NeighborStore {
    vocabulary: Arc<Vocabulary>,
    entries: Vec<(String, SampleStat)>,
}

impl NeighborStore {
    /// Create an empty store for a vocabulary.
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self {
            vocabulary,
            entries: Vec::new(),
        }
    }

    /// Insert a sample's statistics, replacing any earlier entry for the same id.
    pub fn put<S: Into<String>>(&mut self, sample_id: S, stat: SampleStat) -> Result<()> {
        if **stat.vocabulary() != *self.vocabulary {
            return Err(CellDistError::VocabularyMismatch);
        }
        let sample_id = sample_id.into();
        match self.entries.iter_mut().find(|(id, _)| *id == sample_id) {
            Some(entry) => entry.1 = stat,
            None => self.entries.push((sample_id, stat)),
        }
        Ok(())
    }

    /// All samples with their statistics, in insertion order.
    #[inline]
    pub fn get_all(&self) -> &[(String, SampleStat)] {
        &self.entries
    }

    /// Statistics of one sample.
    pub fn get(&self, sample_id: &str) -> Option<&SampleStat> {
        self.entries
            .iter()
            .find(|(id, _)| id == sample_id)
            .map(|(_, s)| s)
    }

    /// Store vocabulary.
    #[inline]
    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    /// Sample identifiers in store order.
    pub fn sample_ids(&self) -> Vec<String> {
        self.entries.iter().map(|(id, _)| id.clone()).collect()
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mean and SE tables `[to, sample]` for distances from `from_label`.
    pub fn get_for_label(&self, from_label: &str) -> Result<(LabelTable, LabelTable)> {
        self.slice(from_label, SliceAxis::From)
    }

    /// Mean and SE tables `[other, sample]` for one label along either axis.
    ///
    /// With `SliceAxis::From` the label's column is taken (rows are targets);
    /// with `SliceAxis::To` its row is taken (rows are sources).
    pub fn slice(&self, label: &str, axis: SliceAxis) -> Result<(LabelTable, LabelTable)> {
        let k = self.vocabulary.require(label)?;
        let pick = |m: &LabelMatrix<Option<f64>>| match axis {
            SliceAxis::From => m.column(k),
            SliceAxis::To => m.row(k),
        };

        let n = self.vocabulary.len();
        let mut means = vec![Vec::with_capacity(self.len()); n];
        let mut errors = vec![Vec::with_capacity(self.len()); n];
        for (_, stat) in &self.entries {
            for (row, value) in pick(&stat.mean).into_iter().enumerate() {
                means[row].push(value);
            }
            for (row, value) in pick(&stat.std_error).into_iter().enumerate() {
                errors[row].push(value);
            }
        }

        let labels = self.vocabulary.labels().to_vec();
        let samples = self.sample_ids();
        Ok((
            LabelTable::from_rows(labels.clone(), samples.clone(), &means)?,
            LabelTable::from_rows(labels, samples, &errors)?,
        ))
    }

    /// Write every sample/pair statistic as a long-format TSV.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "sample_id\tfrom\tto\tmean\tvariance\tcount\tstd_error")?;
        let fmt = |v: Option<f64>| v.map_or_else(|| "NA".to_string(), |x| format!("{:.6}", x));
        for (sample_id, stat) in &self.entries {
            for (j, from) in self.vocabulary.labels().iter().enumerate() {
                for (i, to) in self.vocabulary.labels().iter().enumerate() {
                    writeln!(
                        writer,
                        "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                        sample_id,
                        from,
                        to,
                        fmt(*stat.mean.at(i, j)),
                        fmt(*stat.variance.at(i, j)),
                        stat.count.at(i, j),
                        fmt(*stat.std_error.at(i, j)),
                    )?;
                }
            }
        }
        writer.flush()?;
        Ok(())
    }
}

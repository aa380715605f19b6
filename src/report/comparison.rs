//! Grouped comparison of distances from one label to a target label family.
//!
//! # Algorithm
//!
//! 1. Resolve the target family against the vocabulary (at most two labels)
//! 2. Slice per-sample mean and SE rows out of the neighbor store
//! 3. Optionally convert pixels to microns
//! 4. Drop or zero-fill samples with missing values
//! 5. Sort samples by the row with the larger total, descending
//! 6. Optionally run a paired t-test over samples where both rows are nonzero

use crate::data::Vocabulary;
use crate::error::{CellDistError, Result};
use crate::neighbor::{NeighborStore, SliceAxis};
use crate::pipeline::{unit_label, OutputFormat};
use crate::report::render::render_comparison;
use crate::test::paired_t_test;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Maximum number of target labels compared side by side.
pub const MAX_TARGETS: usize = 2;

/// Resolves a family of target labels for a source label.
pub trait LabelResolver {
    /// Matching labels in vocabulary order, never including `from`.
    fn resolve(&self, vocabulary: &Vocabulary, from: &str) -> Vec<String>;

    /// Short description used in report titles.
    fn describe(&self) -> String;
}

/// Labels containing a fixed, case-sensitive substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstringResolver {
    pattern: String,
}

impl SubstringResolver {
    pub fn new<S: Into<String>>(pattern: S) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

impl LabelResolver for SubstringResolver {
    fn resolve(&self, vocabulary: &Vocabulary, from: &str) -> Vec<String> {
        vocabulary
            .labels()
            .iter()
            .filter(|l| l.as_str() != from && l.contains(self.pattern.as_str()))
            .cloned()
            .collect()
    }

    fn describe(&self) -> String {
        self.pattern.clone()
    }
}

/// An explicit list of family members, matched exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplicitResolver {
    labels: Vec<String>,
}

impl ExplicitResolver {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }
}

impl LabelResolver for ExplicitResolver {
    fn resolve(&self, vocabulary: &Vocabulary, from: &str) -> Vec<String> {
        vocabulary
            .labels()
            .iter()
            .filter(|l| l.as_str() != from && self.labels.contains(l))
            .cloned()
            .collect()
    }

    fn describe(&self) -> String {
        self.labels.join(" / ")
    }
}

/// Options for a comparison report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonOptions {
    /// Slice the store along the target axis instead of the source axis.
    pub transposed: bool,
    /// Drop samples with any missing value instead of zero-filling.
    pub remove_missing_samples: bool,
    /// Pixel-to-micron multiplier, `None` to keep pixels.
    pub unit_scale: Option<f64>,
    /// Run a paired t-test between the two target rows.
    pub run_paired_test: bool,
}

/// Per-sample rows for each target before the missing-value policy.
#[derive(Debug, Clone, PartialEq)]
pub struct RawComparison {
    pub targets: Vec<String>,
    pub sample_ids: Vec<String>,
    pub means: Vec<Vec<Option<f64>>>,
    pub std_errors: Vec<Vec<Option<f64>>>,
}

impl RawComparison {
    /// Multiply every present entry by `factor`.
    pub fn scaled(mut self, factor: f64) -> Self {
        for row in self.means.iter_mut().chain(self.std_errors.iter_mut()) {
            for v in row.iter_mut() {
                *v = v.map(|x| x * factor);
            }
        }
        self
    }

    /// Indices of samples where every row has both a mean and an SE.
    fn complete_columns(&self) -> Vec<usize> {
        (0..self.sample_ids.len())
            .filter(|&c| {
                self.means
                    .iter()
                    .chain(&self.std_errors)
                    .all(|row| row[c].is_some())
            })
            .collect()
    }
}

/// Extract per-sample mean and SE rows from `from` to each target.
pub fn extract_targets(
    store: &NeighborStore,
    from: &str,
    targets: &[String],
    axis: SliceAxis,
) -> Result<RawComparison> {
    let (means, errors) = store.slice(from, axis)?;
    let mut mean_rows = Vec::with_capacity(targets.len());
    let mut error_rows = Vec::with_capacity(targets.len());
    for target in targets {
        mean_rows.push(means.row(target)?);
        error_rows.push(errors.row(target)?);
    }
    Ok(RawComparison {
        targets: targets.to_vec(),
        sample_ids: means.sample_ids().to_vec(),
        means: mean_rows,
        std_errors: error_rows,
    })
}

/// One bar of a grouped bar chart with its SE whisker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub label: String,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

/// All bars drawn for one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarGroup {
    pub sample_id: String,
    pub bars: Vec<Bar>,
}

/// Fully resolved comparison, ready for plotting or export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Source label.
    pub from_label: String,
    /// One or two target labels, in vocabulary order.
    pub targets: Vec<String>,
    /// Samples in display order.
    pub sample_ids: Vec<String>,
    /// Mean distance, `[target][sample]`.
    pub means: Vec<Vec<f64>>,
    /// Standard error, `[target][sample]`.
    pub std_errors: Vec<Vec<f64>>,
    /// Row that drove the sample ordering.
    pub pivot_row: usize,
    /// Two-sided paired t-test p-value, if one could be computed.
    pub p_value: Option<f64>,
    /// Figure title.
    pub title: String,
    /// Value-axis title including the unit.
    pub axis_title: String,
    /// Distance unit.
    pub unit: String,
}

impl ComparisonResult {
    /// Number of samples shown.
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Grouped bars with whiskers at mean ± SE.
    pub fn bars(&self) -> Vec<BarGroup> {
        self.sample_ids
            .iter()
            .enumerate()
            .map(|(c, sample_id)| BarGroup {
                sample_id: sample_id.clone(),
                bars: self
                    .targets
                    .iter()
                    .enumerate()
                    .map(|(r, label)| {
                        let mean = self.means[r][c];
                        let se = self.std_errors[r][c];
                        Bar {
                            label: label.clone(),
                            mean,
                            lower: mean - se,
                            upper: mean + se,
                        }
                    })
                    .collect(),
            })
            .collect()
    }

    /// Write the tables in long format.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "sample_id\tfrom\tto\tmean\tstd_error\tunit")?;
        for (c, sample_id) in self.sample_ids.iter().enumerate() {
            for (r, target) in self.targets.iter().enumerate() {
                writeln!(
                    writer,
                    "{}\t{}\t{}\t{:.6}\t{:.6}\t{}",
                    sample_id, self.from_label, target, self.means[r][c], self.std_errors[r][c], self.unit
                )?;
            }
        }
        if let Some(p) = self.p_value {
            writeln!(writer, "# paired t-test p-value: {:.4e}", p)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Draw the grouped bar chart.
    pub fn render(&self, path: &Path, format: OutputFormat) -> Result<()> {
        render_comparison(self, path, format)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(CellDistError::from)
    }
}

/// Build a comparison report from the neighbor store.
pub fn comparison_report<R: LabelResolver + ?Sized>(
    store: &NeighborStore,
    from: &str,
    resolver: &R,
    options: &ComparisonOptions,
) -> Result<ComparisonResult> {
    let vocabulary = store.vocabulary();
    if !vocabulary.contains(from) {
        return Err(CellDistError::NoMatch(format!(
            "source label '{}' is not in the vocabulary",
            from
        )));
    }
    let mut targets = resolver.resolve(vocabulary, from);
    if targets.is_empty() {
        return Err(CellDistError::NoMatch(format!(
            "no label other than '{}' matches '{}'",
            from,
            resolver.describe()
        )));
    }
    targets.truncate(MAX_TARGETS);

    let axis = if options.transposed {
        SliceAxis::To
    } else {
        SliceAxis::From
    };
    let mut raw = extract_targets(store, from, &targets, axis)?;
    if let Some(scale) = options.unit_scale {
        raw = raw.scaled(scale);
    }

    let columns: Vec<usize> = if options.remove_missing_samples {
        raw.complete_columns()
    } else {
        (0..raw.sample_ids.len()).collect()
    };
    let fill = |rows: &[Vec<Option<f64>>]| -> Vec<Vec<f64>> {
        rows.iter()
            .map(|row| columns.iter().map(|&c| row[c].unwrap_or(0.0)).collect())
            .collect()
    };
    let mut means = fill(&raw.means);
    let mut std_errors = fill(&raw.std_errors);
    let mut sample_ids: Vec<String> = columns.iter().map(|&c| raw.sample_ids[c].clone()).collect();

    // Pivot on the row with the larger total; the first row wins ties.
    let totals: Vec<f64> = means.iter().map(|row| row.iter().sum()).collect();
    let pivot_row = (1..totals.len()).fold(0, |best, r| if totals[r] > totals[best] { r } else { best });
    let mut order: Vec<usize> = (0..sample_ids.len()).collect();
    order.sort_by(|&a, &b| means[pivot_row][b].total_cmp(&means[pivot_row][a]));

    let permute = |row: &[f64]| -> Vec<f64> { order.iter().map(|&i| row[i]).collect() };
    means = means.iter().map(|r| permute(r)).collect();
    std_errors = std_errors.iter().map(|r| permute(r)).collect();
    sample_ids = order.iter().map(|&i| sample_ids[i].clone()).collect();

    let p_value = if options.run_paired_test && means.len() == MAX_TARGETS {
        paired_p_value(&means[0], &means[1])
    } else {
        None
    };

    let unit = unit_label(options.unit_scale).to_string();
    let title = if options.transposed {
        format!("{} to {}", resolver.describe(), from)
    } else {
        format!("{} to {}", from, resolver.describe())
    };
    Ok(ComparisonResult {
        from_label: from.to_string(),
        targets,
        sample_ids,
        means,
        std_errors,
        pivot_row,
        p_value,
        title,
        axis_title: format!("Nearest-neighbor distance ({})", unit),
        unit,
    })
}

/// Paired test over samples where both rows are nonzero.
fn paired_p_value(a: &[f64], b: &[f64]) -> Option<f64> {
    let (x, y): (Vec<f64>, Vec<f64>) = a
        .iter()
        .zip(b)
        .filter(|(x, y)| **x != 0.0 && **y != 0.0)
        .map(|(x, y)| (*x, *y))
        .unzip();
    match paired_t_test(&x, &y) {
        Ok(t) => Some(t.p_value),
        Err(e) => {
            debug!("Paired test skipped: {}", e);
            None
        }
    }
}

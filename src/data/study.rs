//! Study: samples, marker vocabulary and unit conversion.

use crate::data::{Field, Sample, Vocabulary};
use crate::error::{CellDistError, Result};
use crate::neighbor::{NearestNeighbor, NeighborStore};
use crate::pipeline::{aggregate_study, AnalysisConfig};
use nalgebra::Point2;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

const REQUIRED_COLUMNS: [&str; 5] = ["sample_id", "field_id", "label", "x", "y"];

/// Top-level collection of samples sharing one vocabulary.
#[derive(Debug, Clone)]
pub struct Study {
    vocabulary: Arc<Vocabulary>,
    samples: Vec<Sample>,
    microns_per_pixel: f64,
    neighbors: Option<NeighborStore>,
}

impl Study {
    /// Create a study.
    ///
    /// Sample identifiers must be unique and every point label must belong to
    /// the vocabulary.
    pub fn new(vocabulary: Vocabulary, samples: Vec<Sample>, microns_per_pixel: f64) -> Result<Self> {
        if !(microns_per_pixel.is_finite() && microns_per_pixel > 0.0) {
            return Err(CellDistError::InvalidParameter(format!(
                "microns_per_pixel must be positive, got {}",
                microns_per_pixel
            )));
        }
        let mut seen = HashSet::new();
        for sample in &samples {
            if !seen.insert(sample.id()) {
                return Err(CellDistError::InvalidParameter(format!(
                    "Duplicate sample id '{}'",
                    sample.id()
                )));
            }
            for field in sample.fields() {
                for (label, _) in field.iter() {
                    vocabulary.require(label)?;
                }
            }
        }
        Ok(Self {
            vocabulary: Arc::new(vocabulary),
            samples,
            microns_per_pixel,
            neighbors: None,
        })
    }

    /// Load pre-labelled points from a TSV file.
    ///
    /// Expected header: `sample_id  field_id  label  x  y` (extra columns are
    /// ignored). Samples and fields keep their order of first appearance.
    /// Without an explicit vocabulary, one is derived from the labels in the
    /// order they first occur.
    pub fn from_tsv<P: AsRef<Path>>(
        path: P,
        vocabulary: Option<Vocabulary>,
        microns_per_pixel: f64,
    ) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let mut cols = [0usize; 5];
        for (slot, name) in cols.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| CellDistError::MissingColumn(name.to_string()))?;
        }
        let [sample_col, field_col, label_col, x_col, y_col] = cols;

        let mut sample_order: Vec<String> = Vec::new();
        let mut field_order: HashMap<String, Vec<String>> = HashMap::new();
        let mut cells: HashMap<(String, String), Vec<(String, Point2<f64>)>> = HashMap::new();
        let mut label_order: Vec<String> = Vec::new();

        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let get = |col: usize| record.get(col).unwrap_or("").trim();
            let coord = |col: usize| -> Result<f64> {
                let raw = get(col);
                raw.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| CellDistError::InvalidCoordinate {
                        value: raw.to_string(),
                        row,
                    })
            };

            let sample_id = get(sample_col).to_string();
            let field_id = get(field_col).to_string();
            let label = get(label_col).to_string();
            let point = Point2::new(coord(x_col)?, coord(y_col)?);

            if let Some(vocab) = &vocabulary {
                vocab.require(&label)?;
            } else if !label_order.contains(&label) {
                label_order.push(label.clone());
            }

            let fields = field_order.entry(sample_id.clone()).or_insert_with(|| {
                sample_order.push(sample_id.clone());
                Vec::new()
            });
            if !fields.contains(&field_id) {
                fields.push(field_id.clone());
            }
            cells
                .entry((sample_id, field_id))
                .or_default()
                .push((label, point));
        }

        if sample_order.is_empty() {
            return Err(CellDistError::EmptyData("No cells in table".to_string()));
        }

        let vocabulary = match vocabulary {
            Some(v) => v,
            None => Vocabulary::new(label_order)?,
        };

        let mut samples = Vec::with_capacity(sample_order.len());
        for sample_id in sample_order {
            let field_ids = field_order.remove(&sample_id).unwrap_or_default();
            let fields = field_ids
                .into_iter()
                .map(|field_id| {
                    let points = cells
                        .remove(&(sample_id.clone(), field_id.clone()))
                        .unwrap_or_default();
                    Field::new(field_id, points)
                })
                .collect();
            samples.push(Sample::new(sample_id, fields)?);
        }

        Self::new(vocabulary, samples, microns_per_pixel)
    }

    /// Shared marker vocabulary.
    #[inline]
    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    /// Samples in study order.
    #[inline]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Look up a sample by identifier.
    pub fn sample(&self, id: &str) -> Option<&Sample> {
        self.samples.iter().find(|s| s.id() == id)
    }

    /// Pixel-to-micron conversion factor.
    #[inline]
    pub fn microns_per_pixel(&self) -> f64 {
        self.microns_per_pixel
    }

    /// Multiplier from pixels to reported distance units, `None` when
    /// reporting pixels.
    pub fn unit_scale(&self, use_pixel: bool) -> Option<f64> {
        (!use_pixel).then_some(self.microns_per_pixel)
    }

    /// Aggregated neighbor statistics, once computed.
    #[inline]
    pub fn neighbors(&self) -> Option<&NeighborStore> {
        self.neighbors.as_ref()
    }

    /// Aggregated neighbor statistics, failing if they were never computed.
    pub fn require_neighbors(&self) -> Result<&NeighborStore> {
        self.neighbors.as_ref().ok_or_else(|| {
            CellDistError::InvalidParameter(
                "Neighbor statistics have not been computed for this study".to_string(),
            )
        })
    }

    /// Run the field → sample aggregation and keep the resulting store.
    pub fn compute_neighbors<N: NearestNeighbor>(
        &mut self,
        config: &AnalysisConfig,
        nn: &N,
    ) -> Result<&NeighborStore> {
        let store = aggregate_study(self, config, nn)?;
        Ok(&*self.neighbors.insert(store))
    }
}

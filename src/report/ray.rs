//! Nearest-neighbor "ray" plots: one segment per source cell.

use crate::data::{Field, Study, Window};
use crate::error::Result;
use crate::neighbor::{nearest_links, Link, NearestNeighbor};
use crate::pipeline::{unit_label, AnalysisConfig, OutputFormat};
use crate::report::render::render_rays;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Geometry of one ray plot, in display units.
#[derive(Debug, Clone)]
pub struct RayPlot {
    pub sample_id: String,
    pub field_id: String,
    pub from: String,
    pub to: String,
    pub unit: String,
    pub window: Option<Window>,
    /// Points grouped by label, in order of first appearance in the field.
    pub points: Vec<(String, Vec<(f64, f64)>)>,
    /// One link per source cell that has a match.
    pub links: Vec<Link>,
}

impl RayPlot {
    /// Figure title.
    pub fn title(&self) -> String {
        format!(
            "{} / {}: {} to nearest {}",
            self.sample_id, self.field_id, self.from, self.to
        )
    }

    /// Render to `path` in the given format.
    pub fn render(&self, path: &Path, format: OutputFormat) -> Result<()> {
        render_rays(self, path, format)
    }
}

/// Build the ray plot for one field.
///
/// Returns `Ok(None)` when either label has no points in the field.
/// Coordinates are multiplied by `unit_scale` before the neighbor search.
pub fn ray_plot<N: NearestNeighbor + ?Sized>(
    nn: &N,
    sample_id: &str,
    field: &Field,
    from: &str,
    to: &str,
    unit_scale: Option<f64>,
) -> Result<Option<RayPlot>> {
    if field.count(from) == 0 || field.count(to) == 0 {
        debug!(
            "Sample '{}' field '{}': missing {} or {}, no ray plot",
            sample_id,
            field.id(),
            from,
            to
        );
        return Ok(None);
    }

    let scaled;
    let field = match unit_scale {
        Some(factor) => {
            scaled = field.scaled(factor);
            &scaled
        }
        None => field,
    };

    let mut points: Vec<(String, Vec<(f64, f64)>)> = Vec::new();
    for (label, p) in field.iter() {
        match points.iter_mut().find(|(l, _)| l == label) {
            Some((_, pts)) => pts.push((p.x, p.y)),
            None => points.push((label.to_string(), vec![(p.x, p.y)])),
        }
    }

    Ok(Some(RayPlot {
        sample_id: sample_id.to_string(),
        field_id: field.id().to_string(),
        from: from.to_string(),
        to: to.to_string(),
        unit: unit_label(unit_scale).to_string(),
        window: field.window(),
        points,
        links: nearest_links(nn, field, from, to)?,
    }))
}

/// File name for a field's ray plot.
pub fn ray_file_name(sample_id: &str, field_id: &str, from: &str, to: &str, format: OutputFormat) -> String {
    let clean = |s: &str| -> String {
        s.chars()
            .map(|c| {
                if c.is_alphanumeric() || matches!(c, '+' | '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    };
    format!(
        "{}_{}_{}_to_{}.{}",
        clean(sample_id),
        clean(field_id),
        clean(from),
        clean(to),
        format.extension()
    )
}

/// Outcome of a study-wide ray batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RayBatchSummary {
    /// Files written.
    pub written: Vec<PathBuf>,
    /// `(sample, field)` pairs lacking one of the labels.
    pub skipped: Vec<(String, String)>,
    /// `(sample, field, error)` for fields that failed to render.
    pub failed: Vec<(String, String, String)>,
}

enum FieldOutcome {
    Written(PathBuf),
    Skipped,
    Failed(String),
}

/// Render a ray plot for every qualifying field of every sample.
///
/// Coordinates are scaled by the study's own pixel size unless
/// `config.use_pixel` is set. Unknown labels fail the whole call. Per-field
/// failures are collected in the summary and never stop the remaining fields.
pub fn render_study_rays<N: NearestNeighbor>(
    nn: &N,
    study: &Study,
    from: &str,
    to: &str,
    config: &AnalysisConfig,
) -> Result<RayBatchSummary> {
    study.vocabulary().require(from)?;
    study.vocabulary().require(to)?;
    config.validate()?;
    fs::create_dir_all(&config.output_dir)?;
    let unit_scale = study.unit_scale(config.use_pixel);

    let jobs: Vec<(&str, &Field)> = study
        .samples()
        .iter()
        .flat_map(|s| s.fields().iter().map(move |f| (s.id(), f)))
        .collect();

    let outcomes: Vec<(String, String, FieldOutcome)> = jobs
        .par_iter()
        .map(|&(sample_id, field)| {
            let outcome = match ray_plot(nn, sample_id, field, from, to, unit_scale) {
                Ok(None) => FieldOutcome::Skipped,
                Ok(Some(plot)) => {
                    let path = config.output_dir.join(ray_file_name(
                        sample_id,
                        field.id(),
                        from,
                        to,
                        config.format,
                    ));
                    match plot.render(&path, config.format) {
                        Ok(()) => FieldOutcome::Written(path),
                        Err(e) => FieldOutcome::Failed(e.to_string()),
                    }
                }
                Err(e) => FieldOutcome::Failed(e.to_string()),
            };
            (sample_id.to_string(), field.id().to_string(), outcome)
        })
        .collect();

    let mut summary = RayBatchSummary::default();
    for (sample_id, field_id, outcome) in outcomes {
        match outcome {
            FieldOutcome::Written(path) => summary.written.push(path),
            FieldOutcome::Skipped => summary.skipped.push((sample_id, field_id)),
            FieldOutcome::Failed(e) => {
                warn!("Ray plot for {} / {} failed: {}", sample_id, field_id, e);
                summary.failed.push((sample_id, field_id, e));
            }
        }
    }
    info!(
        "Ray plots {} -> {}: {} written, {} skipped, {} failed",
        from,
        to,
        summary.written.len(),
        summary.skipped.len(),
        summary.failed.len()
    );
    Ok(summary)
}

//! Analysis configuration shared by aggregation and reporting.

use crate::error::{CellDistError, Result};
use crate::neighbor::DEFAULT_MIN_NUM_CELLS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default pixel size of the imaging platform, in microns.
pub const DEFAULT_MICRONS_PER_PIXEL: f64 = 0.496;

/// File format for rendered figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = CellDistError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            other => Err(CellDistError::InvalidParameter(format!(
                "Unsupported output format '{}' (expected png or svg)",
                other
            ))),
        }
    }
}

/// Configuration surface for a study analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum population of both labels in a field before distances are computed.
    pub min_num_cells: usize,
    /// Pixel-to-micron conversion factor.
    pub microns_per_pixel: f64,
    /// Report distances in pixels instead of microns.
    pub use_pixel: bool,
    /// Figure format.
    pub format: OutputFormat,
    /// Directory for figures and tables.
    pub output_dir: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_num_cells: DEFAULT_MIN_NUM_CELLS,
            microns_per_pixel: DEFAULT_MICRONS_PER_PIXEL,
            use_pixel: false,
            format: OutputFormat::default(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl AnalysisConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(CellDistError::from)
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.min_num_cells == 0 {
            return Err(CellDistError::InvalidParameter(
                "min_num_cells must be at least 1".to_string(),
            ));
        }
        if !(self.microns_per_pixel.is_finite() && self.microns_per_pixel > 0.0) {
            return Err(CellDistError::InvalidParameter(format!(
                "microns_per_pixel must be positive, got {}",
                self.microns_per_pixel
            )));
        }
        Ok(())
    }

    /// Multiplier applied to pixel distances, `None` when reporting pixels.
    pub fn unit_scale(&self) -> Option<f64> {
        (!self.use_pixel).then_some(self.microns_per_pixel)
    }

    /// Human-readable distance unit.
    pub fn unit_label(&self) -> &'static str {
        unit_label(self.unit_scale())
    }
}

/// Unit name for an optional pixel-to-micron scale.
pub fn unit_label(scale: Option<f64>) -> &'static str {
    if scale.is_some() {
        "µm"
    } else {
        "pixels"
    }
}

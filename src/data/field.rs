//! Imaged fields and the samples that own them.

use crate::error::{CellDistError, Result};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding window of a field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Window {
    /// Smallest window enclosing all points, or `None` for an empty set.
    pub fn enclosing(points: &[Point2<f64>]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            x_min: first.x,
            x_max: first.x,
            y_min: first.y,
            y_max: first.y,
        };
        Some(points.iter().fold(init, |w, p| Self {
            x_min: w.x_min.min(p.x),
            x_max: w.x_max.max(p.x),
            y_min: w.y_min.min(p.y),
            y_max: w.y_max.max(p.y),
        }))
    }

    /// Window with every bound multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            x_min: self.x_min * factor,
            x_max: self.x_max * factor,
            y_min: self.y_min * factor,
            y_max: self.y_max * factor,
        }
    }
}

/// A single imaged region: labelled 2D points in pixel coordinates.
///
/// Fields are immutable once built; the statistics pipeline only reads them.
#[derive(Debug, Clone)]
pub struct Field {
    id: String,
    labels: Vec<String>,
    points: Vec<Point2<f64>>,
    window: Option<Window>,
}

impl Field {
    /// Create a field from `(label, point)` pairs.
    pub fn new<S: Into<String>>(id: S, cells: Vec<(String, Point2<f64>)>) -> Self {
        let (labels, points) = cells.into_iter().unzip();
        Self {
            id: id.into(),
            labels,
            points,
            window: None,
        }
    }

    /// Attach an explicit observation window.
    pub fn with_window(mut self, window: Window) -> Self {
        self.window = Some(window);
        self
    }

    /// Copy of the field with coordinates and window multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            id: self.id.clone(),
            labels: self.labels.clone(),
            points: self.points.iter().map(|p| Point2::new(p.x * factor, p.y * factor)).collect(),
            window: self.window.map(|w| w.scaled(factor)),
        }
    }

    /// Field identifier.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Total number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the field has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The explicit window if one was set, else the bounding box of the points.
    pub fn window(&self) -> Option<Window> {
        self.window.or_else(|| Window::enclosing(&self.points))
    }

    /// Number of points carrying `label`.
    pub fn count(&self, label: &str) -> usize {
        self.labels.iter().filter(|l| l.as_str() == label).count()
    }

    /// Coordinates of every point carrying `label`, in insertion order.
    pub fn points_with_label(&self, label: &str) -> Vec<Point2<f64>> {
        self.labels
            .iter()
            .zip(&self.points)
            .filter(|(l, _)| l.as_str() == label)
            .map(|(_, p)| *p)
            .collect()
    }

    /// Iterate over `(label, point)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Point2<f64>)> {
        self.labels.iter().map(String::as_str).zip(&self.points)
    }
}

/// One subject's ordered, non-empty collection of fields.
#[derive(Debug, Clone)]
pub struct Sample {
    id: String,
    fields: Vec<Field>,
}

impl Sample {
    /// Create a sample. At least one field is required.
    pub fn new<S: Into<String>>(id: S, fields: Vec<Field>) -> Result<Self> {
        let id = id.into();
        if fields.is_empty() {
            return Err(CellDistError::EmptyData(format!(
                "Sample '{}' has no fields",
                id
            )));
        }
        Ok(Self { id, fields })
    }

    /// Sample identifier.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Fields in acquisition order.
    #[inline]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by identifier.
    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id() == id)
    }
}

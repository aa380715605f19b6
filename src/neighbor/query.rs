//! Nearest-neighbor distance queries within a single field.

use crate::data::Field;
use crate::error::{CellDistError, Result};
use nalgebra::{distance, Point2};

/// Closest target point for one query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index into the target slice.
    pub index: usize,
    /// Euclidean distance to that target.
    pub distance: f64,
}

/// Point-pattern nearest-neighbor primitive.
///
/// When `same_set` is true, `queries` and `targets` are the same points and a
/// point must never be reported as its own neighbor; a lone point then has no
/// neighbor at all.
pub trait NearestNeighbor: Send + Sync {
    fn nearest(
        &self,
        queries: &[Point2<f64>],
        targets: &[Point2<f64>],
        same_set: bool,
    ) -> Vec<Option<Neighbor>>;
}

/// Exhaustive O(n·m) search.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForce;

impl NearestNeighbor for BruteForce {
    fn nearest(
        &self,
        queries: &[Point2<f64>],
        targets: &[Point2<f64>],
        same_set: bool,
    ) -> Vec<Option<Neighbor>> {
        queries
            .iter()
            .enumerate()
            .map(|(i, q)| {
                targets
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| !(same_set && *j == i))
                    .map(|(j, t)| Neighbor {
                        index: j,
                        distance: distance(q, t),
                    })
                    .min_by(|a, b| a.distance.total_cmp(&b.distance))
            })
            .collect()
    }
}

/// One nearest-neighbor link between a source and its matched target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub from: Point2<f64>,
    pub to: Point2<f64>,
    pub distance: f64,
}

/// Links from every `from` point to its nearest `to` point in the field.
///
/// Fails with `EmptyInput` if either label has no points.
pub fn nearest_links<N: NearestNeighbor + ?Sized>(
    nn: &N,
    field: &Field,
    from: &str,
    to: &str,
) -> Result<Vec<Link>> {
    let sources = field.points_with_label(from);
    if sources.is_empty() {
        return Err(CellDistError::EmptyInput(from.to_string()));
    }
    let same_set = from == to;
    let targets = if same_set {
        sources.clone()
    } else {
        field.points_with_label(to)
    };
    if targets.is_empty() {
        return Err(CellDistError::EmptyInput(to.to_string()));
    }

    let links = nn
        .nearest(&sources, &targets, same_set)
        .into_iter()
        .zip(&sources)
        .filter_map(|(hit, src)| {
            hit.map(|n| Link {
                from: *src,
                to: targets[n.index],
                distance: n.distance,
            })
        })
        .collect();
    Ok(links)
}

/// Distance from every `from` point to its nearest `to` point in the field.
///
/// Self-matches are excluded when `from == to`.
pub fn nearest_distances<N: NearestNeighbor + ?Sized>(
    nn: &N,
    field: &Field,
    from: &str,
    to: &str,
) -> Result<Vec<f64>> {
    Ok(nearest_links(nn, field, from, to)?
        .into_iter()
        .map(|l| l.distance)
        .collect())
}

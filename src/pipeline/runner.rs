//! Study-level runner: fan out over samples and fields, fan in to a store.

use crate::data::{Sample, Study, Vocabulary};
use crate::error::Result;
use crate::neighbor::{aggregate_field, collapse, FieldMatrices, NearestNeighbor, NeighborStore, SampleStat};
use crate::pipeline::AnalysisConfig;
use log::{debug, info};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;

/// Aggregate every field of one sample into a sample-level statistic.
pub fn aggregate_sample<N: NearestNeighbor>(
    nn: &N,
    sample: &Sample,
    vocabulary: &Arc<Vocabulary>,
    min_num_cells: usize,
) -> Result<SampleStat> {
    let fields: Vec<FieldMatrices> = sample
        .fields()
        .par_iter()
        .map(|field| {
            debug!(
                "Sample '{}': aggregating field '{}' ({} cells)",
                sample.id(),
                field.id(),
                field.len()
            );
            aggregate_field(nn, field, vocabulary, min_num_cells)
        })
        .collect();
    collapse(&fields)
}

/// Compute the neighbor store for a whole study.
///
/// Samples are processed in parallel; the store keeps study sample order.
pub fn aggregate_study<N: NearestNeighbor>(
    study: &Study,
    config: &AnalysisConfig,
    nn: &N,
) -> Result<NeighborStore> {
    config.validate()?;
    let start = Instant::now();
    let vocabulary = study.vocabulary();
    info!(
        "Aggregating {} samples over {} labels (min_num_cells = {})",
        study.samples().len(),
        vocabulary.len(),
        config.min_num_cells
    );

    let stats: Vec<Result<SampleStat>> = study
        .samples()
        .par_iter()
        .map(|sample| aggregate_sample(nn, sample, vocabulary, config.min_num_cells))
        .collect();

    let mut store = NeighborStore::new(Arc::clone(vocabulary));
    for (sample, stat) in study.samples().iter().zip(stats) {
        store.put(sample.id(), stat?)?;
    }

    info!(
        "Neighbor statistics ready for {} samples in {:.2?}",
        store.len(),
        start.elapsed()
    );
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Field;
    use crate::neighbor::BruteForce;
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    fn ring(label: &str, n: usize, cx: f64, radius: f64) -> Vec<(String, Point2<f64>)> {
        (0..n)
            .map(|k| {
                let theta = k as f64 * std::f64::consts::TAU / n as f64;
                (
                    label.to_string(),
                    Point2::new(cx + radius * theta.cos(), radius * theta.sin()),
                )
            })
            .collect()
    }

    fn create_study() -> Study {
        let vocab = Vocabulary::new(vec!["T".into(), "M".into()]).unwrap();
        let mut cells = ring("T", 12, 0.0, 10.0);
        cells.extend(ring("M", 12, 0.0, 13.0));
        let f1 = Field::new("f1", cells);
        let f2 = Field::new("f2", ring("T", 4, 0.0, 10.0));
        let s1 = Sample::new("s1", vec![f1, f2]).unwrap();
        let s2 = Sample::new("s2", vec![Field::new("f1", ring("M", 20, 0.0, 5.0))]).unwrap();
        Study::new(vocab, vec![s1, s2], 0.5).unwrap()
    }

    #[test]
    fn test_aggregate_study_keeps_order_and_counts() {
        let study = create_study();
        let store = aggregate_study(&study, &AnalysisConfig::default(), &BruteForce).unwrap();
        assert_eq!(store.sample_ids(), vec!["s1", "s2"]);

        let s1 = store.get("s1").unwrap();
        // Concentric rings: every T cell is 3 px from its M partner.
        assert_relative_eq!(s1.mean.get("M", "T").unwrap().unwrap(), 3.0, epsilon = 1e-9);
        assert_eq!(*s1.count.get("M", "T").unwrap(), 16);

        let s2 = store.get("s2").unwrap();
        assert!(s2.mean.get("M", "T").unwrap().is_none());
        assert_eq!(*s2.count.get("T", "M").unwrap(), 20);
    }

    #[test]
    fn test_compute_neighbors_attaches_store() {
        let mut study = create_study();
        assert!(study.neighbors().is_none());
        study
            .compute_neighbors(&AnalysisConfig::default(), &BruteForce)
            .unwrap();
        assert_eq!(study.require_neighbors().unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let study = create_study();
        let config = AnalysisConfig {
            min_num_cells: 0,
            ..Default::default()
        };
        assert!(aggregate_study(&study, &config, &BruteForce).is_err());
    }
}

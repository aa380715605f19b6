//! Integration tests for the cell distance pipeline.

use approx::assert_relative_eq;
use celldist::prelude::*;
use nalgebra::Point2;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

fn cell(label: &str, x: f64, y: f64) -> (String, Point2<f64>) {
    (label.to_string(), Point2::new(x, y))
}

fn vocabulary() -> Vocabulary {
    Vocabulary::new(vec!["A+".into(), "A-".into(), "B+".into(), "B-".into()]).unwrap()
}

/// Cells table with one sample and two fields.
///
/// Field 1 holds twelve A+/B+ pairs whose nearest-neighbor distances are
/// exactly 1..=12 px. Field 2 holds three A+ cells and nothing else.
fn write_cells_table() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "sample_id\tfield_id\tlabel\tx\ty").unwrap();
    for k in 0..12 {
        let y = 100.0 * k as f64;
        writeln!(file, "s1\tfield1\tA+\t0\t{}", y).unwrap();
        writeln!(file, "s1\tfield1\tB+\t{}\t{}", k + 1, y).unwrap();
    }
    for k in 0..3 {
        writeln!(file, "s1\tfield2\tA+\t{}\t0", 50 * k).unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_two_field_sample_statistics() {
    let file = write_cells_table();
    let mut study = Study::from_tsv(file.path(), Some(vocabulary()), 0.496).unwrap();
    assert_eq!(study.samples().len(), 1);
    assert_eq!(study.samples()[0].fields().len(), 2);

    let nn = BruteForce;
    let vocab = study.vocabulary().clone();
    let field1 = aggregate_field(&nn, &study.samples()[0].fields()[0], &vocab, 10);
    assert_relative_eq!(field1.mean.get("B+", "A+").unwrap().unwrap(), 6.5, epsilon = 1e-12);
    assert_relative_eq!(field1.variance.get("B+", "A+").unwrap().unwrap(), 13.0, epsilon = 1e-12);
    assert_eq!(*field1.count.get("B+", "A+").unwrap(), 12);

    let field2 = aggregate_field(&nn, &study.samples()[0].fields()[1], &vocab, 10);
    assert!(field2.mean.get("B+", "A+").unwrap().is_none());
    assert_eq!(*field2.count.get("B+", "A+").unwrap(), 3);

    let store = study.compute_neighbors(&AnalysisConfig::default(), &nn).unwrap();
    let stat = store.get("s1").unwrap();
    assert_relative_eq!(stat.mean.get("B+", "A+").unwrap().unwrap(), 6.5, epsilon = 1e-12);
    assert_eq!(*stat.count.get("B+", "A+").unwrap(), 15);
    assert_relative_eq!(
        stat.std_error.get("B+", "A+").unwrap().unwrap(),
        (13.0f64 / 15.0).sqrt(),
        epsilon = 1e-12
    );

    // Labels absent from every field stay missing with zero count.
    assert!(stat.mean.get("B-", "A-").unwrap().is_none());
    assert!(stat.std_error.get("B-", "A-").unwrap().is_none());
    assert_eq!(*stat.count.get("B-", "A-").unwrap(), 0);
}

#[test]
fn test_neighbor_table_export() {
    let file = write_cells_table();
    let mut study = Study::from_tsv(file.path(), Some(vocabulary()), 0.496).unwrap();
    let store = study
        .compute_neighbors(&AnalysisConfig::default(), &BruteForce)
        .unwrap();

    let out = NamedTempFile::new().unwrap();
    store.to_tsv(out.path()).unwrap();

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(out.path())
        .unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 16);

    let a_to_b = rows
        .iter()
        .find(|r| &r[1] == "A+" && &r[2] == "B+")
        .unwrap();
    assert_eq!(&a_to_b[3], "6.500000");
    assert_eq!(&a_to_b[5], "15");

    let missing = rows
        .iter()
        .find(|r| &r[1] == "A-" && &r[2] == "B-")
        .unwrap();
    assert_eq!(&missing[3], "NA");
}

/// Ten A+ cells per field, with B+ at `d_pos` and B- at `d_neg` to the side.
fn offset_field(id: &str, d_pos: f64, d_neg: f64) -> Field {
    let mut cells = Vec::new();
    for k in 0..10 {
        let y = 100.0 * k as f64;
        cells.push(cell("A+", 0.0, y));
        cells.push(cell("B+", d_pos, y));
        cells.push(cell("B-", -d_neg, y));
    }
    Field::new(id, cells)
}

fn offset_study() -> Study {
    let samples = [("s1", 2.0, 5.0), ("s2", 3.0, 4.0), ("s3", 1.0, 8.0)]
        .iter()
        .map(|&(id, d_pos, d_neg)| Sample::new(id, vec![offset_field("f1", d_pos, d_neg)]).unwrap())
        .collect();
    Study::new(vocabulary(), samples, 0.5).unwrap()
}

#[test]
fn test_comparison_report_orders_by_pivot() {
    let mut study = offset_study();
    let store = study
        .compute_neighbors(&AnalysisConfig::default(), &BruteForce)
        .unwrap();

    let options = ComparisonOptions {
        run_paired_test: true,
        ..Default::default()
    };
    let report = comparison_report(store, "A+", &SubstringResolver::new("B"), &options).unwrap();

    assert_eq!(report.targets, vec!["B+", "B-"]);
    // B- totals 17 against 6 for B+, so it drives the ordering.
    assert_eq!(report.pivot_row, 1);
    assert_eq!(report.sample_ids, vec!["s3", "s1", "s2"]);
    assert_eq!(report.means[0], vec![1.0, 2.0, 3.0]);
    assert_eq!(report.means[1], vec![8.0, 5.0, 4.0]);
    assert_eq!(report.unit, "pixels");

    let p = report.p_value.unwrap();
    assert!(p > 0.0 && p < 1.0);
}

#[test]
fn test_comparison_report_in_microns() {
    let mut study = offset_study();
    let config = AnalysisConfig::default();
    let options = ComparisonOptions {
        unit_scale: study.unit_scale(config.use_pixel),
        ..Default::default()
    };
    let store = study.compute_neighbors(&config, &BruteForce).unwrap();

    let report = comparison_report(
        store,
        "A+",
        &ExplicitResolver::new(vec!["B+".into()]),
        &options,
    )
    .unwrap();

    assert_eq!(report.targets, vec!["B+"]);
    assert_eq!(report.unit, "µm");
    // The study was built at 0.5 µm/px, not the configured default.
    assert_relative_eq!(report.means[0][0], 3.0 * 0.5, epsilon = 1e-12);
    assert!(report.p_value.is_none());
}

#[test]
fn test_comparison_report_no_match() {
    let mut study = offset_study();
    let store = study
        .compute_neighbors(&AnalysisConfig::default(), &BruteForce)
        .unwrap();
    let err = comparison_report(
        store,
        "A+",
        &SubstringResolver::new("CD8"),
        &ComparisonOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, CellDistError::NoMatch(_)));
}

#[test]
fn test_rays_skip_fields_without_target() {
    let file = write_cells_table();
    let study = Study::from_tsv(file.path(), Some(vocabulary()), 0.496).unwrap();
    let dir = tempdir().unwrap();
    let config = AnalysisConfig {
        output_dir: dir.path().join("rays"),
        ..Default::default()
    };

    let summary = render_study_rays(&BruteForce, &study, "A+", "B-", &config).unwrap();
    assert!(summary.written.is_empty());
    assert!(summary.failed.is_empty());
    assert_eq!(summary.skipped.len(), 2);
    assert!(dir.path().join("rays").is_dir());
}

#[test]
fn test_config_round_trip_through_yaml() {
    let config = AnalysisConfig {
        min_num_cells: 5,
        use_pixel: true,
        format: OutputFormat::Svg,
        ..Default::default()
    };
    let parsed = AnalysisConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();
    assert_eq!(parsed, config);
    assert_eq!(parsed.unit_scale(), None);
}

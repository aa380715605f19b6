//! Nearest-neighbor spatial statistics for labelled cell populations.
//!
//! This library measures how far cells of one phenotype sit from the
//! nearest cell of another, per imaged field, and rolls those distances up
//! to samples and studies.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (Vocabulary, Field, Sample, Study, LabelMatrix)
//! - **neighbor**: Nearest-neighbor queries, field statistics, sample collapse, the store
//! - **test**: Hypothesis testing (paired t-test)
//! - **report**: Comparison bar charts and ray plots
//! - **pipeline**: Configuration and parallel study execution
//!
//! # Example
//!
//! ```no_run
//! use celldist::prelude::*;
//!
//! // Load cells
//! let mut study = Study::from_tsv("cells.tsv", None, DEFAULT_MICRONS_PER_PIXEL).unwrap();
//!
//! // Aggregate distances field -> sample -> study
//! let config = AnalysisConfig::default();
//! study.compute_neighbors(&config, &BruteForce).unwrap();
//!
//! // Compare distances from CD8+ to the PD1 family
//! let options = ComparisonOptions {
//!     unit_scale: study.unit_scale(config.use_pixel),
//!     run_paired_test: true,
//!     ..Default::default()
//! };
//! let report = comparison_report(
//!     study.require_neighbors().unwrap(),
//!     "CD8+",
//!     &SubstringResolver::new("PD1"),
//!     &options,
//! )
//! .unwrap();
//! report.to_tsv("cd8_to_pd1.tsv").unwrap();
//! ```

pub mod data;
pub mod error;
pub mod neighbor;
pub mod pipeline;
pub mod report;
pub mod test;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::data::{Field, LabelMatrix, LabelTable, Sample, Study, Vocabulary, Window};
    pub use crate::error::{CellDistError, Result};
    pub use crate::neighbor::{
        aggregate_field, collapse, field_pair_stat, nearest_distances, nearest_links,
        standard_error, BruteForce, FieldMatrices, Link, NearestNeighbor, Neighbor,
        NeighborStore, PairStat, SampleStat, SliceAxis, DEFAULT_MIN_NUM_CELLS,
    };
    pub use crate::pipeline::{
        aggregate_sample, aggregate_study, AnalysisConfig, OutputFormat,
        DEFAULT_MICRONS_PER_PIXEL,
    };
    pub use crate::report::{
        comparison_report, ray_file_name, ray_plot, render_study_rays, ComparisonOptions,
        ComparisonResult, ExplicitResolver, LabelResolver, RayBatchSummary, RayPlot,
        SubstringResolver,
    };
    pub use crate::test::paired::{paired_t_test, PairedTTest};
}

//! Configuration and study-level execution.

pub mod config;
pub mod runner;

pub use config::{unit_label, AnalysisConfig, OutputFormat, DEFAULT_MICRONS_PER_PIXEL};
pub use runner::{aggregate_sample, aggregate_study};

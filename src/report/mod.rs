//! Consumer-facing reports built on the neighbor store and raw fields.

pub mod comparison;
pub mod ray;
pub mod render;

pub use comparison::{
    comparison_report, extract_targets, Bar, BarGroup, ComparisonOptions, ComparisonResult,
    ExplicitResolver, LabelResolver, RawComparison, SubstringResolver,
};
pub use ray::{ray_file_name, ray_plot, render_study_rays, RayBatchSummary, RayPlot};
pub use render::{render_comparison, render_rays};

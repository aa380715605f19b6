//! Data structures for labelled point data and label-indexed statistics.

mod field;
mod matrix;
mod study;
mod vocabulary;

pub use field::{Field, Sample, Window};
pub use matrix::{LabelMatrix, LabelTable};
pub use study::Study;
pub use vocabulary::Vocabulary;

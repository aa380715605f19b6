//! Statistical hypothesis testing.

pub mod paired;

pub use paired::{paired_t_test, PairedTTest};

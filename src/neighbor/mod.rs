//! Nearest-neighbor distances and their field → sample → study aggregation.

pub mod collapse;
pub mod field;
pub mod query;
pub mod store;

pub use collapse::{collapse, standard_error, SampleStat};
pub use field::{aggregate_field, field_pair_stat, FieldMatrices, PairStat, DEFAULT_MIN_NUM_CELLS};
pub use query::{nearest_distances, nearest_links, BruteForce, Link, NearestNeighbor, Neighbor};
pub use store::{NeighborStore, SliceAxis};

//! Rate sheet loading and snapshot handling.

pub mod dataset;
pub mod snapshot;

pub use dataset::{default_dataset, load_dataset_file, parse_dataset, DataIntegrityError, DatasetError};
pub use snapshot::{RateSnapshot, SnapshotStore};

//! Durable snapshots of the vector index.

pub mod error;
pub mod snapshot;

pub use error::{StorageError, StorageResult};
pub use snapshot::{SNAPSHOT_FILE, SNAPSHOT_VERSION, Snapshot, SnapshotStore};

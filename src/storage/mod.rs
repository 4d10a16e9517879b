// Storage module: the persisted set of offer ids already handled.

pub mod file;
pub mod sqlite;

pub use file::FileLedger;
pub use sqlite::SqliteLedger;

use crate::model::StorageError;

/// Append-only set of processed offer ids.
pub trait SeenLedger {
    fn has_seen(&self, id: u64) -> Result<bool, StorageError>;
    /// Records `id`. Marking an id twice is a no-op.
    fn mark_seen(&mut self, id: u64) -> Result<(), StorageError>;
}

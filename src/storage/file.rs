use crate::model::StorageError;
use crate::storage::SeenLedger;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Ledger kept in a flat text file of comma-separated ids, e.g. `,2001,2002`.
pub struct FileLedger {
    path: PathBuf,
    seen: HashSet<u64>,
    file: File,
}

impl FileLedger {
    /// Opens the state file for append, creating it when absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        let seen = parse_ids(&content, &path);
        debug!("Loaded {} seen ids from {}", seen.len(), path.display());

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, seen, file })
    }
}

fn parse_ids(content: &str, path: &Path) -> HashSet<u64> {
    content
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| match token.parse::<u64>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!("Ignoring invalid id '{}' in {}", token, path.display());
                None
            }
        })
        .collect()
}

impl SeenLedger for FileLedger {
    fn has_seen(&self, id: u64) -> Result<bool, StorageError> {
        Ok(self.seen.contains(&id))
    }

    /// The id counts as seen for this process even when the write fails.
    fn mark_seen(&mut self, id: u64) -> Result<(), StorageError> {
        if !self.seen.insert(id) {
            return Ok(());
        }
        write!(self.file, ",{id}")?;
        self.file.flush()?;
        debug!("Marked {} as seen in {}", id, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_means_nothing_seen() {
        let dir = TempDir::new().unwrap();
        let ledger = FileLedger::open(dir.path().join("state.txt")).unwrap();
        assert!(ledger.seen.is_empty());
        assert!(!ledger.has_seen(42).unwrap());
    }

    #[test]
    fn test_mark_seen_appends_and_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.txt");

        let mut ledger = FileLedger::open(&path).unwrap();
        ledger.mark_seen(42).unwrap();
        ledger.mark_seen(7).unwrap();
        ledger.mark_seen(42).unwrap();
        assert!(ledger.has_seen(42).unwrap());
        drop(ledger);

        assert_eq!(fs::read_to_string(&path).unwrap(), ",42,7");
        let reopened = FileLedger::open(&path).unwrap();
        assert_eq!(reopened.seen.len(), 2);
        assert!(reopened.has_seen(7).unwrap());
    }

    #[test]
    fn test_membership_is_exact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.txt");
        fs::write(&path, ",1234,junk,,56").unwrap();

        let ledger = FileLedger::open(&path).unwrap();
        assert!(ledger.has_seen(1234).unwrap());
        assert!(ledger.has_seen(56).unwrap());
        assert!(!ledger.has_seen(123).unwrap());
        assert!(!ledger.has_seen(5).unwrap());
    }

    #[test]
    fn test_failed_write_still_remembers_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.txt");
        fs::write(&path, ",1").unwrap();

        let mut ledger = FileLedger::open(&path).unwrap();
        ledger.file = File::open(&path).unwrap();

        assert!(ledger.mark_seen(2).is_err());
        assert!(ledger.has_seen(2).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), ",1");
    }
}

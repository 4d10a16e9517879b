use crate::model::StorageError;
use crate::storage::SeenLedger;
use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::debug;

/// Ledger backed by a SQLite table of seen offer ids.
pub struct SqliteLedger {
    conn: Connection,
}

impl SqliteLedger {
    /// Opens the database and creates the `seen` table when missing.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;
        let ledger = Self::with_connection(conn)?;
        debug!("Loaded {} seen ids from {}", ledger.count()?, db_path);
        Ok(ledger)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS seen (
                offer_id INTEGER PRIMARY KEY,
                seen_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(Self { conn })
    }

    pub fn count(&self) -> Result<usize, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM seen", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
impl SqliteLedger {
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    /// When the offer was marked, if it was.
    pub fn seen_at(&self, offer_id: u64) -> Result<Option<chrono::DateTime<Utc>>, StorageError> {
        use rusqlite::OptionalExtension;

        let seen_at: Option<String> = self
            .conn
            .query_row(
                "SELECT seen_at FROM seen WHERE offer_id = ?1",
                params![offer_id as i64],
                |row| row.get(0),
            )
            .optional()?;

        Ok(seen_at.and_then(|s| {
            chrono::DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        }))
    }
}

impl SeenLedger for SqliteLedger {
    fn has_seen(&self, offer_id: u64) -> Result<bool, StorageError> {
        let mut stmt = self.conn.prepare("SELECT 1 FROM seen WHERE offer_id = ?1")?;
        let mut rows = stmt.query(params![offer_id as i64])?;
        let found = rows.next()?.is_some();
        Ok(found)
    }

    /// Keeps the first timestamp when an id is marked again.
    fn mark_seen(&mut self, offer_id: u64) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO seen (offer_id, seen_at) VALUES (?1, ?2)",
            params![offer_id as i64, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

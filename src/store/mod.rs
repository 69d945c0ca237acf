// Ledger Store - persistence boundary for the movement history
//
// Each backend:
// - Loads the whole ledger fresh on every call (no caching)
// - Replaces the whole ledger atomically (no partial/append writes)
// - Does no locking: read-then-replace from two writers is last-write-wins

pub mod csv_file;
pub mod memory;
pub mod sqlite;

pub use csv_file::CsvFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::record::{Ledger, MovementRecord};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// LedgerStore - load / replace / delete over the backing medium
pub trait LedgerStore: Send + Sync {
    /// Fetch the full current ledger.
    ///
    /// Fails with `StoreUnavailable` if the medium can't be reached or a
    /// row doesn't parse.
    fn load(&self) -> Result<Ledger>;

    /// Overwrite the medium with `ledger`, all or nothing.
    fn replace(&self, ledger: &Ledger) -> Result<()>;

    /// Remove the row at `index` from the persisted ledger.
    ///
    /// # Returns
    /// * `Ok(record)` - The removed record
    /// * `Err(IndexOutOfRange)` - `index >= len` at deletion time
    fn delete_at(&self, index: usize) -> Result<MovementRecord> {
        let mut ledger = self.load()?;
        let removed = ledger.remove(index)?;
        self.replace(&ledger)?;
        info!(index, product = %removed.product, store = %self.describe(), "ledger row deleted");
        Ok(removed)
    }

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}

/// Backend selection, as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreBackend {
    /// Local CSV file
    Csv { path: PathBuf },
    /// SQLite database file (tabular store)
    Sqlite { path: PathBuf },
}

impl Default for StoreBackend {
    fn default() -> Self {
        StoreBackend::Csv {
            path: PathBuf::from("movimentacoes.csv"),
        }
    }
}

/// Open the store selected by configuration
pub fn open_store(backend: &StoreBackend) -> Result<Box<dyn LedgerStore>> {
    match backend {
        StoreBackend::Csv { path } => Ok(Box::new(CsvFileStore::new(path))),
        StoreBackend::Sqlite { path } => Ok(Box::new(SqliteStore::open(path)?)),
    }
}

// 📄 Local CSV file backend

use super::LedgerStore;
use crate::error::{LedgerError, Result};
use crate::record::Ledger;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Ledger kept in a CSV file with a header row
#[derive(Debug, Clone)]
pub struct CsvFileStore {
    path: PathBuf,
}

impl CsvFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        CsvFileStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file, failing if it does not exist.
    ///
    /// Used for import sources, where a missing file is a mistake rather
    /// than an empty ledger.
    pub fn load_existing(&self) -> Result<Ledger> {
        let file = File::open(&self.path)
            .map_err(|e| LedgerError::unavailable(format!("open {}: {e}", self.path.display())))?;
        let ledger = Ledger::read_csv(BufReader::new(file))?;

        debug!(path = %self.path.display(), rows = ledger.len(), "ledger loaded");
        Ok(ledger)
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

impl LedgerStore for CsvFileStore {
    /// A file that doesn't exist yet is an empty ledger
    fn load(&self) -> Result<Ledger> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "ledger file missing, starting empty");
            return Ok(Ledger::new());
        }

        self.load_existing()
    }

    /// Write to a temp file next to the target, then rename over it
    fn replace(&self, ledger: &Ledger) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(self.parent_dir())?;
        ledger.write_csv(&mut tmp)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| LedgerError::from(e.error))?;

        debug!(path = %self.path.display(), rows = ledger.len(), "ledger replaced");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}

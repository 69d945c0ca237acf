// In-memory backend for tests, demos and embedding

use super::LedgerStore;
use crate::error::{LedgerError, Result};
use crate::record::Ledger;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    ledger: RwLock<Ledger>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn with_ledger(ledger: Ledger) -> Self {
        MemoryStore {
            ledger: RwLock::new(ledger),
            offline: AtomicBool::new(false),
        }
    }

    /// Simulate an unreachable medium: every call fails until switched back
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(LedgerError::unavailable("memory store is offline"))
        } else {
            Ok(())
        }
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<Ledger> {
        self.check_online()?;
        let guard = self
            .ledger
            .read()
            .map_err(|_| LedgerError::unavailable("memory store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn replace(&self, ledger: &Ledger) -> Result<()> {
        self.check_online()?;
        let mut guard = self
            .ledger
            .write()
            .map_err(|_| LedgerError::unavailable("memory store lock poisoned"))?;
        *guard = ledger.clone();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

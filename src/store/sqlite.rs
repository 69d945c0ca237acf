// 🗄️ SQLite backend - the tabular store
// Same five text columns as the CSV wire format, plus a position key.

use super::LedgerStore;
use crate::error::{LedgerError, Result};
use crate::record::{Ledger, LedgerRow, MovementRecord};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

pub struct SqliteStore {
    conn: Mutex<Connection>,
    location: String,
}

impl SqliteStore {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        setup_database(&conn)?;

        Ok(SqliteStore {
            conn: Mutex::new(conn),
            location: format!("sqlite:{}", path.display()),
        })
    }

    /// Private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;

        Ok(SqliteStore {
            conn: Mutex::new(conn),
            location: "sqlite::memory:".to_string(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::unavailable("sqlite connection lock poisoned"))
    }
}

/// Create the movements table; WAL journal for crash recovery
pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS movements (
            position INTEGER PRIMARY KEY,
            data TEXT NOT NULL,
            produto TEXT NOT NULL,
            tipo TEXT NOT NULL,
            quantidade TEXT NOT NULL,
            motivo TEXT NOT NULL DEFAULT ''
        )",
        [],
    )?;

    Ok(())
}

impl LedgerStore for SqliteStore {
    fn load(&self) -> Result<Ledger> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT data, produto, tipo, quantidade, motivo
             FROM movements
             ORDER BY position",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(LedgerRow {
                data: row.get(0)?,
                produto: row.get(1)?,
                tipo: row.get(2)?,
                quantidade: row.get(3)?,
                motivo: row.get(4)?,
            })
        })?;

        let mut records = Vec::new();
        for (i, row) in rows.enumerate() {
            let raw = row?;
            if let Some(record) = MovementRecord::from_row(i + 1, &raw)? {
                records.push(record);
            }
        }

        debug!(store = %self.location, rows = records.len(), "ledger loaded");
        Ok(Ledger::from_records(records))
    }

    /// Delete + reinsert inside one transaction
    fn replace(&self, ledger: &Ledger) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM movements", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO movements (position, data, produto, tipo, quantidade, motivo)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (position, record) in ledger.iter().enumerate() {
                let row = record.to_row();
                stmt.execute(params![
                    position as i64,
                    row.data,
                    row.produto,
                    row.tipo,
                    row.quantidade,
                    row.motivo,
                ])?;
            }
        }
        tx.commit()?;

        debug!(store = %self.location, rows = ledger.len(), "ledger replaced");
        Ok(())
    }

    fn describe(&self) -> String {
        self.location.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MovementKind;
    use chrono::NaiveDate;

    fn sample() -> Ledger {
        let ts = NaiveDate::from_ymd_opt(2026, 7, 3)
            .unwrap()
            .and_hms_opt(13, 40, 0)
            .unwrap();
        Ledger::from_records(vec![
            MovementRecord::registration("LUVA NITRILICA", ts),
            MovementRecord::new(ts, "LUVA NITRILICA", MovementKind::Entry, 12.0, "caixa"),
            MovementRecord::new(ts, "LUVA NITRILICA", MovementKind::Exit, 0.5, ""),
        ])
    }

    #[test]
    fn test_new_database_is_empty() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_replace_round_trips_in_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.replace(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), sample());
    }

    #[test]
    fn test_replace_overwrites_previous_content() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.replace(&sample()).unwrap();

        let shorter = Ledger::from_records(sample().into_records().into_iter().take(1).collect());
        store.replace(&shorter).unwrap();
        assert_eq!(store.load().unwrap(), shorter);
    }

    #[test]
    fn test_file_database_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("estoque.db");

        SqliteStore::open(&path).unwrap().replace(&sample()).unwrap();
        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.load().unwrap(), sample());
    }

    #[test]
    fn test_delete_at_on_sqlite() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.replace(&sample()).unwrap();

        store.delete_at(0).unwrap();
        let after = store.load().unwrap();
        assert_eq!(after.len(), 2);
        assert_eq!(after.get(0).unwrap().kind, MovementKind::Entry);
        assert!(store.delete_at(2).is_err());
    }
}

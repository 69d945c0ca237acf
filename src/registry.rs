// 🏷️ Product Registry - the deduplicated set of known product names
//
// Two sources, one contract:
// - LedgerRegistry: distinct `Produto` values seen in the ledger
// - ListFileRegistry: explicit list file, one name per line
// Both normalize (trim + upper-case) and sort ascending.

use crate::error::{LedgerError, Result};
use crate::record::{Ledger, MovementRecord};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

// ============================================================================
// PRODUCT NAME
// ============================================================================

/// Normalized (trimmed, upper-cased) product name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductName(String);

impl ProductName {
    /// Normalize a raw name. Returns `None` when it is blank after trimming.
    pub fn parse(raw: &str) -> Option<ProductName> {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            None
        } else {
            Some(ProductName(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if a raw ledger value names this product
    pub fn matches(&self, raw: &str) -> bool {
        normalize(raw) == self.0
    }
}

impl std::fmt::Display for ProductName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProductName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Trim and upper-case
pub fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}

// ============================================================================
// REGISTRY CONTRACT
// ============================================================================

/// Outcome of a registration request
#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    /// New product; the record must be appended to the ledger
    Created(MovementRecord),
    /// Name already present in the registry snapshot; nothing to do
    AlreadyExists(ProductName),
}

/// Which registry implementation to use
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum RegistrySource {
    /// Derive names from the ledger's `Produto` column
    #[default]
    Ledger,
    /// Read names from a list file
    List { path: PathBuf },
}

/// ProductRegistry - source of known product names
pub trait ProductRegistry: Send + Sync {
    /// Distinct normalized names, ascending.
    ///
    /// `ledger` is the current snapshot; list-backed registries ignore it.
    fn list_products(&self, ledger: &Ledger) -> Result<BTreeSet<ProductName>>;

    /// Persist a newly registered name in the registry's own medium.
    ///
    /// Called only once the registration row has been stored.
    /// `raw` is the name trimmed but with its original case.
    fn remember(&self, _raw: &str) -> Result<()> {
        Ok(())
    }

    /// Short label for logs and UI
    fn source_name(&self) -> &str;

    /// Register a product against the current snapshot.
    ///
    /// Writes nothing; the caller stores the record and then calls `remember`.
    ///
    /// # Returns
    /// * `Ok(Registration::Created(record))` - Registration row to append
    /// * `Ok(Registration::AlreadyExists(name))` - Name already known
    /// * `Err(LedgerError::EmptyName)` - Blank name
    fn register(&self, name: &str, ledger: &Ledger, now: NaiveDateTime) -> Result<Registration> {
        let product = ProductName::parse(name).ok_or(LedgerError::EmptyName)?;

        if self.list_products(ledger)?.contains(&product) {
            debug!(product = %product, source = self.source_name(), "product already registered");
            return Ok(Registration::AlreadyExists(product));
        }

        Ok(Registration::Created(MovementRecord::registration(
            product.as_str(),
            now,
        )))
    }
}

/// Build the registry selected by configuration
pub fn build_registry(source: &RegistrySource) -> Box<dyn ProductRegistry> {
    match source {
        RegistrySource::Ledger => Box::new(LedgerRegistry::new()),
        RegistrySource::List { path } => Box::new(ListFileRegistry::new(path)),
    }
}

// ============================================================================
// LEDGER-DERIVED REGISTRY
// ============================================================================

/// Registry derived from the distinct products in the ledger
#[derive(Debug, Default)]
pub struct LedgerRegistry;

impl LedgerRegistry {
    pub fn new() -> Self {
        LedgerRegistry
    }
}

impl ProductRegistry for LedgerRegistry {
    fn list_products(&self, ledger: &Ledger) -> Result<BTreeSet<ProductName>> {
        Ok(ledger
            .iter()
            .filter_map(|record| ProductName::parse(&record.product))
            .collect())
    }

    fn source_name(&self) -> &str {
        "ledger"
    }
}

// ============================================================================
// LIST-FILE REGISTRY
// ============================================================================

/// Registry backed by a plain text file, one product per line
#[derive(Debug, Clone)]
pub struct ListFileRegistry {
    path: PathBuf,
}

impl ListFileRegistry {
    pub fn new(path: impl AsRef<Path>) -> Self {
        ListFileRegistry {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProductRegistry for ListFileRegistry {
    fn list_products(&self, _ledger: &Ledger) -> Result<BTreeSet<ProductName>> {
        if !self.path.exists() {
            return Ok(BTreeSet::new());
        }

        let content = fs::read_to_string(&self.path)?;
        Ok(content.lines().filter_map(ProductName::parse).collect())
    }

    fn remember(&self, raw: &str) -> Result<()> {
        // Keep one name per line even if the file lacks a trailing newline
        let needs_newline = match fs::read_to_string(&self.path) {
            Ok(content) => !content.is_empty() && !content.ends_with('\n'),
            Err(_) => false,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if needs_newline {
            writeln!(file)?;
        }
        writeln!(file, "{raw}")?;

        debug!(path = %self.path.display(), product = raw, "product appended to list file");
        Ok(())
    }

    fn source_name(&self) -> &str {
        "list"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MovementKind;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn names(set: &BTreeSet<ProductName>) -> Vec<&str> {
        set.iter().map(|p| p.as_str()).collect()
    }

    #[test]
    fn test_product_name_normalizes() {
        let name = ProductName::parse("  parafuso m8 ").unwrap();
        assert_eq!(name.as_str(), "PARAFUSO M8");
        assert!(name.matches("Parafuso M8"));
        assert!(ProductName::parse("   ").is_none());
    }

    #[test]
    fn test_ledger_registry_dedups_and_sorts() {
        let ledger = Ledger::from_records(vec![
            MovementRecord::registration("porca", now()),
            MovementRecord::new(now(), "ARRUELA", MovementKind::Entry, 5.0, ""),
            MovementRecord::new(now(), " Porca ", MovementKind::Entry, 5.0, ""),
        ]);

        let products = LedgerRegistry::new().list_products(&ledger).unwrap();
        assert_eq!(names(&products), vec!["ARRUELA", "PORCA"]);
    }

    #[test]
    fn test_register_creates_registration_record() {
        let registry = LedgerRegistry::new();
        let outcome = registry.register(" parafuso m8", &Ledger::new(), now()).unwrap();

        match outcome {
            Registration::Created(record) => {
                assert_eq!(record.product, "PARAFUSO M8");
                assert_eq!(record.kind, MovementKind::Registration);
                assert_eq!(record.quantity, 0.0);
                assert_eq!(record.timestamp, now());
            }
            other => panic!("expected Created, got {:?}", other),
        }
    }

    #[test]
    fn test_register_existing_is_noop() {
        let registry = LedgerRegistry::new();
        let ledger = Ledger::from_records(vec![MovementRecord::registration("PORCA", now())]);

        let outcome = registry.register("porca", &ledger, now()).unwrap();
        assert_eq!(
            outcome,
            Registration::AlreadyExists(ProductName::parse("PORCA").unwrap())
        );
    }

    #[test]
    fn test_register_blank_name_fails() {
        let registry = LedgerRegistry::new();
        assert_eq!(
            registry.register("  ", &Ledger::new(), now()).unwrap_err(),
            LedgerError::EmptyName
        );
    }

    #[test]
    fn test_list_file_registry_reads_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("produtos.txt");
        fs::write(&path, "Porca\n\narruela\nPORCA\n").unwrap();

        let registry = ListFileRegistry::new(&path);
        let products = registry.list_products(&Ledger::new()).unwrap();
        assert_eq!(names(&products), vec!["ARRUELA", "PORCA"]);
    }

    #[test]
    fn test_list_file_registry_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ListFileRegistry::new(dir.path().join("nope.txt"));
        assert!(registry.list_products(&Ledger::new()).unwrap().is_empty());
    }

    #[test]
    fn test_list_file_registry_remember_appends_original_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("produtos.txt");
        fs::write(&path, "Porca").unwrap();

        let registry = ListFileRegistry::new(&path);
        let outcome = registry.register("  Arruela Lisa ", &Ledger::new(), now()).unwrap();
        assert!(matches!(outcome, Registration::Created(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "Porca");

        registry.remember("Arruela Lisa").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Porca\nArruela Lisa\n");

        let again = registry.register("ARRUELA LISA", &Ledger::new(), now()).unwrap();
        assert!(matches!(again, Registration::AlreadyExists(_)));
        assert_eq!(registry.list_products(&Ledger::new()).unwrap().len(), 2);
    }

    #[test]
    fn test_build_registry_follows_source() {
        assert_eq!(build_registry(&RegistrySource::Ledger).source_name(), "ledger");
        let list = RegistrySource::List {
            path: PathBuf::from("produtos.txt"),
        };
        assert_eq!(build_registry(&list).source_name(), "list");
    }
}

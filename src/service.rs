// 🧭 Inventory service - one interaction cycle per call
//
// Every operation: check session → load fresh → at most one mutation →
// replace whole ledger. Callers run `refresh()` afterwards to recompute views.

use crate::config::Config;
use crate::engine::InventoryView;
use crate::error::Result;
use crate::record::{local_now, Ledger, MovementRecord};
use crate::registry::{build_registry, ProductRegistry, Registration};
use crate::session::SessionContext;
use crate::store::{open_store, CsvFileStore, LedgerStore};
use crate::validator::{build_entry, Flow};
use chrono::{FixedOffset, NaiveDateTime};
use std::path::Path;
use tracing::{debug, info};

/// Outcome of an entry/exit submission
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Appended to the ledger
    Recorded(MovementRecord),
    /// Dropped by the form gate; ledger untouched
    Rejected,
}

/// Ledger store + product registry + clock, wired by configuration
pub struct Inventory {
    store: Box<dyn LedgerStore>,
    registry: Box<dyn ProductRegistry>,
    offset: FixedOffset,
}

impl Inventory {
    pub fn new(
        store: Box<dyn LedgerStore>,
        registry: Box<dyn ProductRegistry>,
        offset: FixedOffset,
    ) -> Self {
        Inventory {
            store,
            registry,
            offset,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let store = open_store(&config.store)?;
        let registry = build_registry(&config.registry);
        let offset = config.offset()?;

        info!(
            store = %store.describe(),
            registry = registry.source_name(),
            offset = %offset,
            "inventory ready"
        );
        Ok(Inventory::new(store, registry, offset))
    }

    /// Wall-clock "now" at the configured offset
    pub fn now(&self) -> NaiveDateTime {
        local_now(self.offset)
    }

    pub fn store(&self) -> &dyn LedgerStore {
        self.store.as_ref()
    }

    pub fn registry(&self) -> &dyn ProductRegistry {
        self.registry.as_ref()
    }

    /// Reload the ledger and recompute every aggregate
    pub fn refresh(&self, session: &SessionContext) -> Result<InventoryView> {
        session.ensure_authenticated()?;

        let ledger = self.store.load()?;
        let products = self.registry.list_products(&ledger)?;
        debug!(rows = ledger.len(), products = products.len(), "inventory refreshed");

        Ok(InventoryView::compute(ledger, products))
    }

    /// Submit an entry or exit.
    ///
    /// A blank product or non-positive quantity is a silent rejection,
    /// not an error.
    pub fn submit_movement(
        &self,
        session: &SessionContext,
        product: &str,
        flow: Flow,
        quantity: f64,
        note: &str,
        now: NaiveDateTime,
    ) -> Result<Submission> {
        session.ensure_authenticated()?;

        let Some(record) = build_entry(product, flow, quantity, note, now) else {
            return Ok(Submission::Rejected);
        };

        let mut ledger = self.store.load()?;
        ledger.push(record.clone());
        self.store.replace(&ledger)?;

        info!(
            operator = %session.operator,
            product = %record.product,
            kind = %record.kind,
            quantity = record.quantity,
            "movement recorded"
        );
        Ok(Submission::Recorded(record))
    }

    /// Register a product name; appends a registration row if it's new
    pub fn register_product(
        &self,
        session: &SessionContext,
        name: &str,
        now: NaiveDateTime,
    ) -> Result<Registration> {
        session.ensure_authenticated()?;

        let mut ledger = self.store.load()?;
        let outcome = self.registry.register(name, &ledger, now)?;

        if let Registration::Created(record) = &outcome {
            ledger.push(record.clone());
            self.store.replace(&ledger)?;
            self.registry.remember(name.trim())?;
            info!(operator = %session.operator, product = %record.product, "product registered");
        }

        Ok(outcome)
    }

    /// Remove the ledger row at `index` (insertion order)
    pub fn delete_movement(&self, session: &SessionContext, index: usize) -> Result<MovementRecord> {
        session.ensure_authenticated()?;
        self.store.delete_at(index)
    }

    /// Overwrite the whole ledger, e.g. from an exported spreadsheet
    pub fn import(&self, session: &SessionContext, ledger: &Ledger) -> Result<()> {
        session.ensure_authenticated()?;
        self.store.replace(ledger)?;
        info!(operator = %session.operator, rows = ledger.len(), "ledger imported");
        Ok(())
    }

    /// Replace the ledger with the rows of a CSV export.
    ///
    /// The source must exist and parse completely; otherwise the stored
    /// ledger is left untouched.
    pub fn import_csv(&self, session: &SessionContext, path: &Path) -> Result<Ledger> {
        session.ensure_authenticated()?;
        let ledger = CsvFileStore::new(path).load_existing()?;
        self.import(session, &ledger)?;
        Ok(ledger)
    }
}

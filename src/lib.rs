// Inventory Ledger - Core Library
// Exposes the ledger core for the CLI, the TUI, the API server and tests

pub mod config;
pub mod engine;
pub mod error;
pub mod record;
pub mod registry;
pub mod service;
pub mod session;
pub mod store;
pub mod validator;

// Re-export commonly used types
pub use config::{Config, ServerConfig};
pub use engine::{
    filtered_view, indexed_view, registered_product_count, stock_by_product, totals,
    InventoryView, ProductFilter, ProductStock, Totals, ALL_PRODUCTS,
};
pub use error::{LedgerError, Result};
pub use record::{Ledger, LedgerRow, MovementKind, MovementRecord};
pub use registry::{
    build_registry, LedgerRegistry, ListFileRegistry, ProductName, ProductRegistry,
    Registration, RegistrySource,
};
pub use service::{Inventory, Submission};
pub use session::SessionContext;
pub use store::{open_store, CsvFileStore, LedgerStore, MemoryStore, SqliteStore, StoreBackend};
pub use validator::{build_entry, Flow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

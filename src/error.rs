// ⚠️ Error taxonomy for the ledger core

/// Errors produced by ledger, registry and store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Transport, write or parse failure of the backing medium.
    #[error("ledger store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    #[error("row index {index} out of range (ledger has {len} rows)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("product name is empty")]
    EmptyName,

    /// The caller's session was not authenticated.
    #[error("session is not authenticated")]
    Unauthenticated,

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl LedgerError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        LedgerError::StoreUnavailable {
            reason: reason.into(),
        }
    }

    /// Parse failure of a single data row (1-based, header excluded).
    pub fn malformed_row(row: usize, reason: impl std::fmt::Display) -> Self {
        LedgerError::StoreUnavailable {
            reason: format!("row {row}: {reason}"),
        }
    }

    /// Parse failure at a physical line of a text file (1-based, header is line 1).
    pub fn malformed_line(line: u64, reason: impl std::fmt::Display) -> Self {
        LedgerError::StoreUnavailable {
            reason: format!("line {line}: {reason}"),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(err: csv::Error) -> Self {
        LedgerError::unavailable(format!("csv: {err}"))
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        LedgerError::unavailable(format!("sqlite: {err}"))
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::unavailable(format!("io: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

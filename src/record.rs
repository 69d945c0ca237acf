// 📒 Movement records and the ledger wire format
// One row per inventory event: Data | Produto | Tipo | Quantidade | Motivo

use crate::error::{LedgerError, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::str::FromStr;

/// Timestamp layout used by every persisted ledger ("DD/MM/YYYY HH:MM").
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Column names, fixed order.
pub const HEADER: [&str; 5] = ["Data", "Produto", "Tipo", "Quantidade", "Motivo"];

/// Note written on rows created by product registration.
pub const REGISTRATION_NOTE: &str = "Novo Item";

// ============================================================================
// MOVEMENT KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementKind {
    /// Stock coming in
    Entry,
    /// Stock going out
    Exit,
    /// Introduces a product name into history; never moves stock
    Registration,
}

impl MovementKind {
    /// Literal stored in the `Tipo` column
    pub fn label(&self) -> &'static str {
        match self {
            MovementKind::Entry => "Entrada",
            MovementKind::Exit => "Saída",
            MovementKind::Registration => "Cadastro",
        }
    }
}

impl FromStr for MovementKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entrada" => Ok(MovementKind::Entry),
            "saída" | "saida" => Ok(MovementKind::Exit),
            "cadastro" => Ok(MovementKind::Registration),
            other => Err(format!("unknown movement kind '{other}'")),
        }
    }
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// MOVEMENT RECORD
// ============================================================================

/// A single inventory event. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRecord {
    /// Local wall-clock time, minute precision
    pub timestamp: NaiveDateTime,
    /// Product as written; matching normalizes it
    pub product: String,
    pub kind: MovementKind,
    /// Always >= 0
    pub quantity: f64,
    pub note: String,
}

impl MovementRecord {
    pub fn new(
        timestamp: NaiveDateTime,
        product: impl Into<String>,
        kind: MovementKind,
        quantity: f64,
        note: impl Into<String>,
    ) -> Self {
        MovementRecord {
            timestamp: truncate_to_minute(timestamp),
            product: product.into(),
            kind,
            quantity,
            note: note.into(),
        }
    }

    /// Registration row for a freshly registered product
    pub fn registration(product: impl Into<String>, now: NaiveDateTime) -> Self {
        MovementRecord::new(now, product, MovementKind::Registration, 0.0, REGISTRATION_NOTE)
    }

    /// Convert a wire row into a typed record.
    ///
    /// Returns `Ok(None)` for fully blank rows, which are skipped at load.
    /// `row` is the 1-based data row used in error messages.
    pub fn from_row(row: usize, raw: &LedgerRow) -> Result<Option<MovementRecord>> {
        parse_row(raw).map_err(|reason| LedgerError::malformed_row(row, reason))
    }

    /// Wire row for this record
    pub fn to_row(&self) -> LedgerRow {
        LedgerRow {
            data: format_timestamp(&self.timestamp),
            produto: self.product.clone(),
            tipo: self.kind.label().to_string(),
            quantidade: format_quantity(self.quantity),
            motivo: self.note.clone(),
        }
    }
}

/// Raw persisted row, every column as text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    #[serde(rename = "Data")]
    pub data: String,

    #[serde(rename = "Produto")]
    pub produto: String,

    #[serde(rename = "Tipo")]
    pub tipo: String,

    #[serde(rename = "Quantidade")]
    pub quantidade: String,

    #[serde(rename = "Motivo", default)]
    pub motivo: String,
}

impl LedgerRow {
    /// True when every field is empty or whitespace
    pub fn is_blank(&self) -> bool {
        self.fields().iter().all(|f| f.trim().is_empty())
    }

    /// Fields in column order
    pub fn fields(&self) -> [&str; 5] {
        [
            self.data.as_str(),
            self.produto.as_str(),
            self.tipo.as_str(),
            self.quantidade.as_str(),
            self.motivo.as_str(),
        ]
    }
}

// ============================================================================
// LEDGER
// ============================================================================

/// Insertion-ordered movement history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    records: Vec<MovementRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    pub fn from_records(records: Vec<MovementRecord>) -> Self {
        Ledger { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[MovementRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MovementRecord> {
        self.records.iter()
    }

    pub fn get(&self, index: usize) -> Option<&MovementRecord> {
        self.records.get(index)
    }

    pub fn push(&mut self, record: MovementRecord) {
        self.records.push(record);
    }

    /// Remove the row at `index`, shifting later rows down
    pub fn remove(&mut self, index: usize) -> Result<MovementRecord> {
        if index >= self.records.len() {
            return Err(LedgerError::IndexOutOfRange {
                index,
                len: self.records.len(),
            });
        }
        Ok(self.records.remove(index))
    }

    pub fn into_records(self) -> Vec<MovementRecord> {
        self.records
    }

    /// Parse a ledger from CSV with a header row.
    ///
    /// Malformed rows fail the whole read, naming the file line.
    pub fn read_csv<R: Read>(reader: R) -> Result<Ledger> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();

        // Errors carry the physical line; the parser skips empty lines
        let mut records = Vec::new();
        for result in rdr.records() {
            let line = match result {
                Ok(ref fields) => fields.position().map(|p| p.line()),
                Err(ref e) => e.position().map(|p| p.line()),
            };
            let malformed = |reason: String| match line {
                Some(line) => LedgerError::malformed_line(line, reason),
                None => LedgerError::unavailable(reason),
            };

            let fields = result.map_err(|e| malformed(e.to_string()))?;
            let raw: LedgerRow = fields
                .deserialize(Some(&headers))
                .map_err(|e| malformed(e.to_string()))?;
            if let Some(record) = parse_row(&raw).map_err(malformed)? {
                records.push(record);
            }
        }

        Ok(Ledger { records })
    }

    /// Write the ledger as CSV; the header row is always written.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        wtr.write_record(HEADER)?;
        for record in &self.records {
            wtr.write_record(record.to_row().fields())?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a MovementRecord;
    type IntoIter = std::slice::Iter<'a, MovementRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<MovementRecord> for Ledger {
    fn from_iter<I: IntoIterator<Item = MovementRecord>>(iter: I) -> Self {
        Ledger {
            records: iter.into_iter().collect(),
        }
    }
}

/// Field checks shared by every backend; the error names the bad field.
fn parse_row(raw: &LedgerRow) -> std::result::Result<Option<MovementRecord>, String> {
    if raw.is_blank() {
        return Ok(None);
    }

    let timestamp =
        parse_timestamp(&raw.data).map_err(|e| format!("Data '{}': {e}", raw.data))?;

    if raw.produto.trim().is_empty() {
        return Err("Produto is empty".to_string());
    }

    let kind: MovementKind = raw.tipo.parse().map_err(|e| format!("Tipo: {e}"))?;

    let quantity = if raw.quantidade.trim().is_empty() && kind == MovementKind::Registration {
        0.0
    } else {
        parse_quantity(&raw.quantidade)
            .map_err(|e| format!("Quantidade '{}': {e}", raw.quantidade))?
    };

    Ok(Some(MovementRecord {
        timestamp,
        product: raw.produto.clone(),
        kind,
        quantity,
        note: raw.motivo.clone(),
    }))
}

// ============================================================================
// FORMATTING HELPERS
// ============================================================================

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> std::result::Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT)
}

/// Shortest representation that parses back to the same value
pub fn format_quantity(quantity: f64) -> String {
    quantity.to_string()
}

/// Parse a non-negative finite quantity; `,` is accepted as decimal separator.
pub fn parse_quantity(s: &str) -> std::result::Result<f64, String> {
    let trimmed = s.trim();
    let normalized = if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replace(',', ".")
    } else {
        trimmed.to_string()
    };

    let value: f64 = normalized
        .parse()
        .map_err(|_| "not a number".to_string())?;

    if !value.is_finite() {
        return Err("not a finite number".to_string());
    }
    if value < 0.0 {
        return Err("negative quantity".to_string());
    }
    Ok(value)
}

/// Drop seconds and sub-seconds so timestamps survive the wire format
pub fn truncate_to_minute(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// Current wall-clock time at a fixed UTC offset, minute precision
pub fn local_now(offset: FixedOffset) -> NaiveDateTime {
    local_time(Utc::now(), offset)
}

pub fn local_time(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDateTime {
    truncate_to_minute(instant.with_timezone(&offset).naive_local())
}

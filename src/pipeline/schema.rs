//! Schema normalization: bytes -> raw three-column table.

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, warn};

use crate::constants::REQUIRED_COLUMNS;
use crate::error::{AuditError, Result};

/// A data row restricted to the required columns, values still untyped.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub line: u64,
    pub items: Option<String>,
    pub debit: Option<String>,
    pub credit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Lowercase and trim a header label.
pub fn canonical_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Positions of `items`, `debit`, `credit` in the header row.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    items: usize,
    debit: usize,
    credit: usize,
}

impl ColumnIndex {
    fn resolve(labels: &[String]) -> Result<Self> {
        let position = |name: &str| labels.iter().position(|label| label == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| position(*name).is_none())
            .map(|name| name.to_string())
            .collect();

        match (position("items"), position("debit"), position("credit")) {
            (Some(items), Some(debit), Some(credit)) => Ok(Self { items, debit, credit }),
            _ => {
                warn!(?missing, found = ?labels, "Ledger is missing required columns");
                Err(AuditError::Schema {
                    missing,
                    found: labels.to_vec(),
                })
            }
        }
    }

    fn project(&self, record: &StringRecord, line: u64) -> RawRow {
        let field = |idx: usize| record.get(idx).map(str::to_string);
        RawRow {
            line,
            items: field(self.items),
            debit: field(self.debit),
            credit: field(self.credit),
        }
    }
}

/// Parse uploaded bytes as CSV and keep only the ledger columns.
///
/// Records shorter than the header are padded with missing values; records
/// longer than the header are rejected as malformed.
pub fn normalize(bytes: &[u8]) -> Result<RawTable> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(AuditError::Format("no columns to parse from file".to_string()));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let labels: Vec<String> = reader
        .headers()
        .map_err(|e| AuditError::Format(e.to_string()))?
        .iter()
        .map(canonical_label)
        .collect();
    let width = labels.len();
    let columns = ColumnIndex::resolve(&labels)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| AuditError::Format(e.to_string()))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.len() > width {
            return Err(AuditError::Format(format!(
                "expected {} fields in line {}, saw {}",
                width,
                line,
                record.len()
            )));
        }
        rows.push(columns.project(&record, line));
    }

    debug!(rows = rows.len(), columns = ?labels, "Normalized ledger schema");
    Ok(RawTable { rows })
}

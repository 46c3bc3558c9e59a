//! Row filtering and numeric coercion: raw table -> validated ledger.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::{debug, error};

use crate::constants::{CREDIT_COLUMN, DEBIT_COLUMN, FOOTER_MARKERS, MISSING_AMOUNT_TOKENS};
use crate::domain::{LedgerRow, LedgerTable};
use crate::error::{AuditError, Result};
use crate::pipeline::schema::{RawRow, RawTable};

/// True when the row is a footer/subtotal line or has no description.
pub fn is_non_data_row(items: Option<&str>) -> bool {
    match items.map(str::trim) {
        None | Some("") => true,
        Some(text) => {
            let lowered = text.to_lowercase();
            FOOTER_MARKERS.iter().any(|marker| lowered.contains(marker))
        }
    }
}

/// Coerce one amount cell. Returns `None` for values that are not numbers
/// or are negative.
pub fn parse_amount(raw: Option<&str>) -> Option<Decimal> {
    let cleaned: String = raw.unwrap_or("").replace(',', "");
    let cleaned = cleaned.trim();

    if MISSING_AMOUNT_TOKENS
        .iter()
        .any(|token| cleaned.eq_ignore_ascii_case(token))
    {
        return Some(Decimal::ZERO);
    }

    let value = Decimal::from_str(cleaned)
        .or_else(|_| Decimal::from_scientific(cleaned))
        .ok()?;
    (!value.is_sign_negative() || value.is_zero()).then_some(value.abs())
}

fn amount(row: &RawRow, column: &str, raw: Option<&str>) -> Result<Decimal> {
    parse_amount(raw).ok_or_else(|| {
        let value = raw.unwrap_or("").to_string();
        error!(column, line = row.line, value = %value, "Invalid numeric value in ledger");
        AuditError::Value {
            column: column.to_string(),
            line: row.line,
            items: row.items.clone().unwrap_or_default(),
            value,
        }
    })
}

/// Drop non-data rows and convert amounts. The first bad amount fails the
/// whole table.
pub fn clean(raw: RawTable) -> Result<LedgerTable> {
    let total = raw.len();
    let mut rows = Vec::with_capacity(total);

    for row in &raw.rows {
        if is_non_data_row(row.items.as_deref()) {
            debug!(line = row.line, items = ?row.items, "Skipping non-data row");
            continue;
        }
        let debit = amount(row, DEBIT_COLUMN, row.debit.as_deref())?;
        let credit = amount(row, CREDIT_COLUMN, row.credit.as_deref())?;
        rows.push(LedgerRow {
            items: row.items.clone().unwrap_or_default(),
            debit,
            credit,
            line: row.line,
        });
    }

    debug!(kept = rows.len(), dropped = total - rows.len(), "Cleaned ledger rows");
    Ok(LedgerTable::new(rows))
}

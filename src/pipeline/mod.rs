//! Ledger audit pipeline stages, leaf-first:
//! schema -> cleaning -> balance -> detector -> response.

pub mod balance;
pub mod cleaning;
pub mod detector;
pub mod response;
pub mod schema;
pub mod worker;

use tracing::info;

use crate::domain::LedgerTable;
use crate::error::Result;
use balance::BalanceStatus;

/// A ledger that passed schema and numeric validation.
#[derive(Debug, Clone)]
pub struct ValidatedLedger {
    pub table: LedgerTable,
    pub balance: BalanceStatus,
}

/// Parse, clean and balance-check uploaded bytes. Any error here rejects the
/// whole upload.
pub fn validate(bytes: &[u8]) -> Result<ValidatedLedger> {
    let raw = schema::normalize(bytes)?;
    let table = cleaning::clean(raw)?;
    let balance = balance::check_balance(&table)?;
    info!(
        rows = table.len(),
        balanced = balance.is_balanced,
        "{}",
        balance.message()
    );
    Ok(ValidatedLedger { table, balance })
}

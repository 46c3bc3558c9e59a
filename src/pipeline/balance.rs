use rust_decimal::Decimal;
use tracing::error;

use crate::constants::{CREDIT_COLUMN, DEBIT_COLUMN};
use crate::domain::LedgerTable;
use crate::error::{AuditError, Result};

/// Debits and credits agree when they differ by strictly less than one cent.
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[derive(Debug, Clone, PartialEq)]
pub struct BalanceStatus {
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub is_balanced: bool,
}

impl BalanceStatus {
    pub fn message(&self) -> String {
        let verdict = if self.is_balanced { "Balanced" } else { "Unbalanced" };
        format!(
            "{}: Total Debit = {:.2}, Total Credit = {:.2}",
            verdict, self.total_debit, self.total_credit
        )
    }
}

fn add_amount(total: Decimal, amount: Decimal, column: &str, line: u64) -> Result<Decimal> {
    total.checked_add(amount).ok_or_else(|| {
        error!(column, line, "Ledger total out of range");
        AuditError::Overflow {
            column: column.to_string(),
            line,
        }
    })
}

/// Sum both columns exactly. Totals beyond the `Decimal` range reject the
/// upload.
pub fn check_balance(table: &LedgerTable) -> Result<BalanceStatus> {
    let (total_debit, total_credit) = table.iter().try_fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(debit, credit), row| -> Result<_> {
            Ok((
                add_amount(debit, row.debit, DEBIT_COLUMN, row.line)?,
                add_amount(credit, row.credit, CREDIT_COLUMN, row.line)?,
            ))
        },
    )?;

    // both totals are non-negative, so the difference cannot overflow
    Ok(BalanceStatus {
        total_debit,
        total_credit,
        is_balanced: (total_debit - total_credit).abs() < BALANCE_TOLERANCE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LedgerRow;
    use std::str::FromStr;

    fn table(amounts: &[(&str, &str)]) -> LedgerTable {
        LedgerTable::new(
            amounts
                .iter()
                .enumerate()
                .map(|(i, (debit, credit))| LedgerRow {
                    items: format!("row {i}"),
                    debit: Decimal::from_str(debit).unwrap(),
                    credit: Decimal::from_str(credit).unwrap(),
                    line: i as u64 + 2,
                })
                .collect(),
        )
    }

    #[test]
    fn tolerance_is_one_cent() {
        assert_eq!(BALANCE_TOLERANCE, Decimal::from_str("0.01").unwrap());
    }

    #[test]
    fn equal_totals_are_balanced() {
        let status = check_balance(&table(&[("100", "0"), ("0", "60"), ("0", "40")])).unwrap();
        assert!(status.is_balanced);
        assert_eq!(
            status.message(),
            "Balanced: Total Debit = 100.00, Total Credit = 100.00"
        );
    }

    #[test]
    fn sub_cent_difference_is_balanced() {
        let status = check_balance(&table(&[("100.004", "0"), ("0", "100")])).unwrap();
        assert!(status.is_balanced);
    }

    #[test]
    fn exactly_one_cent_is_unbalanced() {
        let status = check_balance(&table(&[("100.01", "0"), ("0", "100")])).unwrap();
        assert!(!status.is_balanced);
        assert_eq!(
            status.message(),
            "Unbalanced: Total Debit = 100.01, Total Credit = 100.00"
        );
    }

    #[test]
    fn empty_table_is_balanced() {
        let status = check_balance(&LedgerTable::default()).unwrap();
        assert!(status.is_balanced);
        assert_eq!(status.message(), "Balanced: Total Debit = 0.00, Total Credit = 0.00");
    }

    #[test]
    fn totals_up_to_the_decimal_limit_are_exact() {
        let half = "39614081257132168796771975167";
        let near_max = "79228162514264337593543950334";
        let status = check_balance(&table(&[(half, "0"), (half, "0"), ("0", near_max)])).unwrap();
        assert_eq!(status.total_debit, Decimal::from_str(near_max).unwrap());
        assert_eq!(status.total_credit, Decimal::MAX - Decimal::ONE);
        assert!(status.is_balanced);
    }

    #[test]
    fn debit_total_past_the_limit_names_column_and_row() {
        let huge = "50000000000000000000000000000";
        let err = check_balance(&table(&[("1", "0"), (huge, "0"), (huge, "0")])).unwrap_err();
        match &err {
            AuditError::Overflow { column, line } => {
                assert_eq!(column, "debit");
                assert_eq!(*line, 4);
            }
            other => panic!("expected overflow error, got {other:?}"),
        }
        assert!(err.is_client_error());
    }

    #[test]
    fn credit_total_past_the_limit_is_rejected() {
        let max = Decimal::MAX.to_string();
        let err = check_balance(&table(&[("0", max.as_str()), ("0", "1")])).unwrap_err();
        assert!(matches!(err, AuditError::Overflow { ref column, .. } if column == "credit"));
    }
}

//! Significance rules applied on top of the statistical flags.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::domain::{LedgerRow, LedgerTable, ThresholdSet};

use super::DetectorConfig;

/// Percentile of exact amounts with linear interpolation; `quantile` in [0, 1].
pub fn decimal_quantile(values: &[Decimal], quantile: Decimal) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort();
    let quantile = quantile.clamp(Decimal::ZERO, Decimal::ONE);
    let rank = quantile * Decimal::from(sorted.len() - 1);
    let lo = rank.floor();
    let lo_idx = lo.to_usize()?;
    let hi_idx = (lo_idx + 1).min(sorted.len() - 1);
    Some(sorted[lo_idx] + (sorted[hi_idx] - sorted[lo_idx]) * (rank - lo))
}

/// Expected outlier fraction for `row_count` rows. `None` for an empty table,
/// where no model is fitted.
pub fn contamination_rate(row_count: usize, config: &DetectorConfig) -> Option<f64> {
    (row_count > 0).then(|| {
        (config.contamination_rows / row_count as f64).min(config.max_contamination)
    })
}

/// Amount ceiling: the larger of the configured floor and the highest
/// per-column quantile of debits and credits.
pub fn amount_threshold(table: &LedgerTable, config: &DetectorConfig) -> Decimal {
    let debits: Vec<Decimal> = table.iter().map(|r| r.debit).collect();
    let credits: Vec<Decimal> = table.iter().map(|r| r.credit).collect();

    [
        decimal_quantile(&debits, config.amount_quantile),
        decimal_quantile(&credits, config.amount_quantile),
    ]
    .into_iter()
    .flatten()
    .fold(config.amount_floor, Decimal::max)
}

pub fn derive_thresholds(table: &LedgerTable, config: &DetectorConfig) -> Option<ThresholdSet> {
    let contamination_rate = contamination_rate(table.len(), config)?;
    Some(ThresholdSet {
        amount_threshold: amount_threshold(table, config),
        imbalance_threshold: config.imbalance_threshold,
        contamination_rate,
    })
}

/// True when the row carries audit value: an amount above the ceiling, or a
/// large one-sided entry.
pub fn meets_significance_rule(row: &LedgerRow, thresholds: &ThresholdSet) -> bool {
    let ThresholdSet {
        amount_threshold,
        imbalance_threshold,
        ..
    } = thresholds;

    row.debit > *amount_threshold
        || row.credit > *amount_threshold
        || (row.debit > *imbalance_threshold && row.credit.is_zero())
        || (row.credit > *imbalance_threshold && row.debit.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn row(debit: &str, credit: &str) -> LedgerRow {
        LedgerRow {
            items: "entry".to_string(),
            debit: dec(debit),
            credit: dec(credit),
            line: 2,
        }
    }

    fn thresholds(amount: &str) -> ThresholdSet {
        ThresholdSet {
            amount_threshold: dec(amount),
            imbalance_threshold: dec("5000"),
            contamination_rate: 0.05,
        }
    }

    #[test]
    fn quantile_interpolates_between_ranks() {
        let values: Vec<Decimal> = ["0", "0", "100", "200", "15000"]
            .iter()
            .map(|v| dec(v))
            .collect();
        assert_eq!(decimal_quantile(&values, dec("0.95")), Some(dec("12040")));
        assert_eq!(decimal_quantile(&values, dec("0.5")), Some(dec("100")));
        assert_eq!(decimal_quantile(&values, Decimal::ONE), Some(dec("15000")));
        assert_eq!(decimal_quantile(&[dec("7")], dec("0.95")), Some(dec("7")));
        assert_eq!(decimal_quantile(&[], dec("0.95")), None);
    }

    #[test]
    fn contamination_is_capped_and_scales_down() {
        let config = DetectorConfig::default();
        assert_eq!(contamination_rate(0, &config), None);
        assert_eq!(contamination_rate(3, &config), Some(0.05));
        assert_eq!(contamination_rate(200, &config), Some(0.05));
        assert_eq!(contamination_rate(1000, &config), Some(0.01));
    }

    #[test]
    fn amount_threshold_never_drops_below_floor() {
        let config = DetectorConfig::default();
        let small = LedgerTable::new(vec![row("10", "0"), row("0", "10")]);
        assert_eq!(amount_threshold(&small, &config), dec("10000"));
        assert_eq!(amount_threshold(&LedgerTable::default(), &config), dec("10000"));
    }

    #[test]
    fn amount_threshold_uses_the_larger_column_quantile() {
        let config = DetectorConfig::default();
        let table = LedgerTable::new(vec![
            row("20000", "0"),
            row("30000", "0"),
            row("0", "90000"),
            row("0", "100000"),
        ]);
        // credits sorted [0, 0, 90000, 100000]: rank 2.85 -> 98500
        assert_eq!(amount_threshold(&table, &config), dec("98500"));
    }

    #[test]
    fn amount_threshold_is_per_column_not_per_row_maximum() {
        let config = DetectorConfig::default();
        let table = LedgerTable::new(vec![
            row("0", "15000"),
            row("0", "200"),
            row("100", "100"),
            row("200", "0"),
            row("15000", "0"),
        ]);
        // row maxima would give 15000; each column's 0.95 quantile is 12040
        assert_eq!(amount_threshold(&table, &config), dec("12040"));
    }

    #[test]
    fn one_sided_large_amounts_are_significant() {
        let t = thresholds("10000");
        assert!(meets_significance_rule(&row("6000", "0"), &t));
        assert!(meets_significance_rule(&row("0", "6000"), &t));
        assert!(!meets_significance_rule(&row("6000", "1"), &t));
        assert!(!meets_significance_rule(&row("5000", "0"), &t));
    }

    #[test]
    fn amounts_above_threshold_are_significant_even_when_matched() {
        let t = thresholds("10000");
        assert!(meets_significance_rule(&row("12000", "12000"), &t));
        assert!(!meets_significance_rule(&row("10000", "10000"), &t));
    }
}

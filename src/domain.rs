use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One validated transaction line. Both amounts are non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub items: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub debit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub credit: Decimal,
    /// 1-based line in the uploaded file, kept for error context and logs
    #[serde(skip)]
    pub line: u64,
}

impl LedgerRow {
    /// Feature vector used by the statistical stage.
    pub fn features(&self) -> [f64; 2] {
        [
            self.debit.to_f64().unwrap_or(0.0),
            self.credit.to_f64().unwrap_or(0.0),
        ]
    }
}

/// Cleaned ledger in upload order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerTable {
    rows: Vec<LedgerRow>,
}

impl LedgerTable {
    pub fn new(rows: Vec<LedgerRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LedgerRow> {
        self.rows.iter()
    }

    pub fn features(&self) -> Vec<[f64; 2]> {
        self.rows.iter().map(LedgerRow::features).collect()
    }
}

/// Thresholds derived for a single request.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdSet {
    pub amount_threshold: Decimal,
    pub imbalance_threshold: Decimal,
    pub contamination_rate: f64,
}

/// Per-row classifier result.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyRecord {
    pub items: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub statistical_flag: bool,
    pub is_significant: bool,
}

impl AnomalyRecord {
    pub fn to_entry(&self) -> AnomalyEntry {
        AnomalyEntry {
            items: self.items.clone(),
            debit: self.debit,
            credit: self.credit,
        }
    }
}

/// The externally visible projection of a significant anomaly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEntry {
    pub items: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub debit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub credit: Decimal,
}

/// Final payload returned for a successful upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResponse {
    pub balance_status: String,
    pub anomalies: Vec<AnomalyEntry>,
    pub recommendations: String,
}

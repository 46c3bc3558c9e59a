//! Two-stage anomaly detection: an isolation forest marks statistical
//! outliers, then significance rules keep only those with audit value.

pub mod forest;
pub mod rules;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::{AnomalyEntry, AnomalyRecord, LedgerTable, ThresholdSet};

pub use forest::{flag_outliers, ForestParams, IsolationForest};
pub use rules::{derive_thresholds, meets_significance_rule};

/// Model and rule settings for the detector
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Seed for subsampling and split selection
    pub seed: u64,
    pub n_trees: usize,
    /// Per-tree subsample size, capped at the row count
    pub max_samples: usize,
    /// Contamination is `contamination_rows / row_count`, capped at `max_contamination`
    pub contamination_rows: f64,
    pub max_contamination: f64,
    /// Lower bound for the amount threshold
    pub amount_floor: Decimal,
    /// Column quantile that can raise the amount threshold above the floor
    pub amount_quantile: Decimal,
    /// One-sided entries above this are significant
    pub imbalance_threshold: Decimal,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            n_trees: 100,
            max_samples: 256,
            contamination_rows: 10.0,
            max_contamination: 0.05,
            amount_floor: Decimal::from(10_000),
            amount_quantile: Decimal::new(95, 2),
            imbalance_threshold: Decimal::from(5_000),
        }
    }
}

impl DetectorConfig {
    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_trees: self.n_trees,
            max_samples: self.max_samples,
            seed: self.seed,
        }
    }
}

/// Outcome of one detection run. `thresholds` is `None` when the table was
/// empty and no model was fitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    pub thresholds: Option<ThresholdSet>,
    pub records: Vec<AnomalyRecord>,
}

impl Detection {
    pub fn significant(&self) -> Vec<AnomalyEntry> {
        self.records
            .iter()
            .filter(|r| r.is_significant)
            .map(AnomalyRecord::to_entry)
            .collect()
    }

    pub fn significant_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_significant).count()
    }

    pub fn flagged_count(&self) -> usize {
        self.records.iter().filter(|r| r.statistical_flag).count()
    }

    pub fn summary(&self) -> String {
        match self.significant_count() {
            0 => "No significant anomalies detected".to_string(),
            k => format!("{k} significant anomalies detected"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: DetectorConfig,
}

impl AnomalyDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Classify every row of `table`. CPU-bound; run it off the async runtime.
    pub fn detect(&self, table: &LedgerTable) -> Detection {
        let Some(thresholds) = derive_thresholds(table, &self.config) else {
            debug!("Empty ledger, skipping anomaly model");
            return Detection::default();
        };

        let features = table.features();
        let forest = IsolationForest::fit(&features, self.config.forest_params());
        let flags = flag_outliers(&forest.score_all(&features), thresholds.contamination_rate);

        let records: Vec<AnomalyRecord> = table
            .iter()
            .zip(flags)
            .map(|(row, statistical_flag)| AnomalyRecord {
                items: row.items.clone(),
                debit: row.debit,
                credit: row.credit,
                statistical_flag,
                is_significant: statistical_flag && meets_significance_rule(row, &thresholds),
            })
            .collect();

        let detection = Detection {
            thresholds: Some(thresholds),
            records,
        };
        info!(
            rows = table.len(),
            flagged = detection.flagged_count(),
            significant = detection.significant_count(),
            "Anomaly detection finished"
        );
        detection
    }
}

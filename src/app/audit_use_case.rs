use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::app::ports::RecommendationPort;
use crate::app::recommendations::ensure_bullets;
use crate::constants::has_allowed_extension;
use crate::domain::AuditResponse;
use crate::error::{AuditError, Result};
use crate::pipeline::detector::{AnomalyDetector, Detection};
use crate::pipeline::worker::FitPool;
use crate::pipeline::{self, response, ValidatedLedger};

/// Result of one upload: the response payload plus detection details used
/// for logging and the CLI.
#[derive(Debug, Clone)]
pub struct AuditReport {
    pub response: AuditResponse,
    pub summary: String,
    pub rows: usize,
}

/// Runs the full audit for one uploaded ledger.
pub struct AuditService {
    detector: AnomalyDetector,
    pool: FitPool,
    recommender: Arc<dyn RecommendationPort>,
}

impl AuditService {
    pub fn new(
        detector: AnomalyDetector,
        pool: FitPool,
        recommender: Arc<dyn RecommendationPort>,
    ) -> Self {
        Self {
            detector,
            pool,
            recommender,
        }
    }

    #[instrument(skip(self, bytes), fields(request_id = %Uuid::new_v4(), size = bytes.len()))]
    pub async fn audit(&self, file_name: &str, bytes: &[u8]) -> Result<AuditReport> {
        if !has_allowed_extension(file_name) {
            return Err(AuditError::UnsupportedFile {
                file_name: file_name.to_string(),
            });
        }

        let ValidatedLedger { table, balance } = pipeline::validate(bytes)?;
        let rows = table.len();

        let detection = if table.is_empty() {
            Detection::default()
        } else {
            let detector = self.detector.clone();
            self.pool.run(move || detector.detect(&table)).await?
        };

        let anomalies = detection.significant();
        let summary = detection.summary();
        info!(anomalies = ?anomalies, "{}", summary);

        let recommendations = self
            .recommender
            .recommend(&anomalies)
            .await
            .map(|text| ensure_bullets(&text));

        Ok(AuditReport {
            response: response::assemble(&balance, anomalies, recommendations),
            summary,
            rows,
        })
    }
}

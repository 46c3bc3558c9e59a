use async_trait::async_trait;

use crate::domain::AnomalyEntry;
use crate::error::Result;

/// Source of audit guidance for a set of significant anomalies.
///
/// Implementations return `AuditError::Config` when they cannot be used at
/// all (for example a missing credential) and `AuditError::ExternalService`
/// when a call fails or times out.
#[async_trait]
pub trait RecommendationPort: Send + Sync {
    async fn recommend(&self, anomalies: &[AnomalyEntry]) -> Result<String>;
}

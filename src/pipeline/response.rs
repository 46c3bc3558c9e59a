use tracing::warn;

use crate::domain::{AnomalyEntry, AuditResponse};
use crate::error::{AuditError, Result};
use crate::pipeline::balance::BalanceStatus;

/// Text placed in the recommendations field when the advisory step failed.
pub fn degraded_recommendation(err: &AuditError) -> String {
    match err {
        AuditError::Config(message) => format!("Error: {message}"),
        AuditError::ExternalService(message) => format!("AI error: {message}"),
        other => format!("AI error: {other}"),
    }
}

/// Build the response payload. A failed recommendation only degrades the
/// recommendations field.
pub fn assemble(
    balance: &BalanceStatus,
    anomalies: Vec<AnomalyEntry>,
    recommendations: Result<String>,
) -> AuditResponse {
    let recommendations = recommendations.unwrap_or_else(|e| {
        warn!("Recommendations unavailable: {}", e);
        degraded_recommendation(&e)
    });

    AuditResponse {
        balance_status: balance.message(),
        anomalies,
        recommendations,
    }
}

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use ledger_audit::app::{AuditService, RecommendationPort};
use ledger_audit::domain::AnomalyEntry;
use ledger_audit::error::{AuditError, Result};
use ledger_audit::pipeline::detector::AnomalyDetector;
use ledger_audit::pipeline::worker::FitPool;

pub const BOUNDARY: &str = "ledger-audit-test-boundary";

pub const BALANCED_CSV: &str = "items,debit,credit\n\
    Rent,500,0\n\
    Cash,0,300\n\
    Bank,0,200\n";

pub const LAND_PURCHASE_CSV: &str = "Items , Debit , Credit\n\
    Cash sales,\"1,200\",0\n\
    Sales revenue,0,\"1,200\"\n\
    Office supplies,350,\n\
    Cash,,350\n\
    Utilities,480,0\n\
    Bank,0,480\n\
    Land purchase,\"15,000\",0\n\
    Accrual basis Tuesday,,\n\
    Total,\"17,030\",\"2,030\"\n";

/// What the stub recommender answers with
pub enum StubReply {
    Text(&'static str),
    MissingKey,
    Unavailable,
}

pub struct StubRecommender {
    reply: StubReply,
    pub calls: AtomicUsize,
    pub last_anomaly_count: AtomicUsize,
}

impl StubRecommender {
    pub fn new(reply: StubReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            last_anomaly_count: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecommendationPort for StubRecommender {
    async fn recommend(&self, anomalies: &[AnomalyEntry]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_anomaly_count
            .store(anomalies.len(), Ordering::SeqCst);
        match &self.reply {
            StubReply::Text(text) => Ok(text.to_string()),
            StubReply::MissingKey => Err(AuditError::Config("GEMINI_API_KEY not set".to_string())),
            StubReply::Unavailable => Err(AuditError::ExternalService(
                "service returned 503 Service Unavailable: overloaded".to_string(),
            )),
        }
    }
}

pub fn service_with(recommender: Arc<StubRecommender>) -> AuditService {
    AuditService::new(AnomalyDetector::default(), FitPool::new(2), recommender)
}

/// Encode a single `file` part as multipart/form-data.
pub fn multipart_body(file_name: &str, content: &str) -> Vec<u8> {
    format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {content}\r\n\
         --{BOUNDARY}--\r\n"
    )
    .into_bytes()
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

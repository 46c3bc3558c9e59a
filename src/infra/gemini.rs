use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::app::ports::RecommendationPort;
use crate::app::recommendations::build_prompt;
use crate::config::RecommendationConfig;
use crate::constants::GEMINI_API_KEY_ENV;
use crate::domain::AnomalyEntry;
use crate::error::{AuditError, Result};

const API_KEY_HEADER: &str = "x-goog-api-key";
const MAX_ERROR_BODY: usize = 300;

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    pub fn from_prompt(prompt: String) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: Some(prompt) }],
            }],
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, or `None` when it is empty.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Recommendation client for the Gemini `generateContent` endpoint.
pub struct GeminiRecommender {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
    max_retries: u32,
    retry_backoff: Duration,
}

impl GeminiRecommender {
    pub fn new(config: &RecommendationConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds.max(1));
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            timeout,
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    async fn generate(&self, api_key: &str, request: &GenerateContentRequest) -> Result<String> {
        let call = async {
            let resp = self
                .client
                .post(self.endpoint())
                .header(API_KEY_HEADER, api_key)
                .json(request)
                .send()
                .await
                .map_err(|e| AuditError::ExternalService(e.to_string()))?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                let body: String = body.chars().take(MAX_ERROR_BODY).collect();
                return Err(AuditError::ExternalService(format!(
                    "service returned {}: {}",
                    status, body
                )));
            }

            let parsed: GenerateContentResponse = resp
                .json()
                .await
                .map_err(|e| AuditError::ExternalService(format!("malformed response: {}", e)))?;
            parsed
                .text()
                .ok_or_else(|| AuditError::ExternalService("empty response".to_string()))
        };

        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| {
                AuditError::ExternalService(format!(
                    "request timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
    }
}

#[async_trait]
impl RecommendationPort for GeminiRecommender {
    async fn recommend(&self, anomalies: &[AnomalyEntry]) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AuditError::Config(format!("{} not set", GEMINI_API_KEY_ENV)))?;

        let request = GenerateContentRequest::from_prompt(build_prompt(anomalies)?);

        let mut attempt = 0;
        loop {
            match self.generate(api_key, &request).await {
                Ok(text) => {
                    info!(attempt, chars = text.len(), "Generated recommendations");
                    debug!("Recommendations: {}", text);
                    return Ok(text);
                }
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(attempt, "Recommendation call failed, retrying: {}", e);
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

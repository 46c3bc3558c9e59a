use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::constants::GEMINI_API_KEY_ENV;
use crate::error::{AuditError, Result};
use crate::pipeline::detector::DetectorConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub detector: DetectorConfig,
    pub recommendations: RecommendationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Origins allowed by CORS; credentials are allowed for these.
    pub allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
    /// Concurrent model fits; defaults to the number of cores.
    pub fit_workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "https://tathmini-ai.netlify.app".to_string(),
            ],
            max_upload_bytes: 10 * 1024 * 1024,
            fit_workers: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
    /// Extra attempts after a failed call
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    /// Never read from the file; supplied through the environment.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            timeout_seconds: 30,
            max_retries: 1,
            retry_backoff_ms: 500,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directive used when `RUST_LOG` is unset
    pub filter: String,
    /// When set, JSON logs are also written to a daily rolling file here
    pub file_dir: Option<String>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "ledger_audit=info".to_string(),
            file_dir: None,
            file_prefix: "ledger_audit.log".to_string(),
        }
    }
}

impl Config {
    /// Load from `path`. A missing file yields the defaults; a file that
    /// exists but cannot be read or parsed is an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                AuditError::Config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            Self::from_toml_str(&content)?
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `GEMINI_API_KEY` and `PORT` using `lookup` for values. Blank
    /// values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_blank(GEMINI_API_KEY_ENV) {
            self.recommendations.api_key = Some(key.trim().to_string());
        }
        if let Some(port) = non_blank("PORT").and_then(|p| p.trim().parse().ok()) {
            self.server.port = port;
        }
    }
}

use thiserror::Error;

use crate::constants::REQUIRED_COLUMNS;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Only CSV files are allowed (got '{file_name}')")]
    UnsupportedFile { file_name: String },

    #[error("Invalid CSV format: {0}")]
    Format(String),

    #[error("CSV must have columns: {} (found: {})", REQUIRED_COLUMNS.join(", "), found.join(", "))]
    Schema { missing: Vec<String>, found: Vec<String> },

    #[error("Invalid numeric values in {column}: '{value}' at line {line} (items: '{items}')")]
    Value {
        column: String,
        line: u64,
        items: String,
        value: String,
    },

    #[error("Total of {column} exceeds the supported range at line {line}")]
    Overflow { column: String, line: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Recommendation service error: {0}")]
    ExternalService(String),

    #[error("Worker task failed: {0}")]
    Worker(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuditError {
    /// Errors caused by the uploaded file itself. These abort the pipeline and
    /// are reported back to the caller as a client error.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AuditError::UnsupportedFile { .. }
                | AuditError::Format(_)
                | AuditError::Schema { .. }
                | AuditError::Value { .. }
                | AuditError::Overflow { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;

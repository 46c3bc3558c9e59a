//! Ledger schema and cleaning constants shared across the pipeline stages.

// Canonical (lowercased, trimmed) column names, in output order
pub const ITEMS_COLUMN: &str = "items";
pub const DEBIT_COLUMN: &str = "debit";
pub const CREDIT_COLUMN: &str = "credit";
pub const REQUIRED_COLUMNS: [&str; 3] = [ITEMS_COLUMN, DEBIT_COLUMN, CREDIT_COLUMN];

/// Phrases marking report footers and subtotal lines. Matched as
/// case-insensitive substrings of the `items` column.
pub const FOOTER_MARKERS: [&str; 2] = ["accrual basis", "total"];

/// Amount tokens that mean "no value" and are read as zero.
pub const MISSING_AMOUNT_TOKENS: [&str; 2] = ["", "nan"];

/// Accepted upload extensions (compared case-insensitively, without the dot)
pub const ALLOWED_EXTENSIONS: [&str; 1] = ["csv"];

/// Multipart form field carrying the ledger file
pub const UPLOAD_FIELD: &str = "file";

pub const SERVICE_NAME: &str = "ledger-audit";

/// Environment variable holding the recommendation service credential
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Returns true when `file_name` ends in one of the accepted extensions.
pub fn has_allowed_extension(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(stem, ext)| {
            !stem.is_empty()
                && ALLOWED_EXTENSIONS
                    .iter()
                    .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

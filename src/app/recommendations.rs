use crate::domain::AnomalyEntry;
use crate::error::Result;

/// Prompt sent to the text-generation service. The anomaly list is embedded
/// as JSON so amounts keep their exact values.
pub fn build_prompt(anomalies: &[AnomalyEntry]) -> Result<String> {
    let records = serde_json::to_string(anomalies)?;
    Ok(format!(
        "Analyze these significant financial anomalies from a CSV (items, debit, credit):\n\
         {records}\n\
         Provide 5-8 concise audit recommendations (each 100-150 characters) \
         in Markdown bullet points, focusing on high-value transactions or imbalances. \
         Ensure clear, actionable steps.\n\
         Example:\n\
         - Verify land transaction documentation for compliance and authorization.\n\
         - Check foreign currency account for accurate exchange rate application."
    ))
}

const BULLET_MARKERS: [char; 3] = ['-', '*', '•'];

/// Drop one list marker when it is followed by whitespace. `**bold**` and
/// `-5%` are content, not markers.
fn strip_bullet_marker(line: &str) -> &str {
    line.strip_prefix(BULLET_MARKERS)
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .map_or(line, str::trim_start)
}

/// Guarantee a markdown bullet list. Text already starting with `- ` is kept
/// as is; otherwise every non-empty line becomes a `- ` bullet.
pub fn ensure_bullets(text: &str) -> String {
    let text = text.trim();
    if text.starts_with("- ") {
        return text.to_string();
    }

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("- {}", strip_bullet_marker(line)))
        .collect::<Vec<_>>()
        .join("\n")
}

use serde_json::Value;
use voynich_analysis::LogEntry;

const PROMPT_PREVIEW_CHARS: usize = 200;

/// Render the most recent log entries for terminal display,
/// newest first
#[must_use]
pub fn render_responses(entries: &[LogEntry]) -> String {
    if entries.is_empty() {
        return "No responses found.".to_string();
    }

    let mut out = format!(
        "Showing {} most recent responses:\n{}",
        entries.len(),
        "-".repeat(60)
    );
    for (i, entry) in entries.iter().enumerate() {
        let preview: String = entry
            .prompt
            .chars()
            .take(PROMPT_PREVIEW_CHARS)
            .map(|c| if c == '\n' { ' ' } else { c })
            .collect();
        out.push_str(&format!("\n\n=== Response #{} ===\n", i + 1));
        out.push_str(&format!("Prompt (preview): {preview} ...\n"));
        out.push_str("Response:\n");
        match &entry.response {
            Value::Object(map) => {
                for (key, value) in map {
                    out.push_str(&format!("  {key}: {value}\n"));
                }
            }
            other => out.push_str(&format!("{other}\n")),
        }
    }
    out
}

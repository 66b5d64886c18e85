//! Strips a markdown code fence from a generator response, since models are
//! routinely prompted for SQL but answer in a fenced block anyway.

/// Removes a leading/trailing triple-backtick fence (optionally tagged
/// `sql`) around `text`, leaving the inner content trimmed. Text with no
/// fence passes through unchanged.
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let without_leading = trimmed.trim_start_matches("```");
    let without_leading = without_leading
        .strip_prefix("sql")
        .or_else(|| without_leading.strip_prefix("SQL"))
        .unwrap_or(without_leading);
    let without_leading = without_leading.trim_start_matches('\n');

    match without_leading.rfind("```") {
        Some(idx) => without_leading[..idx].trim().to_string(),
        None => without_leading.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_unfenced_text() {
        assert_eq!(strip_code_fence("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn strips_tagged_fence() {
        let fenced = "```sql\nSELECT 1 FROM orders\n```";
        assert_eq!(strip_code_fence(fenced), "SELECT 1 FROM orders");
    }

    #[test]
    fn strips_untagged_fence() {
        let fenced = "```\nSELECT 1\n```";
        assert_eq!(strip_code_fence(fenced), "SELECT 1");
    }

    #[test]
    fn strips_fence_with_surrounding_whitespace() {
        let fenced = "  \n```sql\nSELECT 1\n```\n  ";
        assert_eq!(strip_code_fence(fenced), "SELECT 1");
    }
}

//! Prompt construction for roster generation.
//!
//! A pure function: the same template, roster and availability always
//! produce the same prompt. The template itself is an external, versioned
//! artifact loaded at startup (see `GenerationSettings::prompt_path`).

use serde_json::Value;

/// Fallback instruction template used when the configured prompt file is
/// missing. Kept intentionally close to the shipped artifact so a broken
/// deployment still produces parseable output.
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"You are a staff rostering assistant.

Given the roster details and the available staff data below, assign staff to
shifts for every date in the roster range. Respect each person's available
time bands (AM, PM, Night) and their minimum and maximum weekly hours.

Respond with ONLY a JSON array of shift objects, no prose. Each object must
have exactly these fields:
"rosterId" (integer), "userId" (integer), "shiftType" ("AM", "PM" or "NA"),
"date" ("YYYY-MM-DD"), "startTime" ("HH:MM:SS"), "finishTime" ("HH:MM:SS"),
"hours" (number, at most 2 decimal places).
"#;

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Composes the full prompt: static template, then the roster descriptor
/// and availability payload as pretty-printed JSON.
pub fn build_prompt(template: &str, roster: &Value, availability: &Value) -> String {
    format!(
        "{}\n\nCurrent Roster Details:\n{}\n\nAvailable Staff Data:\n{}\n",
        template.trim_end(),
        pretty(roster),
        pretty(availability),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prompt_is_deterministic() {
        let roster = json!({"id": 1, "startDate": "2024-03-04", "endDate": "2024-03-10"});
        let availability = json!([{"userId": 2, "date": "2024-03-04", "isAvailableAM": true}]);

        let a = build_prompt("Template text.", &roster, &availability);
        let b = build_prompt("Template text.", &roster, &availability);
        assert_eq!(a, b);
    }

    #[test]
    fn test_prompt_contains_template_and_both_payloads() {
        let roster = json!({"id": 7});
        let availability = json!([{"userId": 9}]);

        let prompt = build_prompt("Assign the shifts.", &roster, &availability);
        assert!(prompt.starts_with("Assign the shifts."));
        assert!(prompt.contains("Current Roster Details:"));
        assert!(prompt.contains("\"id\": 7"));
        assert!(prompt.contains("Available Staff Data:"));
        assert!(prompt.contains("\"userId\": 9"));
    }
}

//! Response cleanup and validation for AI backend output
//!
//! Model responses are untrusted text: they may wrap the JSON payload in
//! Markdown code fences, omit fields, or invent values outside the expected
//! sets. These helpers strip the incidental formatting and normalize each
//! field against explicit defaults before anything reaches the caller.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{Category, Insight, InsightKind};

/// An insight as the model returned it, before validation
///
/// Every field is optional. The model is asked for a specific shape but is
/// never trusted to produce it.
#[derive(Debug, Deserialize)]
pub struct RawInsight {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub action: Option<String>,
    pub confidence: Option<f64>,
}

/// Strip leading/trailing Markdown code fences from a model response
///
/// Handles a leading ``` optionally followed by a `json` language tag, and a
/// trailing ```. Text without fences passes through trimmed.
pub fn strip_code_fences(response: &str) -> &str {
    let mut cleaned = response.trim();

    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest.trim_start();
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest.trim_start();
    }

    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest.trim_end();
    }

    cleaned
}

/// Parse an insight array from a model response
///
/// The response is trimmed and stripped of code fences before being parsed
/// as a JSON array of partially-known objects.
pub fn parse_insight_array(response: &str) -> Result<Vec<RawInsight>> {
    let cleaned = strip_code_fences(response);

    serde_json::from_str(cleaned).map_err(|e| {
        // Truncate long responses for the error message, on a char boundary:
        // model output is arbitrary UTF-8 and must not panic the error path
        let truncated = if cleaned.len() > 200 {
            format!("{}...", cleaned.chars().take(200).collect::<String>())
        } else {
            cleaned.to_string()
        };
        Error::InvalidData(format!("Invalid insight JSON from AI: {} | Raw: {}", e, truncated))
    })
}

/// Normalize a raw insight into a fully-populated one
///
/// Defaults: kind=info, title="AI Insight", message="Analysis complete",
/// confidence=0.8. Unknown kind strings collapse to info, confidence is
/// clamped into [0, 1], and the action passes through unmodified.
pub fn normalize_insight(raw: RawInsight, id: String) -> Insight {
    let kind = raw
        .kind
        .and_then(|k| k.parse::<InsightKind>().ok())
        .unwrap_or_default();

    Insight {
        id,
        kind,
        title: raw.title.unwrap_or_else(|| "AI Insight".to_string()),
        message: raw.message.unwrap_or_else(|| "Analysis complete".to_string()),
        action: raw.action,
        confidence: raw.confidence.unwrap_or(0.8).clamp(0.0, 1.0),
    }
}

/// Parse a category label from a model response
///
/// The trimmed response is compared exactly (case-sensitively) against the
/// fixed label set; any deviation yields `Other`. This covers both
/// malformed/extra-text responses and legitimate novel categories the model
/// might invent.
pub fn parse_category(response: &str) -> Category {
    response.trim().parse().unwrap_or(Category::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fence() {
        let response = "```json\n[{\"type\":\"tip\"}]\n```";
        assert_eq!(strip_code_fences(response), "[{\"type\":\"tip\"}]");
    }

    #[test]
    fn test_strip_bare_fence() {
        let response = "```\n[]\n```";
        assert_eq!(strip_code_fences(response), "[]");
    }

    #[test]
    fn test_strip_no_fence() {
        assert_eq!(strip_code_fences("  [1, 2]  "), "[1, 2]");
    }

    #[test]
    fn test_parse_insight_array() {
        let response = r#"[{"type":"tip","title":"T","message":"M","confidence":0.9}]"#;
        let raws = parse_insight_array(response).unwrap();
        assert_eq!(raws.len(), 1);
        assert_eq!(raws[0].kind.as_deref(), Some("tip"));
        assert_eq!(raws[0].confidence, Some(0.9));
    }

    #[test]
    fn test_parse_insight_array_fenced() {
        let response = "```json\n[{\"type\":\"tip\",\"title\":\"T\",\"message\":\"M\",\"confidence\":0.9}]\n```";
        let raws = parse_insight_array(response).unwrap();
        assert_eq!(raws.len(), 1);
        assert_eq!(raws[0].title.as_deref(), Some("T"));
    }

    #[test]
    fn test_parse_insight_array_rejects_non_json() {
        assert!(parse_insight_array("I could not produce insights.").is_err());
        assert!(parse_insight_array("{\"type\":\"tip\"}").is_err());
    }

    #[test]
    fn test_parse_insight_array_long_multibyte_response() {
        // 300 bytes of 3-byte chars: byte 200 is not a char boundary, so the
        // error-message truncation must not slice mid-character
        let response = "あ".repeat(100);
        let err = parse_insight_array(&response).unwrap_err();
        assert!(err.to_string().contains("Invalid insight JSON"));
    }

    #[test]
    fn test_normalize_empty_object_applies_defaults() {
        let raws = parse_insight_array("[{}]").unwrap();
        let insight = normalize_insight(raws.into_iter().next().unwrap(), "ai-1-0".to_string());
        assert_eq!(insight.kind, InsightKind::Info);
        assert_eq!(insight.title, "AI Insight");
        assert_eq!(insight.message, "Analysis complete");
        assert_eq!(insight.confidence, 0.8);
        assert!(insight.action.is_none());
    }

    #[test]
    fn test_normalize_unknown_kind_collapses_to_info() {
        let raws = parse_insight_array(r#"[{"type":"celebration"}]"#).unwrap();
        let insight = normalize_insight(raws.into_iter().next().unwrap(), "ai-1-0".to_string());
        assert_eq!(insight.kind, InsightKind::Info);
    }

    #[test]
    fn test_normalize_clamps_confidence() {
        let raws = parse_insight_array(r#"[{"confidence":1.7},{"confidence":-0.2}]"#).unwrap();
        let mut iter = raws.into_iter();
        let high = normalize_insight(iter.next().unwrap(), "ai-1-0".to_string());
        let low = normalize_insight(iter.next().unwrap(), "ai-1-1".to_string());
        assert_eq!(high.confidence, 1.0);
        assert_eq!(low.confidence, 0.0);
    }

    #[test]
    fn test_parse_category_exact() {
        assert_eq!(parse_category("Food"), Category::Food);
        assert_eq!(parse_category("  Healthcare \n"), Category::Healthcare);
    }

    #[test]
    fn test_parse_category_unknown_is_other() {
        assert_eq!(parse_category("Groceries"), Category::Other);
        assert_eq!(parse_category("food"), Category::Other);
        assert_eq!(parse_category("The category is Food."), Category::Other);
        assert_eq!(parse_category(""), Category::Other);
    }
}

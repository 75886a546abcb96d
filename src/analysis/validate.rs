//! Response validation.
//!
//! Structured output is never trusted: it is checked field by field and
//! anything that doesn't fit becomes a fallback result carrying the raw text.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::engine::EngineResponse;
use super::error::AnalysisError;
use super::types::{
    AnalysisResult, ComplianceLevel, Effort, FallbackResult, Priority, RawTextResult,
    RemediationItem, StructuredResult,
};

pub const FALLBACK_NOTE: &str =
    "The analysis could not be read as a structured result. The raw engine output is shown instead.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    overall_score: Value,
    compliance_level: String,
    summary: String,
    action_items: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    id: String,
    title: String,
    description: String,
    priority: String,
    effort: String,
    timeline: String,
    controls: Vec<String>,
}

/// Strip a surrounding markdown code fence (```` ```json ... ``` ````).
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        // Single-line fence: drop the language tag.
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Split comma- or semicolon-grouped controls into separate identifiers,
/// dropping blanks and duplicates while keeping order.
pub fn split_controls<S: AsRef<str>>(controls: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    controls
        .iter()
        .flat_map(|c| c.as_ref().split([',', ';']))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty() && seen.insert(c.clone()))
        .collect()
}

fn parse_score(value: &Value) -> Result<u8, String> {
    let score = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        _ => None,
    }
    .ok_or_else(|| format!("overallScore must be an integer, got {}", value))?;

    if !(0..=100).contains(&score) {
        return Err(format!("overallScore {} is outside 0-100", score));
    }
    Ok(score as u8)
}

fn require_text(field: &str, value: String, item: usize) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("action item {} has an empty {}", item + 1, field));
    }
    Ok(trimmed.to_string())
}

fn convert_item(index: usize, raw: RawItem) -> Result<RemediationItem, String> {
    let priority = Priority::parse(&raw.priority).ok_or_else(|| {
        format!("action item {} has invalid priority '{}'", index + 1, raw.priority)
    })?;
    let effort = Effort::parse(&raw.effort)
        .ok_or_else(|| format!("action item {} has invalid effort '{}'", index + 1, raw.effort))?;

    Ok(RemediationItem {
        id: require_text("id", raw.id, index)?,
        title: require_text("title", raw.title, index)?,
        description: require_text("description", raw.description, index)?,
        priority,
        effort,
        timeline: require_text("timeline", raw.timeline, index)?,
        controls: split_controls(&raw.controls),
    })
}

/// Validate a JSON value against the structured result contract.
pub fn validate_structured(value: &Value) -> Result<StructuredResult, String> {
    let raw = RawAnalysis::deserialize(value).map_err(|e| e.to_string())?;

    let overall_score = parse_score(&raw.overall_score)?;
    let compliance_level = ComplianceLevel::parse_assessed(&raw.compliance_level)
        .ok_or_else(|| format!("invalid complianceLevel '{}'", raw.compliance_level))?;

    let mut ids = HashSet::new();
    let mut action_items = Vec::with_capacity(raw.action_items.len());
    for (index, raw_item) in raw.action_items.into_iter().enumerate() {
        let item = convert_item(index, raw_item)?;
        if !ids.insert(item.id.clone()) {
            return Err(format!("duplicate action item id '{}'", item.id));
        }
        action_items.push(item);
    }

    Ok(StructuredResult {
        overall_score,
        compliance_level,
        summary: raw.summary.trim().to_string(),
        action_items,
    })
}

fn fallback(reason: &str, raw_text: String) -> AnalysisResult {
    warn!("Structured analysis failed validation: {}", reason);
    AnalysisResult::Fallback(FallbackResult::new(FALLBACK_NOTE, raw_text))
}

/// Turn an engine response into an analysis result.
///
/// With `expects_structure`, the response must validate as a structured
/// result or it degrades to a fallback. Without it, text is returned as-is.
/// Only an empty response is an error.
pub fn validate_response(
    response: EngineResponse,
    expects_structure: bool,
) -> Result<AnalysisResult, AnalysisError> {
    match response {
        EngineResponse::Structured(value) => {
            if value.is_null() {
                return Err(AnalysisError::MalformedResponse(
                    "engine returned no content".to_string(),
                ));
            }
            match validate_structured(&value) {
                Ok(result) => Ok(AnalysisResult::Structured(result)),
                Err(reason) => {
                    let raw = serde_json::to_string_pretty(&value)
                        .unwrap_or_else(|_| value.to_string());
                    Ok(fallback(&reason, raw))
                }
            }
        }
        EngineResponse::Text(text) => {
            if text.trim().is_empty() {
                return Err(AnalysisError::MalformedResponse(
                    "engine returned an empty response".to_string(),
                ));
            }
            if !expects_structure {
                return Ok(AnalysisResult::RawText(RawTextResult {
                    text: text.trim().to_string(),
                }));
            }

            let body = strip_code_fence(&text);
            let parsed = match serde_json::from_str::<Value>(body) {
                Ok(value) => value,
                Err(e) => {
                    debug!("Engine text is not JSON: {}", e);
                    return Ok(fallback(&format!("response is not JSON: {}", e), text));
                }
            };
            match validate_structured(&parsed) {
                Ok(result) => Ok(AnalysisResult::Structured(result)),
                Err(reason) => Ok(fallback(&reason, text)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::error::AnalysisErrorKind;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "overallScore": 64,
            "complianceLevel": "Fair",
            "summary": "Password rules exist but **MFA** is optional.",
            "actionItems": [
                {
                    "id": "1",
                    "title": "Require MFA",
                    "description": "Make MFA mandatory for remote and privileged access.",
                    "priority": "High",
                    "effort": "Medium",
                    "timeline": "30 days",
                    "controls": ["NIST-3.5.3, ISO-27001-A.9.2.3"]
                },
                {
                    "id": "2",
                    "title": "Annual review",
                    "description": "Review the policy every year.",
                    "priority": "low",
                    "effort": "LOW",
                    "timeline": "90 days",
                    "controls": []
                }
            ]
        })
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```  "), "{}");
        assert_eq!(strip_code_fence("```json {\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_split_controls() {
        let split = split_controls(&["NIST-3.5.3, ISO-27001-A.9.2.3", "NIST-3.5.3", " ", "CIS-6;CIS-7"]);
        assert_eq!(split, vec!["NIST-3.5.3", "ISO-27001-A.9.2.3", "CIS-6", "CIS-7"]);
    }

    #[test]
    fn test_valid_structured_response() {
        let result = validate_response(EngineResponse::Structured(sample()), true).unwrap();
        let AnalysisResult::Structured(result) = result else {
            panic!("expected structured result");
        };
        assert_eq!(result.overall_score, 64);
        assert_eq!(result.compliance_level, ComplianceLevel::Fair);
        assert_eq!(result.action_items.len(), 2);
        assert_eq!(result.action_items[0].controls, vec!["NIST-3.5.3", "ISO-27001-A.9.2.3"]);
        assert_eq!(result.action_items[1].priority, Priority::Low);
        assert_eq!(result.action_items[1].effort, Effort::Low);
    }

    #[test]
    fn test_fenced_text_parses_same_as_structured() {
        let fenced = format!("```json\n{}\n```", serde_json::to_string_pretty(&sample()).unwrap());
        let from_text = validate_response(EngineResponse::Text(fenced), true).unwrap();
        let from_json = validate_response(EngineResponse::Structured(sample()), true).unwrap();
        assert_eq!(from_text, from_json);
    }

    #[test]
    fn test_out_of_range_score_falls_back() {
        let mut value = sample();
        value["overallScore"] = json!(140);
        let result = validate_response(EngineResponse::Structured(value), true).unwrap();
        let AnalysisResult::Fallback(fallback) = result else {
            panic!("expected fallback");
        };
        assert_eq!(fallback.overall_score, 0);
        assert_eq!(fallback.compliance_level, ComplianceLevel::Unknown);
        assert!(fallback.action_items.is_empty());
        assert!(fallback.raw_text.contains("140"));
    }

    #[test]
    fn test_missing_item_field_falls_back() {
        let mut value = sample();
        value["actionItems"][0].as_object_mut().unwrap().remove("timeline");
        let result = validate_response(EngineResponse::Structured(value), true).unwrap();
        assert!(matches!(result, AnalysisResult::Fallback(_)));
    }

    #[test]
    fn test_invalid_enum_and_duplicate_ids_fall_back() {
        let mut value = sample();
        value["complianceLevel"] = json!("Unknown");
        assert!(validate_structured(&value).is_err());

        let mut value = sample();
        value["actionItems"][0]["priority"] = json!("Urgent");
        assert!(validate_structured(&value).is_err());

        let mut value = sample();
        value["actionItems"][1]["id"] = json!("1");
        let err = validate_structured(&value).unwrap_err();
        assert!(err.contains("duplicate"));
    }

    #[test]
    fn test_prose_falls_back_with_raw_text() {
        let text = "I'm sorry, here's my analysis: the policy is decent.".to_string();
        let result = validate_response(EngineResponse::Text(text.clone()), true).unwrap();
        let AnalysisResult::Fallback(fallback) = result else {
            panic!("expected fallback");
        };
        assert_eq!(fallback.raw_text, text);
        assert_eq!(fallback.note, FALLBACK_NOTE);
    }

    #[test]
    fn test_free_form_variant_returns_raw_text() {
        let result =
            validate_response(EngineResponse::Text("## Summary\nGood.".into()), false).unwrap();
        assert_eq!(
            result,
            AnalysisResult::RawText(RawTextResult {
                text: "## Summary\nGood.".into()
            })
        );
    }

    #[test]
    fn test_empty_response_is_malformed() {
        let err = validate_response(EngineResponse::Text("  ".into()), true).unwrap_err();
        assert_eq!(err.kind(), AnalysisErrorKind::MalformedResponse);

        let err = validate_response(EngineResponse::Structured(Value::Null), true).unwrap_err();
        assert_eq!(err.kind(), AnalysisErrorKind::MalformedResponse);
    }
}

//! Strict parsing of the auxiliary model's decision.
//!
//! The model returns loosely structured text. Anything that does not contain a
//! JSON object with a boolean `requires_capabilities` and a known `confidence`
//! is rejected; the classifier turns rejections into the fail-safe decision.

use super::Confidence;
use serde::Deserialize;
use std::str::FromStr;
use thiserror::Error;

/// Why an auxiliary response could not be turned into a decision.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("no JSON object in classifier output")]
    NoJsonObject,

    #[error("malformed classifier output: {0}")]
    Malformed(String),

    #[error("invalid value for '{field}': {message}")]
    InvalidField { field: String, message: String },
}

/// A validated decision, before timing and source are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDecision {
    pub requires_capabilities: bool,
    pub confidence: Confidence,
    pub rationale: String,
    pub suggested_capability_names: Vec<String>,
}

#[derive(Deserialize)]
struct RawDecision {
    #[serde(alias = "requires_tools", alias = "requiresCapabilities")]
    requires_capabilities: bool,
    confidence: String,
    #[serde(default, alias = "reasoning")]
    rationale: String,
    #[serde(
        default,
        alias = "suggested_capability_names",
        alias = "suggested_tools",
        alias = "suggestedCapabilityNames"
    )]
    suggested_capabilities: Vec<String>,
}

/// Parse and validate the auxiliary model's raw output.
pub fn parse_decision(raw: &str) -> Result<ParsedDecision, ParseError> {
    let json = extract_json_object(raw).ok_or(ParseError::NoJsonObject)?;
    let decision: RawDecision =
        serde_json::from_str(json).map_err(|e| ParseError::Malformed(e.to_string()))?;

    let confidence =
        Confidence::from_str(&decision.confidence).map_err(|message| ParseError::InvalidField {
            field: "confidence".to_string(),
            message,
        })?;

    let suggested_capability_names = decision
        .suggested_capabilities
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();

    Ok(ParsedDecision {
        requires_capabilities: decision.requires_capabilities,
        confidence,
        rationale: decision.rationale.trim().to_string(),
        suggested_capability_names,
    })
}

/// Slice from the first `{` to the last `}`, skipping code fences and chatter.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let parsed = parse_decision(
            r#"{"requires_capabilities": false, "confidence": "high", "rationale": "greeting"}"#,
        )
        .unwrap();
        assert!(!parsed.requires_capabilities);
        assert_eq!(parsed.confidence, Confidence::High);
        assert_eq!(parsed.rationale, "greeting");
        assert!(parsed.suggested_capability_names.is_empty());
    }

    #[test]
    fn test_parse_fenced_json_with_suggestions() {
        let raw = "```json\n{\"requires_capabilities\": true, \"confidence\": \"Medium\", \
                   \"rationale\": \"send email\", \"suggested_capabilities\": [\"send_email\", \" \"]}\n```";
        let parsed = parse_decision(raw).unwrap();
        assert!(parsed.requires_capabilities);
        assert_eq!(parsed.confidence, Confidence::Medium);
        assert_eq!(parsed.suggested_capability_names, vec!["send_email"]);
    }

    #[test]
    fn test_parse_accepts_field_aliases() {
        let parsed = parse_decision(
            r#"{"requires_tools": true, "confidence": "low", "reasoning": "unclear", "suggested_tools": ["search"]}"#,
        )
        .unwrap();
        assert!(parsed.requires_capabilities);
        assert_eq!(parsed.rationale, "unclear");
        assert_eq!(parsed.suggested_capability_names, vec!["search"]);
    }

    #[test]
    fn test_parse_rejects_missing_required_field() {
        let err = parse_decision(r#"{"confidence": "high"}"#).unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
    }

    #[test]
    fn test_parse_rejects_string_boolean() {
        let err =
            parse_decision(r#"{"requires_capabilities": "yes", "confidence": "high"}"#).unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
    }

    #[test]
    fn test_parse_rejects_unknown_confidence() {
        let err = parse_decision(r#"{"requires_capabilities": true, "confidence": "certain"}"#)
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidField { ref field, .. } if field == "confidence"));
    }

    #[test]
    fn test_parse_rejects_prose() {
        assert_eq!(
            parse_decision("I think this needs tools.").unwrap_err(),
            ParseError::NoJsonObject
        );
        assert_eq!(parse_decision("} backwards {").unwrap_err(), ParseError::NoJsonObject);
    }
}

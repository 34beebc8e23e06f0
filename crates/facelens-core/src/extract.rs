//! Recover an [`AnalysisResult`] from a model reply.
//!
//! Models asked for "JSON only" still wrap the object in prose or code
//! fences now and then, so text replies are scanned for the outermost
//! `{ ... }` span before parsing.

use serde_json::Value;
use tracing::debug;

use crate::error::{FaceLensError, FaceLensResult};
use crate::model::AnalysisResult;
use crate::vision::ModelReply;

/// Span from the first `{` to the last `}`, if any.
pub fn find_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse the outermost JSON object found in `text`.
pub fn extract_json(text: &str) -> FaceLensResult<Value> {
    let span = find_json_object(text)
        .ok_or_else(|| FaceLensError::parse("no JSON object found in response", text))?;

    serde_json::from_str(span).map_err(|e| FaceLensError::parse(e.to_string(), text))
}

/// Turn a model reply into a validated analysis.
pub fn parse_reply(reply: ModelReply) -> FaceLensResult<AnalysisResult> {
    let (value, raw) = match reply {
        ModelReply::Text(text) => (extract_json(&text)?, text),
        ModelReply::Structured(value) => {
            let raw = value.to_string();
            (value, raw)
        }
    };

    let result: AnalysisResult = serde_json::from_value(value)
        .map_err(|e| FaceLensError::parse(format!("unexpected shape: {}", e), raw.as_str()))?;

    result
        .validate()
        .map_err(|reason| FaceLensError::parse(reason, raw.as_str()))?;

    debug!(
        ancestry = result.ancestry.len(),
        origin = result.origin.len(),
        emotions = result.emotions.len(),
        "Parsed analysis"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const VALID: &str = r#"{"ancestry":[{"region":"East Asian","percentage":87.5}],"origin":[{"country":"Japanese","percentage":76.2}],"emotions":[{"emotion":"Happy","percentage":91.0}],"description":"..."}"#;

    #[test]
    fn test_object_in_prose() {
        let text = format!("Sure! Here is the analysis:\n{}\nLet me know if you need more.", VALID);
        let value = extract_json(&text).unwrap();
        assert_eq!(value, serde_json::from_str::<Value>(VALID).unwrap());
    }

    #[test]
    fn test_object_in_code_fence() {
        let text = format!("```json\n{}\n```", VALID);
        let result = parse_reply(ModelReply::Text(text)).unwrap();
        assert_eq!(result.ancestry[0].region, "East Asian");
        assert_eq!(result.description, "...");
    }

    #[test]
    fn test_no_braces_keeps_raw_text() {
        let err = extract_json("I cannot analyze this image.").unwrap_err();
        assert_eq!(err.raw_response(), Some("I cannot analyze this image."));
        assert!(matches!(err, FaceLensError::Parse { .. }));
    }

    #[test]
    fn test_closing_before_opening() {
        assert!(find_json_object("} nothing {").is_none());
    }

    #[test]
    fn test_truncated_object() {
        let text = r#"{"ancestry":[{"region":"East Asian","percentage":87.5}"#;
        let err = parse_reply(ModelReply::Text(text.into())).unwrap_err();
        assert!(matches!(err, FaceLensError::Parse { .. }));
        assert_eq!(err.raw_response(), Some(text));
    }

    #[test]
    fn test_invalid_json_inside_braces() {
        let err = extract_json("{not json}").unwrap_err();
        assert_eq!(err.raw_response(), Some("{not json}"));
    }

    #[test]
    fn test_greedy_span_with_two_objects_fails() {
        let err = extract_json(r#"{"a":1} and {"b":2}"#).unwrap_err();
        assert!(matches!(err, FaceLensError::Parse { .. }));
    }

    #[test]
    fn test_missing_field_is_parse_error() {
        let text = r#"{"ancestry":[],"emotions":[],"description":"x"}"#;
        let err = parse_reply(ModelReply::Text(text.into())).unwrap_err();
        assert!(err.to_string().contains("origin"));
    }

    #[test]
    fn test_wrong_field_type_is_parse_error() {
        let text = r#"{"ancestry":[{"region":"A","percentage":"high"}],"origin":[],"emotions":[],"description":"x"}"#;
        let err = parse_reply(ModelReply::Text(text.into())).unwrap_err();
        assert!(matches!(err, FaceLensError::Parse { .. }));
    }

    #[test]
    fn test_out_of_range_percentage_is_parse_error() {
        let text = r#"{"ancestry":[],"origin":[{"country":"Peru","percentage":140}],"emotions":[],"description":"x"}"#;
        let err = parse_reply(ModelReply::Text(text.into())).unwrap_err();
        assert!(err.to_string().contains("origin[0]"));
    }

    #[test]
    fn test_structured_reply_used_directly() {
        let value = json!({
            "ancestry": [{"region": "West African", "percentage": 64.0}],
            "origin": [{"country": "Nigerian", "percentage": 55.5}],
            "emotions": [{"emotion": "Neutral", "percentage": 70.0}],
            "description": "Calm.",
            "confidence_note": "ignored"
        });
        let result = parse_reply(ModelReply::Structured(value)).unwrap();
        assert_eq!(result.origin[0].country, "Nigerian");
    }

    #[test]
    fn test_integer_percentage_round_trips_as_float() {
        let text = r#"{"ancestry":[{"region":"A","percentage":87}],"origin":[],"emotions":[],"description":""}"#;
        let result = parse_reply(ModelReply::Text(text.into())).unwrap();
        assert_eq!(result.ancestry[0].percentage, 87.0);

        let out = serde_json::to_string(&result).unwrap();
        assert!(out.contains(r#""percentage":87.0"#));
    }

    #[test]
    fn test_structured_reply_bad_shape_keeps_raw() {
        let value = json!({"description": 3});
        let err = parse_reply(ModelReply::Structured(value.clone())).unwrap_err();
        assert_eq!(err.raw_response(), Some(value.to_string().as_str()));
    }
}

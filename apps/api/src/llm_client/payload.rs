//! Structured payload extraction from free-form answer text.
//!
//! The answer engine is asked for JSON but is not contractually bound to it:
//! answers often wrap the object in prose or code fences. The payload is the
//! span from the first `{` to the last `}`.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::ScreeningError;

/// Outcome of looking for a payload in raw answer text.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Parsed(Value),
    Malformed(String),
}

impl Payload {
    /// Converts a `Malformed` payload into `ScreeningError::MalformedResponse`.
    pub fn into_value(self) -> Result<Value, ScreeningError> {
        match self {
            Payload::Parsed(value) => Ok(value),
            Payload::Malformed(raw) => Err(ScreeningError::malformed(
                "no parseable {...} object in answer",
                &raw,
            )),
        }
    }

    /// Parses, then validates against `T`. Shape mismatches are schema violations.
    pub fn into_typed<T: DeserializeOwned>(self, what: &str) -> Result<T, ScreeningError> {
        let value = self.into_value()?;
        serde_json::from_value(value)
            .map_err(|e| ScreeningError::SchemaViolation(format!("{what}: {e}")))
    }
}

/// Locates the first `{` and the last `}` and parses the enclosed span.
pub fn parse_payload(text: &str) -> Payload {
    let span = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => return Payload::Malformed(text.to_string()),
    };

    match serde_json::from_str::<Value>(span) {
        Ok(value) if value.is_object() => Payload::Parsed(value),
        _ => Payload::Malformed(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_bare_object_parses() {
        let payload = parse_payload(r#"{"value": 7, "explanation": "ok"}"#);
        assert_eq!(payload, Payload::Parsed(json!({"value": 7, "explanation": "ok"})));
    }

    #[test]
    fn test_object_wrapped_in_prose_and_fences() {
        let text = "Sure! Here is the result:\n```json\n{\"promising\": true, \"explanation\": \"fits\"}\n```\nHope this helps.";
        let payload = parse_payload(text);
        assert_eq!(
            payload,
            Payload::Parsed(json!({"promising": true, "explanation": "fits"}))
        );
    }

    #[test]
    fn test_nested_objects_use_outermost_span() {
        let text = r#"result: {"a": {"b": 1}} done"#;
        assert_eq!(parse_payload(text), Payload::Parsed(json!({"a": {"b": 1}})));
    }

    #[test]
    fn test_no_braces_is_malformed() {
        let payload = parse_payload("I cannot rate this candidate.");
        assert!(matches!(payload, Payload::Malformed(_)));
    }

    #[test]
    fn test_reversed_braces_are_malformed() {
        assert!(matches!(parse_payload("} nothing here {"), Payload::Malformed(_)));
    }

    #[test]
    fn test_invalid_json_between_braces_is_malformed() {
        assert!(matches!(parse_payload("{value: seven}"), Payload::Malformed(_)));
    }

    #[test]
    fn test_two_separate_objects_are_malformed() {
        // First `{` to last `}` spans both objects, which is not one JSON value.
        assert!(matches!(parse_payload(r#"{"a": 1} and {"b": 2}"#), Payload::Malformed(_)));
    }

    #[test]
    fn test_malformed_into_value_keeps_raw_text() {
        let err = parse_payload("nope").into_value().unwrap_err();
        match err {
            ScreeningError::MalformedResponse { raw, .. } => assert_eq!(raw, "nope"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[derive(Debug, Deserialize)]
    struct Flag {
        #[allow(dead_code)]
        flag: bool,
    }

    #[test]
    fn test_wrong_type_is_schema_violation() {
        let err = parse_payload(r#"{"flag": "yes"}"#)
            .into_typed::<Flag>("flag result")
            .unwrap_err();
        assert!(matches!(err, ScreeningError::SchemaViolation(msg) if msg.starts_with("flag result")));
    }
}

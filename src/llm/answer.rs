//! The structured answer produced by the generation path, plus the
//! normalization applied to model output before JSON decoding.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Structured answer decoded from a model completion.
///
/// `confidence` is the model's self-reported score and is distinct from
/// store similarity; it gates whether the answer is written back to the
/// semantic cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Answer {
    /// Answer type reported by the model (`"FINAL"` on the happy path).
    #[serde(default)]
    pub r#type: String,
    /// The answer text.
    #[serde(default)]
    pub response: String,
    /// Tool named by the model, if any.
    #[serde(default)]
    pub tool: String,
    /// Parameters the model attached to the tool.
    #[serde(default)]
    pub params: HashMap<String, String>,
    /// Self-reported confidence in `[0, 1]`.
    #[serde(default)]
    pub confidence: f32,
}

impl Answer {
    /// Decodes an answer from raw model output, stripping code fences first.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MalformedOutput`] if the cleaned text is not
    /// a JSON object of this shape.
    pub fn from_model_output(raw: &str) -> Result<Self, QueryError> {
        Ok(serde_json::from_str(clean_json(raw))?)
    }
}

/// Strips a wrapping Markdown code fence and a `json` language tag from
/// model output.
///
/// Models asked for JSON frequently wrap it in ```` ``` ```` or
/// ```` ```json ```` fences; this peels those layers and trims
/// surrounding whitespace so the result can be handed to a JSON decoder.
#[must_use]
pub fn clean_json(s: &str) -> &str {
    let s = s.trim();
    let s = s.strip_prefix("```").unwrap_or(s);
    let s = s.strip_suffix("```").unwrap_or(s);
    let s = s.strip_prefix("json").unwrap_or(s);
    let s = s.strip_suffix("json").unwrap_or(s);
    s.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_json_no_fence() {
        assert_eq!(clean_json(r#"{"a":1}"#), r#"{"a":1}"#);
    }

    #[test]
    fn test_clean_json_plain_fence() {
        assert_eq!(clean_json("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn test_clean_json_fence_with_language_tag() {
        assert_eq!(clean_json("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn test_clean_json_surrounding_whitespace() {
        assert_eq!(clean_json("  \n {\"a\":1} \n "), "{\"a\":1}");
    }

    #[test]
    fn test_answer_from_fenced_output() {
        let raw = "```json\n{\"type\":\"FINAL\",\"response\":\"Paris\",\"confidence\":0.97}\n```";
        let answer = Answer::from_model_output(raw).unwrap_or_else(|_| unreachable!());
        assert_eq!(answer.r#type, "FINAL");
        assert_eq!(answer.response, "Paris");
        assert!((answer.confidence - 0.97).abs() < f32::EPSILON);
    }

    #[test]
    fn test_answer_missing_fields_default() {
        let answer = Answer::from_model_output(r#"{"response":"ok"}"#)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(answer.response, "ok");
        assert!(answer.tool.is_empty());
        assert!(answer.params.is_empty());
        assert!(answer.confidence.abs() < f32::EPSILON);
    }

    #[test]
    fn test_answer_rejects_non_json() {
        let result = Answer::from_model_output("I don't know");
        assert!(matches!(result, Err(QueryError::MalformedOutput(_))));
    }
}

//! Fixed prompt text and template builders for the query pipeline.

use std::fmt::Write;

use chrono::{DateTime, Utc};

/// System preamble for the answer path.
///
/// Instructs the model to answer as JSON of the [`crate::llm::Answer`]
/// shape and to end with the fallback sentinel when the provided context
/// does not cover the question.
pub const SYSTEM_PROMPT: &str = r#"You are a precise question-answering assistant. Answer using only your general knowledge and the statements provided in the prompt, if any.

Respond with a single JSON object and nothing else:
{"type": "FINAL", "response": "<your answer>", "tool": "", "params": {}, "confidence": <0.0-1.0>}

Set "confidence" to how certain you are that the answer is correct and complete. If the question cannot be answered from the provided statements or your knowledge, say so briefly and end the "response" value with a newline followed by the word RAG."#;

/// Instruction template for extracting tool parameters from a query.
///
/// The model sees the current date first (so relative ranges like "last
/// week" resolve), then this template, then the raw query.
pub const TOOL_PARAMS_PROMPT: &str = r#"Extract the parameters needed to run a data tool from the question below. Respond with a single flat JSON object mapping parameter names to string values and nothing else. For time ranges use the keys "ini" and "end" with RFC 3339 timestamps.
Question: "#;

/// Header line written once before the first plain context fact.
pub const CONTEXT_HEADER: &str =
    "Your context contains retrieved facts. Consider the following statements:\n";

/// Suffix appended when any context was accumulated.
const NOW_ANSWER: &str = "Now answer: ";

/// Trailing marker meaning "cannot answer from available context".
pub const FALLBACK_SENTINEL: &str = "\nRAG";

/// Sampling temperature for the tool-parameter extraction call.
pub const TOOL_EXTRACTION_TEMPERATURE: f32 = 0.2;

/// Appends a context bullet line for a fact or tool result.
pub fn push_context_line(buf: &mut String, line: &str) {
    // Infallible for String, but write! keeps the builder uniform.
    let _ = writeln!(buf, " - {line}");
}

/// Finalizes the answer prompt: context (if any) followed by the
/// "now answer" suffix, or the bare query when no context accumulated.
#[must_use]
pub fn build_answer_prompt(context: &str, query: &str) -> String {
    if context.is_empty() {
        query.to_string()
    } else {
        format!("{context}{NOW_ANSWER}{query}")
    }
}

/// Builds the secondary prompt for tool-parameter extraction.
#[must_use]
pub fn build_tool_prompt(now: DateTime<Utc>, query: &str) -> String {
    format!(
        "Consider that today's date is: {}\n{TOOL_PARAMS_PROMPT}{query}",
        now.to_rfc3339()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_query_when_no_context() {
        let prompt = build_answer_prompt("", "what time is it?");
        assert_eq!(prompt, "what time is it?");
    }

    #[test]
    fn test_context_gets_now_answer_suffix() {
        let mut context = String::from(CONTEXT_HEADER);
        push_context_line(&mut context, "the office opens at 9am");
        let prompt = build_answer_prompt(&context, "when does the office open?");
        assert!(prompt.starts_with(CONTEXT_HEADER));
        assert!(prompt.contains(" - the office opens at 9am\n"));
        assert!(prompt.ends_with("Now answer: when does the office open?"));
    }

    #[test]
    fn test_tool_prompt_contains_date_and_query() {
        let now = Utc::now();
        let prompt = build_tool_prompt(now, "cpu usage last week");
        assert!(prompt.contains(&now.to_rfc3339()));
        assert!(prompt.ends_with("cpu usage last week"));
        assert!(prompt.contains("\"ini\""));
    }
}

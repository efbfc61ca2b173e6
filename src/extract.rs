//! Recovers test-case records from a raw model response.
//!
//! Everything here is total: a malformed, empty or unexpected response
//! becomes a single synthetic error record instead of an error value.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::record::TestCaseRecord;

/// Where each known upstream envelope keeps the completion text, in precedence order.
const ENVELOPE_POINTERS: &[(&str, &str)] = &[
    ("chat-completion", "/choices/0/message/content"),
    ("generation", "/candidates/0/content/parts/0/text"),
    ("messages", "/content/0/text"),
];

/// Greedy: first `{` through the last `}` in the text.
static JSON_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("static regex"));

#[derive(Debug, thiserror::Error)]
enum ExtractionFailure {
    #[error("no response content from API")]
    NoContent,
    #[error("no JSON found in response")]
    NoJson,
    #[error("invalid JSON in response: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Extract the ordered batch of test cases from a parsed upstream response.
///
/// Returns the model's cases (possibly none) on success, or exactly one
/// record with id `TC_ERROR_001` when no usable payload can be found.
pub fn extract(raw: &Value) -> Vec<TestCaseRecord> {
    let content = completion_text(raw);
    match parse_test_cases(content) {
        Ok(records) => {
            debug!(count = records.len(), "extracted test cases");
            records
        }
        Err(e) => {
            warn!(error = %e, "falling back to error record");
            vec![TestCaseRecord::extraction_error(content.unwrap_or_default())]
        }
    }
}

/// Like [`extract`], but starting from the undecoded HTTP body.
pub fn extract_body(body: &str) -> Vec<TestCaseRecord> {
    match serde_json::from_str::<Value>(body) {
        Ok(raw) => extract(&raw),
        Err(e) => {
            warn!(error = %e, "upstream body is not JSON, falling back to error record");
            vec![TestCaseRecord::extraction_error(body)]
        }
    }
}

/// The completion text from the first envelope shape that yields a non-empty string.
pub fn completion_text(raw: &Value) -> Option<&str> {
    ENVELOPE_POINTERS.iter().find_map(|(shape, pointer)| {
        let text = raw.pointer(pointer)?.as_str()?;
        if text.is_empty() {
            return None;
        }
        debug!(shape, "matched response envelope");
        Some(text)
    })
}

/// The span from the first `{` to the last `}`, if any.
pub fn json_span(text: &str) -> Option<&str> {
    JSON_SPAN.find(text).map(|m| m.as_str())
}

fn parse_test_cases(content: Option<&str>) -> Result<Vec<TestCaseRecord>, ExtractionFailure> {
    let content = content.ok_or(ExtractionFailure::NoContent)?;
    let span = json_span(content).ok_or(ExtractionFailure::NoJson)?;
    let payload: Value = serde_json::from_str(span)?;

    let records = match payload.get("test_cases").and_then(Value::as_array) {
        Some(cases) => cases
            .iter()
            .enumerate()
            .map(|(i, case)| TestCaseRecord::from_value(case, i + 1))
            .collect(),
        None => Vec::new(),
    };
    Ok(records)
}

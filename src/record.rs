use std::fmt;

use serde::Serialize;
use serde_json::Value;

pub const ERROR_RECORD_ID: &str = "TC_ERROR_001";

const ID_KEYS: &[&str] = &["test_case_id", "id"];
const NAME_KEYS: &[&str] = &["test_case_name", "name"];
const SCENARIO_KEYS: &[&str] = &["test_scenario", "scenario"];
const STEPS_KEYS: &[&str] = &["test_steps", "steps"];
const EXPECTED_KEYS: &[&str] = &["expected_result", "expectedResult"];
const PRECONDITIONS_KEYS: &[&str] = &["preconditions"];
const TEST_DATA_KEYS: &[&str] = &["test_data", "testData"];
const PRIORITY_KEYS: &[&str] = &["priority"];
const TYPE_KEYS: &[&str] = &["test_type", "type"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Case-insensitive parse. Returns `None` for anything outside High/Medium/Low.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TestType {
    #[default]
    Functional,
    Negative,
    #[serde(rename = "Edge Case")]
    EdgeCase,
    Error,
}

impl TestType {
    /// Case-insensitive parse; accepts the spellings models commonly use for edge cases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "functional" => Some(TestType::Functional),
            "negative" => Some(TestType::Negative),
            "edge case" | "edge_case" | "edge-case" | "edgecase" => Some(TestType::EdgeCase),
            "error" => Some(TestType::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TestType::Functional => "Functional",
            TestType::Negative => "Negative",
            TestType::EdgeCase => "Edge Case",
            TestType::Error => "Error",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generated test case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCaseRecord {
    #[serde(rename = "test_case_id")]
    pub id: String,
    #[serde(rename = "test_case_name")]
    pub name: String,
    #[serde(rename = "test_scenario", skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    #[serde(rename = "test_steps", skip_serializing_if = "Option::is_none")]
    pub steps: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preconditions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_data: Option<String>,
    pub priority: Priority,
    pub test_type: TestType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl TestCaseRecord {
    /// Map one element of a `test_cases` array, filling defaults from its
    /// 1-based `position` in the batch. Never fails: a non-object element
    /// maps to an all-defaults record. `raw_response` is reserved for
    /// [`TestCaseRecord::extraction_error`] and never taken from model output.
    pub fn from_value(value: &Value, position: usize) -> Self {
        let field = |keys: &[&str]| text_field(value, keys);

        Self {
            id: field(ID_KEYS).unwrap_or_else(|| format!("TC_UNKNOWN_{position}")),
            name: field(NAME_KEYS).unwrap_or_else(|| format!("Test Case {position}")),
            scenario: field(SCENARIO_KEYS),
            steps: field(STEPS_KEYS),
            expected_result: field(EXPECTED_KEYS),
            preconditions: field(PRECONDITIONS_KEYS),
            test_data: field(TEST_DATA_KEYS),
            priority: field(PRIORITY_KEYS)
                .and_then(|p| Priority::parse(&p))
                .unwrap_or_default(),
            test_type: field(TYPE_KEYS)
                .and_then(|t| TestType::parse(&t))
                .unwrap_or_default(),
            raw_response: None,
        }
    }

    /// The synthetic record that stands in for a response that could not be parsed.
    pub fn extraction_error(raw_response: impl Into<String>) -> Self {
        Self {
            id: ERROR_RECORD_ID.to_string(),
            name: "API Response Error".to_string(),
            scenario: Some("Error parsing AI response".to_string()),
            steps: Some("1. Check API key\n2. Check network connection\n3. Try again".to_string()),
            expected_result: Some("Proper error handling".to_string()),
            preconditions: Some("Valid API key and internet connection".to_string()),
            test_data: Some("N/A".to_string()),
            priority: Priority::High,
            test_type: TestType::Error,
            raw_response: Some(raw_response.into()),
        }
    }

    pub fn is_extraction_error(&self) -> bool {
        self.test_type == TestType::Error && self.id == ERROR_RECORD_ID
    }
}

/// First key in `keys` holding a usable value, rendered as text.
fn text_field(value: &Value, keys: &[&str]) -> Option<String> {
    let obj = value.as_object()?;
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find_map(value_to_text)
}

fn value_to_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    };
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

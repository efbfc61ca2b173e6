//! Human-readable renderings of a batch. All functions are pure.

use std::fmt::Write;

use crate::record::TestCaseRecord;

pub const EMPTY_BATCH_MESSAGE: &str = "Unable to generate test cases. Please try again.";

const RULE: &str = "------------------------------------------------------------";
const MISSING: &str = "N/A";

/// Markdown shown in the chat transcript.
pub fn render_markdown(records: &[TestCaseRecord]) -> String {
    if records.is_empty() {
        return EMPTY_BATCH_MESSAGE.to_string();
    }

    let mut out = String::new();
    out.push_str("# Test Cases Generated\n\n");
    let _ = writeln!(out, "**Total:** {} test cases\n", records.len());

    for (i, tc) in records.iter().enumerate() {
        let _ = writeln!(out, "## {}. {}\n", i + 1, tc.name);
        let _ = writeln!(out, "**ID:** {}", tc.id);
        let _ = writeln!(out, "**Priority:** {}", tc.priority);
        let _ = writeln!(out, "**Type:** {}\n", tc.test_type);

        if let Some(ref pre) = tc.preconditions {
            let _ = writeln!(out, "**Preconditions:**\n{pre}\n");
        }
        let _ = writeln!(
            out,
            "**Steps:**\n{}\n",
            tc.steps.as_deref().unwrap_or(MISSING)
        );
        let _ = writeln!(
            out,
            "**Expected Result:**\n{}\n",
            tc.expected_result.as_deref().unwrap_or(MISSING)
        );
        if let Some(ref data) = tc.test_data {
            let _ = writeln!(out, "**Test Data:**\n{data}\n");
        }
        if let Some(ref raw) = tc.raw_response {
            let _ = writeln!(out, "**Raw Response:**\n```\n{raw}\n```\n");
        }
        out.push_str("---\n\n");
    }

    out
}

/// Plain-text export: one section per record under fixed labels,
/// sections separated by a horizontal rule.
pub fn render_text(records: &[TestCaseRecord]) -> String {
    let mut out = String::new();
    for (i, tc) in records.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "Test Case {}: {}", i + 1, tc.name);
        let _ = writeln!(out, "ID: {}", tc.id);
        let _ = writeln!(out, "Scenario: {}", field(&tc.scenario));
        let _ = writeln!(out, "Priority: {}", tc.priority);
        let _ = writeln!(out, "Type: {}", tc.test_type);
        let _ = writeln!(out, "Preconditions:\n{}", field(&tc.preconditions));
        let _ = writeln!(out, "Steps:\n{}", field(&tc.steps));
        let _ = writeln!(out, "Expected Result:\n{}", field(&tc.expected_result));
        let _ = writeln!(out, "Test Data:\n{}", field(&tc.test_data));
        if let Some(ref raw) = tc.raw_response {
            let _ = writeln!(out, "Raw Response:\n{raw}");
        }
        out.push_str(RULE);
        out.push('\n');
    }
    out
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(MISSING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Priority, TestType};
    use crate::test_helpers::make_record;

    #[test]
    fn test_markdown_empty_batch() {
        assert_eq!(render_markdown(&[]), EMPTY_BATCH_MESSAGE);
    }

    #[test]
    fn test_markdown_sections() {
        let mut tc = make_record("TC_FUNCTIONAL_001");
        tc.priority = Priority::High;
        tc.test_type = TestType::Negative;
        let md = render_markdown(&[tc]);

        assert!(md.starts_with("# Test Cases Generated\n\n**Total:** 1 test cases\n"));
        assert!(md.contains("## 1. TC_FUNCTIONAL_001 name\n"));
        assert!(md.contains("**ID:** TC_FUNCTIONAL_001\n"));
        assert!(md.contains("**Priority:** High\n"));
        assert!(md.contains("**Type:** Negative\n"));
        assert!(md.contains("**Steps:**\n1. Open page\n2. Submit form\n"));
        assert!(md.contains("**Expected Result:**\nSuccess message shown\n"));
        assert!(md.contains("**Preconditions:**\nUser is registered\n"));
        assert!(md.ends_with("---\n\n"));
    }

    #[test]
    fn test_markdown_omits_absent_optional_sections() {
        let mut tc = make_record("TC_1");
        tc.preconditions = None;
        tc.test_data = None;
        let md = render_markdown(&[tc]);
        assert!(!md.contains("**Preconditions:**"));
        assert!(!md.contains("**Test Data:**"));
    }

    #[test]
    fn test_markdown_shows_raw_response_for_error_record() {
        let md = render_markdown(&[TestCaseRecord::extraction_error("oops")]);
        assert!(md.contains("## 1. API Response Error"));
        assert!(md.contains("**Raw Response:**\n```\noops\n```"));
    }

    #[test]
    fn test_text_labels_in_order() {
        let text = render_text(&[make_record("TC_1")]);
        let labels = [
            "ID:",
            "Scenario:",
            "Priority:",
            "Type:",
            "Preconditions:",
            "Steps:",
            "Expected Result:",
            "Test Data:",
        ];
        let mut last = 0;
        for label in labels {
            let pos = text[last..]
                .find(label)
                .unwrap_or_else(|| panic!("missing {label}"))
                + last;
            last = pos;
        }
        assert!(text.ends_with(&format!("{RULE}\n")));
    }

    #[test]
    fn test_text_one_rule_per_record() {
        let text = render_text(&[make_record("TC_1"), make_record("TC_2")]);
        assert_eq!(text.matches(RULE).count(), 2);
        assert!(text.contains("Test Case 2: TC_2 name"));
    }

    #[test]
    fn test_text_missing_fields_render_placeholder() {
        let mut tc = make_record("TC_1");
        tc.scenario = None;
        let text = render_text(&[tc]);
        assert!(text.contains("Scenario: N/A\n"));
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let batch = vec![make_record("TC_1"), TestCaseRecord::extraction_error("x")];
        assert_eq!(render_text(&batch), render_text(&batch));
        assert_eq!(render_markdown(&batch), render_markdown(&batch));
    }
}

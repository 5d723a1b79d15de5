//! Serenity JSON report schema.
//!
//! Field names and nesting here are a compatibility contract with the report
//! viewer. Optional fields are left out entirely when empty; the viewer treats
//! a missing key differently from `null`.

use serde::Serialize;

use crate::domain::TestResult;

/// Top-level report of one scenario
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioPayload {
    pub name: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub start_time: i64,
    pub manual: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TestResult>,
    pub test_steps: Vec<serde_json::Value>,
    pub user_story: UserStory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_failure_cause: Option<FailureCause>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStory {
    pub id: String,
    pub story_name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Report of one step, nested under a scenario or another step
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepPayload {
    pub description: String,
    pub start_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TestResult>,
    pub children: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<FailureCause>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<ScreenshotEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreenshotEntry {
    pub screenshot: String,
}

/// Error attached to a failed scenario (`testFailureCause`) or step (`exception`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureCause {
    pub error_type: String,
    pub message: String,
    pub stack_trace: Vec<StackFrame>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    pub declaring_class: String,
    pub method_name: String,
    pub file_name: String,
    pub line_number: u32,
}

/// URL-safe slug of a user story name: `"User Accounts"` -> `"user-accounts"`,
/// `"shoppingCart"` -> `"shopping-cart"`.
pub fn dashify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut prev: Option<char> = None;

    for c in text.trim().chars() {
        let mapped = if c.is_ascii_alphanumeric() || c == '_' { c } else { '-' };

        if let Some(p) = prev {
            if p.is_ascii_lowercase() && mapped.is_ascii_uppercase() {
                slug.push('-');
            }
        }
        if mapped != '-' || !slug.ends_with('-') {
            slug.push(mapped);
        }
        prev = Some(c);
    }

    slug.trim_matches('-').to_lowercase()
}

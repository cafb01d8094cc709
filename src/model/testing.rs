use serde::{Deserialize, Serialize};

use super::Record;
use crate::util::lenient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    #[serde(deserialize_with = "lenient::id")]
    pub id: u64,
    #[serde(
        default,
        deserialize_with = "lenient::reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub product: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub module: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub module_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub story: Option<u64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::text")]
    pub case_type: String,
    #[serde(
        default,
        deserialize_with = "lenient::small_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub pri: Option<u32>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub precondition: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub steps: String,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub opened_by: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub opened_date: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_edited_by: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_edited_date: Option<String>,
}

impl Record for TestCase {
    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TestCaseStatus {
    Normal,
    Blocked,
    Investigate,
    All,
}

impl TestCaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestCaseStatus::Normal => "normal",
            TestCaseStatus::Blocked => "blocked",
            TestCaseStatus::Investigate => "investigate",
            TestCaseStatus::All => "all",
        }
    }
}

/// Fields for creating a test case under a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTestCase {
    pub product: u64,
    pub module: Option<u64>,
    pub story: Option<u64>,
    pub title: String,
    pub case_type: Option<String>,
    pub pri: Option<u32>,
    pub precondition: Option<String>,
    pub steps: Option<String>,
    pub status: Option<String>,
}

/// One case run inside a test task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    #[serde(deserialize_with = "lenient::id")]
    pub id: u64,
    #[serde(
        rename(deserialize = "task"),
        default,
        deserialize_with = "lenient::reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub run: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient::reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub case: Option<u64>,
    #[serde(
        rename(deserialize = "title"),
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub case_title: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::small_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<u32>,
    #[serde(rename(deserialize = "caseStatus"), default, deserialize_with = "lenient::text")]
    pub status: String,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_runner: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_run_date: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_run_result: Option<String>,
}

impl Record for TestResult {
    fn id(&self) -> u64 {
        self.id
    }
}

/// A test task ("test run" container) in ZenTao.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestTask {
    #[serde(deserialize_with = "lenient::id")]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "lenient::reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub product: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub product_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub project: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient::reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub execution: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub build: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub owner: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: String,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub begin: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub end: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub desc: String,
}

impl Record for TestTask {
    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RunResult {
    Pass,
    Fail,
    Blocked,
    Skipped,
}

impl RunResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunResult::Pass => "pass",
            RunResult::Fail => "fail",
            RunResult::Blocked => "blocked",
            RunResult::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRun {
    pub case_id: u64,
    pub version: Option<u32>,
    pub result: RunResult,
    pub steps: Option<String>,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_reads_legacy_field_names() {
        let result: TestResult = serde_json::from_value(json!({
            "id": "9",
            "task": "4",
            "case": "77",
            "title": "Login with SSO",
            "version": "2",
            "caseStatus": "normal",
            "lastRunResult": "pass"
        }))
        .unwrap();

        assert_eq!(result.run, Some(4));
        assert_eq!(result.case, Some(77));
        assert_eq!(result.case_title.as_deref(), Some("Login with SSO"));
        assert_eq!(result.status, "normal");

        let out = serde_json::to_value(&result).unwrap();
        assert_eq!(out["run"], 4);
        assert_eq!(out["caseTitle"], "Login with SSO");
    }

    #[test]
    fn test_case_type_field() {
        let case: TestCase = serde_json::from_value(json!({
            "id": 3, "product": "1", "title": "t", "type": "feature", "story": "0"
        }))
        .unwrap();
        assert_eq!(case.case_type, "feature");
        assert_eq!(case.story, None);
    }
}

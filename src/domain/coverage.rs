use serde::{Deserialize, Serialize};

use super::generation_request::RawInput;
use super::test_case::TestCase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    Medium,
    Low,
}

impl Importance {
    pub fn parse_loose(value: &str) -> Importance {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" | "critical" | "p0" | "p1" => Importance::High,
            "low" | "minor" | "p3" => Importance::Low,
            _ => Importance::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingArea {
    pub description: String,
    pub importance: Importance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageDetail {
    pub area: String,
    pub covered: bool,
    pub supporting_test_cases: Vec<String>,
}

/// `score` is `None` exactly when `requires_deep_analysis` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    pub score: Option<u8>,
    pub missing_areas: Vec<MissingArea>,
    pub coverage_details: Vec<CoverageDetail>,
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
    pub requires_deep_analysis: bool,
}

impl CoverageReport {
    /// Terminal report for inputs that cannot be scored without a model.
    pub fn deferred() -> Self {
        Self {
            score: None,
            missing_areas: Vec::new(),
            coverage_details: Vec::new(),
            suggestions: Vec::new(),
            narrative: None,
            requires_deep_analysis: true,
        }
    }
}

/// Test cases under analysis: typed records or loosely structured text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoverageSubject {
    Cases(Vec<TestCase>),
    RawText(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageRequest {
    pub test_cases: CoverageSubject,
    pub requirement: RawInput,
}

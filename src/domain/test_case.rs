use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Notation {
    #[default]
    Procedural,
    Gherkin,
}

impl Notation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Notation::Procedural => "procedural",
            Notation::Gherkin => "gherkin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Priority {
    P0,
    P1,
    #[default]
    P2,
    P3,
}

impl Priority {
    /// Best-effort reading of a model-supplied priority ("P1", "p1", "high", "1").
    pub fn parse_loose(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "p0" | "0" | "highest" | "blocker" | "urgent" => Some(Priority::P0),
            "p1" | "1" | "high" | "critical" => Some(Priority::P1),
            "p2" | "2" | "medium" | "normal" | "major" => Some(Priority::P2),
            "p3" | "3" | "low" | "lowest" | "minor" | "trivial" => Some(Priority::P3),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::P0 => "P0",
            Priority::P1 => "P1",
            Priority::P2 => "P2",
            Priority::P3 => "P3",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Severity {
    Blocker,
    Critical,
    #[default]
    Major,
    Minor,
}

impl Severity {
    pub fn parse_loose(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "blocker" | "s0" => Some(Severity::Blocker),
            "critical" | "s1" | "high" => Some(Severity::Critical),
            "major" | "s2" | "medium" | "normal" => Some(Severity::Major),
            "minor" | "s3" | "low" | "trivial" => Some(Severity::Minor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Blocker => "Blocker",
            Severity::Critical => "Critical",
            Severity::Major => "Major",
            Severity::Minor => "Minor",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStep {
    pub ordinal: u32,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProceduralBody {
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub preconditions: Vec<String>,
    #[serde(default)]
    pub steps: Vec<TestStep>,
    #[serde(default)]
    pub postconditions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScenarioKind {
    #[default]
    Scenario,
    ScenarioOutline,
}

impl ScenarioKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            ScenarioKind::Scenario => "Scenario",
            ScenarioKind::ScenarioOutline => "Scenario Outline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GherkinBody {
    pub feature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default)]
    pub scenario_kind: ScenarioKind,
    #[serde(default)]
    pub given_steps: Vec<String>,
    #[serde(default)]
    pub when_steps: Vec<String>,
    #[serde(default)]
    pub then_steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples_table: Option<String>,
}

/// Notation-specific content. The notation of a test case is the variant held here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "notation", rename_all = "lowercase")]
pub enum TestCaseBody {
    Procedural(ProceduralBody),
    Gherkin(GherkinBody),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: String,
    pub title: String,
    pub priority: Priority,
    pub severity: Severity,
    #[serde(default)]
    pub category: String,
    /// Treated as a set: `push_tag` keeps it free of duplicates.
    #[serde(default)]
    pub tags: Vec<String>,
    pub body: TestCaseBody,
}

impl TestCase {
    pub fn notation(&self) -> Notation {
        match self.body {
            TestCaseBody::Procedural(_) => Notation::Procedural,
            TestCaseBody::Gherkin(_) => Notation::Gherkin,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|existing| existing.eq_ignore_ascii_case(tag))
    }

    /// Adds a tag unless an equal one (case-insensitive) is already present.
    pub fn push_tag(&mut self, tag: &str) {
        let trimmed = tag.trim();
        if trimmed.is_empty() || self.has_tag(trimmed) {
            return;
        }
        self.tags.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_parse_loose() {
        assert_eq!(Priority::parse_loose(" p1 "), Some(Priority::P1));
        assert_eq!(Priority::parse_loose("High"), Some(Priority::P1));
        assert_eq!(Priority::parse_loose("eventually"), None);
    }

    #[test]
    fn test_body_serializes_with_notation_tag() {
        let case = TestCase {
            id: "TC-001".to_string(),
            title: "Reset password".to_string(),
            priority: Priority::P1,
            severity: Severity::Critical,
            category: "Functional".to_string(),
            tags: vec!["auth".to_string()],
            body: TestCaseBody::Procedural(ProceduralBody::default()),
        };
        let json = serde_json::to_value(&case).unwrap();
        assert_eq!(json["body"]["notation"], "procedural");
        assert_eq!(json["priority"], "P1");

        let back: TestCase = serde_json::from_value(json).unwrap();
        assert_eq!(back.notation(), Notation::Procedural);
    }

    #[test]
    fn test_push_tag_is_case_insensitive_set() {
        let mut case = TestCase {
            id: "TC-001".to_string(),
            title: "t".to_string(),
            priority: Priority::P2,
            severity: Severity::Major,
            category: String::new(),
            tags: vec!["Functional".to_string()],
            body: TestCaseBody::Gherkin(GherkinBody::default()),
        };
        case.push_tag("functional");
        case.push_tag("EdgeCases");
        case.push_tag("  ");
        assert_eq!(case.tags, vec!["Functional", "EdgeCases"]);
    }
}

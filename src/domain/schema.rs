//! Canonical shapes the model is asked to emit.
//!
//! These are the contracts embedded verbatim into model instructions. The
//! typed counterparts live in `test_case` and `coverage`; the conversion
//! between the two happens in the generation and coverage use cases.

use serde_json::{json, Value};

use super::test_case::Notation;

pub const TEST_CASES_KEY: &str = "testCases";

pub fn procedural_schema() -> Value {
    json!({
        "testCases": [{
            "id": "TC-001",
            "title": "string",
            "priority": "P0 | P1 | P2 | P3",
            "severity": "Blocker | Critical | Major | Minor",
            "category": "string",
            "tags": ["string"],
            "objective": "string",
            "preconditions": ["string"],
            "steps": [{
                "step": 1,
                "description": "string",
                "expectedResult": "string (optional)"
            }],
            "postconditions": ["string"]
        }]
    })
}

pub fn gherkin_schema() -> Value {
    json!({
        "testCases": [{
            "id": "TC-001",
            "title": "string (scenario name)",
            "priority": "P0 | P1 | P2 | P3",
            "severity": "Blocker | Critical | Major | Minor",
            "category": "string",
            "tags": ["string"],
            "feature": "string",
            "featureDescription": "string (optional)",
            "background": "string (optional)",
            "scenarioType": "Scenario | Scenario Outline",
            "given": ["string"],
            "when": ["string"],
            "then": ["string"],
            "examples": "string (optional, Gherkin table for Scenario Outline)"
        }]
    })
}

pub fn test_case_schema(notation: Notation) -> Value {
    match notation {
        Notation::Procedural => procedural_schema(),
        Notation::Gherkin => gherkin_schema(),
    }
}

pub fn coverage_report_schema() -> Value {
    json!({
        "score": "integer 0-100",
        "missingAreas": [{
            "description": "string",
            "importance": "high | medium | low"
        }],
        "coverageDetails": [{
            "area": "string",
            "covered": true,
            "supportingTestCases": ["test case id"]
        }],
        "suggestions": ["string"],
        "narrative": "string"
    })
}

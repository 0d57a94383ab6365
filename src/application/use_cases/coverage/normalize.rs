//! Unifies the field-name variants models use for coverage reports.

use crate::domain::coverage::{CoverageDetail, CoverageReport, Importance, MissingArea};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::llm_clients::StructuredReply;
use serde_json::{Map, Value};

const WRAPPER_KEYS: &[&str] = &["coverageReport", "coverage_report", "report", "analysis"];
const SCORE_KEYS: &[&str] = &[
    "score",
    "coverageScore",
    "coverage_score",
    "coverage",
    "coveragePercentage",
    "coverage_percentage",
    "percentage",
];
const MISSING_KEYS: &[&str] = &[
    "missingAreas",
    "missing_areas",
    "gaps",
    "uncovered",
    "uncoveredAreas",
    "uncovered_areas",
];
const DETAIL_KEYS: &[&str] = &["coverageDetails", "coverage_details", "details"];
const SUGGESTION_KEYS: &[&str] = &["suggestions", "recommendations", "improvements"];
const NARRATIVE_KEYS: &[&str] = &["narrative", "summary", "explanation"];

fn first<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| object.get(*key))
}

fn text_field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    first(object, keys)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Reads a score from a number or a string such as `"85"` or `"85%"`,
/// clamped to 0..=100 and rounded.
pub(crate) fn parse_score(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.clamp(0.0, 100.0).round() as u8)
}

fn string_items(value: Option<&Value>, object_keys: &[&str]) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return match value.and_then(Value::as_str) {
            Some(text) if !text.trim().is_empty() => vec![text.trim().to_string()],
            _ => Vec::new(),
        };
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(text.trim().to_string()),
            Value::Number(number) => Some(number.to_string()),
            Value::Object(object) => text_field(object, object_keys),
            _ => None,
        })
        .filter(|text| !text.is_empty())
        .collect()
}

fn missing_areas(value: Option<&Value>) -> Vec<MissingArea> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(MissingArea {
                description: text.trim().to_string(),
                importance: Importance::Medium,
            }),
            Value::Object(object) => {
                let description =
                    text_field(object, &["description", "area", "name", "gap", "requirement"])?;
                let importance = text_field(object, &["importance", "severity", "priority"])
                    .map(|value| Importance::parse_loose(&value))
                    .unwrap_or(Importance::Medium);
                Some(MissingArea {
                    description,
                    importance,
                })
            }
            _ => None,
        })
        .filter(|area| !area.description.is_empty())
        .collect()
}

fn covered_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "covered" | "full" | "fully"
        ),
        _ => false,
    }
}

fn coverage_details(value: Option<&Value>) -> Vec<CoverageDetail> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|object| {
            let area = text_field(object, &["area", "requirement", "description", "name"])?;
            Some(CoverageDetail {
                area,
                covered: covered_flag(first(object, &["covered", "isCovered", "is_covered", "status"])),
                supporting_test_cases: string_items(
                    first(
                        object,
                        &[
                            "supportingTestCases",
                            "supporting_test_cases",
                            "testCases",
                            "testCaseIds",
                            "test_case_ids",
                        ],
                    ),
                    &["id", "testCaseId"],
                ),
            })
        })
        .collect()
}

/// Maps a model's scoring reply onto `CoverageReport`. A reply without a
/// usable score is a `SchemaViolation`.
pub(crate) fn normalize_report(reply: &StructuredReply) -> Result<CoverageReport> {
    let root = reply.value.as_object().ok_or_else(|| {
        AppError::schema_violation("Coverage reply is not a JSON object", reply.raw.clone())
    })?;
    let object = WRAPPER_KEYS
        .iter()
        .find_map(|key| root.get(*key).and_then(Value::as_object))
        .filter(|inner| first(inner, SCORE_KEYS).is_some())
        .unwrap_or(root);

    let score = SCORE_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(parse_score))
        .ok_or_else(|| {
            AppError::schema_violation("Coverage reply carries no usable score", reply.raw.clone())
        })?;

    Ok(CoverageReport {
        score: Some(score),
        missing_areas: missing_areas(first(object, MISSING_KEYS)),
        coverage_details: coverage_details(first(object, DETAIL_KEYS)),
        suggestions: string_items(
            first(object, SUGGESTION_KEYS),
            &["suggestion", "description", "text"],
        ),
        narrative: text_field(object, NARRATIVE_KEYS),
        requires_deep_analysis: false,
    })
}

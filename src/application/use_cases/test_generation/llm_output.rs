//! Validate-then-convert boundary between model output and typed test cases.

use super::types::{items, StepOutput, TestCaseOutput};
use crate::application::use_cases::identity::MissingAttributes;
use crate::domain::error::{AppError, Result};
use crate::domain::schema::TEST_CASES_KEY;
use crate::domain::test_case::{
    GherkinBody, Notation, Priority, ProceduralBody, ScenarioKind, Severity, TestCase,
    TestCaseBody, TestStep,
};
use crate::infrastructure::llm_clients::StructuredReply;
use serde_json::Value;

/// Converts a structured model reply into typed test cases of `notation`.
///
/// Field spelling is treated leniently; shape is not. A missing or empty
/// `testCases` array, a malformed element or an untitled case is a
/// `SchemaViolation` carrying the raw reply.
pub(crate) fn parse_test_cases(
    reply: &StructuredReply,
    notation: Notation,
) -> Result<Vec<(TestCase, MissingAttributes)>> {
    let collection = reply
        .value
        .get(TEST_CASES_KEY)
        .or_else(|| reply.value.get("test_cases"))
        .ok_or_else(|| {
            AppError::schema_violation(
                format!("Top-level '{}' collection is missing", TEST_CASES_KEY),
                reply.raw.clone(),
            )
        })?;
    let elements = collection.as_array().ok_or_else(|| {
        AppError::schema_violation(
            format!("'{}' is not an array", TEST_CASES_KEY),
            reply.raw.clone(),
        )
    })?;
    if elements.is_empty() {
        return Err(AppError::schema_violation(
            format!("'{}' is empty", TEST_CASES_KEY),
            reply.raw.clone(),
        ));
    }

    elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            let output = TestCaseOutput::from_model_value(element.clone()).map_err(|err| {
                AppError::schema_violation(
                    format!("{}[{}] has an unexpected shape: {}", TEST_CASES_KEY, index, err),
                    reply.raw.clone(),
                )
            })?;
            convert_test_case(output, notation).map_err(|message| {
                AppError::schema_violation(
                    format!("{}[{}] {}", TEST_CASES_KEY, index, message),
                    reply.raw.clone(),
                )
            })
        })
        .collect()
}

fn id_text(id: Option<Value>) -> String {
    match id {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn convert_test_case(
    output: TestCaseOutput,
    notation: Notation,
) -> std::result::Result<(TestCase, MissingAttributes), String> {
    let title = non_empty(output.title.clone()).ok_or("has no title")?;

    let priority = output.priority.as_deref().and_then(Priority::parse_loose);
    let severity = output.severity.as_deref().and_then(Severity::parse_loose);
    let missing = MissingAttributes {
        priority: priority.is_none(),
        severity: severity.is_none(),
    };

    let mut case = TestCase {
        id: id_text(output.id.clone()),
        title,
        priority: priority.unwrap_or_default(),
        severity: severity.unwrap_or_default(),
        category: non_empty(output.category.clone()).unwrap_or_default(),
        tags: Vec::new(),
        body: TestCaseBody::Procedural(ProceduralBody::default()),
    };
    for tag in items(output.tags.clone()) {
        case.push_tag(tag.trim_start_matches('@'));
    }

    case.body = match notation {
        Notation::Procedural => TestCaseBody::Procedural(procedural_body(output)),
        Notation::Gherkin => TestCaseBody::Gherkin(gherkin_body(output, &case.title)),
    };
    Ok((case, missing))
}

fn step_ordinal(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn procedural_body(output: TestCaseOutput) -> ProceduralBody {
    let parallel_results = items(output.expected_results);
    let mut steps = Vec::new();
    for (index, step) in output.steps.unwrap_or_default().into_iter().enumerate() {
        let position = index as u32 + 1;
        let (ordinal, description, expected) = match step {
            StepOutput::Text(text) => (position, text, None),
            StepOutput::Structured(structured) => (
                step_ordinal(structured.step.as_ref()).unwrap_or(position),
                structured.description.unwrap_or_default(),
                structured.expected_result,
            ),
        };
        let description = description.trim().to_string();
        if description.is_empty() {
            continue;
        }
        let expected_result =
            non_empty(expected).or_else(|| non_empty(parallel_results.get(index).cloned()));
        steps.push(TestStep {
            ordinal,
            description,
            expected_result,
        });
    }

    ProceduralBody {
        objective: non_empty(output.objective).unwrap_or_default(),
        preconditions: items(output.preconditions),
        steps,
        postconditions: items(output.postconditions),
    }
}

fn gherkin_body(output: TestCaseOutput, title: &str) -> GherkinBody {
    let scenario_kind = match output.scenario_type.as_deref() {
        Some(kind) if kind.to_ascii_lowercase().contains("outline") => ScenarioKind::ScenarioOutline,
        _ => ScenarioKind::Scenario,
    };
    let background = items(output.background);

    GherkinBody {
        feature: non_empty(output.feature).unwrap_or_else(|| title.to_string()),
        feature_description: non_empty(output.feature_description),
        background: if background.is_empty() {
            None
        } else {
            Some(background.join("\n"))
        },
        scenario_kind,
        given_steps: items(output.given),
        when_steps: items(output.when),
        then_steps: items(output.then),
        examples_table: output
            .examples
            .filter(|table| !table.trim().is_empty()),
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Spellings of one case field, canonical first. Must mirror the serde
/// aliases on `TestCaseOutput`.
const CASE_KEY_GROUPS: &[&[&str]] = &[
    &["id", "testCaseId", "test_case_id"],
    &["title", "name", "scenario", "scenarioName"],
    &["objective", "description"],
    &["expectedResults", "expected_results"],
    &["featureDescription", "feature_description"],
    &["scenarioType", "scenario_type", "scenarioKind", "scenario_kind"],
    &["given", "givenSteps", "given_steps"],
    &["when", "whenSteps", "when_steps"],
    &["then", "thenSteps", "then_steps"],
    &["examples", "examplesTable", "examples_table"],
];

const STEP_KEY_GROUPS: &[&[&str]] = &[
    &["step", "ordinal", "number", "stepNumber"],
    &["description", "action", "stepDescription"],
    &["expectedResult", "expected_result", "expected", "expectedOutcome"],
];

/// Keeps the first non-null spelling of each group and drops the rest, so
/// a reply carrying two spellings of one field is not a duplicate-field error.
fn keep_first_spelling(object: &mut Map<String, Value>, groups: &[&[&str]]) {
    for group in groups {
        let winner = group
            .iter()
            .find(|key| object.get(**key).is_some_and(|value| !value.is_null()));
        for key in group.iter() {
            if Some(key) != winner {
                object.remove(*key);
            }
        }
    }
}

impl TestCaseOutput {
    pub(crate) fn from_model_value(mut value: Value) -> serde_json::Result<Self> {
        if let Value::Object(object) = &mut value {
            keep_first_spelling(object, CASE_KEY_GROUPS);
            if let Some(Value::Array(steps)) = object.get_mut("steps") {
                for step in steps.iter_mut() {
                    if let Value::Object(step) = step {
                        keep_first_spelling(step, STEP_KEY_GROUPS);
                    }
                }
            }
        }
        serde_json::from_value(value)
    }
}

/// A list the model may also send as a single newline-separated string.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(untagged)]
pub(crate) enum TextList {
    Items(Vec<String>),
    Text(String),
}

impl TextList {
    pub(crate) fn into_items(self) -> Vec<String> {
        let items = match self {
            TextList::Items(items) => items,
            TextList::Text(text) => text.lines().map(str::to_string).collect(),
        };
        items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }
}

pub(crate) fn items(list: Option<TextList>) -> Vec<String> {
    list.map(TextList::into_items).unwrap_or_default()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(untagged)]
pub(crate) enum StepOutput {
    Text(String),
    Structured(StructuredStep),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StructuredStep {
    #[serde(default, alias = "ordinal", alias = "number", alias = "stepNumber")]
    pub(crate) step: Option<Value>,
    #[serde(default, alias = "action", alias = "stepDescription")]
    pub(crate) description: Option<String>,
    #[serde(
        default,
        alias = "expected_result",
        alias = "expected",
        alias = "expectedOutcome"
    )]
    pub(crate) expected_result: Option<String>,
}

/// One test case as the model emitted it, before validation.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TestCaseOutput {
    #[serde(default, alias = "testCaseId", alias = "test_case_id")]
    pub(crate) id: Option<Value>,
    #[serde(default, alias = "name", alias = "scenario", alias = "scenarioName")]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) priority: Option<String>,
    #[serde(default)]
    pub(crate) severity: Option<String>,
    #[serde(default)]
    pub(crate) category: Option<String>,
    #[serde(default)]
    pub(crate) tags: Option<TextList>,

    #[serde(default, alias = "description")]
    pub(crate) objective: Option<String>,
    #[serde(default)]
    pub(crate) preconditions: Option<TextList>,
    #[serde(default)]
    pub(crate) steps: Option<Vec<StepOutput>>,
    #[serde(default, alias = "expected_results")]
    pub(crate) expected_results: Option<TextList>,
    #[serde(default)]
    pub(crate) postconditions: Option<TextList>,

    #[serde(default)]
    pub(crate) feature: Option<String>,
    #[serde(default, alias = "feature_description")]
    pub(crate) feature_description: Option<String>,
    #[serde(default)]
    pub(crate) background: Option<TextList>,
    #[serde(default, alias = "scenario_type", alias = "scenarioKind", alias = "scenario_kind")]
    pub(crate) scenario_type: Option<String>,
    #[serde(default, alias = "givenSteps", alias = "given_steps")]
    pub(crate) given: Option<TextList>,
    #[serde(default, alias = "whenSteps", alias = "when_steps")]
    pub(crate) when: Option<TextList>,
    #[serde(default, alias = "thenSteps", alias = "then_steps")]
    pub(crate) then: Option<TextList>,
    #[serde(default, alias = "examplesTable", alias = "examples_table")]
    pub(crate) examples: Option<String>,
}

use crate::domain::generation_request::{GenerationSettings, RequestInput};
use crate::domain::schema::test_case_schema;

const MAX_DOCUMENT_CHARS: usize = 12_000;

pub(crate) fn truncate(value: &str, limit: usize) -> String {
    let trimmed = value.trim();
    match trimmed.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

fn schema_text(settings: &GenerationSettings) -> String {
    serde_json::to_string_pretty(&test_case_schema(settings.output_notation))
        .unwrap_or_else(|_| "{}".to_string())
}

fn settings_block(settings: &GenerationSettings) -> String {
    format!(
        "Output notation: {}\nResponse language: {}\nDefault priority: {}\nDefault severity: {}\nTest type: {}\nCoverage focus: {}\n",
        settings.output_notation.as_str(),
        settings.language,
        settings.priority,
        settings.severity,
        settings.test_type,
        settings.coverage_focus
    )
}

pub(crate) fn build_generation_system_prompt(settings: &GenerationSettings) -> String {
    format!(
        "You are a senior QA engineer. Derive test cases from the material the user provides. Write every human-readable field in {}. Return a single JSON object that matches this schema exactly:\n{}\nUse the key names shown. Give every test case a unique id and a title. Return only JSON, no prose and no markdown.",
        settings.language,
        schema_text(settings)
    )
}

pub(crate) fn build_generation_user_prompt(
    input: &RequestInput,
    settings: &GenerationSettings,
) -> String {
    let mut body = settings_block(settings);

    match input {
        RequestInput::Text { criteria } => {
            body.push_str("\nAcceptance criteria:\n");
            body.push_str(criteria);
            body.push('\n');
        }
        RequestInput::ImageSet { images } => {
            body.push_str(&format!(
                "\n{} screenshot(s) of the system under test are attached. Derive test cases for the behaviour they show.\n",
                images.len()
            ));
            for (index, image) in images.iter().enumerate() {
                body.push_str(&format!(
                    "- Image {}: {} ({})\n",
                    index + 1,
                    image.name.as_deref().unwrap_or("unnamed"),
                    image.mime_type
                ));
            }
        }
        RequestInput::ApiSpec { spec } => {
            body.push_str(&format!("\nAPI description: {}\n", spec.source_url));
            if let Some(title) = spec.title.as_ref() {
                body.push_str(&format!("Title: {}\n", title));
            }
            if let Some(version) = spec.version.as_ref() {
                body.push_str(&format!("Version: {}\n", version));
            }
            body.push_str("\nEndpoints:\n");
            for endpoint in &spec.endpoints {
                body.push_str("- ");
                body.push_str(endpoint);
                body.push('\n');
            }
            let document = serde_json::to_string(&spec.document).unwrap_or_default();
            body.push_str("\nDocument:\n");
            body.push_str(&truncate(&document, MAX_DOCUMENT_CHARS));
            body.push('\n');
        }
    }

    body
}

pub(crate) fn build_refinement_system_prompt(settings: &GenerationSettings) -> String {
    format!(
        "You are a senior QA engineer reviewing an existing set of test cases. Refine them: make them more comprehensive, add missing negative and edge cases, sharpen steps and expected results, and keep ids that still apply. Write in {}. Return the complete refined set as a single JSON object with the same schema:\n{}\nReturn only JSON, no prose and no markdown.",
        settings.language,
        schema_text(settings)
    )
}

pub(crate) fn build_refinement_user_prompt(
    input: &RequestInput,
    settings: &GenerationSettings,
    rendered_batch: &str,
    round: u8,
) -> String {
    let mut body = settings_block(settings);
    body.push_str(&format!(
        "Refinement round: {} of {}\n",
        round, settings.refinement_rounds
    ));
    if let RequestInput::Text { criteria } = input {
        body.push_str("\nAcceptance criteria:\n");
        body.push_str(criteria);
        body.push('\n');
    }
    body.push_str("\nCurrent test cases:\n");
    body.push_str(rendered_batch);
    body.push('\n');
    body
}

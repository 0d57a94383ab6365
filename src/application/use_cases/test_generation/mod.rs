mod llm_output;
mod prompts;
mod types;

use crate::application::use_cases::identity::finalize_batch;
use crate::application::use_cases::input_normalizer::InputNormalizer;
use crate::application::use_cases::renderer::{render, render_batch};
use crate::domain::error::{AppError, Result};
use crate::domain::generation_request::{
    GenerationRequest, GenerationSettings, RawInput, RequestInput,
};
use crate::domain::llm_config::LLMConfig;
use crate::domain::test_case::TestCase;
use crate::infrastructure::llm_clients::{check_model_identifier, ModelGateway, ModelPrompt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info, warn};

use llm_output::parse_test_cases;
use prompts::{
    build_generation_system_prompt, build_generation_user_prompt, build_refinement_system_prompt,
    build_refinement_user_prompt,
};

/// A generated test case together with its rendered text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderedTestCase {
    #[serde(flatten)]
    pub test_case: TestCase,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutcome {
    pub test_cases: Vec<RenderedTestCase>,
    /// Never larger than the requested number of rounds.
    pub rounds_completed: u8,
    /// Set when a refinement round failed and the previous batch was kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refinement_error: Option<AppError>,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub input_digest: String,
    pub generated_at: DateTime<Utc>,
}

impl GenerationOutcome {
    pub fn cases(&self) -> impl Iterator<Item = &TestCase> {
        self.test_cases.iter().map(|rendered| &rendered.test_case)
    }
}

pub(crate) fn input_digest(config: &LLMConfig, request: &GenerationRequest) -> String {
    let settings = serde_json::to_string(&request.settings).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(config.model.as_bytes());
    hasher.update(b"\n");
    hasher.update(settings.as_bytes());
    hasher.update(b"\n");
    hasher.update(request.input.summary().as_bytes());
    hex::encode(hasher.finalize())
}

pub struct TestGenerationUseCase {
    gateway: ModelGateway,
    normalizer: Arc<InputNormalizer>,
}

impl TestGenerationUseCase {
    pub fn new(gateway: ModelGateway, normalizer: Arc<InputNormalizer>) -> Self {
        Self {
            gateway,
            normalizer,
        }
    }

    /// Normalizes caller input and generates a batch for it.
    ///
    /// Fails with `InvalidInput` before any model call when `config` has no
    /// credential. Unrecognized model identifiers are only warned about.
    pub async fn execute(
        &self,
        raw: &RawInput,
        settings: GenerationSettings,
        config: &LLMConfig,
    ) -> Result<GenerationOutcome> {
        if !config.has_credential() {
            return Err(AppError::InvalidInput(
                "Test generation requires a model API key.".to_string(),
            ));
        }

        let mut warnings = Vec::new();
        if let Some(warning) = check_model_identifier(&config.model) {
            warn!(model = %config.model, "{}", warning);
            warnings.push(warning);
        }

        let request = self.normalizer.build_request(raw, settings).await?;
        let mut outcome = self.generate(&request, config).await?;
        warnings.append(&mut outcome.warnings);
        outcome.warnings = warnings;
        Ok(outcome)
    }

    /// Runs the first round and then each refinement round in order.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        config: &LLMConfig,
    ) -> Result<GenerationOutcome> {
        let settings = &request.settings;
        let digest = input_digest(config, request);
        info!(
            model = %config.model,
            input = request.input.kind().as_str(),
            notation = settings.output_notation.as_str(),
            rounds = settings.refinement_rounds,
            digest = %digest,
            "Generating test cases"
        );

        let mut prompt = ModelPrompt::new(
            build_generation_system_prompt(settings),
            build_generation_user_prompt(&request.input, settings),
        );
        if let RequestInput::ImageSet { images } = &request.input {
            prompt = prompt.with_images(images.clone());
        }

        let mut batch = self.run_round(config, &prompt, settings).await?;
        let mut rounds_completed: u8 = 1;
        let mut refinement_error = None;
        debug!(cases = batch.len(), "Initial round parsed");

        for round in 2..=settings.refinement_rounds {
            let rendered = render_batch(&batch);
            let prompt = ModelPrompt::new(
                build_refinement_system_prompt(settings),
                build_refinement_user_prompt(&request.input, settings, &rendered, round),
            );
            match self.run_round(config, &prompt, settings).await {
                Ok(refined) => {
                    debug!(round, cases = refined.len(), "Refinement round parsed");
                    batch = refined;
                    rounds_completed = round;
                }
                Err(err) => {
                    warn!(
                        round,
                        error = %err,
                        "Refinement round failed, keeping batch from round {}",
                        rounds_completed
                    );
                    refinement_error = Some(err);
                    break;
                }
            }
        }

        info!(
            cases = batch.len(),
            rounds_completed,
            "Test case generation finished"
        );

        let test_cases = batch
            .into_iter()
            .map(|test_case| RenderedTestCase {
                content: render(&test_case),
                test_case,
            })
            .collect();

        Ok(GenerationOutcome {
            test_cases,
            rounds_completed,
            refinement_error,
            warnings: Vec::new(),
            input_digest: digest,
            generated_at: Utc::now(),
        })
    }

    async fn run_round(
        &self,
        config: &LLMConfig,
        prompt: &ModelPrompt,
        settings: &GenerationSettings,
    ) -> Result<Vec<TestCase>> {
        let reply = self.gateway.invoke_structured(config, prompt).await?;
        let parsed = parse_test_cases(&reply, settings.output_notation)?;
        Ok(finalize_batch(parsed, settings))
    }
}

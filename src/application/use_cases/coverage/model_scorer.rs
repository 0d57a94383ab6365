use super::normalize::normalize_report;
use super::{CoverageEntry, CoverageScorer};
use crate::domain::coverage::CoverageReport;
use crate::domain::error::Result;
use crate::domain::generation_request::RequestInput;
use crate::domain::llm_config::LLMConfig;
use crate::domain::schema::coverage_report_schema;
use crate::infrastructure::llm_clients::{ModelGateway, ModelPrompt};
use async_trait::async_trait;
use tracing::info;

const MAX_DOCUMENT_CHARS: usize = 8_000;

fn build_system_prompt() -> String {
    let schema = serde_json::to_string_pretty(&coverage_report_schema())
        .unwrap_or_else(|_| "{}".to_string());
    format!(
        "You are a QA lead assessing how well a set of test cases covers a requirement. Identify every testable area of the requirement, decide whether the test cases cover it, and name the ids of the supporting test cases. Return a single JSON object matching this schema exactly:\n{}\nReturn only JSON, no prose and no markdown.",
        schema
    )
}

fn build_user_prompt(entries: &[CoverageEntry], requirement: &RequestInput) -> String {
    let mut body = String::new();
    match requirement {
        RequestInput::Text { criteria } => {
            body.push_str("Requirement:\n");
            body.push_str(criteria);
            body.push('\n');
        }
        RequestInput::ImageSet { images } => {
            body.push_str(&format!(
                "Requirement: the {} attached screenshot(s) of the system under test.\n",
                images.len()
            ));
        }
        RequestInput::ApiSpec { spec } => {
            body.push_str(&format!("Requirement: the API described at {}\n", spec.source_url));
            body.push_str("Endpoints:\n");
            for endpoint in &spec.endpoints {
                body.push_str("- ");
                body.push_str(endpoint);
                body.push('\n');
            }
            let document = serde_json::to_string(&spec.document).unwrap_or_default();
            let preview: String = document.chars().take(MAX_DOCUMENT_CHARS).collect();
            body.push_str("Document:\n");
            body.push_str(&preview);
            body.push('\n');
        }
    }

    body.push_str(&format!("\nTest cases ({}):\n", entries.len()));
    for entry in entries {
        body.push_str(&format!("\n[{}]\n{}\n", entry.id, entry.text));
    }
    body
}

pub struct ModelScorer {
    gateway: ModelGateway,
    config: LLMConfig,
}

impl ModelScorer {
    pub fn new(gateway: ModelGateway, config: LLMConfig) -> Self {
        Self { gateway, config }
    }
}

#[async_trait]
impl CoverageScorer for ModelScorer {
    async fn score(
        &self,
        entries: &[CoverageEntry],
        requirement: &RequestInput,
    ) -> Result<CoverageReport> {
        let mut prompt = ModelPrompt::new(build_system_prompt(), build_user_prompt(entries, requirement));
        if let RequestInput::ImageSet { images } = requirement {
            prompt = prompt.with_images(images.clone());
        }

        let reply = self.gateway.invoke_structured(&self.config, &prompt).await?;
        let report = normalize_report(&reply)?;
        info!(
            model = %self.config.model,
            score = ?report.score,
            missing = report.missing_areas.len(),
            "Model coverage scored"
        );
        Ok(report)
    }
}

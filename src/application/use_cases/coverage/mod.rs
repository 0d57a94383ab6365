//! Coverage analysis of a set of test cases against a requirement source.

mod heuristic;
mod model_scorer;
mod normalize;

pub use heuristic::{HeuristicConfig, HeuristicScorer};
pub use model_scorer::ModelScorer;

use crate::application::use_cases::input_normalizer::InputNormalizer;
use crate::application::use_cases::renderer::{parse_loose_batch, render};
use crate::domain::coverage::{CoverageReport, CoverageRequest, CoverageSubject};
use crate::domain::error::Result;
use crate::domain::generation_request::{InputKind, RequestInput};
use crate::domain::llm_config::LLMConfig;
use crate::infrastructure::llm_clients::ModelGateway;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringStrategy {
    Heuristic,
    Model,
    /// Nothing can score this input; the result is a deferred report.
    Deferred,
}

pub fn select_strategy(kind: InputKind, has_model_access: bool) -> ScoringStrategy {
    match (kind, has_model_access) {
        (_, true) => ScoringStrategy::Model,
        (InputKind::Text, false) => ScoringStrategy::Heuristic,
        (InputKind::ImageSet | InputKind::ApiSpec, false) => ScoringStrategy::Deferred,
    }
}

/// One test case as coverage sees it: an id and searchable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageEntry {
    pub id: String,
    pub text: String,
}

pub fn coverage_entries(subject: &CoverageSubject) -> Vec<CoverageEntry> {
    match subject {
        CoverageSubject::Cases(cases) => cases
            .iter()
            .map(|case| CoverageEntry {
                id: case.id.clone(),
                text: render(case),
            })
            .collect(),
        CoverageSubject::RawText(text) => parse_loose_batch(text)
            .into_iter()
            .enumerate()
            .map(|(index, draft)| CoverageEntry {
                id: draft
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("#{}", index + 1)),
                text: draft.searchable_text().to_string(),
            })
            .collect(),
    }
}

#[async_trait]
pub trait CoverageScorer {
    async fn score(
        &self,
        entries: &[CoverageEntry],
        requirement: &RequestInput,
    ) -> Result<CoverageReport>;
}

pub struct CoverageAnalyzer {
    gateway: ModelGateway,
    normalizer: Arc<InputNormalizer>,
    heuristic: HeuristicConfig,
}

impl CoverageAnalyzer {
    pub fn new(
        gateway: ModelGateway,
        normalizer: Arc<InputNormalizer>,
        heuristic: HeuristicConfig,
    ) -> Self {
        Self {
            gateway,
            normalizer,
            heuristic,
        }
    }

    /// Scores `request.test_cases` against the requirement.
    ///
    /// Model access means `config` carries a credential. Model failures on
    /// that path are returned as errors; the heuristic path never fails.
    pub async fn analyze(
        &self,
        request: &CoverageRequest,
        config: &LLMConfig,
    ) -> Result<CoverageReport> {
        let kind = request.requirement.kind;
        let strategy = select_strategy(kind, config.has_credential());
        let entries = coverage_entries(&request.test_cases);
        info!(
            input = kind.as_str(),
            strategy = ?strategy,
            cases = entries.len(),
            "Analyzing coverage"
        );

        match strategy {
            ScoringStrategy::Deferred => {
                debug!("No model access for non-text requirement, deferring analysis");
                Ok(CoverageReport::deferred())
            }
            ScoringStrategy::Heuristic => {
                warn!("No model access, scoring coverage heuristically");
                let criteria = request.requirement.criteria.clone().unwrap_or_default();
                HeuristicScorer::new(self.heuristic.clone())
                    .score(&entries, &RequestInput::Text { criteria })
                    .await
            }
            ScoringStrategy::Model => {
                let requirement = self.normalizer.normalize(&request.requirement).await?;
                ModelScorer::new(self.gateway.clone(), config.clone())
                    .score(&entries, &requirement)
                    .await
            }
        }
    }
}

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

use crate::application::use_cases::coverage::HeuristicConfig;
use crate::application::use_cases::input_normalizer::InputLimits;
use crate::application::{CoverageAnalyzer, InputNormalizer, TestGenerationUseCase};
use crate::infrastructure::api_spec::{ApiSpecFetcher, HttpApiSpecFetcher};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::llm_clients::{LLMClient, ModelGateway, RouterClient};
use crate::interfaces::http::{start_server, HttpState};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber. `RUST_LOG` wins over `level`.
/// Later calls are no-ops.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Wires the use cases against live model providers and HTTP fetching.
pub fn build_state(config: &AppConfig) -> HttpState {
    let llm_client: Arc<dyn LLMClient + Send + Sync> = Arc::new(RouterClient::new());
    build_state_with_client(config, llm_client)
}

pub fn build_state_with_client(
    config: &AppConfig,
    llm_client: Arc<dyn LLMClient + Send + Sync>,
) -> HttpState {
    let gateway = ModelGateway::new(llm_client).with_timeout(config.model.timeout());
    let fetcher: Arc<dyn ApiSpecFetcher + Send + Sync> =
        Arc::new(HttpApiSpecFetcher::new(config.limits.max_api_spec_bytes));
    let normalizer = Arc::new(InputNormalizer::new(
        fetcher,
        InputLimits {
            max_image_payload_bytes: config.limits.max_image_payload_bytes,
        },
    ));
    let heuristic = HeuristicConfig {
        min_term_length: config.coverage.min_term_length,
        ..HeuristicConfig::default()
    }
    .with_extra_stop_words(&config.coverage.extra_stop_words);

    HttpState {
        generation: TestGenerationUseCase::new(gateway.clone(), normalizer.clone()),
        coverage: CoverageAnalyzer::new(gateway, normalizer, heuristic),
        default_model: config.model.llm_config(),
    }
}

pub async fn run(config: AppConfig) -> std::io::Result<()> {
    info!(
        provider = ?config.model.provider,
        model = %config.model.model,
        timeout_secs = config.model.timeout_secs,
        "Starting caseforge"
    );
    let state = build_state(&config);
    start_server(
        state,
        &config.server.host,
        config.server.port,
        config.limits.max_request_body_bytes(),
    )?
    .await
}

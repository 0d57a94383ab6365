use crate::application::{CoverageAnalyzer, TestGenerationUseCase};
use crate::domain::coverage::{CoverageRequest, CoverageSubject};
use crate::domain::error::{AppError, ModelErrorKind};
use crate::domain::generation_request::{GenerationSettings, RawInput};
use crate::domain::llm_config::{LLMConfig, ModelAccess};
use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::error::InternalError;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use serde::{Deserialize, Serialize};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub struct HttpState {
    pub generation: TestGenerationUseCase,
    pub coverage: CoverageAnalyzer,
    /// Model access used for every field a request leaves out.
    pub default_model: LLMConfig,
}

impl HttpState {
    fn model_for(&self, overrides: &ModelAccess) -> LLMConfig {
        self.default_model.overridden_by(overrides)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub input: RawInput,
    #[serde(default)]
    pub settings: GenerationSettings,
    #[serde(default)]
    pub model: ModelAccess,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageHttpRequest {
    pub test_cases: CoverageSubject,
    pub requirement: RawInput,
    #[serde(default)]
    pub model: ModelAccess,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AppError::UpstreamFetch { .. } => StatusCode::BAD_GATEWAY,
        AppError::SchemaViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::Model(model) => match model.kind {
            ModelErrorKind::AuthFailure => StatusCode::UNAUTHORIZED,
            ModelErrorKind::ModelNotFound => StatusCode::NOT_FOUND,
            ModelErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ModelErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ModelErrorKind::Unknown => StatusCode::BAD_GATEWAY,
        },
        AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_body(err: &AppError) -> ErrorBody {
    let (message, raw) = match err {
        AppError::InvalidInput(message) | AppError::Config(message) | AppError::Internal(message) => {
            (message.clone(), None)
        }
        AppError::UpstreamFetch { url, message } => (format!("{} ({})", message, url), None),
        AppError::Model(model) => (model.message.clone(), None),
        AppError::SchemaViolation { message, raw } => (message.clone(), Some(raw.clone())),
    };
    ErrorBody {
        error: err.code().to_string(),
        message,
        retryable: err.is_retryable(),
        raw,
    }
}

fn error_response(err: &AppError, request_id: &str) -> HttpResponse {
    let status = status_for(err);
    if status.is_server_error() {
        error!(code = err.code(), "{}", err);
    } else {
        warn!(code = err.code(), "{}", err);
    }
    HttpResponse::build(status)
        .insert_header((REQUEST_ID_HEADER, request_id.to_string()))
        .json(error_body(err))
}

#[post("/generate")]
async fn generate(data: web::Data<HttpState>, req: web::Json<GenerateRequest>) -> impl Responder {
    let request_id = Uuid::new_v4().to_string();
    let span = info_span!("http_request", request_id = %request_id, route = "/api/generate");
    let req = req.into_inner();

    async move {
        let config = data.model_for(&req.model);
        info!(
            input = req.input.kind.as_str(),
            provider = ?config.provider,
            model = %config.model,
            "Generate request received"
        );

        match data
            .generation
            .execute(&req.input, req.settings, &config)
            .await
        {
            Ok(outcome) => HttpResponse::Ok()
                .insert_header((REQUEST_ID_HEADER, request_id.clone()))
                .json(outcome),
            Err(e) => error_response(&e, &request_id),
        }
    }
    .instrument(span)
    .await
}

#[post("/coverage")]
async fn coverage(
    data: web::Data<HttpState>,
    req: web::Json<CoverageHttpRequest>,
) -> impl Responder {
    let request_id = Uuid::new_v4().to_string();
    let span = info_span!("http_request", request_id = %request_id, route = "/api/coverage");
    let req = req.into_inner();

    async move {
        let config = data.model_for(&req.model);
        let request = CoverageRequest {
            test_cases: req.test_cases,
            requirement: req.requirement,
        };
        info!(
            input = request.requirement.kind.as_str(),
            model_access = config.has_credential(),
            "Coverage request received"
        );

        match data.coverage.analyze(&request, &config).await {
            Ok(report) => HttpResponse::Ok()
                .insert_header((REQUEST_ID_HEADER, request_id.clone()))
                .json(report),
            Err(e) => error_response(&e, &request_id),
        }
    }
    .instrument(span)
    .await
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Body extractor config: bodies up to `limit` bytes, and rejected bodies
/// answered with the usual `InvalidInput` error JSON.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            let app_err = AppError::InvalidInput(format!("Invalid request body: {}", err));
            warn!(code = app_err.code(), "{}", app_err);
            let response = HttpResponse::build(status_for(&app_err)).json(error_body(&app_err));
            InternalError::from_response(err, response).into()
        })
}

/// Registers the `/api` scope accepting JSON bodies up to `json_limit`
/// bytes. Shared by the server and in-process tests.
pub fn routes(json_limit: usize) -> impl Fn(&mut web::ServiceConfig) + Clone {
    move |cfg: &mut web::ServiceConfig| {
        cfg.service(
            web::scope("/api")
                .app_data(json_config(json_limit))
                .service(generate)
                .service(coverage)
                .service(health),
        );
    }
}

pub fn start_server(
    state: HttpState,
    host: &str,
    port: u16,
    json_limit: usize,
) -> std::io::Result<Server> {
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(routes(json_limit))
    })
    .bind((host.to_string(), port))?
    .run();

    info!(host, port, json_limit, "HTTP server listening");
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::InvalidInput("x".into()), 400),
            (AppError::model(ModelErrorKind::AuthFailure, "x"), 401),
            (AppError::model(ModelErrorKind::ModelNotFound, "x"), 404),
            (AppError::schema_violation("x", "raw"), 422),
            (AppError::model(ModelErrorKind::RateLimited, "x"), 429),
            (AppError::upstream_fetch("https://example.com", "x"), 502),
            (AppError::model(ModelErrorKind::Unknown, "x"), 502),
            (AppError::model(ModelErrorKind::Timeout, "x"), 504),
            (AppError::Config("x".into()), 500),
            (AppError::Internal("x".into()), 500),
        ];
        for (err, expected) in cases {
            assert_eq!(status_for(&err).as_u16(), expected, "{err:?}");
        }
    }

    #[test]
    fn test_error_body_carries_raw_payload_for_schema_violations() {
        let body = error_body(&AppError::schema_violation("no testCases", "{\"cases\": []}"));
        assert_eq!(body.error, "schema_violation");
        assert!(body.retryable);
        assert_eq!(body.raw.as_deref(), Some("{\"cases\": []}"));

        let body = error_body(&AppError::model(ModelErrorKind::RateLimited, "slow down"));
        assert_eq!(body.error, "rate_limited");
        assert!(body.retryable);
        assert!(body.raw.is_none());
    }

    #[test]
    fn test_generate_request_defaults() {
        let req: GenerateRequest = serde_json::from_str(
            r#"{"input": {"kind": "text", "criteria": "user must reset password via email"}}"#,
        )
        .unwrap();
        assert_eq!(req.settings, GenerationSettings::default());
        assert!(req.model.api_key.is_none());
    }
}

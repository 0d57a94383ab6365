//! Provider clients and gateway behaviour against a wiremock server.

mod common;

use caseforge_lib::domain::error::{AppError, ModelErrorKind};
use caseforge_lib::infrastructure::llm_clients::gemini::GeminiClient;
use caseforge_lib::infrastructure::llm_clients::openai::OpenAIClient;
use caseforge_lib::infrastructure::llm_clients::{
    LLMClient, ModelGateway, ModelPrompt, RouterClient,
};
use common::{chat_completion, gemini_config, openai_config, TEST_KEY};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn prompt() -> ModelPrompt {
    ModelPrompt::new("Return only JSON.", "user must reset password via email")
}

#[tokio::test]
async fn test_openai_success_returns_message_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", format!("Bearer {}", TEST_KEY).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("{\"ok\": true}")))
        .expect(1)
        .mount(&server)
        .await;

    let text = OpenAIClient::new()
        .generate(&openai_config(&server), &prompt())
        .await
        .unwrap();
    assert_eq!(text, "{\"ok\": true}");
}

#[tokio::test]
async fn test_openai_rate_limit_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "Rate limit reached", "type": "requests"}
        })))
        .mount(&server)
        .await;

    let err = OpenAIClient::new()
        .generate(&openai_config(&server), &prompt())
        .await
        .unwrap_err();
    assert_eq!(err.model_kind(), Some(ModelErrorKind::RateLimited));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_openai_missing_model_is_terminal_and_named() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"message": "The model `gpt-4o-mini` does not exist", "code": "model_not_found"}
        })))
        .mount(&server)
        .await;

    let err = OpenAIClient::new()
        .generate(&openai_config(&server), &prompt())
        .await
        .unwrap_err();
    assert_eq!(err.model_kind(), Some(ModelErrorKind::ModelNotFound));
    assert!(!err.is_retryable());
    assert!(err.to_string().contains("gpt-4o-mini"));
}

#[tokio::test]
async fn test_openai_auth_failure_masks_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Incorrect API key provided"))
        .mount(&server)
        .await;

    let err = OpenAIClient::new()
        .generate(&openai_config(&server), &prompt())
        .await
        .unwrap_err();
    assert_eq!(err.model_kind(), Some(ModelErrorKind::AuthFailure));
    let message = err.to_string();
    assert!(message.contains("...abcd"));
    assert!(!message.contains(TEST_KEY));
}

#[tokio::test]
async fn test_gemini_success_concatenates_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:generateContent"))
        .and(query_param("key", "gemini-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"parts": [{"text": "{\"testCases\": "}, {"text": "[]}"}]},
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = GeminiClient::new()
        .generate(&gemini_config(&server), &prompt())
        .await
        .unwrap();
    assert_eq!(text, "{\"testCases\": []}");
}

#[tokio::test]
async fn test_gemini_unknown_model_body_is_model_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "models/gemini-1.5-flash is not found for API version v1beta", "status": "NOT_FOUND"}
        })))
        .mount(&server)
        .await;

    let err = GeminiClient::new()
        .generate(&gemini_config(&server), &prompt())
        .await
        .unwrap_err();
    assert_eq!(err.model_kind(), Some(ModelErrorKind::ModelNotFound));
}

#[tokio::test]
async fn test_router_dispatches_on_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "from gemini"}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = RouterClient::new()
        .generate(&gemini_config(&server), &prompt())
        .await
        .unwrap();
    assert_eq!(text, "from gemini");
}

#[tokio::test]
async fn test_gateway_times_out_slow_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_completion("{}"))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let gateway =
        ModelGateway::new(Arc::new(OpenAIClient::new())).with_timeout(Duration::from_millis(50));
    let err = gateway
        .invoke_text(&openai_config(&server), &prompt())
        .await
        .unwrap_err();
    assert_eq!(err.model_kind(), Some(ModelErrorKind::Timeout));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_gateway_structured_call_reads_fenced_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(
            "Here you go:\n```json\n{\"testCases\": [{\"title\": \"x\"}]}\n```",
        )))
        .mount(&server)
        .await;

    let gateway = ModelGateway::new(Arc::new(OpenAIClient::new()));
    let reply = gateway
        .invoke_structured(&openai_config(&server), &prompt())
        .await
        .unwrap();
    assert_eq!(reply.value["testCases"][0]["title"], "x");
}

#[tokio::test]
async fn test_gateway_prose_reply_is_schema_violation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(
            "I cannot produce test cases for that.",
        )))
        .mount(&server)
        .await;

    let gateway = ModelGateway::new(Arc::new(OpenAIClient::new()));
    let err = gateway
        .invoke_structured(&openai_config(&server), &prompt())
        .await
        .unwrap_err();
    match err {
        AppError::SchemaViolation { raw, .. } => {
            assert_eq!(raw, "I cannot produce test cases for that.")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

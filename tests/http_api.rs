//! End-to-end through the HTTP routes with the model provider mocked.

mod common;

use actix_web::{test, web, App};
use caseforge_lib::build_state;
use caseforge_lib::infrastructure::config::LimitsConfig;
use caseforge_lib::interfaces::http::{routes, ErrorBody};
use common::{app_config, chat_completion, procedural_batch, TEST_KEY};
use serde_json::{json, Value};
use std::collections::HashSet;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn body_limit() -> usize {
    LimitsConfig::default().max_request_body_bytes()
}

#[actix_web::test]
async fn test_health() {
    let server = MockServer::start().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(&app_config(&server))))
            .configure(routes(body_limit())),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn test_generate_returns_rendered_unique_cases() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(&procedural_batch())))
        .expect(1)
        .mount(&server)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(&app_config(&server))))
            .configure(routes(body_limit())),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .set_json(json!({
            "input": {"kind": "text", "criteria": "user must reset password via email"},
            "settings": {"outputNotation": "procedural", "refinementRounds": 1},
            "model": {"apiKey": TEST_KEY}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
    assert!(resp.headers().contains_key("x-request-id"));

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["roundsCompleted"], 1);
    let cases = body["testCases"].as_array().unwrap();
    assert_eq!(cases.len(), 2);

    let ids: HashSet<&str> = cases.iter().map(|case| case["id"].as_str().unwrap()).collect();
    assert_eq!(ids.len(), 2);
    assert_eq!(cases[0]["priority"], "P1");
    assert_eq!(cases[1]["priority"], "P2");
    assert_eq!(cases[1]["severity"], "Major");
    assert!(cases[0]["content"]
        .as_str()
        .unwrap()
        .starts_with("ID: TC-001\nTitle: Reset link is emailed to a registered user"));
    assert_eq!(body["inputDigest"].as_str().unwrap().len(), 64);
}

#[actix_web::test]
async fn test_generate_without_credential_is_bad_request() {
    let server = MockServer::start().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(&app_config(&server))))
            .configure(routes(body_limit())),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .set_json(json!({"input": {"kind": "text", "criteria": "user must reset password via email"}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
    let body: ErrorBody = test::read_body_json(resp).await;
    assert_eq!(body.error, "invalid_input");
    assert!(!body.retryable);
}

#[actix_web::test]
async fn test_generate_maps_rate_limit_to_429() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too many requests"))
        .mount(&server)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(&app_config(&server))))
            .configure(routes(body_limit())),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .set_json(json!({
            "input": {"kind": "text", "criteria": "user must reset password via email"},
            "model": {"apiKey": TEST_KEY}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 429);
    let body: ErrorBody = test::read_body_json(resp).await;
    assert_eq!(body.error, "rate_limited");
    assert!(body.retryable);
}

#[actix_web::test]
async fn test_generate_schema_violation_carries_raw_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("{\"cases\": []}")))
        .mount(&server)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(&app_config(&server))))
            .configure(routes(body_limit())),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .set_json(json!({
            "input": {"kind": "text", "criteria": "user must reset password via email"},
            "model": {"apiKey": TEST_KEY}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 422);
    let body: ErrorBody = test::read_body_json(resp).await;
    assert_eq!(body.raw.as_deref(), Some("{\"cases\": []}"));
}

#[actix_web::test]
async fn test_coverage_heuristic_without_model_access() {
    let server = MockServer::start().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(&app_config(&server))))
            .configure(routes(body_limit())),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/coverage")
        .set_json(json!({
            "testCases": "ID: TC-001\nTitle: Apply coupon at checkout\n\n---\n\nID: TC-002\nTitle: Invoice total is correct",
            "requirement": {"kind": "text", "criteria": "checkout coupon invoice refund"}
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["score"], 75);
    assert_eq!(body["requiresDeepAnalysis"], false);
    assert_eq!(body["missingAreas"][0]["description"], "refund");
}

#[actix_web::test]
async fn test_coverage_for_image_without_model_access_is_deferred() {
    let server = MockServer::start().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(&app_config(&server))))
            .configure(routes(body_limit())),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/coverage")
        .set_json(json!({
            "testCases": [],
            "requirement": {"kind": "imageSet", "images": [{"data": "aGVsbG8="}]}
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["score"], Value::Null);
    assert_eq!(body["requiresDeepAnalysis"], true);
    assert_eq!(body["suggestions"], json!([]));
}

#[actix_web::test]
async fn test_coverage_with_model_access_uses_model_report() {
    let server = MockServer::start().await;
    let report = json!({
        "coverage": 90,
        "missingAreas": [{"description": "Refunds", "importance": "high"}],
        "summary": "Nearly complete"
    });
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(&report.to_string())))
        .expect(1)
        .mount(&server)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(&app_config(&server))))
            .configure(routes(body_limit())),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/coverage")
        .set_json(json!({
            "testCases": "ID: TC-001\nTitle: Apply coupon at checkout",
            "requirement": {"kind": "text", "criteria": "checkout coupon invoice refund"},
            "model": {"apiKey": TEST_KEY}
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["score"], 90);
    assert_eq!(body["missingAreas"][0]["importance"], "high");
    assert_eq!(body["narrative"], "Nearly complete");
}

#[actix_web::test]
async fn test_image_bodies_over_two_mib_reach_the_analyzer() {
    let server = MockServer::start().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(&app_config(&server))))
            .configure(routes(body_limit())),
    )
    .await;

    let data = "A".repeat(3 * 1024 * 1024);
    let req = test::TestRequest::post()
        .uri("/api/coverage")
        .set_json(json!({
            "testCases": [],
            "requirement": {"kind": "imageSet", "images": [{"data": data}]}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["requiresDeepAnalysis"], true);
}

#[actix_web::test]
async fn test_oversized_body_gets_invalid_input_json() {
    let server = MockServer::start().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(&app_config(&server))))
            .configure(routes(1024)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/coverage")
        .set_json(json!({
            "testCases": [],
            "requirement": {"kind": "imageSet", "images": [{"data": "A".repeat(4096)}]}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
    let body: ErrorBody = test::read_body_json(resp).await;
    assert_eq!(body.error, "invalid_input");
    assert!(!body.retryable);
    assert!(body.message.starts_with("Invalid request body"), "{}", body.message);
}

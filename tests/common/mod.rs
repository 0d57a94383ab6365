//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use caseforge_lib::domain::llm_config::{LLMConfig, LLMProvider};
use caseforge_lib::infrastructure::config::AppConfig;
use serde_json::{json, Value};
use wiremock::MockServer;

pub const TEST_KEY: &str = "sk-test-0123456789abcd";

pub fn openai_config(server: &MockServer) -> LLMConfig {
    LLMConfig {
        provider: LLMProvider::OpenAI,
        base_url: server.uri(),
        model: "gpt-4o-mini".to_string(),
        api_key: Some(TEST_KEY.to_string()),
        max_tokens: Some(512),
        temperature: Some(0.0),
    }
}

pub fn gemini_config(server: &MockServer) -> LLMConfig {
    LLMConfig {
        provider: LLMProvider::Gemini,
        base_url: server.uri(),
        model: "gemini-1.5-flash".to_string(),
        api_key: Some("gemini-test-key".to_string()),
        max_tokens: None,
        temperature: None,
    }
}

/// Application config pointing the default model at `server`, without a key.
pub fn app_config(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.model.base_url = server.uri();
    config.model.api_key = None;
    config.model.timeout_secs = 5;
    config
}

/// An OpenAI chat-completions body whose message content is `content`.
pub fn chat_completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

pub fn procedural_batch() -> String {
    json!({
        "testCases": [
            {
                "id": "TC-001",
                "title": "Reset link is emailed to a registered user",
                "priority": "P1",
                "objective": "Verify a registered user receives a reset email",
                "preconditions": ["A registered account exists"],
                "steps": [
                    {"step": 1, "description": "Open the forgot password page"},
                    {"step": 2, "description": "Submit the registered email", "expectedResult": "A reset email is sent"}
                ]
            },
            {
                "id": "TC-001",
                "title": "Unknown email shows a neutral message",
                "steps": ["Submit an unregistered email"]
            }
        ]
    })
    .to_string()
}

use once_cell::sync::Lazy;
use regex::Regex;

static THINK_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<think>[\s\S]*?</think>|<think\s*/>").unwrap());

static REASONING_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<reasoning>[\s\S]*?</reasoning>").unwrap());

static FENCED_BLOCK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[A-Za-z0-9_-]*[ \t]*\r?\n?([\s\S]*?)```").unwrap());

/// Strips reasoning artifacts some models prepend to their answer.
pub fn clean_llm_response(response: &str) -> String {
    let cleaned = THINK_TAG_PATTERN.replace_all(response, "");
    let cleaned = REASONING_TAG_PATTERN.replace_all(&cleaned, "");
    cleaned.trim().to_string()
}

/// Finds the structured payload inside a model reply.
///
/// Tried in order: the whole text, each fenced block, then the first
/// balanced JSON object/array embedded in prose. Returns `None` when no
/// candidate parses.
pub fn extract_json_payload(output: &str) -> Option<serde_json::Value> {
    let trimmed = output.trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return Some(value);
    }

    for captures in FENCED_BLOCK_PATTERN.captures_iter(trimmed) {
        if let Some(block) = captures.get(1) {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(block.as_str().trim()) {
                return Some(value);
            }
        }
    }

    first_embedded_value(trimmed)
}

fn first_embedded_value(content: &str) -> Option<serde_json::Value> {
    for (idx, ch) in content.char_indices() {
        if ch != '{' && ch != '[' {
            continue;
        }
        let candidate = &content[idx..];
        let mut stream =
            serde_json::Deserializer::from_str(candidate).into_iter::<serde_json::Value>();
        if let Some(Ok(value)) = stream.next() {
            if value.is_object() || value.is_array() {
                return Some(value);
            }
        }
    }
    None
}

// Chat Relay: OpenAI-Compatible Completion Provider
// Handles Groq (the default) and any other OpenAI-compatible REST API.
// One non-streaming chat completion per call, no retries.

use async_trait::async_trait;
use chatrelay_core::{Completer, EngineError, EngineResult};
use log::{debug, error};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.1-70b-versatile";
const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 150;

/// Truncate to at most `max` bytes without splitting a character.
pub(crate) fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

pub struct OpenAiCompleter {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiCompleter {
    pub fn new(client: Client, base_url: &str, api_key: &str, model: &str) -> Self {
        OpenAiCompleter {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            model: model.to_string(),
        }
    }

    fn request_body(&self, system_prompt: &str, user_turn: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_turn},
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        })
    }

    /// Pull the first choice's text out of a chat.completions response.
    fn parse_completion(v: &Value) -> Option<String> {
        v["choices"]
            .get(0)?["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
    }
}

#[async_trait]
impl Completer for OpenAiCompleter {
    fn name(&self) -> &str {
        "groq"
    }

    async fn complete(&self, system_prompt: &str, user_turn: &str) -> EngineResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("[providers] Completion request to {} model={}", url, self.model);

        let response = self.client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.request_body(system_prompt, user_turn))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            error!("[providers] Completion error {}: {}", status.as_u16(), truncate_utf8(&body_text, 500));
            return Err(EngineError::provider(
                self.name(),
                format!("API error {}: {}", status.as_u16(), truncate_utf8(&body_text, 200)),
            ));
        }

        let v: Value = response.json().await?;
        Self::parse_completion(&v)
            .ok_or_else(|| EngineError::provider(self.name(), "response had no message content"))
    }
}

/// Client with the same connect/request budget for every outbound call.
pub fn build_client(request_timeout: Duration) -> EngineResult<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(request_timeout)
        .build()
        .map_err(EngineError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completer() -> OpenAiCompleter {
        OpenAiCompleter::new(Client::new(), "https://api.groq.com/openai/v1/", "gsk_test", DEFAULT_MODEL)
    }

    #[test]
    fn body_has_system_and_user_turns() {
        let body = completer().request_body("You are Nova.", "viewer1 says: hello");
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "You are Nova.");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "viewer1 says: hello");
        assert_eq!(body["max_tokens"], 150);
        assert_eq!(body["temperature"], 0.7);
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        assert_eq!(completer().base_url, "https://api.groq.com/openai/v1");
    }

    #[test]
    fn parses_first_choice() {
        let v = json!({"choices": [{"message": {"role": "assistant", "content": "  Hey there!\n"}}]});
        assert_eq!(OpenAiCompleter::parse_completion(&v).as_deref(), Some("Hey there!"));
    }

    #[test]
    fn missing_choices_is_none() {
        assert!(OpenAiCompleter::parse_completion(&json!({"error": {"message": "bad"}})).is_none());
        assert!(OpenAiCompleter::parse_completion(&json!({"choices": []})).is_none());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_utf8("hello", 10), "hello");
        assert_eq!(truncate_utf8("héllo", 2), "h");
    }
}

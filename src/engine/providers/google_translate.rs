// Chat Relay: Google Translate Provider
//
// Uses the public `translate_a/single` endpoint (client=gtx), the same one
// the common keyless translation libraries call. Source language is
// auto-detected; the response is a nested JSON array whose first element
// holds one [translated, original, ...] entry per sentence.

use super::openai::truncate_utf8;
use async_trait::async_trait;
use chatrelay_core::{EngineError, EngineResult, TargetLanguage, Translator};
use log::debug;
use reqwest::Client;
use serde_json::Value;

pub const GOOGLE_TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

pub struct GoogleTranslator {
    client: Client,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(client: Client) -> Self {
        Self::with_endpoint(client, GOOGLE_TRANSLATE_URL)
    }

    pub fn with_endpoint(client: Client, endpoint: &str) -> Self {
        GoogleTranslator { client, endpoint: endpoint.to_string() }
    }

    /// Google spells Chinese with an upper-case region.
    fn google_code(target: TargetLanguage) -> &'static str {
        match target {
            TargetLanguage::ChineseSimplified => "zh-CN",
            other => other.code(),
        }
    }

    fn request_url(&self, text: &str, target: TargetLanguage) -> String {
        format!(
            "{}?client=gtx&sl=auto&tl={}&dt=t&q={}",
            self.endpoint,
            Self::google_code(target),
            urlencoding::encode(text),
        )
    }

    /// Join the per-sentence translations of a `translate_a/single` response.
    fn parse_translation(v: &Value) -> Option<String> {
        let sentences = v.get(0)?.as_array()?;
        let joined: String = sentences
            .iter()
            .filter_map(|s| s.get(0).and_then(Value::as_str))
            .collect();
        if joined.trim().is_empty() { None } else { Some(joined) }
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    fn name(&self) -> &str {
        "google"
    }

    async fn translate(&self, text: &str, target: TargetLanguage) -> EngineResult<String> {
        debug!("[providers] Translating {} chars to {}", text.chars().count(), target);
        let response = self.client.get(self.request_url(text, target)).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(EngineError::provider(
                self.name(),
                format!("HTTP {}: {}", status.as_u16(), truncate_utf8(&body_text, 200)),
            ));
        }

        let v: Value = response.json().await?;
        Self::parse_translation(&v)
            .ok_or_else(|| EngineError::provider(self.name(), "response had no translated text"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn url_encodes_text_and_language() {
        let t = GoogleTranslator::new(Client::new());
        let url = t.request_url("hello world & more", TargetLanguage::ChineseSimplified);
        assert!(url.starts_with(GOOGLE_TRANSLATE_URL));
        assert!(url.contains("tl=zh-CN"));
        assert!(url.contains("sl=auto"));
        assert!(url.ends_with("q=hello%20world%20%26%20more"));
    }

    #[test]
    fn joins_sentences() {
        let v = json!([
            [["مرحبا. ", "hello. ", null, null, 10], ["كيف حالك؟", "how are you?", null, null, 10]],
            null,
            "en"
        ]);
        assert_eq!(
            GoogleTranslator::parse_translation(&v).as_deref(),
            Some("مرحبا. كيف حالك؟")
        );
    }

    #[test]
    fn empty_or_malformed_is_none() {
        assert!(GoogleTranslator::parse_translation(&json!([[], null, "en"])).is_none());
        assert!(GoogleTranslator::parse_translation(&json!({"error": 1})).is_none());
    }
}

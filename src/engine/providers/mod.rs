// Chat Relay: Backend Registry
// HttpBackends builds the translation and completion clients a session's
// toggles ask for. Callers hold the trait objects and never learn which
// concrete backend is in use.

pub mod google_translate;
pub mod openai;

pub use google_translate::GoogleTranslator;
pub use openai::OpenAiCompleter;

use chatrelay_core::{BackendFactory, Completer, EngineResult, SessionConfig, Translator};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

pub struct HttpBackends {
    client: Client,
    completion_base_url: String,
    completion_model: String,
}

impl HttpBackends {
    pub fn new(request_timeout: Duration, completion_base_url: &str, completion_model: &str) -> EngineResult<Self> {
        Ok(HttpBackends {
            client: openai::build_client(request_timeout)?,
            completion_base_url: completion_base_url.to_string(),
            completion_model: completion_model.to_string(),
        })
    }
}

impl BackendFactory for HttpBackends {
    fn translator(&self, config: &SessionConfig) -> EngineResult<Option<Arc<dyn Translator>>> {
        if !config.translation_enabled {
            return Ok(None);
        }
        Ok(Some(Arc::new(GoogleTranslator::new(self.client.clone()))))
    }

    fn completer(&self, config: &SessionConfig) -> EngineResult<Option<Arc<dyn Completer>>> {
        if !config.wants_completion() {
            return Ok(None);
        }
        Ok(Some(Arc::new(OpenAiCompleter::new(
            self.client.clone(),
            &self.completion_base_url,
            &config.groq_api_key,
            &self.completion_model,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backends() -> HttpBackends {
        HttpBackends::new(Duration::from_secs(5), openai::GROQ_BASE_URL, openai::DEFAULT_MODEL).unwrap()
    }

    #[test]
    fn toggles_decide_which_backends_exist() {
        let b = backends();
        let mut cfg = SessionConfig::default();
        assert!(b.translator(&cfg).unwrap().is_some());
        // AI on but no key
        assert!(b.completer(&cfg).unwrap().is_none());

        cfg.groq_api_key = "gsk_x".into();
        assert_eq!(b.completer(&cfg).unwrap().map(|c| c.name().to_string()).as_deref(), Some("groq"));

        cfg.translation_enabled = false;
        cfg.ai_enabled = false;
        assert!(b.translator(&cfg).unwrap().is_none());
        assert!(b.completer(&cfg).unwrap().is_none());
    }
}

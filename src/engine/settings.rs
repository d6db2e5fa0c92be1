// Chat Relay: Settings
//
// Process-level settings, read once at startup from an optional TOML file:
//
//   [dashboard]  bind address, port, how many records a redraw shows
//   [relay]      retention cap, per-call timeout, completion endpoint/model
//   [defaults]   values pre-filled into the start form
//
// Secrets never live in the file's [defaults]. The OAuth token and Groq key
// can come from TWITCH_OAUTH_TOKEN / GROQ_API_KEY instead; they fill blank
// form fields at Start and are never sent back to the browser.

use crate::engine::providers::openai::{DEFAULT_MODEL, GROQ_BASE_URL};
use chatrelay_core::atoms::constants::{
    DEFAULT_BACKEND_TIMEOUT_SECS, DEFAULT_DISPLAY_LIMIT, DEFAULT_MAX_RECORDS,
};
use chatrelay_core::{EngineError, EngineResult, Persona, SessionConfig, TargetLanguage};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const TOKEN_ENV: &str = "TWITCH_OAUTH_TOKEN";
pub const GROQ_KEY_ENV: &str = "GROQ_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardSettings {
    /// Address to bind: "127.0.0.1" (local only) or "0.0.0.0" (LAN)
    pub bind_address: String,
    pub port: u16,
    pub display_limit: usize,
    pub page_title: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        DashboardSettings {
            bind_address: "127.0.0.1".into(),
            port: 8501,
            display_limit: DEFAULT_DISPLAY_LIMIT,
            page_title: "Chat Relay".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RelaySettings {
    pub max_records: usize,
    pub backend_timeout_secs: u64,
    pub completion_base_url: String,
    pub completion_model: String,
}

impl Default for RelaySettings {
    fn default() -> Self {
        RelaySettings {
            max_records: DEFAULT_MAX_RECORDS,
            backend_timeout_secs: DEFAULT_BACKEND_TIMEOUT_SECS,
            completion_base_url: GROQ_BASE_URL.into(),
            completion_model: DEFAULT_MODEL.into(),
        }
    }
}

impl RelaySettings {
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_secs.max(1))
    }
}

/// Start-form defaults. Everything here is safe to show in the browser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FormDefaults {
    pub channel: String,
    pub bot_username: String,
    pub ai_enabled: bool,
    pub translation_enabled: bool,
    pub target_language: TargetLanguage,
    pub persona: Persona,
}

impl Default for FormDefaults {
    fn default() -> Self {
        let base = SessionConfig::default();
        FormDefaults {
            channel: base.channel,
            bot_username: base.bot_username,
            ai_enabled: base.ai_enabled,
            translation_enabled: base.translation_enabled,
            target_language: base.target_language,
            persona: base.persona,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub dashboard: DashboardSettings,
    pub relay: RelaySettings,
    pub defaults: FormDefaults,
    #[serde(skip)]
    pub secrets: Secrets,
}

/// Credentials taken from the environment.
#[derive(Clone, Default, PartialEq)]
pub struct Secrets {
    pub oauth_token: Option<String>,
    pub groq_api_key: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("oauth_token", &self.oauth_token.as_ref().map(|_| "<redacted>"))
            .field("groq_api_key", &self.groq_api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Secrets {
    pub fn from_env() -> Self {
        let read = |key: &str| std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Secrets { oauth_token: read(TOKEN_ENV), groq_api_key: read(GROQ_KEY_ENV) }
    }
}

/// `<config dir>/chatrelay/config.toml`
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("chatrelay").join("config.toml"))
}

impl Settings {
    pub fn from_toml(text: &str) -> EngineResult<Self> {
        toml::from_str(text).map_err(|e| EngineError::Config(format!("Parse settings: {}", e)))
    }

    /// Load settings. An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> EngineResult<Self> {
        let (path, required) = match path {
            Some(p) => (Some(p.to_path_buf()), true),
            None => (default_settings_path(), false),
        };
        let mut settings = match path {
            Some(p) if p.exists() => {
                info!("[settings] Loading {}", p.display());
                Self::from_toml(&std::fs::read_to_string(&p)?)?
            }
            Some(p) if required => {
                return Err(EngineError::Config(format!("Settings file {} not found", p.display())));
            }
            _ => Settings::default(),
        };
        settings.secrets = Secrets::from_env();
        Ok(settings)
    }

    /// Fill blank credential fields of a submitted form from the environment.
    pub fn apply_secrets(&self, config: &mut SessionConfig) {
        if config.oauth_token.trim().is_empty() {
            if let Some(token) = &self.secrets.oauth_token {
                config.oauth_token = token.clone();
            }
        }
        if config.groq_api_key.trim().is_empty() {
            if let Some(key) = &self.secrets.groq_api_key {
                config.groq_api_key = key.clone();
            }
        }
    }
}

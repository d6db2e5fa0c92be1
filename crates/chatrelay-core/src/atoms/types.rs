// ── Relay Atoms: Pure Data Types ──────────────────────────────────────────────
// Plain struct/enum definitions shared by every layer.
// Atoms layer rule: no I/O, no side effects.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Message records ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    System,
    Chat,
    Translation,
    AiReply,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::System => "system",
            RecordKind::Chat => "chat",
            RecordKind::Translation => "translation",
            RecordKind::AiReply => "ai-reply",
        }
    }
}

/// One line of the relay log. Never mutated once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageRecord {
    /// Monotonic sequence number within the session, starting at 1.
    pub id: u64,
    pub kind: RecordKind,
    pub author: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Viewer an ai-reply answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

impl MessageRecord {
    /// Wall-clock time of the record in the host's zone, `HH:MM:SS`.
    pub fn clock(&self) -> String {
        self.timestamp.with_timezone(&Local).format("%H:%M:%S").to_string()
    }
}

// ── Target languages ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TargetLanguage {
    #[default]
    #[serde(rename = "ar")]
    Arabic,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "it")]
    Italian,
    #[serde(rename = "pt")]
    Portuguese,
    #[serde(rename = "ru")]
    Russian,
    #[serde(rename = "ja")]
    Japanese,
    #[serde(rename = "ko")]
    Korean,
    #[serde(rename = "zh-cn")]
    ChineseSimplified,
}

impl TargetLanguage {
    pub const ALL: [TargetLanguage; 11] = [
        TargetLanguage::Arabic,
        TargetLanguage::English,
        TargetLanguage::Spanish,
        TargetLanguage::French,
        TargetLanguage::German,
        TargetLanguage::Italian,
        TargetLanguage::Portuguese,
        TargetLanguage::Russian,
        TargetLanguage::Japanese,
        TargetLanguage::Korean,
        TargetLanguage::ChineseSimplified,
    ];

    /// Language code as the translation endpoint expects it.
    pub fn code(&self) -> &'static str {
        match self {
            TargetLanguage::Arabic => "ar",
            TargetLanguage::English => "en",
            TargetLanguage::Spanish => "es",
            TargetLanguage::French => "fr",
            TargetLanguage::German => "de",
            TargetLanguage::Italian => "it",
            TargetLanguage::Portuguese => "pt",
            TargetLanguage::Russian => "ru",
            TargetLanguage::Japanese => "ja",
            TargetLanguage::Korean => "ko",
            TargetLanguage::ChineseSimplified => "zh-cn",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TargetLanguage::Arabic => "Arabic",
            TargetLanguage::English => "English",
            TargetLanguage::Spanish => "Spanish",
            TargetLanguage::French => "French",
            TargetLanguage::German => "German",
            TargetLanguage::Italian => "Italian",
            TargetLanguage::Portuguese => "Portuguese",
            TargetLanguage::Russian => "Russian",
            TargetLanguage::Japanese => "Japanese",
            TargetLanguage::Korean => "Korean",
            TargetLanguage::ChineseSimplified => "Chinese",
        }
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        TargetLanguage::ALL
            .into_iter()
            .find(|l| l.code() == wanted)
            .ok_or_else(|| format!("Unsupported target language '{}'", s))
    }
}

// ── Persona ────────────────────────────────────────────────────────────────

/// Operator profile used to build the AI system prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Persona {
    pub nickname: String,
    pub bio: String,
    pub style: String,
    /// Current activity shown to the model as "Current Game".
    pub game: String,
    pub cpu: String,
    pub gpu: String,
}

impl Default for Persona {
    fn default() -> Self {
        Persona {
            nickname: "Streamer".into(),
            bio: "A friendly streamer".into(),
            style: "Friendly and helpful".into(),
            game: "Various games".into(),
            cpu: "Intel i9".into(),
            gpu: "RTX 4090".into(),
        }
    }
}

// ── Session configuration ──────────────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Twitch channel to join, with or without the leading '#'.
    pub channel: String,
    /// OAuth token (with oauth: prefix or without, the connector adds it)
    pub oauth_token: String,
    /// Bot's Twitch username
    pub bot_username: String,
    pub ai_enabled: bool,
    pub groq_api_key: String,
    pub translation_enabled: bool,
    pub target_language: TargetLanguage,
    pub persona: Persona,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            channel: String::new(),
            oauth_token: String::new(),
            bot_username: String::new(),
            ai_enabled: true,
            groq_api_key: String::new(),
            translation_enabled: true,
            target_language: TargetLanguage::default(),
            persona: Persona::default(),
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("channel", &self.channel)
            .field("oauth_token", &redact(&self.oauth_token))
            .field("bot_username", &self.bot_username)
            .field("ai_enabled", &self.ai_enabled)
            .field("groq_api_key", &redact(&self.groq_api_key))
            .field("translation_enabled", &self.translation_enabled)
            .field("target_language", &self.target_language)
            .field("persona", &self.persona)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "<redacted>" }
}

// ── Run state ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    #[default]
    Stopped,
    Running,
}

/// Monotonic session counters. Only "clear" resets them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Counters {
    pub messages: u64,
    pub translations: u64,
    pub ai_replies: u64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

// ── Connector events ───────────────────────────────────────────────────────

/// A chat line as the connector saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Display name of the sender.
    pub author: String,
    pub text: String,
    /// Channel the line arrived on, '#'-prefixed.
    pub channel: String,
    /// True when the bot account itself sent the line.
    pub is_echo: bool,
}

/// Everything the chat connector can report to the relay.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// Authenticated and joined; carries the bot's login.
    Ready { nick: String },
    Message(InboundMessage),
    /// The connection failed or dropped; the session stops.
    Error(String),
}

/// A line the relay wants written back to chat.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub channel: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_language_codes_round_trip_through_serde() {
        let json = serde_json::to_string(&TargetLanguage::ChineseSimplified).unwrap();
        assert_eq!(json, "\"zh-cn\"");
        let back: TargetLanguage = serde_json::from_str("\"ja\"").unwrap();
        assert_eq!(back, TargetLanguage::Japanese);
    }

    #[test]
    fn target_language_from_str_is_case_insensitive() {
        assert_eq!("ZH-CN".parse::<TargetLanguage>().unwrap(), TargetLanguage::ChineseSimplified);
        assert!("xx".parse::<TargetLanguage>().is_err());
    }

    #[test]
    fn session_config_debug_hides_secrets() {
        let cfg = SessionConfig {
            oauth_token: "oauth:abcdef".into(),
            groq_api_key: "gsk_secret".into(),
            ..Default::default()
        };
        let dbg = format!("{:?}", cfg);
        assert!(!dbg.contains("abcdef"));
        assert!(!dbg.contains("gsk_secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn session_config_fills_missing_fields_from_defaults() {
        let cfg: SessionConfig = serde_json::from_str(r#"{"channel":"mychan"}"#).unwrap();
        assert_eq!(cfg.channel, "mychan");
        assert!(cfg.ai_enabled);
        assert!(cfg.translation_enabled);
        assert_eq!(cfg.target_language, TargetLanguage::Arabic);
        assert_eq!(cfg.persona.nickname, "Streamer");
    }

    #[test]
    fn record_kind_serializes_kebab_case() {
        assert_eq!(serde_json::to_string(&RecordKind::AiReply).unwrap(), "\"ai-reply\"");
        assert_eq!(RecordKind::AiReply.as_str(), "ai-reply");
    }
}

// Chat Relay: Session Config Checks
//
// Presence checks and normalisation for the operator-entered start form.

use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::SessionConfig;

impl SessionConfig {
    /// Fails with a configuration error naming every missing required field.
    pub fn validate(&self) -> EngineResult<()> {
        let mut missing = Vec::new();
        if self.channel_name().is_empty() {
            missing.push("channel");
        }
        if self.oauth_token.trim().trim_start_matches("oauth:").is_empty() {
            missing.push("oauth token");
        }
        if self.bot_username.trim().is_empty() {
            missing.push("bot username");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Config(format!(
                "Please fill in all Twitch configuration fields (missing: {})",
                missing.join(", ")
            )))
        }
    }

    /// Channel login without '#', lowercased.
    pub fn channel_name(&self) -> String {
        self.channel.trim().trim_start_matches('#').trim().to_lowercase()
    }

    /// Channel as IRC addresses it, e.g. `#mychannel`.
    pub fn irc_channel(&self) -> String {
        format!("#{}", self.channel_name())
    }

    /// Token in the `oauth:<token>` form Twitch IRC expects.
    pub fn irc_token(&self) -> String {
        let token = self.oauth_token.trim();
        if token.starts_with("oauth:") {
            token.to_string()
        } else {
            format!("oauth:{}", token)
        }
    }

    pub fn bot_login(&self) -> String {
        self.bot_username.trim().to_lowercase()
    }

    /// A completion backend is built only when AI is on and a key is present.
    pub fn wants_completion(&self) -> bool {
        self.ai_enabled && !self.groq_api_key.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> SessionConfig {
        SessionConfig {
            channel: "#MyChannel ".into(),
            oauth_token: "abc123".into(),
            bot_username: "MyBot".into(),
            ..Default::default()
        }
    }

    #[test]
    fn filled_config_is_valid() {
        assert!(filled().validate().is_ok());
    }

    #[test]
    fn empty_channel_is_a_config_error() {
        let cfg = SessionConfig { channel: "  ".into(), ..filled() };
        let err = cfg.validate().unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("channel"));
    }

    #[test]
    fn bare_oauth_prefix_counts_as_missing() {
        let cfg = SessionConfig { oauth_token: "oauth:".into(), bot_username: String::new(), ..filled() };
        let msg = cfg.validate().unwrap_err().to_string();
        assert!(msg.contains("oauth token"));
        assert!(msg.contains("bot username"));
    }

    #[test]
    fn error_message_never_echoes_the_token() {
        let cfg = SessionConfig { channel: String::new(), oauth_token: "supersecret".into(), ..filled() };
        assert!(!cfg.validate().unwrap_err().to_string().contains("supersecret"));
    }

    #[test]
    fn irc_forms() {
        let cfg = filled();
        assert_eq!(cfg.irc_channel(), "#mychannel");
        assert_eq!(cfg.irc_token(), "oauth:abc123");
        assert_eq!(cfg.bot_login(), "mybot");
        let prefixed = SessionConfig { oauth_token: "oauth:xyz".into(), ..filled() };
        assert_eq!(prefixed.irc_token(), "oauth:xyz");
    }

    #[test]
    fn completion_needs_toggle_and_key() {
        let mut cfg = filled();
        assert!(!cfg.wants_completion());
        cfg.groq_api_key = "gsk_x".into();
        assert!(cfg.wants_completion());
        cfg.ai_enabled = false;
        assert!(!cfg.wants_completion());
    }
}

// ── Relay Atoms: Error Types ───────────────────────────────────────────────
// Single canonical error enum for the relay, built with `thiserror`.
//
// Design rules:
//   • Variants are coarse-grained by domain (I/O, network, provider, channel, config).
//   • The `#[from]` attribute wires std/external error conversions automatically.
//   • `EngineError` → `String` conversion goes through `Display`, so the HTTP
//     boundary can turn any failure into a JSON `{ "error": ... }` body.
//   • No variant carries secret material (OAuth tokens, API keys) in its message.

use std::time::Duration;
use thiserror::Error;

// ── Primary error enum ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EngineError {
    /// Filesystem or OS-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP / network failure (reqwest layer).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Translation or completion backend failure (non-secret detail only).
    #[error("Provider error: {provider}: {message}")]
    Provider { provider: String, message: String },

    /// Chat connector failure (auth rejected, socket dropped, ...).
    #[error("Channel error: {channel}: {message}")]
    Channel { channel: String, message: String },

    /// Session configuration is invalid or missing required fields.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An outbound call did not finish inside its time budget.
    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout { operation: String, after: Duration },

    /// Catch-all for errors that do not yet have a dedicated variant.
    #[error("{0}")]
    Other(String),
}

// ── Convenience constructors ───────────────────────────────────────────────

impl EngineError {
    /// Create a provider error with name and message.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider { provider: provider.into(), message: message.into() }
    }

    /// Create a channel error with name and message.
    pub fn channel(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Channel { channel: channel.into(), message: message.into() }
    }

    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        Self::Timeout { operation: operation.into(), after }
    }

    /// True for errors the operator has to fix in the start form.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// ── String bridges ─────────────────────────────────────────────────────────

impl From<String> for EngineError {
    fn from(s: String) -> Self {
        EngineError::Other(s)
    }
}

impl From<&str> for EngineError {
    fn from(s: &str) -> Self {
        EngineError::Other(s.to_string())
    }
}

// ── Convenience alias ──────────────────────────────────────────────────────

/// All relay operations return this type.
pub type EngineResult<T> = Result<T, EngineError>;

impl From<EngineError> for String {
    fn from(e: EngineError) -> Self {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_names_operation() {
        let e = EngineError::timeout("translation", Duration::from_secs(15));
        assert_eq!(e.to_string(), "translation timed out after 15s");
    }

    #[test]
    fn config_errors_are_flagged() {
        assert!(EngineError::Config("channel is required".into()).is_config());
        assert!(!EngineError::from("boom").is_config());
    }

    #[test]
    fn channel_error_display() {
        let e = EngineError::channel("twitch", "auth failed");
        assert_eq!(e.to_string(), "Channel error: twitch: auth failed");
        let s: String = e.into();
        assert!(s.contains("auth failed"));
    }
}

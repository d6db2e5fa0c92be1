// ── Relay Atoms: Capability Traits ─────────────────────────────────────────
// The seams between the relay and the outside world. Concrete HTTP and
// WebSocket implementations live in the binary crate; tests use fakes.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use super::error::EngineResult;
use super::types::{ChatEvent, OutboundMessage, SessionConfig, TargetLanguage};

/// Machine translation backend.
#[async_trait]
pub trait Translator: Send + Sync {
    fn name(&self) -> &str;

    async fn translate(&self, text: &str, target: TargetLanguage) -> EngineResult<String>;
}

/// Chat-completion backend.
#[async_trait]
pub trait Completer: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, system_prompt: &str, user_turn: &str) -> EngineResult<String>;
}

/// Fire-and-forget write back to the chat channel.
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send(&self, message: OutboundMessage) -> EngineResult<()>;
}

/// Everything a connector task needs for one session.
pub struct ConnectorLink {
    pub config: SessionConfig,
    pub events: mpsc::Sender<ChatEvent>,
    pub outbound: mpsc::UnboundedReceiver<OutboundMessage>,
    pub stop: watch::Receiver<bool>,
}

/// A persistent connection to one chat channel.
///
/// `run` returns once the stop signal fires or the socket closes (`Ok`), or on
/// any connection failure (`Err`), which the controller turns into a stopped
/// session. `Ready` and `Message` events go through `link.events`.
#[async_trait]
pub trait ChatConnector: Send + Sync {
    async fn run(&self, link: ConnectorLink) -> EngineResult<()>;
}

/// Builds the optional backends for a session from its toggles.
pub trait BackendFactory: Send + Sync {
    fn translator(&self, config: &SessionConfig) -> EngineResult<Option<Arc<dyn Translator>>>;

    fn completer(&self, config: &SessionConfig) -> EngineResult<Option<Arc<dyn Completer>>>;
}

// ── Channel-backed sender ──────────────────────────────────────────────────

/// Hands outbound lines to the connector task that owns the socket.
#[async_trait]
impl ChatSender for mpsc::UnboundedSender<OutboundMessage> {
    async fn send(&self, message: OutboundMessage) -> EngineResult<()> {
        mpsc::UnboundedSender::send(self, message)
            .map_err(|_| "Chat connector is no longer accepting messages".into())
    }
}

// Chat Relay: Engine
// Network-facing pieces that plug into chatrelay-core: the Twitch connector,
// HTTP translation/completion backends, settings and the dashboard server.

pub mod dashboard;
pub mod providers;
pub mod settings;
pub mod twitch;

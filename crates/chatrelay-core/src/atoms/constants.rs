// ── Relay Atoms: Constants ─────────────────────────────────────────────────
// Named constants shared by the relay, the controller and the dashboard.

// ── Synthetic record authors ──────────────────────────────────────────────
pub const SYSTEM_AUTHOR: &str = "SystemBot";
pub const TRANSLATOR_AUTHOR: &str = "Translator";
pub const AI_AUTHOR: &str = "AI Bot";

// ── Log retention and display ─────────────────────────────────────────────
// The store keeps at most this many records; the oldest are evicted first.
pub const DEFAULT_MAX_RECORDS: usize = 1000;
// The dashboard renders this many of the most recent records.
pub const DEFAULT_DISPLAY_LIMIT: usize = 50;
// Poll period of the dashboard while the relay is running.
pub const REFRESH_INTERVAL_MS: u64 = 2000;

// ── Outbound call budget ──────────────────────────────────────────────────
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 15;

// ── Twitch chat limits ────────────────────────────────────────────────────
// Twitch rejects PRIVMSG bodies over 500 characters; leave headroom.
pub const TWITCH_MESSAGE_LIMIT: usize = 490;

// ── Channel capacities ────────────────────────────────────────────────────
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

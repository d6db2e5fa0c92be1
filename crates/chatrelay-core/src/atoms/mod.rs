// ── Relay Atoms Layer ──────────────────────────────────────────────────────
// Constants, data types, error types and capability traits.
// Dependency rule: atoms never import from the session, relay or controller.

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

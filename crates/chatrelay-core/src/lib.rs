// chatrelay-core: records, session state, persona prompts, the relay and the
// run controller. No sockets or HTTP clients live here; those plug in through
// the traits in `atoms::traits`.

pub mod atoms;
pub mod config;
pub mod controller;
pub mod persona;
pub mod relay;
pub mod session;
pub mod snapshot;

pub use atoms::error::{EngineError, EngineResult};
pub use atoms::traits::{BackendFactory, ChatConnector, ChatSender, Completer, ConnectorLink, Translator};
pub use atoms::types::*;
pub use controller::RunController;
pub use relay::{Relay, RelayReport};
pub use session::{Session, SharedSession};
pub use snapshot::{DashboardSnapshot, RecordView};

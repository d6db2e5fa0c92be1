// Chat Relay: Run Controller
//
// Start/Stop/Clear for one relay session.
//
// Start spawns two tasks per run:
//   - the connector task, which owns the chat socket and pushes ChatEvents
//   - the relay worker, the single consumer of those events
// Outbound replies travel back from the worker to the connector over a second
// channel, so only the connector task ever touches the socket.
//
// Stop is best-effort: it raises the stop signal and returns without waiting
// for the connector to close its socket.

use crate::atoms::constants::{DEFAULT_BACKEND_TIMEOUT_SECS, EVENT_CHANNEL_CAPACITY};
use crate::atoms::error::EngineResult;
use crate::atoms::traits::{BackendFactory, ChatConnector, ConnectorLink};
use crate::atoms::types::{ChatEvent, RunState, SessionConfig, StartOutcome};
use crate::relay::Relay;
use crate::session::SharedSession;
use crate::snapshot::DashboardSnapshot;
use log::{info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

struct ActiveRun {
    epoch: u64,
    stop: watch::Sender<bool>,
}

pub struct RunController {
    session: SharedSession,
    connector: Arc<dyn ChatConnector>,
    backends: Arc<dyn BackendFactory>,
    call_timeout: Duration,
    active: Mutex<Option<ActiveRun>>,
}

impl RunController {
    pub fn new(
        session: SharedSession,
        connector: Arc<dyn ChatConnector>,
        backends: Arc<dyn BackendFactory>,
    ) -> Self {
        RunController {
            session,
            connector,
            backends,
            call_timeout: Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS),
            active: Mutex::new(None),
        }
    }

    /// Deadline for each translation and completion call.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn run_state(&self) -> RunState {
        self.session.run_state()
    }

    /// Validate `config`, build the enabled backends and launch the connector.
    /// A second Start while running is a no-op. Must be called inside a tokio runtime.
    pub fn start(&self, config: SessionConfig) -> EngineResult<StartOutcome> {
        if self.session.run_state() == RunState::Running {
            info!("[controller] Start ignored, already running");
            return Ok(StartOutcome::AlreadyRunning);
        }
        config.validate()?;

        let translator = if config.translation_enabled {
            self.backends.translator(&config)?
        } else {
            None
        };
        let completer = if config.wants_completion() {
            self.backends.completer(&config)?
        } else {
            None
        };

        let mut active = self.active.lock();
        let Some(epoch) = self.session.begin_run("System started! Connecting to Twitch...") else {
            return Ok(StartOutcome::AlreadyRunning);
        };
        if let Some(previous) = active.take() {
            // Leftover from a run whose connector failed on its own
            let _ = previous.stop.send(true);
        }

        info!(
            "[controller] Run {} starting for {} (translation: {}, ai: {})",
            epoch,
            config.irc_channel(),
            translator.is_some(),
            completer.is_some(),
        );

        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);

        let relay = Relay::new(
            self.session.clone(),
            epoch,
            &config,
            translator,
            completer,
            Arc::new(outbound_tx),
            self.call_timeout,
        );
        tokio::spawn(relay.run(events_rx));

        let connector = self.connector.clone();
        let failure_tx = events_tx.clone();
        let stopped = stop_rx.clone();
        let link = ConnectorLink { config, events: events_tx, outbound: outbound_rx, stop: stop_rx };
        tokio::spawn(async move {
            let result = connector.run(link).await;
            if *stopped.borrow() {
                info!("[controller] Run {} connector closed", epoch);
                return;
            }
            let reason = match result {
                Ok(()) => "Connection closed by server".to_string(),
                Err(e) => e.to_string(),
            };
            warn!("[controller] Run {} connector ended: {}", epoch, reason);
            let _ = failure_tx.send(ChatEvent::Error(reason)).await;
        });

        *active = Some(ActiveRun { epoch, stop: stop_tx });
        Ok(StartOutcome::Started)
    }

    /// Signal the connector to close and mark the session stopped.
    /// Returns false when there was nothing to stop.
    pub fn stop(&self) -> bool {
        if let Some(run) = self.active.lock().take() {
            if run.stop.send(true).is_err() {
                // Connector already gone; nothing left to tear down
                info!("[controller] Run {} connector already closed", run.epoch);
            }
        }
        let stopped = self.session.end_run("System stopped");
        if stopped {
            info!("[controller] Stopped");
        }
        stopped
    }

    /// Empty the log and reset all counters.
    pub fn clear(&self) {
        self.session.clear();
        info!("[controller] Log cleared");
    }

    pub fn snapshot(&self, limit: usize) -> DashboardSnapshot {
        DashboardSnapshot::capture(&self.session, limit)
    }
}

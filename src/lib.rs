// chatrelay: wires the core relay to Twitch, the HTTP backends and the
// browser dashboard.

pub mod engine;

use chatrelay_core::{EngineResult, RunController, Session};
use engine::dashboard::{run_server, Dashboard};
use engine::providers::HttpBackends;
use engine::settings::Settings;
use engine::twitch::TwitchConnector;
use log::info;
use std::future::Future;
use std::sync::Arc;

/// Build the process-wide session and controller, then serve the dashboard
/// until `shutdown` resolves. A run still active at shutdown is stopped.
pub async fn run<F>(settings: Settings, shutdown: F) -> EngineResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let timeout = settings.relay.backend_timeout();
    let backends = HttpBackends::new(
        timeout,
        &settings.relay.completion_base_url,
        &settings.relay.completion_model,
    )?;
    let session = Session::shared(settings.relay.max_records);
    let controller = RunController::new(session, Arc::new(TwitchConnector::default()), Arc::new(backends))
        .with_call_timeout(timeout);

    info!(
        "[controller] Retaining up to {} records, backend timeout {}s",
        settings.relay.max_records,
        timeout.as_secs()
    );

    let dashboard = Arc::new(Dashboard::new(controller, Arc::new(settings)));
    let result = run_server(dashboard.clone(), shutdown).await;
    dashboard.controller().stop();
    result
}

// Chat Relay: Dashboard
//
// The whole operator surface, served with axum.
//
// Routes:
//   - GET  /              → self-contained HTML dashboard (no secrets embedded)
//   - GET  /api/state     → snapshot: run state, counters, newest records first
//   - GET  /api/defaults  → start-form defaults and the language list
//   - POST /api/start     → Start with the submitted session config
//   - POST /api/stop      → Stop (best-effort)
//   - POST /api/clear     → empty the log and reset counters
//
// POSTs must be `application/json` and, when the browser sends an Origin,
// come from the dashboard's own origin. A plain form or `text/plain` fetch
// from another site never reaches a handler, so it cannot start the bot with
// the operator's environment credentials.
//
// The page redraws every `refresh_ms` while the relay is running and only on
// explicit Refresh/Clear while it is stopped.

mod html;
mod server;

pub use server::run_server;

use crate::engine::settings::Settings;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chatrelay_core::{DashboardSnapshot, EngineError, RunController, SessionConfig, TargetLanguage};
use log::{info, warn};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct Dashboard {
    controller: RunController,
    settings: Arc<Settings>,
}

impl Dashboard {
    pub fn new(controller: RunController, settings: Arc<Settings>) -> Self {
        Dashboard { controller, settings }
    }

    pub fn controller(&self) -> &RunController {
        &self.controller
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn defaults_json(&self) -> Value {
        let languages: Vec<Value> = TargetLanguage::ALL
            .iter()
            .map(|l| json!({ "code": l.code(), "label": l.label() }))
            .collect();
        json!({
            "defaults": self.settings.defaults,
            "languages": languages,
            // Presence only; the values stay server-side
            "env_secrets": {
                "oauth_token": self.settings.secrets.oauth_token.is_some(),
                "groq_api_key": self.settings.secrets.groq_api_key.is_some(),
            },
        })
    }
}

pub fn router(dashboard: Arc<Dashboard>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/index.html", get(index))
        .route("/api/state", get(state))
        .route("/api/defaults", get(defaults))
        .route("/api/start", post(start))
        .route("/api/stop", post(stop))
        .route("/api/clear", post(clear))
        .fallback(not_found)
        .layer(middleware::from_fn(same_origin_json))
        .with_state(dashboard)
}

fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "ok": false, "error": message.into() }))).into_response()
}

// ── Handlers ───────────────────────────────────────────────────────────

async fn index(State(d): State<Arc<Dashboard>>) -> Html<String> {
    Html(html::build_dashboard_html(&d.settings.dashboard.page_title))
}

async fn state(State(d): State<Arc<Dashboard>>) -> Json<DashboardSnapshot> {
    Json(d.controller.snapshot(d.settings.dashboard.display_limit))
}

async fn defaults(State(d): State<Arc<Dashboard>>) -> Json<Value> {
    Json(d.defaults_json())
}

async fn start(
    State(d): State<Arc<Dashboard>>,
    payload: Result<Json<SessionConfig>, JsonRejection>,
) -> Response {
    let mut config = match payload {
        Ok(Json(c)) => c,
        Err(e) => return api_error(StatusCode::BAD_REQUEST, format!("Invalid start form: {}", e.body_text())),
    };
    d.settings.apply_secrets(&mut config);

    match d.controller.start(config) {
        Ok(outcome) => {
            info!("[dashboard] Start: {:?}", outcome);
            Json(json!({ "ok": true, "outcome": outcome })).into_response()
        }
        Err(e @ EngineError::Config(_)) => api_error(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => {
            warn!("[dashboard] Start failed: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to start system: {}", e))
        }
    }
}

async fn stop(State(d): State<Arc<Dashboard>>) -> Json<Value> {
    let stopped = d.controller.stop();
    Json(json!({ "ok": true, "stopped": stopped }))
}

async fn clear(State(d): State<Arc<Dashboard>>) -> Json<Value> {
    d.controller.clear();
    Json(json!({ "ok": true }))
}

async fn not_found() -> Response {
    api_error(StatusCode::NOT_FOUND, "not found")
}

// ── Cross-site guard ───────────────────────────────────────────────────

async fn same_origin_json(req: Request, next: Next) -> Response {
    if req.method() == Method::POST {
        if let Err((status, reason)) = check_post_headers(req.headers()) {
            warn!("[dashboard] Rejected POST {}: {}", req.uri().path(), reason);
            return api_error(status, reason);
        }
    }
    next.run(req).await
}

/// A POST must declare a JSON body, and any Origin it carries must name the
/// host it was sent to.
fn check_post_headers(headers: &HeaderMap) -> Result<(), (StatusCode, &'static str)> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false);
    if !is_json {
        return Err((StatusCode::UNSUPPORTED_MEDIA_TYPE, "POST body must be application/json"));
    }

    if let Some(origin) = headers.get(header::ORIGIN) {
        let origin = origin.to_str().unwrap_or("");
        let origin_host = origin
            .strip_prefix("http://")
            .or_else(|| origin.strip_prefix("https://"))
            .unwrap_or("");
        let host = headers.get(header::HOST).and_then(|h| h.to_str().ok()).unwrap_or("");
        if host.is_empty() || !origin_host.eq_ignore_ascii_case(host) {
            return Err((StatusCode::FORBIDDEN, "cross-origin request rejected"));
        }
    }
    Ok(())
}

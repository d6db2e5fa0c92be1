// Chat Relay: Dashboard Snapshot
//
// What one redraw of the dashboard shows: run indicator, counters and the
// most recent records newest first. While running, the snapshot carries the
// poll interval the page should wait before redrawing; while stopped it
// carries none and the page only redraws on explicit refresh or clear.

use crate::atoms::constants::REFRESH_INTERVAL_MS;
use crate::atoms::types::{Counters, MessageRecord, RecordKind, RunState};
use crate::session::Session;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct RecordView {
    pub id: u64,
    pub kind: RecordKind,
    pub author: String,
    pub text: String,
    /// `HH:MM:SS` in the host's zone.
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

impl From<&MessageRecord> for RecordView {
    fn from(r: &MessageRecord) -> Self {
        RecordView {
            id: r.id,
            kind: r.kind,
            author: r.author.clone(),
            text: r.text.clone(),
            time: r.clock(),
            reply_to: r.reply_to.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub state: RunState,
    pub counters: Counters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_ms: Option<u64>,
    pub records: Vec<RecordView>,
}

impl DashboardSnapshot {
    pub fn capture(session: &Session, limit: usize) -> Self {
        let (state, counters, recent) = session.recent(limit);
        DashboardSnapshot {
            state,
            counters,
            refresh_ms: (state == RunState::Running).then_some(REFRESH_INTERVAL_MS),
            records: recent.iter().map(RecordView::from).collect(),
        }
    }
}

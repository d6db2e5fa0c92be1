// Chat Relay: Session Store
//
// The one piece of shared mutable state: the append-only record log, the
// three counters and the run state, all behind a single parking_lot mutex.
// The lock is never held across an `.await`.
//
// Each Start bumps the run epoch. Late events from a connector that belonged
// to an earlier run carry the old epoch and cannot stop the current one.

use crate::atoms::constants::{AI_AUTHOR, DEFAULT_MAX_RECORDS, SYSTEM_AUTHOR, TRANSLATOR_AUTHOR};
use crate::atoms::types::{Counters, MessageRecord, RecordKind, RunState};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

pub type SharedSession = Arc<Session>;

struct SessionState {
    records: VecDeque<MessageRecord>,
    next_id: u64,
    counters: Counters,
    run_state: RunState,
    epoch: u64,
    max_records: usize,
}

impl SessionState {
    fn push(&mut self, kind: RecordKind, author: &str, text: &str, reply_to: Option<&str>) {
        self.next_id += 1;
        self.records.push_back(MessageRecord {
            id: self.next_id,
            kind,
            author: author.to_string(),
            text: text.to_string(),
            timestamp: Utc::now(),
            reply_to: reply_to.map(str::to_string),
        });
        while self.records.len() > self.max_records {
            self.records.pop_front();
        }
    }

    fn is_live(&self, epoch: u64) -> bool {
        self.epoch == epoch && self.run_state == RunState::Running
    }
}

pub struct Session {
    inner: Mutex<SessionState>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RECORDS)
    }
}

impl Session {
    /// `max_records` is clamped to at least 1.
    pub fn new(max_records: usize) -> Self {
        Session {
            inner: Mutex::new(SessionState {
                records: VecDeque::new(),
                next_id: 0,
                counters: Counters::default(),
                run_state: RunState::Stopped,
                epoch: 0,
                max_records: max_records.max(1),
            }),
        }
    }

    pub fn shared(max_records: usize) -> SharedSession {
        Arc::new(Self::new(max_records))
    }

    // ── Appends ────────────────────────────────────────────────────────
    //
    // Every append is made on behalf of run `epoch` and is dropped (returns
    // false) once that run is stopped or superseded. The check and the write
    // happen under one lock, so nothing lands after "System stopped".

    pub fn push_system(&self, epoch: u64, text: &str) -> bool {
        let mut s = self.inner.lock();
        if !s.is_live(epoch) {
            return false;
        }
        s.push(RecordKind::System, SYSTEM_AUTHOR, text, None);
        true
    }

    /// Append a viewer's line and count it.
    pub fn push_chat(&self, epoch: u64, author: &str, text: &str) -> bool {
        let mut s = self.inner.lock();
        if !s.is_live(epoch) {
            return false;
        }
        s.push(RecordKind::Chat, author, text, None);
        s.counters.messages += 1;
        true
    }

    pub fn push_translation(&self, epoch: u64, text: &str) -> bool {
        let mut s = self.inner.lock();
        if !s.is_live(epoch) {
            return false;
        }
        s.push(RecordKind::Translation, TRANSLATOR_AUTHOR, text, None);
        s.counters.translations += 1;
        true
    }

    pub fn push_ai_reply(&self, epoch: u64, viewer: &str, text: &str) -> bool {
        let mut s = self.inner.lock();
        if !s.is_live(epoch) {
            return false;
        }
        s.push(RecordKind::AiReply, AI_AUTHOR, text, Some(viewer));
        s.counters.ai_replies += 1;
        true
    }

    /// Empty the log and zero every counter. Run state is untouched.
    pub fn clear(&self) {
        let mut s = self.inner.lock();
        s.records.clear();
        s.counters = Counters::default();
    }

    // ── Run state transitions ─────────────────────────────────────────

    /// Stopped → Running. Returns the new run epoch, or `None` if already running.
    pub fn begin_run(&self, announcement: &str) -> Option<u64> {
        let mut s = self.inner.lock();
        if s.run_state == RunState::Running {
            return None;
        }
        s.run_state = RunState::Running;
        s.epoch += 1;
        s.push(RecordKind::System, SYSTEM_AUTHOR, announcement, None);
        Some(s.epoch)
    }

    /// Running → Stopped by operator request. Returns false if already stopped.
    pub fn end_run(&self, announcement: &str) -> bool {
        let mut s = self.inner.lock();
        if s.run_state == RunState::Stopped {
            return false;
        }
        s.run_state = RunState::Stopped;
        s.push(RecordKind::System, SYSTEM_AUTHOR, announcement, None);
        true
    }

    /// Running → Stopped because the connector of run `epoch` failed.
    /// Ignored when that run is no longer the current one.
    pub fn fail_run(&self, epoch: u64, reason: &str) -> bool {
        let mut s = self.inner.lock();
        if s.epoch != epoch || s.run_state == RunState::Stopped {
            return false;
        }
        s.run_state = RunState::Stopped;
        s.push(RecordKind::System, SYSTEM_AUTHOR, reason, None);
        true
    }

    /// True while run `epoch` is the live one.
    pub fn is_current(&self, epoch: u64) -> bool {
        self.inner.lock().is_live(epoch)
    }

    // ── Reads ──────────────────────────────────────────────────────────

    pub fn run_state(&self) -> RunState {
        self.inner.lock().run_state
    }

    pub fn counters(&self) -> Counters {
        self.inner.lock().counters
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every retained record, oldest first.
    pub fn records(&self) -> Vec<MessageRecord> {
        self.inner.lock().records.iter().cloned().collect()
    }

    /// Up to `limit` records, newest first, with the counters and run state
    /// read under the same lock.
    pub fn recent(&self, limit: usize) -> (RunState, Counters, Vec<MessageRecord>) {
        let s = self.inner.lock();
        let records = s.records.iter().rev().take(limit).cloned().collect();
        (s.run_state, s.counters, records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_records_count_messages() {
        let session = Session::default();
        let run = session.begin_run("started").unwrap();
        session.push_chat(run, "viewer1", "hello");
        session.push_chat(run, "viewer2", "hi");
        assert_eq!(session.counters().messages, 2);
        assert_eq!(session.len(), 3);
        let ids: Vec<u64> = session.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn system_records_do_not_touch_counters() {
        let session = Session::default();
        let run = session.begin_run("started").unwrap();
        session.push_system(run, "hello");
        assert_eq!(session.counters(), Counters::default());
        assert_eq!(session.records()[1].author, SYSTEM_AUTHOR);
    }

    #[test]
    fn clear_empties_log_and_zeroes_counters() {
        let session = Session::default();
        let run = session.begin_run("started").unwrap();
        session.push_chat(run, "a", "x");
        session.push_translation(run, "y");
        session.push_ai_reply(run, "a", "z");
        session.clear();
        assert!(session.is_empty());
        assert_eq!(session.counters(), Counters::default());
    }

    #[test]
    fn clear_keeps_run_state() {
        let session = Session::default();
        session.begin_run("started");
        session.clear();
        assert_eq!(session.run_state(), RunState::Running);
    }

    #[test]
    fn retention_evicts_oldest_first() {
        let session = Session::new(3);
        let run = session.begin_run("started").unwrap();
        for i in 0..5 {
            session.push_chat(run, "v", &format!("m{}", i));
        }
        let texts: Vec<String> = session.records().into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["m2", "m3", "m4"]);
        // Counters are not capped
        assert_eq!(session.counters().messages, 5);
    }

    #[test]
    fn recent_is_newest_first_and_limited() {
        let session = Session::default();
        let run = session.begin_run("started").unwrap();
        for i in 0..10 {
            session.push_chat(run, "v", &format!("m{}", i));
        }
        let (_, _, recent) = session.recent(3);
        let texts: Vec<&str> = recent.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["m9", "m8", "m7"]);
    }

    #[test]
    fn begin_run_twice_is_rejected() {
        let session = Session::default();
        assert_eq!(session.begin_run("started"), Some(1));
        assert_eq!(session.begin_run("started"), None);
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn end_run_when_stopped_is_noop() {
        let session = Session::default();
        assert!(!session.end_run("stopped"));
        assert!(session.is_empty());
    }

    #[test]
    fn stale_epoch_cannot_fail_current_run() {
        let session = Session::default();
        let first = session.begin_run("started").unwrap();
        session.end_run("stopped");
        let second = session.begin_run("started").unwrap();
        assert!(!session.fail_run(first, "old connector died"));
        assert_eq!(session.run_state(), RunState::Running);
        assert!(session.fail_run(second, "Error: boom"));
        assert_eq!(session.run_state(), RunState::Stopped);
        assert!(!session.is_current(second));
    }

    #[test]
    fn ai_reply_carries_viewer() {
        let session = Session::default();
        let run = session.begin_run("started").unwrap();
        session.push_ai_reply(run, "viewer1", "hey there");
        let r = &session.records()[1];
        assert_eq!(r.kind, RecordKind::AiReply);
        assert_eq!(r.author, AI_AUTHOR);
        assert_eq!(r.reply_to.as_deref(), Some("viewer1"));
        assert_eq!(session.counters().ai_replies, 1);
    }

    #[test]
    fn appends_for_a_stopped_run_are_dropped() {
        let session = Session::default();
        let run = session.begin_run("started").unwrap();
        assert!(session.push_chat(run, "v", "before"));
        session.end_run("stopped");

        assert!(!session.push_chat(run, "v", "late"));
        assert!(!session.push_translation(run, "late"));
        assert!(!session.push_ai_reply(run, "v", "late"));
        assert!(!session.push_system(run, "late"));
        assert_eq!(session.records().last().map(|r| r.text.as_str()), Some("stopped"));
        assert_eq!(session.counters().messages, 1);

        // A newer run does not revive the old epoch
        let next = session.begin_run("started").unwrap();
        assert!(!session.push_chat(run, "v", "late"));
        assert!(session.push_chat(next, "v", "fresh"));
    }
}

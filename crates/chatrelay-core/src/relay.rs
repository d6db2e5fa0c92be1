// Chat Relay: Relay
//
// Turns one inbound chat line into up to three log records and at most one
// reply written back to chat:
//   1. self-echo lines are dropped
//   2. the chat record is appended and counted
//   3. optional translation into the target language
//   4. optional in-character AI reply, recorded and sent back to the viewer
//
// Steps 3 and 4 are failure-isolated: each backend call runs under its own
// timeout and its error is logged and swallowed at the call site.

use crate::atoms::constants::TWITCH_MESSAGE_LIMIT;
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::traits::{ChatSender, Completer, Translator};
use crate::atoms::types::{ChatEvent, InboundMessage, OutboundMessage, SessionConfig, TargetLanguage};
use crate::persona::{build_system_prompt, build_user_turn};
use crate::session::SharedSession;
use log::{debug, info, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// What one relay step produced. `run` logs it at debug level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayReport {
    pub recorded: bool,
    pub translated: bool,
    pub replied: bool,
}

pub struct Relay {
    session: SharedSession,
    epoch: u64,
    translation_enabled: bool,
    target_language: TargetLanguage,
    translator: Option<Arc<dyn Translator>>,
    ai_enabled: bool,
    system_prompt: String,
    completer: Option<Arc<dyn Completer>>,
    sender: Arc<dyn ChatSender>,
    call_timeout: Duration,
}

impl Relay {
    pub fn new(
        session: SharedSession,
        epoch: u64,
        config: &SessionConfig,
        translator: Option<Arc<dyn Translator>>,
        completer: Option<Arc<dyn Completer>>,
        sender: Arc<dyn ChatSender>,
        call_timeout: Duration,
    ) -> Self {
        Relay {
            session,
            epoch,
            translation_enabled: config.translation_enabled,
            target_language: config.target_language,
            translator,
            ai_enabled: config.ai_enabled,
            system_prompt: build_system_prompt(&config.persona),
            completer,
            sender,
            call_timeout,
        }
    }

    /// Consume connector events in arrival order until the connector hangs
    /// up or this run is stopped. Events still queued at Stop are discarded.
    pub async fn run(self, mut events: mpsc::Receiver<ChatEvent>) {
        while let Some(event) = events.recv().await {
            if !self.session.is_current(self.epoch) {
                debug!("[relay] Run {} no longer live, dropping queued events", self.epoch);
                break;
            }
            let report = self.handle(event).await;
            if report != RelayReport::default() {
                debug!("[relay] Run {}: {:?}", self.epoch, report);
            }
        }
        debug!("[relay] Event stream closed (run {})", self.epoch);
    }

    pub async fn handle(&self, event: ChatEvent) -> RelayReport {
        match event {
            ChatEvent::Ready { nick } => {
                info!("[relay] Connected as {}", nick);
                self.session.push_system(self.epoch, &format!("Connected to Twitch as {}", nick));
                RelayReport::default()
            }
            ChatEvent::Message(msg) => self.relay_message(&msg).await,
            ChatEvent::Error(reason) => {
                warn!("[relay] Connector failed: {}", reason);
                self.session.fail_run(self.epoch, &format!("Error: {}", reason));
                RelayReport::default()
            }
        }
    }

    async fn relay_message(&self, msg: &InboundMessage) -> RelayReport {
        let mut report = RelayReport::default();
        if msg.is_echo {
            return report;
        }

        // Each append re-checks the run; a Stop during a backend call ends the step
        if !self.session.push_chat(self.epoch, &msg.author, &msg.text) {
            return report;
        }
        report.recorded = true;

        if self.translation_enabled {
            if let Some(translator) = &self.translator {
                match bounded("translation", self.call_timeout, translator.translate(&msg.text, self.target_language)).await {
                    Ok(translated) => {
                        if !self.session.push_translation(self.epoch, &translated) {
                            return report;
                        }
                        report.translated = true;
                    }
                    Err(e) => warn!("[relay] Translation via {} failed: {}", translator.name(), e),
                }
            }
        }

        if self.ai_enabled {
            if let Some(completer) = &self.completer {
                let user_turn = build_user_turn(&msg.author, &msg.text);
                let reply = bounded("completion", self.call_timeout, completer.complete(&self.system_prompt, &user_turn))
                    .await
                    .and_then(|r| {
                        let r = r.trim().to_string();
                        if r.is_empty() {
                            Err(EngineError::provider(completer.name(), "empty completion"))
                        } else {
                            Ok(r)
                        }
                    });
                match reply {
                    Ok(reply) => {
                        if !self.session.push_ai_reply(self.epoch, &msg.author, &reply) {
                            return report;
                        }
                        report.replied = true;
                        self.send_reply(&msg.channel, &msg.author, &reply).await;
                    }
                    Err(e) => warn!("[relay] Completion via {} failed: {}", completer.name(), e),
                }
            }
        }

        report
    }

    async fn send_reply(&self, channel: &str, viewer: &str, reply: &str) {
        let line = format!("@{} {}", viewer, single_line(reply));
        for chunk in split_message(&line, TWITCH_MESSAGE_LIMIT) {
            let out = OutboundMessage { channel: channel.to_string(), text: chunk };
            if let Err(e) = self.sender.send(out).await {
                warn!("[relay] Reply to {} not sent: {}", viewer, e);
                break;
            }
        }
    }
}

/// Collapse CR/LF runs to single spaces. One chat reply is one IRC line.
pub fn single_line(text: &str) -> String {
    text.split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run `fut` with a deadline, mapping expiry to `EngineError::Timeout`.
pub async fn bounded<T, F>(operation: &str, after: Duration, fut: F) -> EngineResult<T>
where
    F: Future<Output = EngineResult<T>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => Err(EngineError::timeout(operation, after)),
    }
}

/// Split a long message into chunks of at most `max_len` bytes, preferring
/// newline/space breaks and never cutting inside a UTF-8 character.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }
    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }
        let mut limit = max_len.max(1);
        while !remaining.is_char_boundary(limit) {
            limit -= 1;
        }
        if limit == 0 {
            // A single character wider than max_len
            limit = remaining.chars().next().map(char::len_utf8).unwrap_or(remaining.len());
        }
        let split_at = remaining[..limit]
            .rfind('\n')
            .or_else(|| remaining[..limit].rfind(' '))
            .filter(|&i| i > 0)
            .unwrap_or(limit);
        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::types::RecordKind;
    use crate::session::Session;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct EchoTranslator;

    #[async_trait]
    impl Translator for EchoTranslator {
        fn name(&self) -> &str { "echo" }
        async fn translate(&self, text: &str, target: TargetLanguage) -> EngineResult<String> {
            Ok(format!("[{}] {}", target.code(), text))
        }
    }

    struct BrokenTranslator;

    #[async_trait]
    impl Translator for BrokenTranslator {
        fn name(&self) -> &str { "broken" }
        async fn translate(&self, _: &str, _: TargetLanguage) -> EngineResult<String> {
            Err(EngineError::provider("broken", "503 Service Unavailable"))
        }
    }

    struct SlowTranslator;

    #[async_trait]
    impl Translator for SlowTranslator {
        fn name(&self) -> &str { "slow" }
        async fn translate(&self, text: &str, _: TargetLanguage) -> EngineResult<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(text.to_string())
        }
    }

    struct CannedCompleter(EngineResult<String>);

    #[async_trait]
    impl Completer for CannedCompleter {
        fn name(&self) -> &str { "canned" }
        async fn complete(&self, _: &str, _: &str) -> EngineResult<String> {
            match &self.0 {
                Ok(s) => Ok(s.clone()),
                Err(e) => Err(EngineError::provider("canned", e.to_string())),
            }
        }
    }

    #[derive(Default)]
    struct RecordingSender(Mutex<Vec<OutboundMessage>>);

    #[async_trait]
    impl ChatSender for RecordingSender {
        async fn send(&self, message: OutboundMessage) -> EngineResult<()> {
            self.0.lock().push(message);
            Ok(())
        }
    }

    fn message(author: &str, text: &str) -> ChatEvent {
        ChatEvent::Message(InboundMessage {
            author: author.into(),
            text: text.into(),
            channel: "#mychan".into(),
            is_echo: false,
        })
    }

    fn relay(
        config: SessionConfig,
        translator: Option<Arc<dyn Translator>>,
        completer: Option<Arc<dyn Completer>>,
    ) -> (Relay, SharedSession, Arc<RecordingSender>) {
        let session = Session::shared(100);
        let epoch = session.begin_run("started").unwrap();
        let sender = Arc::new(RecordingSender::default());
        let relay = Relay::new(
            session.clone(), epoch, &config, translator, completer,
            sender.clone(), Duration::from_millis(200),
        );
        (relay, session, sender)
    }

    fn kinds(session: &Session) -> Vec<RecordKind> {
        session.records().iter().map(|r| r.kind).collect()
    }

    #[tokio::test]
    async fn translation_only_scenario() {
        let config = SessionConfig { ai_enabled: false, ..Default::default() };
        let (relay, session, sender) = relay(config, Some(Arc::new(EchoTranslator)), None);
        let report = relay.handle(message("viewer1", "hello")).await;
        assert_eq!(report, RelayReport { recorded: true, translated: true, replied: false });

        let records = session.records();
        // "started" system record plus the two new ones
        assert_eq!(kinds(&session), vec![RecordKind::System, RecordKind::Chat, RecordKind::Translation]);
        assert_eq!(records[1].author, "viewer1");
        assert_eq!(records[1].text, "hello");
        assert_eq!(records[2].author, "Translator");
        assert_eq!(records[2].text, "[ar] hello");
        let c = session.counters();
        assert_eq!((c.messages, c.translations, c.ai_replies), (1, 1, 0));
        assert!(sender.0.lock().is_empty());
    }

    #[tokio::test]
    async fn self_echo_produces_nothing() {
        let (relay, session, sender) = relay(
            SessionConfig::default(),
            Some(Arc::new(EchoTranslator)),
            Some(Arc::new(CannedCompleter(Ok("hi".into())))),
        );
        let before = session.len();
        let report = relay.handle(ChatEvent::Message(InboundMessage {
            author: "mybot".into(),
            text: "@viewer1 hi".into(),
            channel: "#mychan".into(),
            is_echo: true,
        })).await;
        assert_eq!(report, RelayReport::default());
        assert_eq!(session.len(), before);
        assert_eq!(session.counters().messages, 0);
        assert!(sender.0.lock().is_empty());
    }

    #[tokio::test]
    async fn translation_disabled_ignores_available_backend() {
        let config = SessionConfig { translation_enabled: false, ai_enabled: false, ..Default::default() };
        let (relay, session, _) = relay(config, Some(Arc::new(EchoTranslator)), None);
        relay.handle(message("v", "one")).await;
        relay.handle(message("v", "two")).await;
        assert_eq!(session.counters().translations, 0);
        assert!(!kinds(&session).contains(&RecordKind::Translation));
    }

    #[tokio::test]
    async fn translation_failure_does_not_block_ai_reply() {
        let (relay, session, sender) = relay(
            SessionConfig::default(),
            Some(Arc::new(BrokenTranslator)),
            Some(Arc::new(CannedCompleter(Ok("  Welcome in!  ".into())))),
        );
        let report = relay.handle(message("viewer1", "hello")).await;
        assert_eq!(report, RelayReport { recorded: true, translated: false, replied: true });
        assert_eq!(kinds(&session), vec![RecordKind::System, RecordKind::Chat, RecordKind::AiReply]);
        let sent = sender.0.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].channel, "#mychan");
        assert_eq!(sent[0].text, "@viewer1 Welcome in!");
    }

    #[tokio::test]
    async fn completion_failure_keeps_chat_and_translation() {
        let (relay, session, sender) = relay(
            SessionConfig::default(),
            Some(Arc::new(EchoTranslator)),
            Some(Arc::new(CannedCompleter(Err("401 invalid key".into())))),
        );
        let report = relay.handle(message("viewer1", "hello")).await;
        assert_eq!(report, RelayReport { recorded: true, translated: true, replied: false });
        assert_eq!(kinds(&session), vec![RecordKind::System, RecordKind::Chat, RecordKind::Translation]);
        assert_eq!(session.counters().ai_replies, 0);
        assert!(sender.0.lock().is_empty());
    }

    #[tokio::test]
    async fn empty_completion_counts_as_failure() {
        let (relay, session, sender) = relay(
            SessionConfig { translation_enabled: false, ..Default::default() },
            None,
            Some(Arc::new(CannedCompleter(Ok("   ".into())))),
        );
        relay.handle(message("viewer1", "hello")).await;
        assert_eq!(session.counters().ai_replies, 0);
        assert!(sender.0.lock().is_empty());
    }

    #[tokio::test]
    async fn translation_precedes_ai_reply() {
        let (relay, session, _) = relay(
            SessionConfig::default(),
            Some(Arc::new(EchoTranslator)),
            Some(Arc::new(CannedCompleter(Ok("hey".into())))),
        );
        relay.handle(message("viewer1", "hello")).await;
        assert_eq!(
            kinds(&session),
            vec![RecordKind::System, RecordKind::Chat, RecordKind::Translation, RecordKind::AiReply]
        );
        let c = session.counters();
        assert_eq!((c.messages, c.translations, c.ai_replies), (1, 1, 1));
    }

    #[tokio::test]
    async fn slow_translation_times_out() {
        let (relay, session, _) = relay(
            SessionConfig { ai_enabled: false, ..Default::default() },
            Some(Arc::new(SlowTranslator)),
            None,
        );
        let report = relay.handle(message("viewer1", "hello")).await;
        assert!(report.recorded);
        assert!(!report.translated);
        assert_eq!(session.counters().translations, 0);
    }

    #[tokio::test]
    async fn ready_and_error_events() {
        let (relay, session, _) = relay(SessionConfig::default(), None, None);
        relay.handle(ChatEvent::Ready { nick: "mybot".into() }).await;
        relay.handle(ChatEvent::Error("Login authentication failed".into())).await;
        let texts: Vec<String> = session.records().into_iter().map(|r| r.text).collect();
        assert_eq!(texts[1], "Connected to Twitch as mybot");
        assert_eq!(texts[2], "Error: Login authentication failed");
        assert_eq!(session.run_state(), crate::atoms::types::RunState::Stopped);
    }

    #[tokio::test]
    async fn run_drains_channel_in_order() {
        let (relay, session, _) = relay(
            SessionConfig { translation_enabled: false, ai_enabled: false, ..Default::default() },
            None,
            None,
        );
        let (tx, rx) = mpsc::channel(8);
        for i in 0..3 {
            tx.send(message("v", &format!("m{}", i))).await.unwrap();
        }
        drop(tx);
        relay.run(rx).await;
        let texts: Vec<String> = session.records().into_iter().skip(1).map(|r| r.text).collect();
        assert_eq!(texts, vec!["m0", "m1", "m2"]);
    }

    #[tokio::test]
    async fn multi_line_reply_is_sent_as_one_line() {
        let (relay, session, sender) = relay(
            SessionConfig { translation_enabled: false, ..Default::default() },
            None,
            Some(Arc::new(CannedCompleter(Ok("Sure thing!\nPART #mychan\r\nbye".into())))),
        );
        relay.handle(message("viewer1", "leave pls")).await;
        let sent = sender.0.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, "@viewer1 Sure thing! PART #mychan bye");
        assert!(!sent[0].text.contains('\n') && !sent[0].text.contains('\r'));
        // The log keeps the reply as the model wrote it
        assert_eq!(session.records().last().map(|r| r.text.as_str()), Some("Sure thing!\nPART #mychan\r\nbye"));
    }

    #[tokio::test]
    async fn stopped_run_records_and_sends_nothing() {
        let (relay, session, sender) = relay(
            SessionConfig::default(),
            Some(Arc::new(EchoTranslator)),
            Some(Arc::new(CannedCompleter(Ok("hi".into())))),
        );
        session.end_run("stopped");
        let report = relay.handle(message("viewer1", "hello")).await;
        assert_eq!(report, RelayReport::default());
        assert_eq!(session.records().last().map(|r| r.text.as_str()), Some("stopped"));
        assert_eq!(session.counters().messages, 0);
        assert!(sender.0.lock().is_empty());
    }

    #[tokio::test]
    async fn stop_during_translation_drops_the_rest_of_the_step() {
        struct StopThenTranslate(SharedSession);

        #[async_trait]
        impl Translator for StopThenTranslate {
            fn name(&self) -> &str { "stopping" }
            async fn translate(&self, text: &str, _: TargetLanguage) -> EngineResult<String> {
                self.0.end_run("stopped");
                Ok(text.to_string())
            }
        }

        let session = Session::shared(100);
        let epoch = session.begin_run("started").unwrap();
        let sender = Arc::new(RecordingSender::default());
        let relay = Relay::new(
            session.clone(), epoch, &SessionConfig::default(),
            Some(Arc::new(StopThenTranslate(session.clone()))),
            Some(Arc::new(CannedCompleter(Ok("hi".into())))),
            sender.clone(), Duration::from_millis(200),
        );
        let report = relay.handle(message("viewer1", "hello")).await;
        assert_eq!(report, RelayReport { recorded: true, translated: false, replied: false });
        assert_eq!(kinds(&session), vec![RecordKind::System, RecordKind::Chat, RecordKind::System]);
        assert!(sender.0.lock().is_empty());
    }

    #[tokio::test]
    async fn run_discards_events_queued_after_stop() {
        let (relay, session, _) = relay(
            SessionConfig { translation_enabled: false, ai_enabled: false, ..Default::default() },
            None,
            None,
        );
        let (tx, rx) = mpsc::channel(8);
        tx.send(message("v", "m0")).await.unwrap();
        session.end_run("stopped");
        tx.send(message("v", "m1")).await.unwrap();
        drop(tx);
        relay.run(rx).await;
        assert_eq!(session.counters().messages, 0);
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn single_line_collapses_breaks() {
        assert_eq!(single_line("a\nb"), "a b");
        assert_eq!(single_line("one\r\n\r\ntwo \n three"), "one two three");
        assert_eq!(single_line("plain"), "plain");
    }

    #[test]
    fn split_message_short() {
        assert_eq!(split_message("hello", 100), vec!["hello"]);
    }

    #[test]
    fn split_message_prefers_space_break() {
        let msg = format!("{} {}", "a".repeat(60), "b".repeat(60));
        let chunks = split_message(&msg, 80);
        assert_eq!(chunks, vec!["a".repeat(60), "b".repeat(60)]);
    }

    #[test]
    fn split_message_respects_char_boundaries() {
        // Arabic letters are two bytes each
        let msg = "م".repeat(300);
        let chunks = split_message(&msg, 101);
        assert!(chunks.len() >= 6);
        for chunk in &chunks {
            assert!(chunk.len() <= 101);
        }
        assert_eq!(chunks.concat(), msg);
    }
}

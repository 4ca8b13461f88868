//! The conversation engine.
//!
//! One inbound message in, at most one reply out. The sender's session
//! slot stays locked for the whole transition, including the send, so a
//! burst from one number is handled strictly in arrival order while other
//! senders proceed in parallel.
//!
//! State advances before the reply goes out. A failed send therefore never
//! rolls a session back; the tenant just misses one message.

use crate::calls::{CallLog, CallRecord};
use crate::error::EngineError;
use crate::maintenance::{MaintenanceLog, MaintenanceRequest};
use crate::replies;
use chrono::{DateTime, Utc};
use parkline_ai::{FallbackGenerator, GenerationRequest, ResponseGenerator};
use parkline_conversation::{
    classify, detect_language, is_greeting_only, ConversationSession, Intent, Role, SessionStore,
};
use parkline_directory::{
    DirectorySource, DirectoryStore, IdentityResolver, Resolution, TenantRecord,
};
use parkline_transport::{InboundMessage, Transport};
use std::sync::Arc;

/// Engine-level settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Phone number maintenance reports are forwarded to.
    pub owner_number: String,
}

/// The conversation engine and its collaborators.
pub struct ConversationEngine {
    directory: Arc<DirectoryStore>,
    source: Arc<dyn DirectorySource>,
    sessions: Arc<SessionStore>,
    resolver: IdentityResolver,
    generator: Arc<dyn ResponseGenerator>,
    fallback: FallbackGenerator,
    transport: Arc<dyn Transport>,
    maintenance: Arc<dyn MaintenanceLog>,
    calls: Arc<dyn CallLog>,
    config: EngineConfig,
}

impl ConversationEngine {
    /// Wires up an engine.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        directory: Arc<DirectoryStore>,
        source: Arc<dyn DirectorySource>,
        sessions: Arc<SessionStore>,
        resolver: IdentityResolver,
        generator: Arc<dyn ResponseGenerator>,
        transport: Arc<dyn Transport>,
        maintenance: Arc<dyn MaintenanceLog>,
        calls: Arc<dyn CallLog>,
        config: EngineConfig,
    ) -> Self {
        Self {
            directory,
            source,
            sessions,
            resolver,
            generator,
            fallback: FallbackGenerator,
            transport,
            maintenance,
            calls,
            config,
        }
    }

    /// Shared session store, for the sweeper and persistence.
    #[must_use]
    pub fn sessions(&self) -> Arc<SessionStore> {
        Arc::clone(&self.sessions)
    }

    /// Refreshes the tenant roster from the source.
    ///
    /// # Errors
    ///
    /// Propagates directory errors; the prior snapshot stays live.
    pub async fn refresh_directory(&self) -> Result<usize, EngineError> {
        Ok(self.directory.refresh(self.source.as_ref()).await?)
    }

    /// Shared directory store, for reminder runs.
    #[must_use]
    pub fn directory(&self) -> Arc<DirectoryStore> {
        Arc::clone(&self.directory)
    }

    /// Handles one inbound SMS end to end.
    ///
    /// # Errors
    ///
    /// Returns an error for a missing sender or a failed send; in the
    /// latter case session state has already advanced.
    pub async fn handle_inbound(&self, message: &InboundMessage) -> Result<(), EngineError> {
        if !message.has_sender() {
            return Err(EngineError::MissingSender);
        }
        let now = Utc::now();
        let slot = self.sessions.slot(&message.sender);
        let mut guard = slot.lock().await;

        let session = guard.get_or_insert_with(|| {
            tracing::info!(sender = %message.sender, "starting conversation");
            let mut session =
                ConversationSession::new(&message.sender, detect_language(&message.text), now);
            // The first message may carry the actual request alongside the
            // identification; keep it for replay once the sender is known.
            if !is_greeting_only(&message.text) {
                session.hold_pending_message(&message.text);
            }
            session
        });
        session.touch(now);

        if !session.phase.is_identified() {
            let reply = self.identify(session, &message.text, now).await;
            return self.send(&message.sender, &reply).await;
        }

        // Tenant bound but dropped from the roster since, e.g. a move-out
        // picked up by a refresh. Start over.
        let Some(record) = self.bound_record(session) else {
            tracing::warn!(sender = %message.sender, "bound tenant left the roster");
            session.force_reset(now);
            if !is_greeting_only(&message.text) {
                session.hold_pending_message(&message.text);
            }
            let reply = self.identify(session, &message.text, now).await;
            return self.send(&message.sender, &reply).await;
        };

        if classify(&message.text) == Intent::EndOfConversation {
            let language = session.language;
            tracing::info!(sender = %message.sender, "conversation ended by tenant");
            *guard = None;
            return self.send(&message.sender, replies::goodbye(language)).await;
        }

        let reply = self.answer(session, &record, &message.text, now).await;
        self.send(&message.sender, &reply).await
    }

    /// Handles one inbound voice call; returns the spoken prompt.
    pub async fn handle_voice(&self, caller: &str) -> String {
        let record = CallRecord::new(caller, Utc::now());
        if let Err(e) = self.calls.record_call(&record).await {
            tracing::warn!(caller, error = %e, "failed to log inbound call");
        }
        replies::voice_prompt().to_string()
    }

    /// Runs one identification attempt and returns the reply text.
    async fn identify(
        &self,
        session: &mut ConversationSession,
        text: &str,
        now: DateTime<Utc>,
    ) -> String {
        let snapshot = self.directory.snapshot();
        match self.resolver.resolve(text, &snapshot) {
            Resolution::Unique(identity) => {
                tracing::info!(sender = %session.sender, tenant = %identity, "tenant identified");
                let record = snapshot.get(&identity).cloned();
                session.bind_tenant(identity.clone());
                let greeting = replies::greeting(
                    session.language,
                    &identity.first_name,
                    &identity.unit,
                    record.as_ref().map_or("", |r| r.park.name.as_str()),
                );
                session.history.push(Role::Bot, greeting.clone());

                // Replay the message that arrived before or alongside the
                // identification, so the tenant doesn't have to repeat it.
                // A held message that is the identification itself and
                // nothing more ("hi, this is Clara Lopez") answers nothing
                // and is dropped.
                match (session.take_pending_message(), record) {
                    (Some(held), Some(record))
                        if !is_greeting_only(&held)
                            && (held != text || classify(&held) != Intent::General) =>
                    {
                        let answer = self.answer(session, &record, &held, now).await;
                        format!("{greeting}\n{answer}")
                    }
                    _ => greeting,
                }
            }
            Resolution::Ambiguous(candidates) => {
                tracing::info!(
                    sender = %session.sender,
                    candidates = candidates.len(),
                    "ambiguous identification"
                );
                replies::ambiguous_prompt(session.language, &candidates)
            }
            Resolution::NoMatch => {
                if session.pending_message.is_none() && !is_greeting_only(text) {
                    session.hold_pending_message(text);
                }
                replies::identify_prompt(session.language).to_string()
            }
        }
    }

    /// Composes the reply for an identified tenant's message and records
    /// both sides in the session history.
    async fn answer(
        &self,
        session: &mut ConversationSession,
        record: &TenantRecord,
        text: &str,
        now: DateTime<Utc>,
    ) -> String {
        let intent = classify(text);

        let ledger = if intent == Intent::Financial {
            match self
                .directory
                .ledger(&record.identity.external_id, self.source.as_ref())
                .await
            {
                Ok(ledger) => Some(ledger.as_ref().clone()),
                Err(e) => {
                    tracing::warn!(
                        tenant = %record.identity.external_id,
                        error = %e,
                        "ledger unavailable, answering from the roster record"
                    );
                    None
                }
            }
        } else {
            None
        };

        let mut request = GenerationRequest::new(text, record.clone(), session.language)
            .with_intent(intent)
            .with_history(session.history.entries().cloned().collect());
        if let Some(ledger) = ledger {
            request = request.with_ledger(ledger);
        }

        let reply = match intent {
            Intent::Maintenance => self.handle_maintenance(session, record, text, now, &request).await,
            _ => match self.generator.generate_reply(&request).await {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::warn!(sender = %session.sender, error = %e, "generation failed, using fallback");
                    self.fallback.reply(&request)
                }
            },
        };

        session.history.push(Role::User, text);
        session.history.push(Role::Bot, reply.clone());
        reply
    }

    /// Logs a maintenance report, notifies the owner, and returns the ack.
    async fn handle_maintenance(
        &self,
        session: &ConversationSession,
        record: &TenantRecord,
        text: &str,
        now: DateTime<Utc>,
        request: &GenerationRequest,
    ) -> String {
        let report = MaintenanceRequest::new(
            &session.sender,
            record.identity.full_name(),
            &record.identity.unit,
            text,
            now,
        );

        if let Err(e) = self.maintenance.record(&report).await {
            tracing::error!(sender = %session.sender, error = %e, "failed to log maintenance request");
            let mut apology = request.clone();
            apology.intent = Intent::General;
            return self.fallback.reply(&apology);
        }

        if let Err(e) = self
            .transport
            .send_message(&self.config.owner_number, &report.summary())
            .await
        {
            tracing::warn!(error = %e, "owner notification failed");
        }

        self.fallback.reply(request)
    }

    fn bound_record(&self, session: &ConversationSession) -> Option<TenantRecord> {
        let identity = session.tenant.as_ref()?;
        self.directory.snapshot().get(identity).cloned()
    }

    async fn send(&self, to: &str, body: &str) -> Result<(), EngineError> {
        self.transport.send_message(to, body).await.map_err(|e| {
            tracing::warn!(to, error = %e, "reply send failed");
            EngineError::Transport(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calls::InMemoryCallLog;
    use crate::maintenance::InMemoryMaintenanceLog;
    use async_trait::async_trait;
    use parkline_ai::GenerationError;
    use parkline_conversation::SessionPhase;
    use parkline_directory::{DirectoryError, LedgerEntry, TenantIdentity};
    use parkline_transport::TransportError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const OWNER: &str = "+15558887777";

    struct FakeSource {
        roster: Vec<TenantRecord>,
        ledger_fetches: AtomicUsize,
    }

    #[async_trait]
    impl DirectorySource for FakeSource {
        async fn fetch_all(&self) -> Result<Vec<TenantRecord>, DirectoryError> {
            Ok(self.roster.clone())
        }

        async fn fetch_ledger(&self, external_id: &str) -> Result<Vec<LedgerEntry>, DirectoryError> {
            self.ledger_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(vec![LedgerEntry {
                date: "2026-08-01".to_string(),
                description: format!("rent for {external_id}"),
                amount: "$450.00".to_string(),
            }])
        }
    }

    #[derive(Default)]
    struct FakeTransport {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl FakeTransport {
        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send_message(&self, to: &str, body: &str) -> Result<(), TransportError> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), body.to_string()));
            Ok(())
        }
    }

    struct FakeGenerator {
        reply: Option<String>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl FakeGenerator {
        fn canned(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn broken() -> Self {
            Self {
                reply: None,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ResponseGenerator for FakeGenerator {
        async fn generate_reply(
            &self,
            request: &GenerationRequest,
        ) -> Result<String, GenerationError> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => Err(GenerationError::Timeout),
            }
        }
    }

    fn roster() -> Vec<TenantRecord> {
        vec![
            TenantRecord::new(
                TenantIdentity::new("t-1", "Clara", "Lopez", "02"),
                "$450.00",
                "1st",
            )
            .with_phone("+15550001111"),
            TenantRecord::new(
                TenantIdentity::new("t-2", "Miguel", "Reyes", "18 A"),
                "$0.00",
                "1st",
            ),
            TenantRecord::new(
                TenantIdentity::new("t-3", "Clara", "Ramos", "07"),
                "$0.00",
                "1st",
            ),
        ]
    }

    struct Harness {
        engine: ConversationEngine,
        transport: Arc<FakeTransport>,
        generator: Arc<FakeGenerator>,
        maintenance: Arc<InMemoryMaintenanceLog>,
        calls: Arc<InMemoryCallLog>,
    }

    async fn harness(generator: FakeGenerator) -> Harness {
        let directory = Arc::new(DirectoryStore::new());
        let source = Arc::new(FakeSource {
            roster: roster(),
            ledger_fetches: AtomicUsize::new(0),
        });
        directory.refresh(source.as_ref()).await.expect("refresh");

        let transport = Arc::new(FakeTransport::default());
        let generator = Arc::new(generator);
        let maintenance = Arc::new(InMemoryMaintenanceLog::new());
        let calls = Arc::new(InMemoryCallLog::new());

        let engine = ConversationEngine::new(
            directory,
            source,
            Arc::new(SessionStore::new()),
            IdentityResolver::new(),
            Arc::clone(&generator) as Arc<dyn ResponseGenerator>,
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&maintenance) as Arc<dyn MaintenanceLog>,
            Arc::clone(&calls) as Arc<dyn CallLog>,
            EngineConfig {
                owner_number: OWNER.to_string(),
            },
        );
        Harness {
            engine,
            transport,
            generator,
            maintenance,
            calls,
        }
    }

    async fn session_phase(h: &Harness, sender: &str) -> Option<SessionPhase> {
        let slot = h.engine.sessions().slot(sender);
        let guard = slot.lock().await;
        guard.as_ref().map(|s| s.phase)
    }

    #[tokio::test]
    async fn missing_sender_is_rejected() {
        let h = harness(FakeGenerator::canned("ok")).await;
        let msg = InboundMessage::sms("", "hello");
        assert_eq!(
            h.engine.handle_inbound(&msg).await,
            Err(EngineError::MissingSender)
        );
    }

    #[tokio::test]
    async fn unique_name_identifies_and_greets() {
        let h = harness(FakeGenerator::canned("ok")).await;
        h.engine
            .handle_inbound(&InboundMessage::sms("+15550001111", "hi, this is Clara Lopez"))
            .await
            .expect("handled");

        let sent = h.transport.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("Clara"));
        assert!(sent[0].1.contains("lot 02"));
        assert_eq!(
            session_phase(&h, "+15550001111").await,
            Some(SessionPhase::Active)
        );
    }

    #[tokio::test]
    async fn no_match_holds_the_question_and_replays_it() {
        let h = harness(FakeGenerator::canned("The office opens at nine.")).await;
        let sender = "+15550001111";

        h.engine
            .handle_inbound(&InboundMessage::sms(sender, "what time does the office open"))
            .await
            .expect("handled");
        let sent = h.transport.sent();
        assert!(sent[0].1.contains("full name"));

        h.engine
            .handle_inbound(&InboundMessage::sms(sender, "Clara Lopez"))
            .await
            .expect("handled");
        let sent = h.transport.sent();
        assert_eq!(sent.len(), 2);
        // Greeting and the answer to the held question, in one message.
        assert!(sent[1].1.contains("Clara"));
        assert!(sent[1].1.contains("office opens at nine"));
    }

    #[tokio::test]
    async fn ambiguous_input_asks_for_detail_without_binding() {
        let h = harness(FakeGenerator::canned("ok")).await;
        // Two tenants are named Clara.
        h.engine
            .handle_inbound(&InboundMessage::sms("+15550001111", "Clara"))
            .await
            .expect("handled");

        let sent = h.transport.sent();
        assert!(sent[0].1.contains("Clara Lopez (lot 02)"));
        assert!(sent[0].1.contains("Clara Ramos (lot 07)"));
        assert_eq!(
            session_phase(&h, "+15550001111").await,
            Some(SessionPhase::AwaitingIdentification)
        );
    }

    #[tokio::test]
    async fn end_of_conversation_destroys_the_session() {
        let h = harness(FakeGenerator::canned("ok")).await;
        let sender = "+15550001111";
        h.engine
            .handle_inbound(&InboundMessage::sms(sender, "Clara Lopez"))
            .await
            .expect("handled");
        h.engine
            .handle_inbound(&InboundMessage::sms(sender, "that's all, bye"))
            .await
            .expect("handled");

        let sent = h.transport.sent();
        assert!(sent.last().unwrap().1.contains("Goodbye"));
        assert_eq!(session_phase(&h, sender).await, None);
    }

    #[tokio::test]
    async fn maintenance_logs_and_notifies_owner() {
        let h = harness(FakeGenerator::canned("unused")).await;
        let sender = "+15550001111";
        h.engine
            .handle_inbound(&InboundMessage::sms(sender, "Clara Lopez"))
            .await
            .expect("handled");
        h.engine
            .handle_inbound(&InboundMessage::sms(sender, "my kitchen sink is leaking"))
            .await
            .expect("handled");

        let logged = h.maintenance.all();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].unit, "02");
        assert!(logged[0].issue.contains("leaking"));

        let sent = h.transport.sent();
        let owner_msgs: Vec<_> = sent.iter().filter(|(to, _)| to == OWNER).collect();
        assert_eq!(owner_msgs.len(), 1);
        assert!(owner_msgs[0].1.contains("Clara Lopez"));

        let tenant_msgs: Vec<_> = sent.iter().filter(|(to, _)| to == sender).collect();
        assert!(tenant_msgs.last().unwrap().1.contains("logged"));
    }

    #[tokio::test]
    async fn combined_first_message_keeps_the_issue() {
        let h = harness(FakeGenerator::canned("unused")).await;
        let sender = "+15550001111";
        h.engine
            .handle_inbound(&InboundMessage::sms(
                sender,
                "my sink is leaking, Clara Lopez lot 02",
            ))
            .await
            .expect("handled");

        let logged = h.maintenance.all();
        assert_eq!(logged.len(), 1);
        assert!(logged[0].issue.contains("leaking"));

        let sent = h.transport.sent();
        let owner_msgs: Vec<_> = sent.iter().filter(|(to, _)| to == OWNER).collect();
        assert_eq!(owner_msgs.len(), 1);

        // One message to the tenant: greeting plus the acknowledgement.
        let tenant_msgs: Vec<_> = sent.iter().filter(|(to, _)| to == sender).collect();
        assert_eq!(tenant_msgs.len(), 1);
        assert!(tenant_msgs[0].1.contains("lot 02"));
        assert!(tenant_msgs[0].1.contains("logged"));
    }

    #[tokio::test]
    async fn issue_reported_before_identification_is_logged_verbatim() {
        let h = harness(FakeGenerator::canned("unused")).await;
        let sender = "+15550001111";
        h.engine
            .handle_inbound(&InboundMessage::sms(sender, "my pipe is leaking"))
            .await
            .expect("handled");
        assert!(h.maintenance.all().is_empty());

        h.engine
            .handle_inbound(&InboundMessage::sms(sender, "Clara Lopez"))
            .await
            .expect("handled");

        let logged = h.maintenance.all();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].issue, "my pipe is leaking");
        assert_eq!(logged[0].unit, "02");
    }

    #[tokio::test]
    async fn financial_question_attaches_the_ledger() {
        let h = harness(FakeGenerator::canned("Your balance is $450.00.")).await;
        let sender = "+15550001111";
        h.engine
            .handle_inbound(&InboundMessage::sms(sender, "Clara Lopez"))
            .await
            .expect("handled");
        h.engine
            .handle_inbound(&InboundMessage::sms(sender, "what is my balance"))
            .await
            .expect("handled");

        let requests = h.generator.requests.lock().unwrap();
        let financial = requests
            .iter()
            .find(|r| r.intent == Intent::Financial)
            .expect("financial request");
        assert!(financial.ledger.is_some());
    }

    #[tokio::test]
    async fn generation_failure_falls_back_to_directory_answer() {
        let h = harness(FakeGenerator::broken()).await;
        let sender = "+15550001111";
        h.engine
            .handle_inbound(&InboundMessage::sms(sender, "Clara Lopez"))
            .await
            .expect("handled");
        h.engine
            .handle_inbound(&InboundMessage::sms(sender, "what is my balance"))
            .await
            .expect("handled");

        let sent = h.transport.sent();
        assert!(sent.last().unwrap().1.contains("$450.00"));
    }

    #[tokio::test]
    async fn history_carries_previous_turns() {
        let h = harness(FakeGenerator::canned("ok")).await;
        let sender = "+15550001111";
        h.engine
            .handle_inbound(&InboundMessage::sms(sender, "Clara Lopez"))
            .await
            .expect("handled");
        h.engine
            .handle_inbound(&InboundMessage::sms(sender, "first question"))
            .await
            .expect("handled");
        h.engine
            .handle_inbound(&InboundMessage::sms(sender, "second question"))
            .await
            .expect("handled");

        let requests = h.generator.requests.lock().unwrap();
        let last = requests.last().expect("request");
        assert!(last
            .history
            .iter()
            .any(|e| e.role == Role::User && e.text == "first question"));
        assert!(last.history.iter().any(|e| e.role == Role::Bot && e.text == "ok"));
    }

    #[tokio::test]
    async fn spanish_first_message_pins_spanish_replies() {
        let h = harness(FakeGenerator::canned("ok")).await;
        let sender = "+15550001111";
        h.engine
            .handle_inbound(&InboundMessage::sms(sender, "hola, soy Clara Lopez"))
            .await
            .expect("handled");

        let sent = h.transport.sent();
        assert!(sent[0].1.contains("Hola"));
    }

    #[tokio::test]
    async fn voice_calls_are_logged_and_prompted() {
        let h = harness(FakeGenerator::canned("ok")).await;
        let prompt = h.engine.handle_voice("+15550001111").await;
        assert!(prompt.contains("text"));
        assert_eq!(h.calls.all().len(), 1);
        assert_eq!(h.calls.all()[0].caller, "+15550001111");
    }
}

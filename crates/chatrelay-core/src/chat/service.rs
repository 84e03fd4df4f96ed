//! Chat service -- the request orchestrator.
//!
//! Per request:
//! 1. validate (non-empty trimmed input)
//! 2. dedup check: a stored reply for the fingerprint is returned as-is,
//!    with no generation, no persistence, and no session touch
//! 3. session touch
//! 4. generate via the gateway
//! 5. persist best-effort
//! 6. store the reply under the fingerprint and return it
//!
//! Steps 3-5 run inside the fingerprint's dedup slot, so concurrent
//! identical requests share a single generation.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

use chatrelay_types::chat::{ChatReply, ChatRequest};
use chatrelay_types::error::ChatError;

use crate::llm::gateway::GenerationGateway;
use crate::repository::exchange::ExchangeRepository;

use super::dedup::RequestDeduplicator;
use super::session::SessionTracker;
use super::sink::PersistenceSink;

/// Orchestrates one chat request through dedup, generation, and persistence.
///
/// Generic over the repository so the binary pins it to the SQL store and
/// tests can use in-memory doubles.
pub struct ChatService<R> {
    dedup: RequestDeduplicator,
    sessions: SessionTracker,
    gateway: GenerationGateway,
    sink: PersistenceSink<R>,
}

impl<R: ExchangeRepository> ChatService<R> {
    pub fn new(
        gateway: GenerationGateway,
        sink: PersistenceSink<R>,
        dedup: RequestDeduplicator,
        sessions: SessionTracker,
    ) -> Self {
        Self {
            dedup,
            sessions,
            gateway,
            sink,
        }
    }

    pub fn sessions(&self) -> &SessionTracker {
        &self.sessions
    }

    pub fn dedup(&self) -> &RequestDeduplicator {
        &self.dedup
    }

    pub fn gateway(&self) -> &GenerationGateway {
        &self.gateway
    }

    pub fn sink(&self) -> &PersistenceSink<R> {
        &self.sink
    }

    /// Handle a chat request arriving now.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        self.chat_at(request, Utc::now()).await
    }

    /// Handle a chat request arriving at `now`.
    ///
    /// `now` selects the dedup bucket and stamps session activity.
    pub async fn chat_at(
        &self,
        request: &ChatRequest,
        now: DateTime<Utc>,
    ) -> Result<ChatReply, ChatError> {
        let user_input = request.trimmed_input();
        if user_input.is_empty() {
            tracing::warn!("Rejected request with empty input");
            return Err(ChatError::EmptyInput);
        }
        let session_id = request.session_label();

        let key = self.dedup.fingerprint(session_id, user_input, now);
        if let Some(reply) = self.dedup.lookup(&key) {
            tracing::info!(fingerprint = %key, "Returning cached reply");
            return Ok(reply);
        }

        let slot = self.dedup.claim(&key);
        let generated = AtomicBool::new(false);
        let reply = {
            let generated = &generated;
            slot.get_or_init(move || async move {
                generated.store(true, Ordering::Relaxed);
                self.generate_reply(session_id, user_input, now).await
            })
            .await
            .clone()
        };

        if generated.load(Ordering::Relaxed) {
            // The slot may have been evicted while generating.
            self.dedup.store(&key, reply.clone());
        } else {
            tracing::info!(fingerprint = %key, "Joined in-flight generation");
        }

        Ok(reply)
    }

    async fn generate_reply(
        &self,
        session_id: Option<&str>,
        user_input: &str,
        now: DateTime<Utc>,
    ) -> ChatReply {
        self.sessions.touch(session_id, now);

        tracing::info!(user_input, session_id = ?session_id, "Generating reply");
        let outcome = self.gateway.generate(user_input).await;
        if outcome.is_failed() {
            tracing::warn!("Replying with generation error text");
        }
        let response = outcome.into_reply_text();

        if !self.sink.save(user_input, &response, session_id).await {
            tracing::warn!("Exchange was not persisted");
        }

        ChatReply {
            response,
            timestamp: Utc::now(),
        }
    }
}

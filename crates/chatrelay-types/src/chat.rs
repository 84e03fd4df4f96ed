//! Chat request, reply, and exchange types for chatrelay.
//!
//! These types model one round trip through the relay: the inbound
//! `ChatRequest`, the `ChatReply` returned (and replayed from the dedup cache),
//! and the `ChatExchange` row appended to the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inbound body of `POST /chat`.
///
/// Both fields are optional at the wire level; an absent or blank
/// `user_input` is rejected by the chat service, not by deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub user_input: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ChatRequest {
    /// The user text with surrounding whitespace removed (empty when absent).
    pub fn trimmed_input(&self) -> &str {
        self.user_input.as_deref().map(str::trim).unwrap_or_default()
    }

    /// The session label, treating an empty string the same as no label.
    pub fn session_label(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|s| !s.is_empty())
    }
}

/// Payload returned by `POST /chat`.
///
/// Cached verbatim by the deduplicator, so a replay serializes to exactly
/// the same bytes as the original reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

/// One persisted user/model exchange.
///
/// Written once to the store after generation; never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatExchange {
    pub session_id: Option<String>,
    pub user_input: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatExchange {
    /// Build an exchange stamped with the current time.
    pub fn now(session_id: Option<&str>, user_input: &str, response: &str) -> Self {
        Self {
            session_id: session_id.map(ToString::to_string),
            user_input: user_input.to_string(),
            response: response.to_string(),
            timestamp: Utc::now(),
        }
    }
}

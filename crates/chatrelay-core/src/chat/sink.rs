//! Best-effort persistence of chat exchanges.
//!
//! Store availability is decided once, at startup: if the schema bootstrap
//! fails the sink runs in degraded mode for the life of the process and every
//! `save` returns `false` without touching the store. When the store is
//! available, individual write failures are logged and reported as `false`;
//! they never reach the caller as errors.

use chatrelay_types::chat::ChatExchange;

use crate::repository::exchange::ExchangeRepository;

/// Append-only sink in front of an [`ExchangeRepository`].
pub struct PersistenceSink<R> {
    repo: Option<R>,
}

impl<R: ExchangeRepository> PersistenceSink<R> {
    /// Probe the store by ensuring its schema.
    ///
    /// On failure the repository is dropped and the sink is unavailable.
    pub async fn bootstrap(repo: R) -> Self {
        match repo.ensure_schema().await {
            Ok(()) => {
                tracing::info!("Connected to store and verified chats table");
                Self { repo: Some(repo) }
            }
            Err(e) => {
                tracing::error!(error = %e, "Store unavailable at startup, persistence disabled");
                Self { repo: None }
            }
        }
    }

    /// Wrap a repository already known to be reachable.
    pub fn connected(repo: R) -> Self {
        Self { repo: Some(repo) }
    }

    /// A sink that never writes.
    pub fn unavailable() -> Self {
        Self { repo: None }
    }

    /// Whether the store was reachable at startup.
    pub fn is_available(&self) -> bool {
        self.repo.is_some()
    }

    /// Persist one exchange stamped with the current time.
    ///
    /// Returns `true` when the row was written.
    pub async fn save(&self, user_input: &str, response: &str, session_id: Option<&str>) -> bool {
        let Some(repo) = &self.repo else {
            tracing::warn!("Store unavailable, exchange not saved");
            return false;
        };

        let exchange = ChatExchange::now(session_id, user_input, response);
        match repo.save_exchange(&exchange).await {
            Ok(id) => {
                tracing::info!(id, "Saved exchange");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to save exchange");
                false
            }
        }
    }
}

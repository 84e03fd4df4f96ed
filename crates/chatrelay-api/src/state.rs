//! Application state wiring the chat pipeline together.
//!
//! `ChatService` is generic over its repository; AppState pins it to the
//! SQL store from chatrelay-infra.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use secrecy::SecretString;

use chatrelay_core::chat::dedup::RequestDeduplicator;
use chatrelay_core::chat::service::ChatService;
use chatrelay_core::chat::session::SessionTracker;
use chatrelay_core::chat::sink::PersistenceSink;
use chatrelay_core::llm::box_provider::BoxLlmProvider;
use chatrelay_core::llm::gateway::GenerationGateway;
use chatrelay_infra::config::load_instruction;
use chatrelay_infra::llm::gemini::GeminiProvider;
use chatrelay_infra::store::exchange::SqlExchangeRepository;
use chatrelay_infra::store::pool::{PoolSettings, StorePool, StoreTarget};
use chatrelay_types::config::ServiceConfig;
use chatrelay_types::error::ConfigError;

use crate::cli::{ServeArgs, StoreArgs};

pub type ConcreteChatService = ChatService<SqlExchangeRepository>;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    /// Pool behind the sink, kept for shutdown. `None` when the store
    /// settings were unusable.
    pub store: Option<StorePool>,
}

impl AppState {
    pub fn new(chat_service: ConcreteChatService, store: Option<StorePool>) -> Self {
        Self {
            chat_service: Arc::new(chat_service),
            store,
        }
    }

    /// Build the pipeline from CLI settings and validated tunables.
    ///
    /// A missing API key or unreadable instruction file is fatal. An
    /// unreachable store is not: the sink starts in degraded mode.
    pub async fn init(args: &ServeArgs, config: &ServiceConfig) -> anyhow::Result<Self> {
        let api_key = args
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing("GENAI_API_KEY".to_string()))?;

        let instruction = load_instruction(&args.instruction_file).await?;

        let provider = GeminiProvider::new(SecretString::from(api_key))
            .context("failed to build Gemini client")?;
        let gateway = GenerationGateway::new(
            BoxLlmProvider::new(provider),
            config.model.clone(),
            instruction,
        )
        .with_temperature(config.temperature)
        .with_timeout(Duration::from_secs(config.generation_timeout_secs));

        let (sink, store) = open_store(&StoreSettings::resolve(&args.store, config)).await;

        let service = ChatService::new(
            gateway,
            sink,
            RequestDeduplicator::new(config.dedup_capacity, config.dedup_bucket_secs),
            SessionTracker::new(),
        );

        tracing::info!(
            model = %config.model,
            store_available = service.sink().is_available(),
            "Chat pipeline ready"
        );

        Ok(Self::new(service, store))
    }

    /// Release pooled store connections.
    pub async fn close(&self) {
        if let Some(pool) = &self.store {
            pool.close().await;
        }
    }
}

/// Store target plus pool sizing, resolved from flags and tunables.
pub struct StoreSettings {
    pub target: StoreTarget,
    pub pool: PoolSettings,
}

impl StoreSettings {
    pub fn resolve(args: &StoreArgs, config: &ServiceConfig) -> Self {
        Self {
            target: args.target(),
            pool: PoolSettings {
                max_connections: config.pool_max_connections,
                acquire_timeout: Duration::from_secs(config.pool_acquire_timeout_secs),
            },
        }
    }
}

/// Create the database if needed, open the store and probe it once.
///
/// Never fails: unusable settings or an unreachable server yield an
/// unavailable sink.
pub async fn open_store(
    settings: &StoreSettings,
) -> (PersistenceSink<SqlExchangeRepository>, Option<StorePool>) {
    tracing::info!(store = %settings.target.describe(), "Opening store");
    match StorePool::prepare(&settings.target, &settings.pool).await {
        Ok(pool) => {
            let sink = PersistenceSink::bootstrap(SqlExchangeRepository::new(pool.clone())).await;
            (sink, Some(pool))
        }
        Err(e) => {
            tracing::error!(error = %e, "Invalid store settings, persistence disabled");
            (PersistenceSink::unavailable(), None)
        }
    }
}

//! ExchangeRepository trait definition.
//!
//! The store is an append-only sink: the relay only ever inserts exchanges.
//! Follows the RPITIT repository pattern used across the core crate.

use chatrelay_types::chat::ChatExchange;
use chatrelay_types::error::RepositoryError;

/// Repository trait for persisting chat exchanges.
///
/// Implementations live in chatrelay-infra (e.g., `SqlExchangeRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ExchangeRepository: Send + Sync {
    /// Ensure the backing table exists.
    fn ensure_schema(
        &self,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Insert one exchange and return the id assigned by the store.
    fn save_exchange(
        &self,
        exchange: &ChatExchange,
    ) -> impl std::future::Future<Output = Result<i64, RepositoryError>> + Send;
}

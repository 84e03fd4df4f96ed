//! SQL exchange repository implementation.
//!
//! Implements `ExchangeRepository` from `chatrelay-core` with raw sqlx
//! queries against the `chats` table. Each insert runs as its own
//! auto-committed statement on a pooled connection.

use chatrelay_core::repository::exchange::ExchangeRepository;
use chatrelay_types::chat::ChatExchange;
use chatrelay_types::error::RepositoryError;

use super::pool::StorePool;

const MYSQL_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS chats (
    id INT AUTO_INCREMENT PRIMARY KEY,
    session_id VARCHAR(50) NULL,
    user_input TEXT NOT NULL,
    response TEXT NOT NULL,
    timestamp DATETIME NOT NULL
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci";

const SQLITE_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS chats (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NULL,
    user_input TEXT NOT NULL,
    response TEXT NOT NULL,
    timestamp TEXT NOT NULL
)";

const INSERT_EXCHANGE: &str =
    "INSERT INTO chats (session_id, user_input, response, timestamp) VALUES (?, ?, ?, ?)";

/// sqlx-backed implementation of `ExchangeRepository`.
pub struct SqlExchangeRepository {
    pool: StorePool,
}

impl SqlExchangeRepository {
    pub fn new(pool: StorePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &StorePool {
        &self.pool
    }
}

/// Pool exhaustion and I/O failures are connection problems; everything
/// else is reported against the query.
fn map_err(e: sqlx::Error) -> RepositoryError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::Connection(e.to_string())
        }
        other => RepositoryError::Query(other.to_string()),
    }
}

impl ExchangeRepository for SqlExchangeRepository {
    async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        match &self.pool {
            StorePool::MySql(pool) => {
                sqlx::query(MYSQL_SCHEMA).execute(pool).await.map_err(map_err)?;
            }
            StorePool::Sqlite(pool) => {
                sqlx::query(SQLITE_SCHEMA).execute(pool).await.map_err(map_err)?;
            }
        }
        tracing::debug!(backend = self.pool.backend(), "chats table ready");
        Ok(())
    }

    async fn save_exchange(&self, exchange: &ChatExchange) -> Result<i64, RepositoryError> {
        let timestamp = exchange.timestamp.naive_utc();

        match &self.pool {
            StorePool::MySql(pool) => {
                let result = sqlx::query(INSERT_EXCHANGE)
                    .bind(&exchange.session_id)
                    .bind(&exchange.user_input)
                    .bind(&exchange.response)
                    .bind(timestamp)
                    .execute(pool)
                    .await
                    .map_err(map_err)?;
                i64::try_from(result.last_insert_id())
                    .map_err(|e| RepositoryError::Query(format!("row id out of range: {e}")))
            }
            StorePool::Sqlite(pool) => {
                let result = sqlx::query(INSERT_EXCHANGE)
                    .bind(&exchange.session_id)
                    .bind(&exchange.user_input)
                    .bind(&exchange.response)
                    .bind(timestamp)
                    .execute(pool)
                    .await
                    .map_err(map_err)?;
                Ok(result.last_insert_rowid())
            }
        }
    }
}

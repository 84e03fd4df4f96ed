//! SQL storage layer.
//!
//! A single append-only `chats` table behind a bounded connection pool.
//! MySQL is the production backend; SQLite serves local runs and tests.

pub mod exchange;
pub mod pool;

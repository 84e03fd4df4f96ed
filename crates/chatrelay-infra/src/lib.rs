//! Infrastructure layer for chatrelay.
//!
//! Contains implementations of the traits defined in `chatrelay-core`:
//! the Gemini text-generation provider, the SQL exchange store (MySQL in
//! production, SQLite for local runs), and startup configuration loading.

pub mod config;
pub mod llm;
pub mod store;

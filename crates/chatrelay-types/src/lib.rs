//! Shared domain types for chatrelay.
//!
//! This crate contains the types passed between the relay layers: chat
//! requests and replies, persisted exchanges, LLM request shapes, service
//! tunables, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;

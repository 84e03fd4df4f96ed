//! Request pipeline and repository trait definitions for chatrelay.
//!
//! This crate defines the "ports" (provider and repository traits) that the
//! infrastructure layer implements, plus the chat pipeline built on them:
//! response cleaning, request deduplication, session tracking, the
//! generation gateway, and best-effort persistence. It depends only on
//! `chatrelay-types` -- never on `chatrelay-infra` or any database/IO crate.

pub mod chat;
pub mod llm;
pub mod repository;

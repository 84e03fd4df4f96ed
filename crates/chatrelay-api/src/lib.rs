//! chatrelay HTTP server.
//!
//! Wires the chat pipeline from `chatrelay-core` to its concrete
//! infrastructure and exposes it over axum. The `chatrelay` binary in
//! `main.rs` is a thin entry point over this library.

pub mod cli;
pub mod http;
pub mod state;

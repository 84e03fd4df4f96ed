//! LLM provider abstractions for chatrelay.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: Object-safe wrapper for dynamic dispatch
//! - `GenerationGateway`: single-turn generation with timing, timeout, and
//!   failure capture

pub mod box_provider;
pub mod gateway;
pub mod provider;

//! LlmProvider trait definition.
//!
//! This is the core abstraction every text-generation backend implements.
//! Uses RPITIT for `complete`; `BoxLlmProvider` adds dynamic dispatch.

use chatrelay_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for LLM provider backends (Gemini, test doubles, etc.).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
///
/// Implementations live in chatrelay-infra (e.g., `GeminiProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}

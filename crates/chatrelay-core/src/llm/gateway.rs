//! Generation gateway.
//!
//! Wraps the provider call for a single user turn: builds the request with
//! the fixed system instruction and sampling settings, bounds it with a
//! timeout, times it, cleans the output, and folds any failure into a
//! [`GenerationOutcome::Failed`] instead of returning an error.
//!
//! No retries: a failed call is reported once and the caller moves on.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::{Instrument, error, info, info_span};

use chatrelay_types::llm::{CompletionRequest, GenerationOutcome, LlmError, Message};

use crate::chat::clean::clean;

use super::box_provider::BoxLlmProvider;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.5;

/// Default upper bound on one provider call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Output format requested from the provider.
const RESPONSE_MIME_TYPE: &str = "text/plain";

/// Point-in-time copy of the gateway counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenerationStats {
    pub successes: u64,
    pub failures: u64,
    pub last_latency_ms: Option<u64>,
}

#[derive(Debug, Default)]
struct Counters {
    successes: AtomicU64,
    failures: AtomicU64,
    /// `u64::MAX` until the first call finishes.
    last_latency_ms: AtomicU64,
}

impl Counters {
    fn new() -> Self {
        Self {
            last_latency_ms: AtomicU64::new(u64::MAX),
            ..Self::default()
        }
    }

    fn record(&self, success: bool, latency_ms: u64) {
        let counter = if success { &self.successes } else { &self.failures };
        counter.fetch_add(1, Ordering::Relaxed);
        self.last_latency_ms.store(latency_ms, Ordering::Relaxed);
    }

    fn snapshot(&self) -> GenerationStats {
        let last = self.last_latency_ms.load(Ordering::Relaxed);
        GenerationStats {
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            last_latency_ms: (last != u64::MAX).then_some(last),
        }
    }
}

/// Single-turn text generation against one provider.
pub struct GenerationGateway {
    provider: BoxLlmProvider,
    model: String,
    system_instruction: Arc<str>,
    temperature: f64,
    timeout: Duration,
    counters: Counters,
}

impl GenerationGateway {
    /// Create a gateway with the default temperature and timeout.
    ///
    /// `system_instruction` is fixed for the life of the gateway.
    pub fn new(
        provider: BoxLlmProvider,
        model: impl Into<String>,
        system_instruction: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            system_instruction: system_instruction.into(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_TIMEOUT,
            counters: Counters::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Success/failure counts and last observed latency.
    pub fn stats(&self) -> GenerationStats {
        self.counters.snapshot()
    }

    /// Build the single-turn request for `user_input`.
    pub fn build_request(&self, user_input: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages: vec![Message::user(user_input)],
            system: Some(self.system_instruction.to_string()),
            temperature: Some(self.temperature),
            max_tokens: None,
            response_mime_type: Some(RESPONSE_MIME_TYPE.to_string()),
        }
    }

    /// Generate a cleaned reply for `user_input`.
    ///
    /// Never fails: provider errors and timeouts come back as
    /// [`GenerationOutcome::Failed`] carrying the error description.
    pub async fn generate(&self, user_input: &str) -> GenerationOutcome {
        let request = self.build_request(user_input);

        let span = info_span!(
            "gen_ai.generate",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.temperature = ?request.temperature,
        );

        async {
            info!("Sending generation request");
            let start = Instant::now();

            let result = tokio::time::timeout(self.timeout, self.provider.complete(&request))
                .await
                .unwrap_or_else(|_| Err(LlmError::Timeout(self.timeout.as_secs())));

            let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            match result {
                Ok(response) => {
                    self.counters.record(true, latency_ms);
                    info!(
                        latency_ms,
                        gen_ai.usage.input_tokens = response.usage.input_tokens,
                        gen_ai.usage.output_tokens = response.usage.output_tokens,
                        "Generation completed"
                    );
                    GenerationOutcome::Completed(clean(Some(&response.content)))
                }
                Err(e) => {
                    self.counters.record(false, latency_ms);
                    error!(latency_ms, error = %e, "Generation failed");
                    GenerationOutcome::Failed(e.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }
}

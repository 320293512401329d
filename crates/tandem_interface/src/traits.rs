//! Trait definitions for provider streams and result persistence.

use async_trait::async_trait;
use futures_util::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::time::Instant;
use tandem_core::{
    BranchMetrics, ComparisonRun, NewProviderResult, Pricing, Provider, ProviderResult, RunId,
    RunOnceReport, RunWithResults, elapsed_ms, estimate_tokens,
};
use tandem_error::TandemResult;

/// A lazy sequence of non-empty text increments.
///
/// The stream ending is a successful completion; an `Err` item is a failure
/// and is the last item the consumer should act on. Dropping the stream
/// cancels it and releases the underlying transport.
pub type TextStream = Pin<Box<dyn Stream<Item = TandemResult<String>> + Send>>;

/// Uniform producer contract over one upstream token-generation service.
///
/// Every call to [`stream`](ProviderStream::stream) yields a fresh,
/// independent sequence; sequences are never restarted.
#[async_trait]
pub trait ProviderStream: Send + Sync {
    /// Fixed provider tag.
    fn provider(&self) -> Provider;

    /// Fixed model identifier (e.g., "gpt-4o-mini").
    fn model_name(&self) -> &str;

    /// Flat price used by [`estimate_cost_usd`](ProviderStream::estimate_cost_usd).
    fn pricing(&self) -> Pricing;

    /// Deterministic token estimate, monotonic in text length.
    fn count_tokens(&self, text: &str) -> u64 {
        estimate_tokens(text)
    }

    /// Deterministic cost estimate, linear in `tokens`.
    fn estimate_cost_usd(&self, tokens: u64) -> f64 {
        self.pricing().cost_for(tokens)
    }

    /// Open a new increment stream for `prompt`.
    ///
    /// An error here (e.g., the upstream rejected the request before sending
    /// anything) is a failure termination just like an `Err` item.
    async fn stream(&self, prompt: &str) -> TandemResult<TextStream>;

    /// Collect one stream to completion and compute its metrics.
    ///
    /// Dry-run helper for exercising a provider without the relay.
    async fn run_once(&self, prompt: &str) -> TandemResult<RunOnceReport> {
        let started = Instant::now();
        let mut stream = self.stream(prompt).await?;
        let mut text = String::new();
        while let Some(increment) = stream.next().await {
            text.push_str(&increment?);
        }
        let response_time_ms = elapsed_ms(started.elapsed());
        let token_count = self.count_tokens(&text);
        let cost_usd = self.estimate_cost_usd(token_count);
        Ok(RunOnceReport {
            text,
            metrics: BranchMetrics {
                response_time_ms,
                token_count,
                cost_usd,
            },
        })
    }
}

/// Durable record of comparison runs and their per-provider results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Create a run for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store cannot write the record.
    async fn create_run(&self, prompt: &str, user_id: Option<&str>)
    -> TandemResult<ComparisonRun>;

    /// Persist one provider result.
    ///
    /// # Errors
    ///
    /// Returns a not-found storage error if `result.run_id` is unknown, or a
    /// storage error if the write fails.
    async fn save_result(&self, result: NewProviderResult) -> TandemResult<ProviderResult>;

    /// Load a run with all of its results, or `None` if it does not exist.
    async fn find_run_with_results(&self, id: RunId) -> TandemResult<Option<RunWithResults>>;
}

//! Deterministic word-by-word stream for offline development and tests.

use crate::defaults;
use async_trait::async_trait;
use std::time::Duration;
use tandem_core::{Pricing, Provider, elapsed_ms};
use tandem_error::{TandemError, TandemResult};
use tandem_interface::{ProviderStream, TextStream};
use tokio::time::{MissedTickBehavior, interval};

const PROMPT_PLACEHOLDER: &str = "{prompt}";

/// Provider stream that drips a canned response one word per tick.
///
/// The response is `template` with `{prompt}` substituted, split on single
/// spaces; each increment is one word followed by a space.
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct DripStream {
    provider: Provider,
    model: String,
    template: String,
    cadence: Duration,
    pricing: Pricing,
}

impl DripStream {
    /// Create a drip stream with explicit settings.
    pub fn new(
        provider: Provider,
        model: impl Into<String>,
        template: impl Into<String>,
        cadence: Duration,
        pricing: Pricing,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            template: template.into(),
            cadence,
            pricing,
        }
    }

    /// OpenAI stand-in, one word every 55ms.
    pub fn openai() -> Self {
        Self::new(
            Provider::OpenAI,
            defaults::OPENAI_MODEL,
            "OpenAI response to: {prompt}. This is a mocked stream for development to test SSE and UI.",
            Duration::from_millis(55),
            Pricing::OPENAI,
        )
    }

    /// Gemini stand-in, one word every 70ms.
    pub fn gemini() -> Self {
        Self::new(
            Provider::Google,
            defaults::GEMINI_MODEL,
            "Gemini response to: {prompt}. This simulates real-time chunked output for development.",
            Duration::from_millis(70),
            Pricing::GEMINI,
        )
    }

    /// Replace the tick interval.
    pub fn with_cadence(mut self, cadence: Duration) -> Self {
        self.cadence = cadence;
        self
    }

    /// Replace the response template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Replace the pricing.
    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }

    /// Replace the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// The increments this stream emits for `prompt`, in order.
    pub fn words_for(&self, prompt: &str) -> Vec<String> {
        self.template
            .replace(PROMPT_PLACEHOLDER, prompt)
            .split(' ')
            .filter(|word| !word.is_empty())
            .map(|word| format!("{} ", word))
            .collect()
    }
}

#[async_trait]
impl ProviderStream for DripStream {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn pricing(&self) -> Pricing {
        self.pricing
    }

    async fn stream(&self, prompt: &str) -> TandemResult<TextStream> {
        let words = self.words_for(prompt);
        let cadence = self.cadence.max(Duration::from_millis(1));
        tracing::debug!(
            provider = %self.provider,
            words = words.len(),
            cadence_ms = elapsed_ms(cadence),
            "Starting drip stream"
        );

        let increments = async_stream::stream! {
            let mut ticker = interval(cadence);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;
            for word in words {
                ticker.tick().await;
                yield Ok::<_, TandemError>(word);
            }
        };

        Ok(Box::pin(increments))
    }
}

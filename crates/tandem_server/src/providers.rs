//! Provider construction from configuration.

use crate::{ProviderMode, ProviderSettings, ProvidersSettings};
use std::sync::Arc;
use std::time::Duration;
use tandem_core::Pricing;
use tandem_error::{ConfigError, TandemResult};
use tandem_interface::ProviderStream;
use tandem_models::{
    DripStream, GeminiClient, GeminiConfigBuilder, OpenAIClient, OpenAIConfigBuilder,
};

/// The OpenAI and Gemini branches, in that order.
pub type ProviderPair = (Arc<dyn ProviderStream>, Arc<dyn ProviderStream>);

/// Build both providers for the configured mode.
///
/// # Errors
///
/// Returns a configuration error if a live client cannot be built.
pub fn build_providers(settings: &ProvidersSettings) -> TandemResult<ProviderPair> {
    let pair: ProviderPair = match settings.mode {
        ProviderMode::Drip => (
            Arc::new(drip(DripStream::openai(), &settings.openai)),
            Arc::new(drip(DripStream::gemini(), &settings.gemini)),
        ),
        ProviderMode::Live => (
            Arc::new(live_openai(&settings.openai)?),
            Arc::new(live_gemini(&settings.gemini)?),
        ),
    };
    tracing::info!(
        mode = ?settings.mode,
        openai = pair.0.model_name(),
        gemini = pair.1.model_name(),
        "Providers ready"
    );
    Ok(pair)
}

fn drip(mut stream: DripStream, settings: &ProviderSettings) -> DripStream {
    if let Some(model) = &settings.model {
        stream = stream.with_model(model.clone());
    }
    if let Some(ms) = settings.drip_cadence_ms {
        stream = stream.with_cadence(Duration::from_millis(ms));
    }
    if let Some(price) = settings.price_per_1k {
        stream = stream.with_pricing(Pricing::per_1k(price));
    }
    stream
}

fn live_openai(settings: &ProviderSettings) -> TandemResult<OpenAIClient> {
    let mut builder = OpenAIConfigBuilder::default();
    builder.api_key(settings.api_key.clone().unwrap_or_default());
    if let Some(model) = &settings.model {
        builder.model(model.clone());
    }
    if let Some(base_url) = &settings.base_url {
        builder.base_url(base_url.trim_end_matches('/').to_string());
    }
    if let Some(price) = settings.price_per_1k {
        builder.pricing(Pricing::per_1k(price));
    }
    let config = builder
        .build()
        .map_err(|e| ConfigError::new(format!("Invalid OpenAI settings: {}", e)))?;
    OpenAIClient::new(config)
}

fn live_gemini(settings: &ProviderSettings) -> TandemResult<GeminiClient> {
    let mut builder = GeminiConfigBuilder::default();
    builder.api_key(settings.api_key.clone().unwrap_or_default());
    if let Some(model) = &settings.model {
        builder.model(model.clone());
    }
    if let Some(base_url) = &settings.base_url {
        builder.base_url(base_url.trim_end_matches('/').to_string());
    }
    if let Some(price) = settings.price_per_1k {
        builder.pricing(Pricing::per_1k(price));
    }
    let config = builder
        .build()
        .map_err(|e| ConfigError::new(format!("Invalid Gemini settings: {}", e)))?;
    GeminiClient::new(config)
}

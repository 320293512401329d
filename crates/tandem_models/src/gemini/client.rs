use super::{DEFAULT_BASE_URL, DEFAULT_MODEL, GenerateContentRequest, GenerateContentResponse};
use crate::{sse, upstream};
use async_trait::async_trait;
use futures_util::{StreamExt, future};
use tandem_core::{Pricing, Provider};
use tandem_error::{ProviderError, ProviderErrorKind, TandemError, TandemResult};
use tandem_interface::{ProviderStream, TextStream};
use tracing::instrument;

/// Connection settings for the Gemini API.
#[derive(Debug, Clone, PartialEq, derive_builder::Builder, derive_getters::Getters)]
#[builder(setter(into))]
pub struct GeminiConfig {
    /// API key, sent in the `x-goog-api-key` header
    api_key: String,
    /// API base URL, without trailing slash
    #[builder(default = DEFAULT_BASE_URL.to_string())]
    base_url: String,
    /// Model identifier
    #[builder(default = DEFAULT_MODEL.to_string())]
    model: String,
    /// Flat pricing used for cost estimates
    #[builder(default = Pricing::GEMINI)]
    pricing: Pricing,
}

/// Gemini provider stream.
///
/// The key travels in a header rather than the query string so that it never
/// shows up in error messages that echo the request URL.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderErrorKind::MissingApiKey`] if the API key is blank.
    #[instrument(skip(config), fields(base_url = %config.base_url, model = %config.model))]
    pub fn new(config: GeminiConfig) -> TandemResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(
                ProviderError::new(ProviderErrorKind::MissingApiKey("GEMINI_API_KEY".into()))
                    .into(),
            );
        }
        tracing::debug!("Creating Gemini client");
        Ok(Self {
            config,
            client: reqwest::Client::new(),
        })
    }

    /// Create a client with default settings, reading `GEMINI_API_KEY`.
    pub fn from_env() -> TandemResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            ProviderError::new(ProviderErrorKind::MissingApiKey("GEMINI_API_KEY".into()))
        })?;
        let config = GeminiConfigBuilder::default()
            .api_key(api_key)
            .build()
            .map_err(|e| {
                ProviderError::new(ProviderErrorKind::Request(format!(
                    "Invalid Gemini configuration: {}",
                    e
                )))
            })?;
        Self::new(config)
    }

    /// Get the client configuration
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

fn parse_frame(data: &str) -> Result<Option<String>, ProviderError> {
    match serde_json::from_str::<GenerateContentResponse>(data) {
        Ok(response) if !response.candidates.is_empty() => Ok(response.text()),
        parsed => {
            let (code, message) = upstream::parse_error_body(data);
            match (message, parsed) {
                (Some(message), _) => Err(ProviderError::new(ProviderErrorKind::Stream(
                    match code {
                        Some(code) => format!("{} ({})", message, code),
                        None => message,
                    },
                ))),
                // Frames with only usage or feedback metadata
                (None, Ok(_)) => Ok(None),
                (None, Err(e)) => Err(ProviderError::new(ProviderErrorKind::Deserialization(
                    format!("Failed to parse frame: {}", e),
                ))),
            }
        }
    }
}

#[async_trait]
impl ProviderStream for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn pricing(&self) -> Pricing {
        self.config.pricing
    }

    #[instrument(skip(self, prompt), fields(model = %self.config.model))]
    async fn stream(&self, prompt: &str) -> TandemResult<TextStream> {
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.config.base_url, self.config.model
        );
        tracing::debug!(model = %self.config.model, "Sending streamGenerateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(upstream::request_error)?;

        if !response.status().is_success() {
            let err = upstream::error_from_response(response).await;
            tracing::error!(error = %err, "Gemini rejected streaming request");
            return Err(err.into());
        }

        let increments = sse::data_frames(response).filter_map(|frame| {
            future::ready(match frame.and_then(|data| parse_frame(&data)) {
                Ok(Some(text)) => Some(Ok(text)),
                Ok(None) => None,
                Err(e) => Some(Err(TandemError::from(e))),
            })
        });

        Ok(Box::pin(increments))
    }
}

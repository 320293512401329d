use super::{ChatCompletionChunk, ChatCompletionRequest, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::{sse, upstream};
use async_trait::async_trait;
use futures_util::{StreamExt, future};
use tandem_core::{Pricing, Provider};
use tandem_error::{ProviderError, ProviderErrorKind, TandemError, TandemResult};
use tandem_interface::{ProviderStream, TextStream};
use tracing::instrument;

/// Connection settings for the OpenAI chat completions API.
#[derive(Debug, Clone, PartialEq, derive_builder::Builder, derive_getters::Getters)]
#[builder(setter(into))]
pub struct OpenAIConfig {
    /// Bearer token
    api_key: String,
    /// API base URL, without trailing slash
    #[builder(default = DEFAULT_BASE_URL.to_string())]
    base_url: String,
    /// Model identifier
    #[builder(default = DEFAULT_MODEL.to_string())]
    model: String,
    /// Flat pricing used for cost estimates
    #[builder(default = Pricing::OPENAI)]
    pricing: Pricing,
}

/// OpenAI provider stream.
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    config: OpenAIConfig,
    client: reqwest::Client,
}

impl OpenAIClient {
    /// Create a client from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderErrorKind::MissingApiKey`] if the API key is blank.
    #[instrument(skip(config), fields(base_url = %config.base_url, model = %config.model))]
    pub fn new(config: OpenAIConfig) -> TandemResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(
                ProviderError::new(ProviderErrorKind::MissingApiKey("OPENAI_API_KEY".into()))
                    .into(),
            );
        }
        tracing::debug!("Creating OpenAI client");
        Ok(Self {
            config,
            client: reqwest::Client::new(),
        })
    }

    /// Create a client with default settings, reading `OPENAI_API_KEY`.
    pub fn from_env() -> TandemResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            ProviderError::new(ProviderErrorKind::MissingApiKey("OPENAI_API_KEY".into()))
        })?;
        let config = OpenAIConfigBuilder::default()
            .api_key(api_key)
            .build()
            .map_err(|e| {
                ProviderError::new(ProviderErrorKind::Request(format!(
                    "Invalid OpenAI configuration: {}",
                    e
                )))
            })?;
        Self::new(config)
    }

    /// Get the client configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

/// Decode one SSE payload into an increment.
///
/// `Ok(None)` means the frame carried no text (role-only or finish frames).
/// An in-band `{"error":{..}}` frame fails the stream.
fn parse_frame(data: &str) -> Result<Option<String>, ProviderError> {
    if let (code, Some(message)) = upstream::parse_error_body(data) {
        return Err(ProviderError::new(ProviderErrorKind::Stream(match code {
            Some(code) => format!("{} ({})", message, code),
            None => message,
        })));
    }

    serde_json::from_str::<ChatCompletionChunk>(data)
        .map(|chunk| chunk.text().map(str::to_string))
        .map_err(|e| {
            ProviderError::new(ProviderErrorKind::Deserialization(format!(
                "Failed to parse chunk: {}",
                e
            )))
        })
}

#[async_trait]
impl ProviderStream for OpenAIClient {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn pricing(&self) -> Pricing {
        self.config.pricing
    }

    #[instrument(skip(self, prompt), fields(model = %self.config.model))]
    async fn stream(&self, prompt: &str) -> TandemResult<TextStream> {
        let url = format!("{}/chat/completions", self.config.base_url);
        tracing::debug!("Sending streaming chat completion request to {}", url);

        let request = ChatCompletionRequest::streaming(&self.config.model, prompt);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(upstream::request_error)?;

        if !response.status().is_success() {
            let err = upstream::error_from_response(response).await;
            tracing::error!(error = %err, "OpenAI rejected streaming request");
            return Err(err.into());
        }

        tracing::debug!("Streaming request accepted, decoding SSE stream");
        let increments = sse::data_frames(response)
            .take_while(|frame| future::ready(!matches!(frame, Ok(data) if data == "[DONE]")))
            .filter_map(|frame| {
                future::ready(match frame.and_then(|data| parse_frame(&data)) {
                    Ok(Some(text)) => Some(Ok(text)),
                    Ok(None) => None,
                    Err(e) => Some(Err(TandemError::from(e))),
                })
            });

        Ok(Box::pin(increments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_frame() {
        let data = r#"{"id":"c1","object":"chat.completion.chunk","created":1,"model":"gpt-4o-mini","choices":[{"index":0,"delta":{"content":"Hel"},"finish_reason":null}]}"#;
        assert_eq!(parse_frame(data).expect("valid"), Some("Hel".to_string()));
    }

    #[test]
    fn test_parse_role_only_frame() {
        let data = r#"{"id":"c1","model":"gpt-4o-mini","choices":[{"index":0,"delta":{"role":"assistant","content":""}}]}"#;
        assert_eq!(parse_frame(data).expect("valid"), None);
    }

    #[test]
    fn test_parse_error_frame() {
        let data = r#"{"error":{"message":"The server had an error","code":"server_error"}}"#;
        let err = parse_frame(data).expect_err("error frame");
        assert!(matches!(err.kind, ProviderErrorKind::Stream(ref m) if m.contains("server_error")));
    }

    #[test]
    fn test_error_frame_without_code() {
        let data = r#"{"error":{"message":"overloaded"}}"#;
        let err = parse_frame(data).expect_err("error frame");
        assert!(matches!(err.kind, ProviderErrorKind::Stream(ref m) if m == "overloaded"));
    }

    #[test]
    fn test_parse_garbage_frame() {
        let err = parse_frame("not json").expect_err("garbage");
        assert!(matches!(err.kind, ProviderErrorKind::Deserialization(_)));
    }

    #[test]
    fn test_blank_key_rejected() {
        let config = OpenAIConfigBuilder::default()
            .api_key("  ")
            .build()
            .expect("config builds");
        assert!(OpenAIClient::new(config).is_err());
    }
}

//! Gemini client tests against a mock `streamGenerateContent` endpoint.

use futures_util::StreamExt;
use tandem_core::Provider;
use tandem_interface::ProviderStream;
use tandem_models::{GeminiClient, GeminiConfigBuilder};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> anyhow::Result<GeminiClient> {
    let config = GeminiConfigBuilder::default()
        .api_key("gem-key")
        .base_url(server.uri())
        .build()?;
    Ok(GeminiClient::new(config)?)
}

fn frame(text: &str) -> String {
    format!(
        "data: {}\r\n\r\n",
        serde_json::json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
        })
    )
}

#[tokio::test]
async fn test_streams_candidate_text() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let body = format!(
        "{}{}data: {}\r\n\r\n",
        frame("Pong"),
        frame(" back"),
        serde_json::json!({
            "candidates": [{"finishReason": "STOP"}],
            "usageMetadata": {"totalTokenCount": 4}
        })
    );

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:streamGenerateContent"))
        .and(query_param("alt", "sse"))
        .and(header("x-goog-api-key", "gem-key"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server)?;
    assert_eq!(client.provider(), Provider::Google);
    assert_eq!(client.model_name(), "gemini-2.5-flash");

    let mut stream = client.stream("ping").await?;
    let mut increments = Vec::new();
    while let Some(item) = stream.next().await {
        increments.push(item?);
    }

    assert_eq!(increments, vec!["Pong", " back"]);
    Ok(())
}

#[tokio::test]
async fn test_rate_limit_is_http_error() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": {
                "code": 429,
                "message": "Resource has been exhausted (e.g. check quota).",
                "status": "RESOURCE_EXHAUSTED"
            }
        })))
        .mount(&server)
        .await;

    let Err(err) = client_for(&server)?.stream("ping").await else {
        anyhow::bail!("expected 429 to fail the stream");
    };
    let provider_err = err
        .as_provider()
        .ok_or_else(|| anyhow::anyhow!("expected provider error, got {}", err))?;
    assert_eq!(provider_err.kind.status_code(), Some(429));
    assert_eq!(provider_err.kind.code(), Some("RESOURCE_EXHAUSTED"));
    Ok(())
}

#[test]
fn test_blank_key_rejected() -> anyhow::Result<()> {
    let config = GeminiConfigBuilder::default().api_key("").build()?;
    assert!(GeminiClient::new(config).is_err());
    Ok(())
}

//! Helpers shared by the HTTP-backed providers.

use serde_json::Value;
use tandem_error::{ProviderError, ProviderErrorKind};

/// Build a provider error from a non-success upstream response.
///
/// Both vendors wrap failures as `{"error": {"message": ..., "code": ...}}`;
/// OpenAI's `code` is a string, Gemini's is numeric with a `status` string.
pub(crate) async fn error_from_response(response: reqwest::Response) -> ProviderError {
    let status_code = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let (code, message) = parse_error_body(&body);

    ProviderError::new(ProviderErrorKind::Http {
        status_code,
        code,
        message: message.unwrap_or(body),
    })
}

/// Extract `(code, message)` from an upstream error body.
pub(crate) fn parse_error_body(body: &str) -> (Option<String>, Option<String>) {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return (None, None);
    };
    let error = &value["error"];

    let message = error["message"].as_str().map(str::to_string);
    let code = match &error["code"] {
        Value::String(code) => Some(code.clone()),
        Value::Number(code) => error["status"]
            .as_str()
            .map(str::to_string)
            .or_else(|| Some(code.to_string())),
        _ => error["status"].as_str().map(str::to_string),
    };

    (code, message)
}

/// Map a transport failure while sending a request.
pub(crate) fn request_error(err: reqwest::Error) -> ProviderError {
    ProviderError::new(ProviderErrorKind::Request(err.to_string()))
}

//! Mapping of provider failures to user-safe messages.

use regex::Regex;
use std::sync::LazyLock;
use tandem_core::Provider;
use tandem_error::{ProviderErrorKind, TandemError};

static URL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"https?://\S+").ok());

const MAX_USER_MESSAGE_CHARS: usize = 200;

/// A provider failure split into what the user sees and what the log keeps.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct NormalizedError {
    /// Upstream HTTP status, when there was one
    status: Option<u16>,
    /// Upstream error code, when there was one
    code: Option<String>,
    /// Short text safe to show in the UI, prefixed with the provider name
    user_message: String,
    /// Full diagnostic for server logs
    log_message: String,
    /// Coarse class used as a metrics label
    #[getter(skip)]
    class: &'static str,
}

impl NormalizedError {
    /// Coarse class used as a metrics label.
    pub fn class(&self) -> &'static str {
        self.class
    }
}

/// Normalize `err` raised by `provider`'s branch.
///
/// # Examples
///
/// ```
/// use tandem_core::Provider;
/// use tandem_error::{ProviderError, ProviderErrorKind, TandemError};
/// use tandem_relay::normalize_provider_error;
///
/// let err: TandemError = ProviderError::new(ProviderErrorKind::Http {
///     status_code: 429,
///     code: Some("rate_limit_exceeded".into()),
///     message: "slow down".into(),
/// })
/// .into();
/// let normalized = normalize_provider_error(&err, Provider::OpenAI);
/// assert_eq!(
///     normalized.user_message(),
///     "OpenAI: Rate limit or quota exceeded. Please try again later."
/// );
/// ```
pub fn normalize_provider_error(err: &TandemError, provider: Provider) -> NormalizedError {
    let name = provider.display_name();
    let kind = err.as_provider().map(|e| &e.kind);

    let status = kind.and_then(ProviderErrorKind::status_code);
    let code = kind.and_then(ProviderErrorKind::code).map(str::to_string);
    let raw = match kind {
        Some(ProviderErrorKind::Http { message, .. }) => message.clone(),
        Some(other) => other.to_string(),
        None => err.to_string(),
    };

    let detail = match status {
        Some(401) => "Invalid or missing API key. Check your key in the backend .env.".to_string(),
        Some(429) => "Rate limit or quota exceeded. Please try again later.".to_string(),
        Some(400) => "Bad request. Try simplifying or shortening the prompt.".to_string(),
        Some(s) if s >= 500 => "Service is temporarily unavailable. Please retry shortly.".to_string(),
        _ => {
            let cleaned = scrub(&raw);
            if cleaned.is_empty() {
                "Something went wrong. Please try again.".to_string()
            } else {
                cleaned
            }
        }
    };

    let log_message = format!(
        "{} error (status={} code={}): {}",
        name,
        status.map_or_else(|| "n/a".to_string(), |s| s.to_string()),
        code.as_deref().unwrap_or("n/a"),
        raw
    );

    NormalizedError {
        status,
        code,
        user_message: format!("{}: {}", name, detail),
        log_message,
        class: classify(kind, status),
    }
}

/// Strip URLs and cap the length.
fn scrub(raw: &str) -> String {
    let stripped = match URL_PATTERN.as_ref() {
        Some(pattern) => pattern.replace_all(raw, "").into_owned(),
        None => raw.to_string(),
    };
    stripped
        .trim()
        .chars()
        .take(MAX_USER_MESSAGE_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

fn classify(kind: Option<&ProviderErrorKind>, status: Option<u16>) -> &'static str {
    match (kind, status) {
        (_, Some(401 | 403)) | (Some(ProviderErrorKind::MissingApiKey(_)), _) => "auth",
        (_, Some(429)) => "rate_limit",
        (_, Some(400)) => "invalid_request",
        (_, Some(s)) if s >= 500 => "unavailable",
        (Some(ProviderErrorKind::Timeout(_)), _) => "timeout",
        (Some(ProviderErrorKind::Request(_) | ProviderErrorKind::Stream(_)), _) => "network",
        (Some(ProviderErrorKind::Deserialization(_)), _) => "decode",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_error::{HttpError, ProviderError};

    fn http(status_code: u16, code: Option<&str>, message: &str) -> TandemError {
        ProviderError::new(ProviderErrorKind::Http {
            status_code,
            code: code.map(str::to_string),
            message: message.to_string(),
        })
        .into()
    }

    #[test]
    fn test_status_classes() {
        let cases = [
            (401, "OpenAI: Invalid or missing API key. Check your key in the backend .env."),
            (429, "OpenAI: Rate limit or quota exceeded. Please try again later."),
            (400, "OpenAI: Bad request. Try simplifying or shortening the prompt."),
            (503, "OpenAI: Service is temporarily unavailable. Please retry shortly."),
        ];
        for (status, expected) in cases {
            let normalized = normalize_provider_error(&http(status, None, "raw"), Provider::OpenAI);
            assert_eq!(normalized.user_message(), expected);
            assert_eq!(*normalized.status(), Some(status));
        }
    }

    #[test]
    fn test_urls_stripped_from_fallback() {
        let err = http(
            404,
            Some("model_not_found"),
            "The model does not exist. See https://platform.openai.com/docs/models for details",
        );
        let normalized = normalize_provider_error(&err, Provider::Google);
        assert!(normalized.user_message().starts_with("Gemini: The model does not exist."));
        assert!(!normalized.user_message().contains("https://"));
        assert_eq!(
            normalized.log_message(),
            "Gemini error (status=404 code=model_not_found): The model does not exist. See https://platform.openai.com/docs/models for details"
        );
    }

    #[test]
    fn test_length_capped() {
        let err = http(418, None, &"x".repeat(500));
        let normalized = normalize_provider_error(&err, Provider::OpenAI);
        assert_eq!(normalized.user_message().chars().count(), "OpenAI: ".len() + 200);
    }

    #[test]
    fn test_empty_message_falls_back() {
        let err = http(404, None, "https://example.com/only-a-link");
        let normalized = normalize_provider_error(&err, Provider::OpenAI);
        assert_eq!(
            normalized.user_message(),
            "OpenAI: Something went wrong. Please try again."
        );
    }

    #[test]
    fn test_non_provider_error() {
        let err: TandemError = HttpError::new("socket closed").into();
        let normalized = normalize_provider_error(&err, Provider::Google);
        assert!(normalized.user_message().starts_with("Gemini: "));
        assert!(normalized.log_message().contains("status=n/a code=n/a"));
        assert_eq!(normalized.class(), "unknown");
    }

    #[test]
    fn test_timeout_class() {
        let err: TandemError =
            ProviderError::new(ProviderErrorKind::Timeout("no increment for 5s".into())).into();
        let normalized = normalize_provider_error(&err, Provider::OpenAI);
        assert_eq!(normalized.class(), "timeout");
        assert!(normalized.user_message().contains("no increment for 5s"));
    }
}

//! Upstream provider error types.

/// Upstream token-service error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ProviderErrorKind {
    /// API key not configured
    #[display("{} is not set", _0)]
    MissingApiKey(String),
    /// Upstream answered with a non-success status
    #[display("HTTP {} error: {}", status_code, message)]
    Http {
        /// HTTP status code
        status_code: u16,
        /// Upstream error code, when the body carried one
        code: Option<String>,
        /// Upstream error message
        message: String,
    },
    /// Request could not be sent
    #[display("Request failed: {}", _0)]
    Request(String),
    /// Stream broke after it started
    #[display("Stream error: {}", _0)]
    Stream(String),
    /// Upstream frame could not be decoded
    #[display("Failed to deserialize response: {}", _0)]
    Deserialization(String),
    /// No increment arrived within the idle timeout
    #[display("Stream timed out: {}", _0)]
    Timeout(String),
}

impl ProviderErrorKind {
    /// HTTP status reported by the upstream, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProviderErrorKind::Http { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Upstream error code, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            ProviderErrorKind::Http { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Raw upstream message without the kind prefix.
    pub fn raw_message(&self) -> &str {
        match self {
            ProviderErrorKind::MissingApiKey(m)
            | ProviderErrorKind::Request(m)
            | ProviderErrorKind::Stream(m)
            | ProviderErrorKind::Deserialization(m)
            | ProviderErrorKind::Timeout(m) => m,
            ProviderErrorKind::Http { message, .. } => message,
        }
    }
}

/// Provider error with source location tracking.
///
/// # Examples
///
/// ```
/// use tandem_error::{ProviderError, ProviderErrorKind};
///
/// let err = ProviderError::new(ProviderErrorKind::Http {
///     status_code: 429,
///     code: Some("rate_limit_exceeded".to_string()),
///     message: "Too many requests".to_string(),
/// });
/// assert_eq!(err.kind.status_code(), Some(429));
/// assert!(format!("{}", err).contains("HTTP 429"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error: {} at line {} in {}", kind, line, file)]
pub struct ProviderError {
    /// The kind of error that occurred
    pub kind: ProviderErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new ProviderError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

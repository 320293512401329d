//! Top-level error wrapper types.

use crate::{
    ConfigError, HttpError, ProviderError, RelayError, StorageError,
};

/// Every error condition the workspace can report.
///
/// # Examples
///
/// ```
/// use tandem_error::{TandemError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: TandemError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum TandemErrorKind {
    /// HTTP server error
    #[from(HttpError)]
    Http(HttpError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Upstream provider error
    #[from(ProviderError)]
    Provider(ProviderError),
    /// Result store error
    #[from(StorageError)]
    Storage(StorageError),
    /// Relay request error
    #[from(RelayError)]
    Relay(RelayError),
}

/// Tandem error with kind discrimination.
///
/// # Examples
///
/// ```
/// use tandem_error::{ConfigError, TandemResult};
///
/// fn might_fail() -> TandemResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Tandem Error: {}", _0)]
pub struct TandemError(Box<TandemErrorKind>);

impl TandemError {
    /// Create a new error from a kind.
    pub fn new(kind: TandemErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TandemErrorKind {
        &self.0
    }

    /// The provider error inside, if this is one.
    pub fn as_provider(&self) -> Option<&ProviderError> {
        match self.kind() {
            TandemErrorKind::Provider(e) => Some(e),
            _ => None,
        }
    }

    /// The relay error inside, if this is one.
    pub fn as_relay(&self) -> Option<&RelayError> {
        match self.kind() {
            TandemErrorKind::Relay(e) => Some(e),
            _ => None,
        }
    }

    /// The storage error inside, if this is one.
    pub fn as_storage(&self) -> Option<&StorageError> {
        match self.kind() {
            TandemErrorKind::Storage(e) => Some(e),
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to TandemErrorKind
impl<T> From<T> for TandemError
where
    T: Into<TandemErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Tandem operations.
pub type TandemResult<T> = std::result::Result<T, TandemError>;

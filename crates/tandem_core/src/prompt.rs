//! Validated prompt text.

use tandem_error::{RelayError, RelayErrorKind};

/// A prompt that is non-empty after trimming.
///
/// The original text is kept as submitted; trimming is only used to decide
/// whether the prompt is blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub struct Prompt(String);

impl Prompt {
    /// Validate a raw prompt.
    ///
    /// # Errors
    ///
    /// Returns [`RelayErrorKind::InvalidPrompt`] when the prompt is blank.
    ///
    /// # Examples
    ///
    /// ```
    /// use tandem_core::Prompt;
    ///
    /// assert!(Prompt::new("ping").is_ok());
    /// assert!(Prompt::new("   \n").is_err());
    /// ```
    #[track_caller]
    pub fn new(raw: impl Into<String>) -> Result<Self, RelayError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(RelayError::new(RelayErrorKind::InvalidPrompt));
        }
        Ok(Self(raw))
    }

    /// Prompt text as submitted.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Prompt {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

//! Provider identity.

use serde::{Deserialize, Serialize};

/// The two upstream vendors compared by every run.
///
/// The persisted tag is `openai` / `google`; events sent to the browser use
/// [`ModelId`] instead, which spells the second provider `gemini`.
///
/// # Examples
///
/// ```
/// use tandem_core::{ModelId, Provider};
///
/// assert_eq!(Provider::Google.tag(), "google");
/// assert_eq!(ModelId::from(Provider::Google).as_str(), "gemini");
/// assert_eq!(Provider::from_tag("openai"), Some(Provider::OpenAI));
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI chat completions
    #[display("openai")]
    OpenAI,
    /// Google Gemini
    #[display("google")]
    Google,
}

impl Provider {
    /// Both providers, in branch order.
    pub const ALL: [Provider; 2] = [Provider::OpenAI, Provider::Google];

    /// Tag stored with persisted results.
    pub fn tag(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Google => "google",
        }
    }

    /// Parse a persisted tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "openai" => Some(Provider::OpenAI),
            "google" => Some(Provider::Google),
            _ => None,
        }
    }

    /// Human-facing vendor name used in user messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OpenAI",
            Provider::Google => "Gemini",
        }
    }

    /// Branch slot of this provider within a run.
    pub fn index(&self) -> usize {
        match self {
            Provider::OpenAI => 0,
            Provider::Google => 1,
        }
    }
}

/// Provider identifier as it appears on the wire (`modelId`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum ModelId {
    /// OpenAI branch
    #[display("openai")]
    OpenAI,
    /// Gemini branch
    #[display("gemini")]
    Gemini,
}

impl ModelId {
    /// Wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::OpenAI => "openai",
            ModelId::Gemini => "gemini",
        }
    }
}

impl From<Provider> for ModelId {
    fn from(provider: Provider) -> Self {
        match provider {
            Provider::OpenAI => ModelId::OpenAI,
            Provider::Google => ModelId::Gemini,
        }
    }
}

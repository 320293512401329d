//! Google Gemini `streamGenerateContent` streamed over SSE.

mod client;
mod protocol;

pub use client::{GeminiClient, GeminiConfig, GeminiConfigBuilder};
pub use protocol::{Candidate, Content, GenerateContentRequest, GenerateContentResponse, Part};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

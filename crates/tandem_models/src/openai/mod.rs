//! OpenAI chat completions streamed over SSE.

mod client;
mod request;
mod response;

pub use client::{OpenAIClient, OpenAIConfig, OpenAIConfigBuilder};
pub use request::{ChatCompletionRequest, Message};
pub use response::{ChatCompletionChunk, ChunkChoice, Delta};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

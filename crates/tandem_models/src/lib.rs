//! Provider stream implementations for Tandem.
//!
//! Every type here implements [`tandem_interface::ProviderStream`]:
//!
//! - [`OpenAIClient`] - OpenAI chat completions, streamed over SSE
//! - [`GeminiClient`] - Gemini `streamGenerateContent`, streamed over SSE
//! - [`DripStream`] - deterministic word-by-word stream for offline use and tests
//!
//! # Example
//!
//! ```no_run
//! use tandem_interface::ProviderStream;
//! use tandem_models::DripStream;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let openai = DripStream::openai();
//! let report = openai.run_once("hello world").await?;
//! println!("{} tokens in {}ms", report.metrics.token_count, report.metrics.response_time_ms);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod drip;
mod gemini;
mod openai;
mod sse;
mod upstream;

pub use drip::DripStream;
pub use gemini::{
    Candidate, Content, GeminiClient, GeminiConfig, GeminiConfigBuilder, GenerateContentRequest,
    GenerateContentResponse, Part,
};
pub use openai::{
    ChatCompletionChunk, ChatCompletionRequest, ChunkChoice, Delta, Message, OpenAIClient,
    OpenAIConfig, OpenAIConfigBuilder,
};
pub use sse::SseDecoder;

/// Default model names, used when configuration leaves them unset.
pub mod defaults {
    pub use crate::gemini::{DEFAULT_BASE_URL as GEMINI_BASE_URL, DEFAULT_MODEL as GEMINI_MODEL};
    pub use crate::openai::{DEFAULT_BASE_URL as OPENAI_BASE_URL, DEFAULT_MODEL as OPENAI_MODEL};
}

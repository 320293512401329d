//! Error types for the Tandem comparison relay.
//!
//! This crate provides the foundation error types used throughout the Tandem workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use tandem_error::{HttpError, TandemResult};
//!
//! fn fetch_data() -> TandemResult<String> {
//!     Err(HttpError::new("Connection refused"))?
//! }
//!
//! match fetch_data() {
//!     Ok(data) => println!("Got: {}", data),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod http;
mod provider;
mod relay;
mod storage;

pub use config::ConfigError;
pub use error::{TandemError, TandemErrorKind, TandemResult};
pub use http::HttpError;
pub use provider::{ProviderError, ProviderErrorKind};
pub use relay::{RelayError, RelayErrorKind};
pub use storage::{StorageError, StorageErrorKind};

//! HTTP surface for the Tandem comparison relay.
//!
//! Exposes [`StreamRelay`](tandem_relay::StreamRelay) runs as server-sent
//! events, plus session lookup and health endpoints:
//!
//! - `GET /api/compare/stream?prompt=...`
//! - `POST /api/sessions`
//! - `GET /api/sessions/{id}`
//! - `GET /health`

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod observability;
mod providers;
mod routes;
mod server;

pub use config::{
    AppConfig, DatabaseSettings, LoggingSettings, ProviderMode, ProviderSettings,
    ProvidersSettings, RelaySettings, ServerSettings,
};
pub use error::ApiError;
pub use observability::init_observability;
pub use providers::{ProviderPair, build_providers};
pub use routes::{AppState, create_app, create_router};
pub use server::{DryRunReport, build_state, dry_run, serve};

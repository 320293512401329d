//! Wiring configuration into a running server, and the dry-run helper.

use crate::{AppConfig, AppState, build_providers, create_app};
use futures_util::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tandem_core::{Provider, RunOnceReport};
use tandem_database::PostgresResultStore;
use tandem_error::{HttpError, TandemResult};
use tandem_interface::{ProviderStream, ResultStore};
use tandem_relay::{InMemoryResultStore, RelayConfigBuilder, StreamRelay};
use tokio::net::TcpListener;

/// Build handler state: result store, providers and relay.
///
/// Runs are kept in memory when `in_memory` is set or no database URL is
/// configured.
pub async fn build_state(config: &AppConfig, in_memory: bool) -> TandemResult<AppState> {
    let store: Arc<dyn ResultStore> = match (&config.database.url, in_memory) {
        (Some(url), false) => {
            Arc::new(PostgresResultStore::connect(url, config.database.max_connections).await?)
        }
        (None, false) => {
            tracing::warn!("No database URL configured, keeping runs in memory");
            Arc::new(InMemoryResultStore::new())
        }
        (_, true) => {
            tracing::info!("Keeping runs in memory");
            Arc::new(InMemoryResultStore::new())
        }
    };

    let (openai, gemini) = build_providers(&config.providers)?;
    let relay_config = RelayConfigBuilder::default()
        .channel_capacity(config.relay.channel_capacity)
        .branch_idle_timeout(config.relay.branch_idle_timeout())
        .build()
        .map_err(|e| tandem_error::ConfigError::new(format!("Invalid relay settings: {}", e)))?;

    Ok(AppState::new(StreamRelay::new(
        store,
        openai,
        gemini,
        relay_config,
    )))
}

/// Serve the HTTP API until Ctrl-C.
pub async fn serve(config: AppConfig, in_memory: bool) -> TandemResult<()> {
    let state = build_state(&config, in_memory).await?;
    let app = create_app(state, &config.server)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| HttpError::new(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!(
        %addr,
        cors_origin = %config.server.cors_origin,
        "Tandem relay listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| HttpError::new(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// What one provider produced during a dry run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunReport {
    /// Which provider ran
    pub provider: Provider,
    /// Model identifier
    pub model: String,
    /// Leading increments, trimmed
    pub first_chunks: Vec<String>,
    /// Full text and metrics of a separate complete run
    pub run: RunOnceReport,
}

/// Exercise each provider without the relay or a store.
///
/// For each provider, capture its first `chunk_limit` increments, then collect
/// a fresh stream to completion with [`ProviderStream::run_once`].
pub async fn dry_run(
    providers: &[Arc<dyn ProviderStream>],
    prompt: &str,
    chunk_limit: usize,
) -> TandemResult<Vec<DryRunReport>> {
    let mut reports = Vec::with_capacity(providers.len());
    for provider in providers {
        let mut stream = provider.stream(prompt).await?;
        let mut first_chunks = Vec::new();
        while first_chunks.len() < chunk_limit {
            match stream.next().await {
                Some(increment) => first_chunks.push(increment?.trim().to_string()),
                None => break,
            }
        }
        drop(stream);

        let run = provider.run_once(prompt).await?;
        reports.push(DryRunReport {
            provider: provider.provider(),
            model: provider.model_name().to_string(),
            first_chunks,
            run,
        });
    }
    Ok(reports)
}

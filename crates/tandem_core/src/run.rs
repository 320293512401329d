//! Comparison runs and their per-provider results.

use crate::Provider;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a comparison run.
pub type RunId = Uuid;

/// One prompt submission. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRun {
    /// Server-generated identifier
    pub id: RunId,
    /// Prompt as submitted
    pub prompt: String,
    /// Optional submitting user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Values for a provider result about to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProviderResult {
    /// Parent run
    pub run_id: RunId,
    /// Which vendor answered
    pub provider: Provider,
    /// Model identifier used
    pub model_name: String,
    /// Full accumulated response text
    pub response_text: String,
    /// Token estimate of `response_text`
    pub token_count: u64,
    /// Estimated cost in USD
    #[serde(rename = "costUSD")]
    pub cost_usd: f64,
    /// Elapsed wall-clock milliseconds
    pub response_time_ms: u64,
}

/// A persisted provider result. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResult {
    /// Result identifier
    pub id: Uuid,
    /// Parent run
    pub run_id: RunId,
    /// Which vendor answered
    pub provider: Provider,
    /// Model identifier used
    pub model_name: String,
    /// Full accumulated response text
    pub response_text: String,
    /// Token estimate of `response_text`
    pub token_count: u64,
    /// Estimated cost in USD
    #[serde(rename = "costUSD")]
    pub cost_usd: f64,
    /// Elapsed wall-clock milliseconds
    pub response_time_ms: u64,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl ProviderResult {
    /// Materialize a new result with a fresh id.
    pub fn from_new(new: NewProviderResult, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id: new.run_id,
            provider: new.provider,
            model_name: new.model_name,
            response_text: new.response_text,
            token_count: new.token_count,
            cost_usd: new.cost_usd,
            response_time_ms: new.response_time_ms,
            created_at,
        }
    }
}

/// A run together with every result recorded for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunWithResults {
    /// The run
    #[serde(flatten)]
    pub run: ComparisonRun,
    /// Its results, oldest first
    pub results: Vec<ProviderResult>,
}

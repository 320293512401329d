//! Row types and conversions to the core records.

use crate::schema::{comparison_runs, provider_results};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tandem_core::{ComparisonRun, NewProviderResult, Provider, ProviderResult};
use tandem_error::{StorageError, StorageErrorKind};
use uuid::Uuid;

/// Database row for `comparison_runs`.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = comparison_runs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ComparisonRunRow {
    /// Run identifier
    pub id: Uuid,
    /// Prompt as submitted
    pub prompt: String,
    /// Optional submitting user
    pub user_id: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl From<ComparisonRunRow> for ComparisonRun {
    fn from(row: ComparisonRunRow) -> Self {
        Self {
            id: row.id,
            prompt: row.prompt,
            user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}

/// Database row for `provider_results`.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = provider_results)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProviderResultRow {
    /// Result identifier
    pub id: Uuid,
    /// Parent run
    pub run_id: Uuid,
    /// Provider tag (`openai` or `google`)
    pub provider: String,
    /// Model identifier
    pub model_name: String,
    /// Accumulated response text
    pub response_text: String,
    /// Token estimate
    pub token_count: i64,
    /// Estimated cost in USD
    pub cost_usd: f64,
    /// Elapsed milliseconds
    pub response_time_ms: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

fn to_db_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_db_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

impl ProviderResultRow {
    /// Build a row for a new result with a fresh id.
    pub fn from_new(new: &NewProviderResult, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id: new.run_id,
            provider: new.provider.tag().to_string(),
            model_name: new.model_name.clone(),
            response_text: new.response_text.clone(),
            token_count: to_db_count(new.token_count),
            cost_usd: new.cost_usd,
            response_time_ms: to_db_count(new.response_time_ms),
            created_at,
        }
    }
}

impl TryFrom<ProviderResultRow> for ProviderResult {
    type Error = StorageError;

    fn try_from(row: ProviderResultRow) -> Result<Self, Self::Error> {
        let provider = Provider::from_tag(&row.provider).ok_or_else(|| {
            StorageError::new(StorageErrorKind::Query(format!(
                "Unknown provider tag '{}' on result {}",
                row.provider, row.id
            )))
        })?;

        Ok(Self {
            id: row.id,
            run_id: row.run_id,
            provider,
            model_name: row.model_name,
            response_text: row.response_text,
            token_count: from_db_count(row.token_count),
            cost_usd: row.cost_usd,
            response_time_ms: from_db_count(row.response_time_ms),
            created_at: row.created_at,
        })
    }
}

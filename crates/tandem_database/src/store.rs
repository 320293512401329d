//! [`ResultStore`] backed by PostgreSQL.

use crate::connection::{PgPool, establish_pool, run_migrations};
use crate::models::{ComparisonRunRow, ProviderResultRow};
use crate::schema::{comparison_runs, provider_results};
use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use tandem_core::{ComparisonRun, NewProviderResult, ProviderResult, RunId, RunWithResults};
use tandem_error::{StorageError, StorageErrorKind, TandemResult};
use tandem_interface::ResultStore;
use tracing::instrument;
use uuid::Uuid;

/// PostgreSQL result store.
///
/// Diesel is synchronous, so every query runs on the blocking thread pool with
/// a connection checked out of the r2d2 pool.
#[derive(Clone)]
pub struct PostgresResultStore {
    pool: PgPool,
}

impl std::fmt::Debug for PostgresResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresResultStore")
            .field("connections", &self.pool.state().connections)
            .finish()
    }
}

impl PostgresResultStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` and bring the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the database is unreachable or a migration fails.
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> TandemResult<Self> {
        let url = database_url.to_string();
        let pool = tokio::task::spawn_blocking(move || {
            let pool = establish_pool(&url, max_connections)?;
            run_migrations(&pool)?;
            Ok::<_, StorageError>(pool)
        })
        .await
        .map_err(|e| StorageError::new(StorageErrorKind::Unavailable(e.to_string())))??;

        tracing::info!(max_connections, "Connected to result database");
        Ok(Self::new(pool))
    }

    async fn with_conn<T, F>(&self, op: F) -> TandemResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, StorageError> + Send + 'static,
    {
        let pool = self.pool.clone();
        let value = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            op(&mut conn)
        })
        .await
        .map_err(|e| {
            StorageError::new(StorageErrorKind::Unavailable(format!(
                "Database task failed: {}",
                e
            )))
        })??;
        Ok(value)
    }
}

#[async_trait]
impl ResultStore for PostgresResultStore {
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    async fn create_run(
        &self,
        prompt: &str,
        user_id: Option<&str>,
    ) -> TandemResult<ComparisonRun> {
        let row = ComparisonRunRow {
            id: Uuid::new_v4(),
            prompt: prompt.to_string(),
            user_id: user_id.map(str::to_string),
            created_at: Utc::now(),
        };

        let created = self
            .with_conn(move |conn| {
                diesel::insert_into(comparison_runs::table)
                    .values(&row)
                    .returning(ComparisonRunRow::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)
            })
            .await?;

        tracing::debug!(run_id = %created.id, "Created comparison run");
        Ok(created.into())
    }

    #[instrument(skip(self, result), fields(run_id = %result.run_id, provider = %result.provider))]
    async fn save_result(&self, result: NewProviderResult) -> TandemResult<ProviderResult> {
        let row = ProviderResultRow::from_new(&result, Utc::now());
        let run_id = result.run_id;

        let saved = self
            .with_conn(move |conn| {
                conn.transaction::<_, StorageError, _>(|conn| {
                    let exists = comparison_runs::table
                        .find(run_id)
                        .select(comparison_runs::id)
                        .first::<Uuid>(conn)
                        .optional()?;
                    if exists.is_none() {
                        return Err(StorageError::new(StorageErrorKind::NotFound(format!(
                            "comparison run {}",
                            run_id
                        ))));
                    }

                    diesel::insert_into(provider_results::table)
                        .values(&row)
                        .returning(ProviderResultRow::as_returning())
                        .get_result(conn)
                        .map_err(StorageError::from)
                })
            })
            .await?;

        tracing::debug!(result_id = %saved.id, "Saved provider result");
        Ok(ProviderResult::try_from(saved)?)
    }

    #[instrument(skip(self))]
    async fn find_run_with_results(&self, id: RunId) -> TandemResult<Option<RunWithResults>> {
        let found = self
            .with_conn(move |conn| {
                let run = comparison_runs::table
                    .find(id)
                    .select(ComparisonRunRow::as_select())
                    .first(conn)
                    .optional()?;
                let Some(run) = run else {
                    return Ok(None);
                };

                let rows = provider_results::table
                    .filter(provider_results::run_id.eq(id))
                    .order(provider_results::created_at.asc())
                    .select(ProviderResultRow::as_select())
                    .load(conn)?;
                Ok(Some((run, rows)))
            })
            .await?;

        let Some((run, rows)) = found else {
            return Ok(None);
        };
        let results = rows
            .into_iter()
            .map(ProviderResult::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(RunWithResults {
            run: run.into(),
            results,
        }))
    }
}

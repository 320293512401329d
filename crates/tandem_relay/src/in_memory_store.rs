//! In-memory [`ResultStore`] for tests and `--in-memory` runs.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tandem_core::{ComparisonRun, NewProviderResult, ProviderResult, RunId, RunWithResults};
use tandem_error::{StorageError, StorageErrorKind, TandemResult};
use tandem_interface::ResultStore;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Result store kept in process memory.
///
/// All data is lost when the last clone is dropped. Two switches simulate
/// outages: [`set_unavailable`](Self::set_unavailable) fails every operation,
/// [`set_saves_failing`](Self::set_saves_failing) fails only `save_result`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResultStore {
    runs: Arc<RwLock<HashMap<RunId, ComparisonRun>>>,
    results: Arc<RwLock<HashMap<RunId, Vec<ProviderResult>>>>,
    unavailable: Arc<AtomicBool>,
    saves_failing: Arc<AtomicBool>,
}

impl InMemoryResultStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with an unavailable error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make `save_result` fail while runs can still be created.
    pub fn set_saves_failing(&self, failing: bool) {
        self.saves_failing.store(failing, Ordering::SeqCst);
    }

    /// Number of stored runs (for testing).
    pub async fn run_count(&self) -> usize {
        self.runs.read().await.len()
    }

    /// Results recorded for `run_id`, oldest first (for testing).
    pub async fn results_for(&self, run_id: RunId) -> Vec<ProviderResult> {
        self.results
            .read()
            .await
            .get(&run_id)
            .cloned()
            .unwrap_or_default()
    }

    #[track_caller]
    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::new(StorageErrorKind::Unavailable(
                "in-memory store switched off".to_string(),
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn create_run(
        &self,
        prompt: &str,
        user_id: Option<&str>,
    ) -> TandemResult<ComparisonRun> {
        self.check_available()?;
        let run = ComparisonRun {
            id: Uuid::new_v4(),
            prompt: prompt.to_string(),
            user_id: user_id.map(str::to_string),
            created_at: Utc::now(),
        };
        self.runs.write().await.insert(run.id, run.clone());
        Ok(run)
    }

    async fn save_result(&self, result: NewProviderResult) -> TandemResult<ProviderResult> {
        self.check_available()?;
        if self.saves_failing.load(Ordering::SeqCst) {
            return Err(StorageError::new(StorageErrorKind::Query(
                "in-memory saves switched off".to_string(),
            ))
            .into());
        }
        if !self.runs.read().await.contains_key(&result.run_id) {
            return Err(StorageError::new(StorageErrorKind::NotFound(format!(
                "comparison run {}",
                result.run_id
            )))
            .into());
        }

        let saved = ProviderResult::from_new(result, Utc::now());
        self.results
            .write()
            .await
            .entry(saved.run_id)
            .or_default()
            .push(saved.clone());
        Ok(saved)
    }

    async fn find_run_with_results(&self, id: RunId) -> TandemResult<Option<RunWithResults>> {
        self.check_available()?;
        let Some(run) = self.runs.read().await.get(&id).cloned() else {
            return Ok(None);
        };
        Ok(Some(RunWithResults {
            run,
            results: self.results_for(id).await,
        }))
    }
}

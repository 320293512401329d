//! Fan-out of one prompt to two provider streams, fan-in to one event stream.

use crate::{
    BranchJoin, JoinState, RelayEvent, RelayMetrics, normalize_provider_error,
};
use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tandem_core::{BranchMetrics, ModelId, NewProviderResult, Prompt, RunId, elapsed_ms};
use tandem_error::{
    ProviderError, ProviderErrorKind, RelayError, RelayErrorKind, TandemError, TandemResult,
};
use tandem_interface::{ProviderStream, ResultStore};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{Instrument, instrument};

/// Tuning for [`StreamRelay`].
#[derive(Debug, Clone, PartialEq, Eq, derive_builder::Builder, derive_getters::Getters)]
#[builder(setter(into))]
pub struct RelayConfig {
    /// Outbound channel capacity; producers wait when it is full
    #[builder(default = 64)]
    channel_capacity: usize,
    /// Fail a branch that produces nothing for this long
    #[builder(default)]
    branch_idle_timeout: Option<Duration>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            branch_idle_timeout: None,
        }
    }
}

/// Runs one prompt against two providers concurrently.
///
/// Construct once and share; each [`run`](Self::run) is independent.
#[derive(Clone)]
pub struct StreamRelay {
    store: Arc<dyn ResultStore>,
    branches: [Arc<dyn ProviderStream>; 2],
    config: RelayConfig,
}

impl std::fmt::Debug for StreamRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamRelay")
            .field("openai", &self.branches[0].model_name())
            .field("gemini", &self.branches[1].model_name())
            .field("config", &self.config)
            .finish()
    }
}

impl StreamRelay {
    /// Create a relay over a result store and the two provider streams.
    pub fn new(
        store: Arc<dyn ResultStore>,
        openai: Arc<dyn ProviderStream>,
        gemini: Arc<dyn ProviderStream>,
        config: RelayConfig,
    ) -> Self {
        Self {
            store,
            branches: [openai, gemini],
            config,
        }
    }

    /// The result store runs are recorded in.
    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    /// Start a comparison run for `prompt`.
    ///
    /// The returned stream yields `session` first and `all-complete` last.
    /// Dropping it cancels both branches.
    ///
    /// # Errors
    ///
    /// - [`RelayErrorKind::InvalidPrompt`] if the prompt is blank
    /// - [`RelayErrorKind::RunCreation`] if the run could not be recorded
    pub async fn run(&self, prompt: &str) -> TandemResult<RelayStream> {
        self.run_for_user(prompt, None).await
    }

    /// Like [`run`](Self::run), attributing the run to `user_id`.
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    pub async fn run_for_user(
        &self,
        prompt: &str,
        user_id: Option<&str>,
    ) -> TandemResult<RelayStream> {
        let prompt = Prompt::new(prompt)?;

        let run = self
            .store
            .create_run(prompt.as_str(), user_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to create comparison run");
                RelayError::new(RelayErrorKind::RunCreation(e.to_string()))
            })?;

        let metrics = RelayMetrics::get();
        metrics.record_run_started();
        tracing::info!(run_id = %run.id, "Comparison run started");

        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let cancel = CancellationToken::new();
        let join = Arc::new(BranchJoin::new());

        // Capacity is at least one and nothing else has sent yet
        if tx
            .try_send(RelayEvent::Session { session_id: run.id })
            .is_err()
        {
            tracing::warn!(run_id = %run.id, "Could not queue session event");
        }

        for (slot, provider) in self.branches.iter().enumerate() {
            let branch = Branch {
                slot,
                run_id: run.id,
                prompt: prompt.clone(),
                provider: Arc::clone(provider),
                model_id: ModelId::from(provider.provider()),
                store: Arc::clone(&self.store),
                tx: tx.clone(),
                join: Arc::clone(&join),
                cancel: cancel.clone(),
                idle_timeout: self.config.branch_idle_timeout,
                metrics,
            };
            let span = tracing::info_span!(
                "branch",
                run_id = %run.id,
                provider = %provider.provider(),
                model = provider.model_name()
            );
            tokio::spawn(branch.drive().instrument(span));
        }

        Ok(RelayStream {
            run_id: run.id,
            receiver: rx,
            finished: false,
            _cancel_on_drop: cancel.drop_guard(),
        })
    }
}

/// Outbound events of one run.
///
/// Ends after `all-complete`. Dropping it cancels any branch still running.
#[derive(Debug)]
pub struct RelayStream {
    run_id: RunId,
    receiver: mpsc::Receiver<RelayEvent>,
    finished: bool,
    _cancel_on_drop: DropGuard,
}

impl RelayStream {
    /// Identifier of the run this stream belongs to.
    pub fn run_id(&self) -> RunId {
        self.run_id
    }
}

impl Stream for RelayStream {
    type Item = RelayEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match self.receiver.poll_recv(cx) {
            Poll::Ready(Some(event)) => {
                if event == RelayEvent::AllComplete {
                    self.finished = true;
                }
                Poll::Ready(Some(event))
            }
            Poll::Ready(None) => {
                self.finished = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Why a branch stopped early.
enum BranchStop {
    /// Upstream failed; reported to the client as an error status
    Upstream(TandemError),
    /// Client is gone; nothing more to report
    Disconnected,
}

/// State owned by one branch task.
struct Branch {
    slot: usize,
    run_id: RunId,
    prompt: Prompt,
    provider: Arc<dyn ProviderStream>,
    model_id: ModelId,
    store: Arc<dyn ResultStore>,
    tx: mpsc::Sender<RelayEvent>,
    join: Arc<BranchJoin>,
    cancel: CancellationToken,
    idle_timeout: Option<Duration>,
    metrics: &'static RelayMetrics,
}

impl Branch {
    async fn drive(self) {
        let cancel = self.cancel.clone();
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Branch cancelled, client disconnected");
            }
            _ = self.execute() => {}
        }
    }

    async fn execute(&self) {
        let started = Instant::now();
        let outcome = match self.collect().await {
            Ok(text) => self.complete(text, started.elapsed()).await,
            Err(BranchStop::Upstream(err)) => self.fail(err).await,
            Err(BranchStop::Disconnected) => Err(BranchStop::Disconnected),
        };
        if outcome.is_ok() {
            let _ = self.finish().await;
        }
    }

    /// Forward increments until the provider stream ends.
    async fn collect(&self) -> Result<String, BranchStop> {
        let mut stream = self
            .provider
            .stream(self.prompt.as_str())
            .await
            .map_err(BranchStop::Upstream)?;
        let mut text = String::new();

        loop {
            let next = match self.idle_timeout {
                Some(limit) => tokio::time::timeout(limit, stream.next())
                    .await
                    .map_err(|_| {
                        BranchStop::Upstream(
                            ProviderError::new(ProviderErrorKind::Timeout(format!(
                                "no output for {}ms",
                                limit.as_millis()
                            )))
                            .into(),
                        )
                    })?,
                None => stream.next().await,
            };

            match next {
                None => return Ok(text),
                Some(Err(e)) => return Err(BranchStop::Upstream(e)),
                Some(Ok(increment)) if increment.is_empty() => continue,
                Some(Ok(increment)) => {
                    text.push_str(&increment);
                    self.send(RelayEvent::chunk(self.model_id, increment)).await?;
                }
            }
        }
    }

    async fn complete(&self, text: String, elapsed: Duration) -> Result<(), BranchStop> {
        let token_count = self.provider.count_tokens(&text);
        let metrics = BranchMetrics {
            response_time_ms: elapsed_ms(elapsed),
            token_count,
            cost_usd: self.provider.estimate_cost_usd(token_count),
        };
        let provider = self.provider.provider();

        let saved = self
            .store
            .save_result(NewProviderResult {
                run_id: self.run_id,
                provider,
                model_name: self.provider.model_name().to_string(),
                response_text: text,
                token_count,
                cost_usd: metrics.cost_usd,
                response_time_ms: metrics.response_time_ms,
            })
            .await;
        if let Err(e) = saved {
            tracing::warn!(error = %e, "Failed to save provider result");
            self.metrics.record_save_failure(provider.tag());
            self.send(RelayEvent::error(
                self.model_id,
                format!("Failed to save {} result", provider.display_name()),
            ))
            .await?;
        }

        self.metrics.record_completion(
            provider.tag(),
            self.provider.model_name(),
            elapsed.as_secs_f64(),
            token_count,
        );
        tracing::info!(
            response_time_ms = metrics.response_time_ms,
            token_count,
            cost_usd = metrics.cost_usd,
            "Branch complete"
        );
        self.send(RelayEvent::complete(self.model_id, metrics)).await
    }

    async fn fail(&self, err: TandemError) -> Result<(), BranchStop> {
        let provider = self.provider.provider();
        let normalized = normalize_provider_error(&err, provider);
        tracing::error!(error = %err, "{}", normalized.log_message());
        self.metrics
            .record_error(provider.tag(), self.provider.model_name(), normalized.class());
        self.send(RelayEvent::error(
            self.model_id,
            normalized.user_message().clone(),
        ))
        .await
    }

    /// Join with the sibling; the last branch closes the run.
    async fn finish(&self) -> Result<(), BranchStop> {
        if self.join.mark_done(self.slot) == JoinState::BothDone {
            self.send(RelayEvent::AllComplete).await?;
            tracing::info!("Comparison run finished");
        }
        Ok(())
    }

    /// Send one event, waiting for channel space.
    async fn send(&self, event: RelayEvent) -> Result<(), BranchStop> {
        self.tx.send(event).await.map_err(|_| {
            tracing::debug!("Event receiver dropped, cancelling run");
            self.cancel.cancel();
            BranchStop::Disconnected
        })
    }
}

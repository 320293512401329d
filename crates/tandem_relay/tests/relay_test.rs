//! End-to-end relay tests with drip, scripted and spy providers.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tandem_core::{ModelId, Pricing, Provider};
use tandem_error::{ProviderError, ProviderErrorKind, RelayErrorKind, TandemError, TandemResult};
use tandem_interface::{ProviderStream, TextStream};
use tandem_models::DripStream;
use tandem_relay::{
    BranchStatus, InMemoryResultStore, RelayConfig, RelayConfigBuilder, RelayEvent, RelayStream,
    StreamRelay,
};

fn drip_pair() -> (Arc<dyn ProviderStream>, Arc<dyn ProviderStream>) {
    let openai = DripStream::openai()
        .with_template("{prompt} from openai")
        .with_cadence(Duration::from_millis(5));
    let gemini = DripStream::gemini()
        .with_template("{prompt} from gemini")
        .with_cadence(Duration::from_millis(7));
    (Arc::new(openai), Arc::new(gemini))
}

fn relay_with(
    store: &InMemoryResultStore,
    openai: Arc<dyn ProviderStream>,
    gemini: Arc<dyn ProviderStream>,
    config: RelayConfig,
) -> StreamRelay {
    StreamRelay::new(Arc::new(store.clone()), openai, gemini, config)
}

async fn drain(stream: RelayStream) -> anyhow::Result<Vec<RelayEvent>> {
    Ok(tokio::time::timeout(Duration::from_secs(10), stream.collect::<Vec<_>>()).await?)
}

fn chunks_for(events: &[RelayEvent], model: ModelId) -> String {
    events
        .iter()
        .filter_map(|event| match event {
            RelayEvent::Chunk { model_id, data } if *model_id == model => Some(data.as_str()),
            _ => None,
        })
        .collect()
}

fn statuses_for(events: &[RelayEvent], model: ModelId) -> Vec<&RelayEvent> {
    events
        .iter()
        .filter(|event| matches!(event, RelayEvent::Status { model_id, .. } if *model_id == model))
        .collect()
}

fn http_error(status_code: u16) -> TandemError {
    ProviderError::new(ProviderErrorKind::Http {
        status_code,
        code: None,
        message: format!("upstream said {}", status_code),
    })
    .into()
}

/// Provider that replays a fixed script of increments and failures.
struct ScriptedProvider {
    provider: Provider,
    reject_with: Option<u16>,
    steps: Vec<Result<&'static str, u16>>,
}

#[async_trait]
impl ProviderStream for ScriptedProvider {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    fn pricing(&self) -> Pricing {
        Pricing::per_1k(0.2)
    }

    async fn stream(&self, _prompt: &str) -> TandemResult<TextStream> {
        if let Some(status) = self.reject_with {
            return Err(http_error(status));
        }
        let items: Vec<TandemResult<String>> = self
            .steps
            .iter()
            .map(|step| match step {
                Ok(text) => Ok(text.to_string()),
                Err(status) => Err(http_error(*status)),
            })
            .collect();
        Ok(Box::pin(futures_util::stream::iter(items)))
    }
}

struct ReleaseOnDrop(Arc<AtomicUsize>);

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Provider that emits one increment and then hangs, counting opens and drops.
struct SpyProvider {
    provider: Provider,
    opened: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

#[async_trait]
impl ProviderStream for SpyProvider {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn model_name(&self) -> &str {
        "spy"
    }

    fn pricing(&self) -> Pricing {
        Pricing::OPENAI
    }

    async fn stream(&self, _prompt: &str) -> TandemResult<TextStream> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let guard = ReleaseOnDrop(Arc::clone(&self.released));
        Ok(Box::pin(async_stream::stream! {
            let _guard = guard;
            yield Ok::<_, TandemError>("first ".to_string());
            futures_util::future::pending::<()>().await;
        }))
    }
}

#[tokio::test(start_paused = true)]
async fn test_ping_scenario() -> anyhow::Result<()> {
    let store = InMemoryResultStore::new();
    let (openai, gemini) = drip_pair();
    let relay = relay_with(&store, openai, gemini, RelayConfig::default());

    let stream = relay.run("ping").await?;
    let run_id = stream.run_id();
    let events = drain(stream).await?;

    assert_eq!(events.first(), Some(&RelayEvent::Session { session_id: run_id }));
    assert_eq!(events.last(), Some(&RelayEvent::AllComplete));
    assert_eq!(events.iter().filter(|e| e.kind() == "session").count(), 1);
    assert_eq!(events.iter().filter(|e| e.kind() == "chunk").count(), 6);
    assert_eq!(events.iter().filter(|e| e.kind() == "all-complete").count(), 1);

    for model in [ModelId::OpenAI, ModelId::Gemini] {
        let statuses = statuses_for(&events, model);
        assert_eq!(statuses.len(), 1);
        let RelayEvent::Status {
            status, metrics, ..
        } = statuses[0]
        else {
            anyhow::bail!("not a status event");
        };
        assert_eq!(*status, BranchStatus::Complete);
        let metrics = metrics.ok_or_else(|| anyhow::anyhow!("complete status without metrics"))?;
        assert!(metrics.token_count >= 1);
        assert!(metrics.cost_usd >= 0.0);
    }

    assert_eq!(chunks_for(&events, ModelId::OpenAI), "ping from openai ");
    assert_eq!(chunks_for(&events, ModelId::Gemini), "ping from gemini ");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_branches_stream_concurrently() -> anyhow::Result<()> {
    let store = InMemoryResultStore::new();
    let (openai, gemini) = drip_pair();
    let relay = relay_with(&store, openai, gemini, RelayConfig::default());

    let events = drain(relay.run("ping").await?).await?;
    let order: Vec<ModelId> = events
        .iter()
        .filter_map(|event| match event {
            RelayEvent::Chunk { model_id, .. } => Some(*model_id),
            _ => None,
        })
        .collect();

    let first_gemini = order
        .iter()
        .position(|model| *model == ModelId::Gemini)
        .ok_or_else(|| anyhow::anyhow!("no gemini chunks: {:?}", order))?;
    let last_openai = order
        .iter()
        .rposition(|model| *model == ModelId::OpenAI)
        .ok_or_else(|| anyhow::anyhow!("no openai chunks: {:?}", order))?;
    assert!(
        first_gemini < last_openai,
        "branches ran one after the other: {:?}",
        order
    );
    assert_eq!(order.first(), Some(&ModelId::OpenAI));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_chunks_match_persisted_text() -> anyhow::Result<()> {
    let store = InMemoryResultStore::new();
    let (openai, gemini) = drip_pair();
    let relay = relay_with(&store, openai, gemini, RelayConfig::default());

    let stream = relay.run("compare these").await?;
    let run_id = stream.run_id();
    let events = drain(stream).await?;

    let results = store.results_for(run_id).await;
    assert_eq!(results.len(), 2);
    for result in results {
        let model = ModelId::from(result.provider);
        assert_eq!(result.response_text, chunks_for(&events, model));
        assert_eq!(
            result.token_count,
            tandem_core::estimate_tokens(&result.response_text)
        );

        let statuses = statuses_for(&events, model);
        let Some(RelayEvent::Status {
            metrics: Some(metrics),
            ..
        }) = statuses.first().copied()
        else {
            anyhow::bail!("missing metrics for {}", model);
        };
        assert_eq!(metrics.token_count, result.token_count);
        assert_eq!(metrics.cost_usd, result.cost_usd);
        assert_eq!(metrics.response_time_ms, result.response_time_ms);
    }
    Ok(())
}

#[tokio::test]
async fn test_one_branch_fails_other_completes() -> anyhow::Result<()> {
    let store = InMemoryResultStore::new();
    let openai = Arc::new(ScriptedProvider {
        provider: Provider::OpenAI,
        reject_with: None,
        steps: vec![Ok("fine "), Ok("answer ")],
    });
    let gemini = Arc::new(ScriptedProvider {
        provider: Provider::Google,
        reject_with: None,
        steps: vec![Ok("partial "), Err(429)],
    });
    let relay = relay_with(&store, openai, gemini, RelayConfig::default());

    let stream = relay.run("ping").await?;
    let run_id = stream.run_id();
    let events = drain(stream).await?;

    assert_eq!(events.last(), Some(&RelayEvent::AllComplete));
    assert_eq!(events.iter().filter(|e| e.kind() == "all-complete").count(), 1);

    let failed = statuses_for(&events, ModelId::Gemini);
    assert_eq!(
        failed,
        vec![&RelayEvent::error(
            ModelId::Gemini,
            "Gemini: Rate limit or quota exceeded. Please try again later."
        )]
    );

    let succeeded = statuses_for(&events, ModelId::OpenAI);
    assert!(matches!(
        succeeded.as_slice(),
        [RelayEvent::Status { status: BranchStatus::Complete, metrics: Some(_), .. }]
    ));

    let results = store.results_for(run_id).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].provider, Provider::OpenAI);
    assert_eq!(results[0].response_text, "fine answer ");
    Ok(())
}

#[tokio::test]
async fn test_rejected_request_reports_error() -> anyhow::Result<()> {
    let store = InMemoryResultStore::new();
    let openai = Arc::new(ScriptedProvider {
        provider: Provider::OpenAI,
        reject_with: Some(401),
        steps: vec![],
    });
    let gemini = Arc::new(ScriptedProvider {
        provider: Provider::Google,
        reject_with: Some(503),
        steps: vec![],
    });
    let relay = relay_with(&store, openai, gemini, RelayConfig::default());

    let events = drain(relay.run("ping").await?).await?;

    assert_eq!(events.len(), 4);
    assert!(events.contains(&RelayEvent::error(
        ModelId::OpenAI,
        "OpenAI: Invalid or missing API key. Check your key in the backend .env."
    )));
    assert!(events.contains(&RelayEvent::error(
        ModelId::Gemini,
        "Gemini: Service is temporarily unavailable. Please retry shortly."
    )));
    assert_eq!(events.last(), Some(&RelayEvent::AllComplete));
    Ok(())
}

#[tokio::test]
async fn test_run_creation_failure_starts_nothing() -> anyhow::Result<()> {
    let store = InMemoryResultStore::new();
    store.set_unavailable(true);
    let opened = Arc::new(AtomicUsize::new(0));
    let released = Arc::new(AtomicUsize::new(0));
    let spy = |provider| {
        Arc::new(SpyProvider {
            provider,
            opened: Arc::clone(&opened),
            released: Arc::clone(&released),
        })
    };
    let relay = relay_with(
        &store,
        spy(Provider::OpenAI),
        spy(Provider::Google),
        RelayConfig::default(),
    );

    let err = relay
        .run("ping")
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("run should fail"))?;
    assert!(matches!(
        err.as_relay().map(|e| &e.kind),
        Some(RelayErrorKind::RunCreation(_))
    ));

    tokio::task::yield_now().await;
    assert_eq!(opened.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn test_blank_prompt_rejected_before_side_effects() -> anyhow::Result<()> {
    let store = InMemoryResultStore::new();
    let (openai, gemini) = drip_pair();
    let relay = relay_with(&store, openai, gemini, RelayConfig::default());

    for prompt in ["", "   ", "\n\t"] {
        let err = relay
            .run(prompt)
            .await
            .err()
            .ok_or_else(|| anyhow::anyhow!("blank prompt accepted"))?;
        assert!(matches!(
            err.as_relay().map(|e| &e.kind),
            Some(RelayErrorKind::InvalidPrompt)
        ));
    }
    assert_eq!(store.run_count().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_disconnect_releases_both_branches() -> anyhow::Result<()> {
    let store = InMemoryResultStore::new();
    let opened = Arc::new(AtomicUsize::new(0));
    let released = Arc::new(AtomicUsize::new(0));
    let spy = |provider| {
        Arc::new(SpyProvider {
            provider,
            opened: Arc::clone(&opened),
            released: Arc::clone(&released),
        })
    };
    let relay = relay_with(
        &store,
        spy(Provider::OpenAI),
        spy(Provider::Google),
        RelayConfig::default(),
    );

    let mut stream = relay.run("ping").await?;
    let mut seen = Vec::new();
    for _ in 0..3 {
        let event = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await?
            .ok_or_else(|| anyhow::anyhow!("stream ended early"))?;
        seen.push(event);
    }
    assert_eq!(seen[0].kind(), "session");
    assert_eq!(opened.load(Ordering::SeqCst), 2);
    assert_eq!(released.load(Ordering::SeqCst), 0);

    drop(stream);

    tokio::time::timeout(Duration::from_secs(5), async {
        while released.load(Ordering::SeqCst) < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await?;
    assert!(store.results_for(seen_run_id(&seen)?).await.is_empty());
    Ok(())
}

fn seen_run_id(events: &[RelayEvent]) -> anyhow::Result<uuid::Uuid> {
    match events.first() {
        Some(RelayEvent::Session { session_id }) => Ok(*session_id),
        other => anyhow::bail!("expected session first, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_save_failure_warns_and_continues() -> anyhow::Result<()> {
    let store = InMemoryResultStore::new();
    store.set_saves_failing(true);
    let (openai, gemini) = drip_pair();
    let relay = relay_with(&store, openai, gemini, RelayConfig::default());

    let events = drain(relay.run("ping").await?).await?;

    let openai_statuses = statuses_for(&events, ModelId::OpenAI);
    assert_eq!(openai_statuses.len(), 2);
    assert_eq!(
        openai_statuses[0],
        &RelayEvent::error(ModelId::OpenAI, "Failed to save OpenAI result")
    );
    assert!(matches!(
        openai_statuses[1],
        RelayEvent::Status { status: BranchStatus::Complete, metrics: Some(_), .. }
    ));

    let gemini_statuses = statuses_for(&events, ModelId::Gemini);
    assert_eq!(
        gemini_statuses[0],
        &RelayEvent::error(ModelId::Gemini, "Failed to save Gemini result")
    );
    assert_eq!(events.last(), Some(&RelayEvent::AllComplete));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_idle_timeout_fails_silent_branch() -> anyhow::Result<()> {
    let store = InMemoryResultStore::new();
    let silent = Arc::new(SpyProvider {
        provider: Provider::Google,
        opened: Arc::new(AtomicUsize::new(0)),
        released: Arc::new(AtomicUsize::new(0)),
    });
    let (openai, _) = drip_pair();
    let config = RelayConfigBuilder::default()
        .branch_idle_timeout(Duration::from_millis(200))
        .build()?;
    let relay = relay_with(&store, openai, silent, config);

    let events = drain(relay.run("ping").await?).await?;

    let gemini = statuses_for(&events, ModelId::Gemini);
    let [RelayEvent::Status { status, message: Some(message), metrics: None, .. }] =
        gemini.as_slice()
    else {
        anyhow::bail!("expected a single error status, got {:?}", gemini);
    };
    assert_eq!(*status, BranchStatus::Error);
    assert!(message.starts_with("Gemini: "));
    assert!(message.contains("no output for 200ms"));
    assert_eq!(events.last(), Some(&RelayEvent::AllComplete));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_small_channel_loses_nothing() -> anyhow::Result<()> {
    let store = InMemoryResultStore::new();
    let (openai, gemini) = drip_pair();
    let config = RelayConfigBuilder::default().channel_capacity(1usize).build()?;
    let relay = relay_with(&store, openai, gemini, config);

    let mut stream = relay.run("a slow reader").await?;
    let mut events = Vec::new();
    while let Some(event) = stream.next().await {
        tokio::time::sleep(Duration::from_millis(20)).await;
        events.push(event);
    }

    assert_eq!(chunks_for(&events, ModelId::OpenAI), "a slow reader from openai ");
    assert_eq!(chunks_for(&events, ModelId::Gemini), "a slow reader from gemini ");
    assert_eq!(events.last(), Some(&RelayEvent::AllComplete));
    Ok(())
}

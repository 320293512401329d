//! Drip stream timing and content tests (paused tokio clock).

use futures_util::StreamExt;
use std::time::Duration;
use tandem_interface::ProviderStream;
use tandem_models::DripStream;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_one_word_per_tick() -> anyhow::Result<()> {
    let drip = DripStream::openai().with_template("Echo: {prompt}");
    let started = Instant::now();
    let mut stream = drip.stream("ping").await?;

    let first = stream.next().await.transpose()?;
    assert_eq!(first.as_deref(), Some("Echo: "));
    assert_eq!(started.elapsed(), Duration::from_millis(55));

    let second = stream.next().await.transpose()?;
    assert_eq!(second.as_deref(), Some("ping "));
    assert_eq!(started.elapsed(), Duration::from_millis(110));

    assert!(stream.next().await.is_none());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_default_templates_mention_prompt() -> anyhow::Result<()> {
    let openai = DripStream::openai().run_once("ping").await?;
    assert_eq!(
        openai.text,
        "OpenAI response to: ping. This is a mocked stream for development to test SSE and UI. "
    );

    let gemini = DripStream::gemini().run_once("ping").await?;
    assert!(gemini.text.starts_with("Gemini response to: ping. "));
    assert_eq!(
        gemini.metrics.token_count,
        tandem_core::estimate_tokens(&gemini.text)
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_streams_are_independent() -> anyhow::Result<()> {
    let drip = DripStream::gemini()
        .with_template("a b c")
        .with_cadence(Duration::from_millis(10));

    let mut first = drip.stream("x").await?;
    let _ = first.next().await;
    drop(first);

    let collected: Vec<String> = drip
        .stream("x")
        .await?
        .filter_map(|item| async move { item.ok() })
        .collect()
        .await;
    assert_eq!(collected, vec!["a ", "b ", "c "]);
    Ok(())
}

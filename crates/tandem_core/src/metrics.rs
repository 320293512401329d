//! Branch metrics reported when a provider stream completes.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Latency, token and cost figures for one finished branch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BranchMetrics {
    /// Wall-clock time from branch start to stream completion.
    #[serde(rename = "responseTimeMs")]
    pub response_time_ms: u64,
    /// Estimated tokens in the accumulated text.
    #[serde(rename = "tokenCount")]
    pub token_count: u64,
    /// Estimated cost in USD.
    #[serde(rename = "costUSD")]
    pub cost_usd: f64,
}

/// Outcome of collecting one provider stream to completion outside a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOnceReport {
    /// Full accumulated text.
    pub text: String,
    /// Metrics derived from `text`.
    #[serde(flatten)]
    pub metrics: BranchMetrics,
}

/// Whole milliseconds in `elapsed`, saturating at `u64::MAX`.
pub fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

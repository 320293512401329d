//! Core data types for the Tandem comparison relay.
//!
//! This crate provides the records shared by the relay, the providers and the
//! result store: provider tags, comparison runs, per-provider results and the
//! token/cost estimators used to derive branch metrics.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod metrics;
mod prompt;
mod provider;
mod run;
mod token_counting;

pub use metrics::{BranchMetrics, RunOnceReport, elapsed_ms};
pub use prompt::Prompt;
pub use provider::{ModelId, Provider};
pub use run::{ComparisonRun, NewProviderResult, ProviderResult, RunId, RunWithResults};
pub use token_counting::{Pricing, estimate_tokens, round_usd};

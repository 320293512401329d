//! Concurrent two-provider stream relay.
//!
//! [`StreamRelay`] takes one prompt, records a comparison run, streams the
//! prompt through two [`ProviderStream`](tandem_interface::ProviderStream)s at
//! once and merges their output into a single ordered [`RelayStream`] of
//! [`RelayEvent`]s:
//!
//! 1. `session` with the run id
//! 2. interleaved `chunk`s from both branches
//! 3. one `status` per branch (`complete` with metrics, or `error`)
//! 4. `all-complete`
//!
//! A failing branch never affects its sibling, and dropping the stream cancels
//! both branches.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod event;
mod in_memory_store;
mod join;
mod metrics;
mod relay;
mod sanitize;

pub use event::{BranchStatus, RelayEvent};
pub use in_memory_store::InMemoryResultStore;
pub use join::{BranchJoin, JoinState};
pub use metrics::RelayMetrics;
pub use relay::{RelayConfig, RelayConfigBuilder, RelayStream, StreamRelay};
pub use sanitize::{NormalizedError, normalize_provider_error};

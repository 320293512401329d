//! Trait definitions for the Tandem comparison relay.
//!
//! This crate provides the two seams the relay is built against: a uniform
//! producer contract for upstream token streams and the result store the relay
//! persists into.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;

pub use traits::{ProviderStream, ResultStore, TextStream};

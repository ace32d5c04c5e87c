//! # `todo-contract`: consumer-driven contract tooling for the todo gateway
//!
//! Contracts are Pact specification v2 files: a list of recorded HTTP
//! interactions, each optionally tagged with a provider state.
//!
//! - [`pact`] - the fixture model and loader.
//! - [`matching`] - compares live responses (or requests) against a fixture,
//!   honoring `type`/`min`/`max` matching rules.
//! - [`verifier`] - provider side: replays every interaction against a freshly
//!   launched provider and reports mismatches.
//! - [`mock`] - consumer side: serves the fixture responses so a client can be
//!   tested without the real provider.
//! - [`consumer`] - [`TodoProxy`](consumer::TodoProxy), the HTTP client the
//!   contract was recorded from.

pub mod consumer;
mod error;
pub mod matching;
pub mod mock;
pub mod pact;
pub mod verifier;

pub use error::{BoxError, Error, Result};
pub use pact::Pact;

use std::path::PathBuf;

/// Directory holding the pact files shipped with this crate.
pub fn pact_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("pacts")
}

/// Path of the `ToDoConsumer` ↔ `ToDoService` contract.
pub fn todo_pact_path() -> PathBuf {
    pact_dir().join("todoconsumer-todoservice.json")
}

//! Transport front for the todo service.
//!
//! ## Structure
//!
//! - [`config`] - CLI/environment configuration.
//! - [`service`] - the gRPC request handler.
//! - [`gateway`] - the HTTP/JSON gateway forwarding to gRPC.
//! - [`telemetry`] - logging, tracing, and metrics setup.
//! - [`start`] / [`ServerHandle`] - listener lifecycle.

pub mod config;
pub mod gateway;
mod lifecycle;
pub mod service;
pub mod telemetry;

pub use lifecycle::{ServerHandle, start};

//! Shared types and error definitions used across the todo service.
//!
//! ## Submodules
//!
//! - [`error`] - Central error type used by the store and the handler.
//! - [`types`] - Constants shared by the server and its clients.

pub mod error;
pub mod types;

pub use error::{Error, Result};

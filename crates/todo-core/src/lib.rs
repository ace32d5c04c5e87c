//! # `todo-core`: shared protocol and error types
//!
//! This crate holds everything the server, the gateway, and the contract
//! tooling agree on:
//!
//! - [`proto`] - generated `todo.v1` messages plus the `TodoService` client
//!   and server bindings.
//! - [`Error`] - the error taxonomy surfaced by the store and the request
//!   handler, with its mapping onto [`tonic::Status`].
//! - [`types`] - `ListTodo` limit resolution shared by the server and its clients.

mod common;
pub use common::*;

/// gRPC service and message definitions generated from `proto/todo.proto`.
///
/// Messages derive `serde` with `#[serde(default)]`, so a JSON object that
/// omits a field decodes to the proto3 zero value for that field.
pub mod proto {
    tonic::include_proto!("todo.v1");

    /// Encoded file descriptor set, registered with the reflection service.
    pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("todo_descriptor");
}

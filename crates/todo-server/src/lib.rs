//! # `todo-server`: gRPC todo service with an HTTP/JSON gateway
//!
//! The crate is split along the request path:
//!
//! - [`store`] - the [`TodoStore`](store::TodoStore) capability and its SQLite
//!   and in-memory implementations.
//! - [`server`] - the gRPC request handler, the HTTP/JSON gateway, process
//!   configuration, telemetry, and the [`start`](server::start) /
//!   [`ServerHandle::shutdown`](server::ServerHandle::shutdown) lifecycle.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin todo-server -- --database-url sqlite://todo.db
//! ```
//!
//! Then call `todo.v1.TodoService` on `127.0.0.1:50051`, or the gateway on
//! `http://127.0.0.1:8080/v1/todo`.

pub mod server;
pub mod store;

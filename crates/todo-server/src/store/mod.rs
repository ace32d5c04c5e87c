//! Persistence for todo items.
//!
//! [`TodoStore`] is the narrow capability the request handler depends on. Two
//! implementations ship with the crate:
//!
//! - [`SqlStore`] - SQLite through a `sqlx` connection pool; used in
//!   production.
//! - [`MemoryStore`] - an insertion-ordered in-process list; used by tests
//!   and by `--in-memory` runs. Fixtures are passed to its constructor.
//!
//! Both implementations share the same semantics: duplicate ids are a
//! [`Error::Conflict`](todo_core::Error::Conflict), reads and deletes of a
//! missing id are [`Error::NotFound`](todo_core::Error::NotFound), and a list
//! that matches nothing is an empty `Vec`.

mod memory;
mod sql;

pub use memory::MemoryStore;
pub use sql::{SqlStore, StoreConfig};

use todo_core::{Result, proto::Todo};

/// Single-table CRUD over [`Todo`] records.
#[tonic::async_trait]
pub trait TodoStore: Send + Sync + 'static {
    /// Persists a new record. Fails with `Conflict` if the id exists.
    async fn insert(&self, item: Todo) -> Result<()>;

    /// Returns the record with `id`, or `NotFound`.
    async fn get(&self, id: &str) -> Result<Todo>;

    /// Returns records whose `completed` flag equals `completed`, oldest
    /// first; at most `limit` of them, or all when `limit` is `None`.
    async fn list(&self, limit: Option<u32>, completed: bool) -> Result<Vec<Todo>>;

    /// Removes the record with `id`, or fails with `NotFound`.
    async fn delete(&self, id: &str) -> Result<()>;
}

//! gRPC service implementation for todo items.
//!
//! This module defines [`TodoHandler`], the concrete implementation of the
//! [`TodoService`] gRPC service defined in `proto/todo.proto`. Every RPC maps
//! onto exactly one [`TodoStore`] call; the handler only assembles request
//! and response envelopes.
//!
//! ## Responsibilities
//!
//! - Assign a UUID v4 to items created without an id.
//! - Reject negative `ListTodo` limits and invert `not_completed` into the
//!   store's completion filter.
//! - Propagate store errors unchanged as [`tonic::Status`].
//! - Emit a span and request/error/duration metrics per RPC.

use crate::server::telemetry::{increment_rpc_errors, increment_rpc_requests, record_rpc_duration};
use crate::store::TodoStore;
use core::future::Future;
use std::{sync::Arc, time::Instant};
use todo_core::{
    Error,
    proto::{
        CreateTodoRequest, CreateTodoResponse, DeleteTodoRequest, DeleteTodoResponse,
        GetTodoRequest, GetTodoResponse, ListTodoRequest, ListTodoResponse,
        todo_service_server::TodoService,
    },
    types::list_limit,
};
use tonic::{Request, Response, Status};
use uuid::Uuid;

/// Translates `todo.v1.TodoService` calls into [`TodoStore`] calls.
///
/// Cloning is cheap; all clones share the same store.
#[derive(Clone)]
pub struct TodoHandler {
    store: Arc<dyn TodoStore>,
}

impl TodoHandler {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }
}

/// Runs one RPC body, recording duration and errors under `method`.
async fn observe<T, F>(method: &'static str, fut: F) -> Result<Response<T>, Status>
where
    F: Future<Output = todo_core::Result<T>>,
{
    let start = Instant::now();
    increment_rpc_requests(method);

    let result = fut.await;
    record_rpc_duration(method, start.elapsed().as_secs_f64() * 1000.0);

    match result {
        Ok(body) => Ok(Response::new(body)),
        Err(e) => {
            increment_rpc_errors(method);
            tracing::warn!(method, error = %e, "RPC failed");
            Err(e.into())
        }
    }
}

#[tonic::async_trait]
impl TodoService for TodoHandler {
    #[tracing::instrument(skip_all)]
    async fn create_todo(
        &self,
        req: Request<CreateTodoRequest>,
    ) -> Result<Response<CreateTodoResponse>, Status> {
        observe("CreateTodo", async move {
            let mut item = req
                .into_inner()
                .item
                .ok_or_else(|| Error::invalid_argument("item is required"))?;

            if item.id.is_empty() {
                item.id = Uuid::new_v4().to_string();
            }
            let id = item.id.clone();

            self.store.insert(item).await?;
            tracing::debug!(%id, "Created todo");
            Ok::<_, Error>(CreateTodoResponse { id })
        })
        .await
    }

    #[tracing::instrument(skip_all, fields(id = %req.get_ref().id))]
    async fn get_todo(
        &self,
        req: Request<GetTodoRequest>,
    ) -> Result<Response<GetTodoResponse>, Status> {
        observe("GetTodo", async move {
            let item = self.store.get(&req.get_ref().id).await?;
            Ok::<_, Error>(GetTodoResponse { item: Some(item) })
        })
        .await
    }

    #[tracing::instrument(
        skip_all,
        fields(limit = req.get_ref().limit, not_completed = req.get_ref().not_completed)
    )]
    async fn list_todo(
        &self,
        req: Request<ListTodoRequest>,
    ) -> Result<Response<ListTodoResponse>, Status> {
        observe("ListTodo", async move {
            let ListTodoRequest {
                limit,
                not_completed,
            } = req.into_inner();

            let limit = list_limit(limit)?;

            let items = self.store.list(limit, !not_completed).await?;
            Ok::<_, Error>(ListTodoResponse { items })
        })
        .await
    }

    #[tracing::instrument(skip_all, fields(id = %req.get_ref().id))]
    async fn delete_todo(
        &self,
        req: Request<DeleteTodoRequest>,
    ) -> Result<Response<DeleteTodoResponse>, Status> {
        observe("DeleteTodo", async move {
            self.store.delete(&req.get_ref().id).await?;
            Ok::<_, Error>(DeleteTodoResponse {})
        })
        .await
    }
}

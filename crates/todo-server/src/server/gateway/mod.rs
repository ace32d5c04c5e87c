//! HTTP/JSON projection of `todo.v1.TodoService`.
//!
//! Each route decodes its JSON body or query string into the generated
//! request message, forwards it over gRPC through a [`TodoServiceClient`],
//! and re-encodes the response message as JSON. gRPC failures become HTTP
//! statuses via [`status::grpc_to_http_status`].
//!
//! | method | path | RPC |
//! |---|---|---|
//! | `POST` | `/v1/todo` | `CreateTodo` (body is the `Todo`) |
//! | `GET` | `/v1/todo?limit=&not_completed=` | `ListTodo` |
//! | `GET` | `/v1/todo/{id}` | `GetTodo` |
//! | `DELETE` | `/v1/todo/{id}` | `DeleteTodo` |

pub mod status;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State, rejection::QueryRejection},
    routing::get,
};
use core::net::SocketAddr;
use status::GatewayError;
use todo_core::proto::{
    CreateTodoRequest, CreateTodoResponse, DeleteTodoRequest, DeleteTodoResponse, GetTodoRequest,
    GetTodoResponse, ListTodoRequest, ListTodoResponse, Todo,
    todo_service_client::TodoServiceClient,
};
use tonic::transport::{Channel, Endpoint};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Shared router state: a gRPC client pointed at the todo service.
#[derive(Clone)]
pub struct Gateway {
    client: TodoServiceClient<Channel>,
}

impl Gateway {
    pub fn new(client: TodoServiceClient<Channel>) -> Self {
        Self { client }
    }

    /// Builds a gateway whose channel connects on first use, so it can be
    /// created before the gRPC listener is serving.
    pub fn connect_lazy(grpc_addr: SocketAddr) -> Result<Self, tonic::transport::Error> {
        let channel = Endpoint::from_shared(format!("http://{grpc_addr}"))?.connect_lazy();
        Ok(Self::new(TodoServiceClient::new(channel)))
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/v1/todo", get(list_todo).post(create_todo))
            .route("/v1/todo/{id}", get(get_todo).delete(delete_todo))
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .with_state(self)
    }
}

type GatewayResult<T> = Result<Json<T>, GatewayError>;

async fn create_todo(State(gw): State<Gateway>, body: Bytes) -> GatewayResult<CreateTodoResponse> {
    let item: Todo = if body.is_empty() {
        Todo::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| GatewayError::invalid_argument(format!("invalid request body: {e}")))?
    };

    let res = gw
        .client
        .clone()
        .create_todo(CreateTodoRequest { item: Some(item) })
        .await?;
    Ok(Json(res.into_inner()))
}

async fn list_todo(
    State(gw): State<Gateway>,
    query: Result<Query<ListTodoRequest>, QueryRejection>,
) -> GatewayResult<ListTodoResponse> {
    let Query(req) = query.map_err(|e| GatewayError::invalid_argument(e.body_text()))?;
    let res = gw.client.clone().list_todo(req).await?;
    Ok(Json(res.into_inner()))
}

async fn get_todo(State(gw): State<Gateway>, Path(id): Path<String>) -> GatewayResult<GetTodoResponse> {
    let res = gw.client.clone().get_todo(GetTodoRequest { id }).await?;
    Ok(Json(res.into_inner()))
}

async fn delete_todo(
    State(gw): State<Gateway>,
    Path(id): Path<String>,
) -> GatewayResult<DeleteTodoResponse> {
    let res = gw.client.clone().delete_todo(DeleteTodoRequest { id }).await?;
    Ok(Json(res.into_inner()))
}

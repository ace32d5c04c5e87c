//! Listener startup and graceful shutdown.
//!
//! [`start`] binds the gRPC and HTTP listeners before returning, so the
//! reported addresses are usable immediately (port `0` picks a free port).
//! Both listeners run on their own task and stop together when the shared
//! [`CancellationToken`] fires, either through [`ServerHandle::shutdown`] or
//! because one of them failed.

use super::{
    config::ServerConfig,
    gateway::Gateway,
    service::{build_todo_service, handler::TodoHandler},
};
use crate::store::TodoStore;
use anyhow::Context;
use core::fmt::Display;
use core::future::{Future, IntoFuture};
use core::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use todo_core::proto::{FILE_DESCRIPTOR_SET, todo_service_server::TodoServiceServer};
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tonic_health::server::HealthReporter;
use tonic_reflection::server::Builder;
use tonic_web::GrpcWebLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

type Served = TodoServiceServer<TodoHandler>;

/// A running server. Dropping the handle leaves the listeners running; call
/// [`shutdown`](Self::shutdown) to stop them.
pub struct ServerHandle {
    grpc_addr: SocketAddr,
    http_addr: SocketAddr,
    shutdown: CancellationToken,
    health_reporter: HealthReporter,
    grpc_task: JoinHandle<Result<(), tonic::transport::Error>>,
    http_task: JoinHandle<std::io::Result<()>>,
}

impl ServerHandle {
    pub fn grpc_addr(&self) -> SocketAddr {
        self.grpc_addr
    }

    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    /// Base URL of the HTTP/JSON gateway, e.g. `http://127.0.0.1:8080`.
    pub fn http_url(&self) -> String {
        format!("http://{}", dialable(self.http_addr))
    }

    /// Endpoint URL for gRPC clients, e.g. `http://127.0.0.1:50051`.
    pub fn grpc_url(&self) -> String {
        format!("http://{}", dialable(self.grpc_addr))
    }

    /// Resolves once shutdown was requested or a listener stopped on its own.
    pub async fn closed(&self) {
        self.shutdown.cancelled().await;
    }

    /// Marks the service NOT_SERVING, stops both listeners, and waits for
    /// in-flight connections to drain.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.health_reporter.set_not_serving::<Served>().await;
        self.shutdown.cancel();

        self.grpc_task.await.context("gRPC listener task panicked")??;
        self.http_task.await.context("HTTP listener task panicked")??;

        tracing::info!("Service shut down successfully");
        Ok(())
    }
}

/// Starts the gRPC server and the HTTP/JSON gateway over `store`.
pub async fn start(config: &ServerConfig, store: Arc<dyn TodoStore>) -> anyhow::Result<ServerHandle> {
    let grpc_listener = TcpListener::bind(config.grpc_addr)
        .await
        .with_context(|| format!("failed to bind gRPC listener on {}", config.grpc_addr))?;
    let http_listener = TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {}", config.http_addr))?;
    let grpc_addr = grpc_listener.local_addr()?;
    let http_addr = http_listener.local_addr()?;

    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter.set_serving::<Served>().await;

    let reflection = Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    let shutdown = CancellationToken::new();

    let grpc = Server::builder()
        .accept_http1(true)
        .layer(
            ServiceBuilder::new()
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(GrpcWebLayer::new()),
        )
        .add_service(health_service)
        .add_service(reflection)
        .add_service(build_todo_service(TodoHandler::new(store)))
        .serve_with_incoming_shutdown(
            TcpListenerStream::new(grpc_listener),
            shutdown.clone().cancelled_owned(),
        );
    let grpc_task = tokio::spawn(supervise("grpc", grpc, shutdown.clone()));

    let gateway = Gateway::connect_lazy(dialable(grpc_addr))?;
    let http = axum::serve(http_listener, gateway.router())
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .into_future();
    let http_task = tokio::spawn(supervise("http", http, shutdown.clone()));

    tracing::info!(%grpc_addr, %http_addr, "Todo service listening");

    Ok(ServerHandle {
        grpc_addr,
        http_addr,
        shutdown,
        health_reporter,
        grpc_task,
        http_task,
    })
}

/// Runs a listener to completion and trips `shutdown` when it ends, so the
/// sibling listener stops too.
async fn supervise<F, E>(name: &'static str, serve: F, shutdown: CancellationToken) -> Result<(), E>
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    let result = serve.await;
    if let Err(e) = &result {
        tracing::error!(listener = name, error = %e, "Listener failed");
    }
    shutdown.cancel();
    result
}

/// Replaces an unspecified bind address with loopback so it can be dialed.
fn dialable(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => SocketAddr::new(Ipv4Addr::LOCALHOST.into(), addr.port()),
        IpAddr::V6(ip) if ip.is_unspecified() => SocketAddr::new(Ipv6Addr::LOCALHOST.into(), addr.port()),
        _ => addr,
    }
}

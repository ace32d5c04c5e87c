//! gRPC service implementation.
//!
//! ## Structure
//!
//! - [`handler`] - gRPC service entry point (`TodoHandler`).

pub mod handler;

use handler::TodoHandler;
use todo_core::proto::todo_service_server::TodoServiceServer;
use tonic::codec::CompressionEncoding;

/// Wraps `handler` in the generated server with every supported compression
/// encoding enabled in both directions.
pub fn build_todo_service(handler: TodoHandler) -> TodoServiceServer<TodoHandler> {
    TodoServiceServer::new(handler)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Deflate)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Deflate)
}

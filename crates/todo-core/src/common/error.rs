//! Error types for the todo service.
//!
//! This module defines the central `Error` enum returned by every store
//! implementation and propagated unchanged by the request handler. It
//! implements `From<Error>` for `tonic::Status` so handlers can use `?` and
//! clients receive the matching gRPC status code.
//!
//! ## Error Cases
//! - `NotFound`: No todo matches the requested id.
//! - `Conflict`: A todo with the same id already exists.
//! - `StoreUnavailable`: The backing store could not be reached (pool timeout,
//!   closed pool, I/O failure).
//! - `InvalidArgument`: The request was malformed.
//! - `Internal`: Any other store failure.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the todo service.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// No record with the given id.
    #[error("Todo not found: {id}")]
    NotFound { id: String },

    /// A record with the given id already exists.
    #[error("Todo already exists: {id}")]
    Conflict { id: String },

    /// Connectivity or transient failure in the backing store.
    #[error("Store unavailable: {context}")]
    StoreUnavailable { context: String },

    /// The client request was malformed.
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Unclassified store failure.
    #[error("Internal error: {context}")]
    Internal { context: String },
}

impl Error {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound { id } => Status::not_found(format!("todo {id} not found")),
            Error::Conflict { id } => Status::already_exists(format!("todo {id} already exists")),
            Error::StoreUnavailable { context } => {
                Status::unavailable(format!("Store unavailable: {context}"))
            }
            Error::InvalidArgument { reason } => Status::invalid_argument(reason),
            Error::Internal { context } => Status::internal(context),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn maps_onto_grpc_codes() {
        let cases = [
            (Error::not_found("a"), Code::NotFound),
            (Error::Conflict { id: "a".into() }, Code::AlreadyExists),
            (
                Error::StoreUnavailable {
                    context: "pool timed out".into(),
                },
                Code::Unavailable,
            ),
            (Error::invalid_argument("bad"), Code::InvalidArgument),
            (
                Error::Internal {
                    context: "boom".into(),
                },
                Code::Internal,
            ),
        ];

        for (err, code) in cases {
            assert_eq!(Status::from(err).code(), code);
        }
    }

    #[test]
    fn not_found_message_names_the_id() {
        let status = Status::from(Error::not_found("id1"));
        assert!(status.message().contains("id1"));
    }
}

use std::path::PathBuf;

pub type Result<T> = core::result::Result<T, Error>;

/// Boxed error returned by provider launch and shutdown hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures raised by the contract tooling itself, as opposed to contract
/// mismatches, which are reported as data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read pact file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid pact JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid interaction '{description}': {reason}")]
    InvalidInteraction { description: String, reason: String },

    #[error("no interaction described as '{0}'")]
    UnknownInteraction(String),

    #[error("no state handler for provider state '{0}'")]
    UnknownProviderState(String),

    #[error("provider failed to start: {0}")]
    ProviderLaunch(BoxError),

    #[error("provider failed to stop: {0}")]
    ProviderShutdown(BoxError),

    #[error("mock provider failed: {0}")]
    MockServer(#[source] std::io::Error),

    #[error("successful response is missing '{0}'")]
    MissingField(&'static str),

    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("mock provider expectations not met: missing {missing:?}, unexpected {unexpected:?}")]
    MockVerification {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
}

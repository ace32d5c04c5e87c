//! Mock provider serving recorded interactions to a consumer under test.

use crate::{
    Error, Result,
    matching::{BodyMatcher, match_headers, match_query},
    pact::Interaction,
};
use axum::{
    Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use core::net::SocketAddr;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;

struct MockState {
    interactions: Vec<Interaction>,
    hits: Mutex<Vec<usize>>,
    unexpected: Mutex<Vec<String>>,
}

/// An HTTP server on an ephemeral loopback port that answers with the
/// recorded response of the first interaction whose request matches.
pub struct MockProvider {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown: CancellationToken,
    task: JoinHandle<std::io::Result<()>>,
}

impl MockProvider {
    pub async fn start(interactions: Vec<Interaction>) -> Result<Self> {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .map_err(Error::MockServer)?;
        let addr = listener.local_addr().map_err(Error::MockServer)?;

        let state = Arc::new(MockState {
            hits: Mutex::new(vec![0; interactions.len()]),
            interactions,
            unexpected: Mutex::new(Vec::new()),
        });
        let shutdown = CancellationToken::new();

        let app = Router::new()
            .fallback(respond)
            .with_state(Arc::clone(&state));
        let serve = axum::serve(listener, app).with_graceful_shutdown(shutdown.clone().cancelled_owned());
        let task = tokio::spawn(async move { serve.await });

        tracing::debug!(%addr, "Mock provider listening");
        Ok(Self {
            addr,
            state,
            shutdown,
            task,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Fails unless every interaction was exercised at least once and no
    /// request went unmatched.
    pub fn verify(&self) -> Result<()> {
        let missing: Vec<String> = self
            .state
            .hits
            .lock()
            .iter()
            .zip(&self.state.interactions)
            .filter(|(hits, _)| **hits == 0)
            .map(|(_, i)| i.description.clone())
            .collect();
        let unexpected = self.state.unexpected.lock().clone();

        if missing.is_empty() && unexpected.is_empty() {
            Ok(())
        } else {
            Err(Error::MockVerification {
                missing,
                unexpected,
            })
        }
    }

    pub async fn shutdown(self) -> Result<()> {
        self.shutdown.cancel();
        match self.task.await {
            Ok(res) => res.map_err(Error::MockServer),
            Err(e) => Err(Error::MockServer(std::io::Error::other(e))),
        }
    }
}

async fn respond(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let actual_body: Option<serde_json::Value> = if body.is_empty() {
        None
    } else {
        serde_json::from_slice(&body).ok()
    };

    let matched = state
        .interactions
        .iter()
        .position(|i| request_matches(i, &method, &uri, &headers, actual_body.as_ref()));

    let Some(index) = matched else {
        let line = format!("{method} {uri}");
        tracing::warn!(request = %line, "Unexpected request");
        state.unexpected.lock().push(line.clone());
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("no interaction matches {line}"),
        )
            .into_response();
    };

    state.hits.lock()[index] += 1;
    recorded_response(&state.interactions[index])
}

fn request_matches(
    interaction: &Interaction,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Option<&serde_json::Value>,
) -> bool {
    let expected = &interaction.request;
    if !expected.method.eq_ignore_ascii_case(method.as_str()) || expected.path != uri.path() {
        return false;
    }
    if !match_query(expected.query.as_deref(), uri.query()).is_empty() {
        return false;
    }
    if !match_headers(&expected.headers, headers).is_empty() {
        return false;
    }
    match (&expected.body, body) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(want), Some(got)) => BodyMatcher::request(&expected.matching_rules)
            .compare(want, got)
            .is_empty(),
    }
}

fn recorded_response(interaction: &Interaction) -> Response {
    let recorded = &interaction.response;
    let status = StatusCode::from_u16(recorded.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let body = match &recorded.body {
        Some(value) => match serde_json::to_vec(value) {
            Ok(bytes) => Body::from(bytes),
            Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
        },
        None => Body::empty(),
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    for (name, value) in &recorded.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            response.headers_mut().insert(name, value);
        }
    }
    response
}

//! Provider verification: replay recorded interactions against a live
//! provider and collect every mismatch.
//!
//! Each interaction gets its own provider instance. The caller's `launch`
//! hook receives the fixture produced by the interaction's provider state and
//! returns a [`ProviderTarget`]; the verifier replays the request, stops the
//! target, and moves on. No state is shared between interactions.

use crate::{
    BoxError, Error, Result,
    matching::{BodyMatcher, Mismatch, match_headers},
    pact::{Interaction, Pact},
};
use core::fmt;
use core::future::Future;
use core::pin::Pin;
use reqwest::Method;
use std::collections::BTreeMap;

type ShutdownFuture = Pin<Box<dyn Future<Output = core::result::Result<(), BoxError>> + Send>>;

/// Maps provider state names to fixture factories.
///
/// Interactions without a provider state receive `S::default()`.
pub struct StateHandlers<S> {
    handlers: BTreeMap<String, Box<dyn Fn() -> S + Send + Sync>>,
}

impl<S: Default> StateHandlers<S> {
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    pub fn with(mut self, state: impl Into<String>, setup: impl Fn() -> S + Send + Sync + 'static) -> Self {
        self.handlers.insert(state.into(), Box::new(setup));
        self
    }

    pub fn resolve(&self, state: Option<&str>) -> Result<S> {
        match state {
            None => Ok(S::default()),
            Some(name) => self
                .handlers
                .get(name)
                .map(|setup| setup())
                .ok_or_else(|| Error::UnknownProviderState(name.to_string())),
        }
    }
}

impl<S: Default> Default for StateHandlers<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// A running provider the verifier can send requests to.
pub struct ProviderTarget {
    base_url: String,
    shutdown: Option<ShutdownFuture>,
}

impl ProviderTarget {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            shutdown: None,
        }
    }

    /// Registers the future that stops this provider. It is polled only
    /// after the interaction has been replayed.
    pub fn with_shutdown<F>(mut self, shutdown: F) -> Self
    where
        F: Future<Output = core::result::Result<(), BoxError>> + Send + 'static,
    {
        self.shutdown = Some(Box::pin(shutdown));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn stop(self) -> Result<()> {
        match self.shutdown {
            Some(fut) => fut.await.map_err(Error::ProviderShutdown),
            None => Ok(()),
        }
    }
}

/// Outcome of one replayed interaction.
#[derive(Debug, Clone)]
pub struct InteractionResult {
    pub description: String,
    pub provider_state: Option<String>,
    pub mismatches: Vec<Mismatch>,
}

impl InteractionResult {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub results: Vec<InteractionResult>,
}

impl VerificationReport {
    pub fn is_success(&self) -> bool {
        self.results.iter().all(InteractionResult::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &InteractionResult> {
        self.results.iter().filter(|r| !r.passed())
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            let verdict = if result.passed() { "OK" } else { "FAILED" };
            writeln!(f, "[{verdict}] {}", result.description)?;
            for mismatch in &result.mismatches {
                writeln!(f, "    {mismatch}")?;
            }
        }
        Ok(())
    }
}

/// Replays pact interactions over HTTP.
#[derive(Clone)]
pub struct Verifier {
    client: reqwest::Client,
}

impl Verifier {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().no_proxy().build()?;
        Ok(Self { client })
    }

    /// Verifies every interaction in `pact`, launching a fresh provider for
    /// each one through `launch`.
    pub async fn verify<S, F, Fut>(
        &self,
        pact: &Pact,
        states: &StateHandlers<S>,
        mut launch: F,
    ) -> Result<VerificationReport>
    where
        S: Default,
        F: FnMut(S) -> Fut,
        Fut: Future<Output = core::result::Result<ProviderTarget, BoxError>>,
    {
        let mut report = VerificationReport::default();

        for interaction in &pact.interactions {
            let fixture = states.resolve(interaction.provider_state.as_deref())?;
            let target = launch(fixture).await.map_err(Error::ProviderLaunch)?;

            let outcome = self.replay(target.base_url(), interaction).await;
            target.stop().await?;
            let mismatches = outcome?;

            if mismatches.is_empty() {
                tracing::info!(interaction = %interaction.description, "Interaction verified");
            } else {
                tracing::warn!(
                    interaction = %interaction.description,
                    mismatches = mismatches.len(),
                    "Interaction failed verification"
                );
            }

            report.results.push(InteractionResult {
                description: interaction.description.clone(),
                provider_state: interaction.provider_state.clone(),
                mismatches,
            });
        }

        Ok(report)
    }

    /// Sends the interaction's request to `base_url` and compares the
    /// response with the recorded one.
    pub async fn replay(&self, base_url: &str, interaction: &Interaction) -> Result<Vec<Mismatch>> {
        let expected_req = &interaction.request;
        let method = Method::from_bytes(expected_req.method.to_ascii_uppercase().as_bytes())
            .map_err(|e| Error::InvalidInteraction {
                description: interaction.description.clone(),
                reason: e.to_string(),
            })?;
        let url = format!(
            "{}{}",
            base_url.trim_end_matches('/'),
            expected_req.path_and_query()
        );

        let mut request = self.client.request(method, url);
        for (name, value) in &expected_req.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &expected_req.body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;

        let expected = &interaction.response;
        let mut mismatches = Vec::new();

        if status != expected.status {
            mismatches.push(Mismatch {
                path: "$.status".to_string(),
                message: format!("expected {}, got {status}", expected.status),
            });
        }

        mismatches.extend(match_headers(&expected.headers, &headers));

        if let Some(expected_body) = &expected.body {
            match serde_json::from_slice(&bytes) {
                Ok(actual_body) => mismatches.extend(
                    BodyMatcher::response(&expected.matching_rules).compare(expected_body, &actual_body),
                ),
                Err(e) => mismatches.push(Mismatch {
                    path: "$.body".to_string(),
                    message: format!("response body is not JSON: {e}"),
                }),
            }
        }

        Ok(mismatches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_state_uses_default_fixture() {
        let states: StateHandlers<Vec<u8>> = StateHandlers::new().with("has one", || vec![1]);
        assert_eq!(states.resolve(None).unwrap(), Vec::<u8>::new());
        assert_eq!(states.resolve(Some("has one")).unwrap(), vec![1]);
    }

    #[test]
    fn unknown_state_is_an_error() {
        let states: StateHandlers<Vec<u8>> = StateHandlers::new();
        assert!(matches!(
            states.resolve(Some("nope")),
            Err(Error::UnknownProviderState(name)) if name == "nope"
        ));
    }
}

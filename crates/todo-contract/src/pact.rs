//! Pact specification v2 fixture model.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Matching rules keyed by JSON path, e.g. `$.body.items[*].id`.
pub type MatchingRules = BTreeMap<String, MatchingRule>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pact {
    pub consumer: Pacticipant,
    pub provider: Pacticipant,
    pub interactions: Vec<Interaction>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pacticipant {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_state: Option<String>,
    pub request: InteractionRequest,
    pub response: InteractionResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRequest {
    pub method: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub matching_rules: MatchingRules,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionResponse {
    pub status: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub matching_rules: MatchingRules,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingRule {
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MatchKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Values must share a JSON type; applies to the whole subtree.
    Type,
    /// Values must be equal; switches off an inherited `type` rule.
    Equality,
}

impl Pact {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn interaction(&self, description: &str) -> Result<&Interaction> {
        self.interactions
            .iter()
            .find(|i| i.description == description)
            .ok_or_else(|| Error::UnknownInteraction(description.to_string()))
    }
}

impl InteractionRequest {
    /// Path plus query string, as sent on the wire.
    pub fn path_and_query(&self) -> String {
        match self.query.as_deref() {
            Some(q) if !q.is_empty() => format!("{}?{}", self.path, q),
            _ => self.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_pact_parses() {
        let pact = Pact::load(crate::todo_pact_path()).unwrap();
        assert_eq!(pact.consumer.name, "ToDoConsumer");
        assert_eq!(pact.provider.name, "ToDoService");

        let list = pact.interaction("A request to list incomplete todos").unwrap();
        assert_eq!(
            list.request.path_and_query(),
            "/v1/todo?limit=10&not_completed=true"
        );
        assert_eq!(
            list.response.matching_rules.get("$.body"),
            Some(&MatchingRule {
                kind: Some(MatchKind::Type),
                ..Default::default()
            })
        );
    }

    #[test]
    fn unknown_interaction_is_an_error() {
        let pact = Pact::from_json(
            r#"{"consumer":{"name":"c"},"provider":{"name":"p"},"interactions":[]}"#,
        )
        .unwrap();
        assert!(matches!(
            pact.interaction("nope"),
            Err(Error::UnknownInteraction(_))
        ));
    }
}

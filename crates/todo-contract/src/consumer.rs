//! The consumer side of the contract: a thin HTTP client for the gateway.

use crate::{Error, Result};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// A todo as the consumer sees it on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
}

#[derive(Deserialize)]
struct CreateTodoResponse {
    id: String,
}

#[derive(Deserialize)]
struct GetTodoResponse {
    #[serde(default)]
    item: Option<Todo>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ListTodoResponse {
    items: Vec<Todo>,
}

/// HTTP client for the `/v1/todo` gateway.
#[derive(Debug, Clone)]
pub struct TodoProxy {
    base_url: String,
    client: reqwest::Client,
}

impl TodoProxy {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().no_proxy().build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_host_port(host: &str, port: u16) -> Result<Self> {
        Self::new(format!("http://{host}:{port}"))
    }

    /// Creates `todo` and returns the id the provider assigned or kept.
    pub async fn create_todo(&self, todo: &Todo) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/v1/todo", self.base_url))
            .json(todo)
            .send()
            .await?;
        let created: CreateTodoResponse = decode(response).await?;
        Ok(created.id)
    }

    pub async fn get_todo(&self, id: &str) -> Result<Todo> {
        let response = self
            .client
            .get(format!("{}/v1/todo/{id}", self.base_url))
            .send()
            .await?;
        let found: GetTodoResponse = decode(response).await?;
        found.item.ok_or(Error::MissingField("item"))
    }

    pub async fn list_todos(&self, limit: i32, not_completed: bool) -> Result<Vec<Todo>> {
        let response = self
            .client
            .get(format!("{}/v1/todo", self.base_url))
            .query(&[("limit", limit.to_string()), ("not_completed", not_completed.to_string())])
            .send()
            .await?;
        let listed: ListTodoResponse = decode(response).await?;
        Ok(listed.items)
    }

    pub async fn delete_todo(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/v1/todo/{id}", self.base_url))
            .send()
            .await?;
        let _: serde_json::Value = decode(response).await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::UnexpectedStatus {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}

//! API client module
//!
//! This module provides HTTP client functionality to interact with the resource-tree API server.

use std::sync::Arc;

use reqwest::{Client as ReqwestClient, Error as ReqwestError, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::models::{DisplayItem, Node};

/// API client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
        }
    }
}

/// Generic API response structure
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] ReqwestError),

    #[error("API error: {0}")]
    Api(String),

    #[error("Missing data in response")]
    MissingData,
}

/// API client for the resource-tree service
#[derive(Debug, Clone)]
pub struct Client {
    http_client: Arc<ReqwestClient>,
    config: ClientConfig,
}

impl Client {
    /// Create a new client with default configuration
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            http_client: Arc::new(ReqwestClient::new()),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    // Sends a request and unwraps the envelope; an absent payload is `None`.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let api_response: ApiResponse<T> = response.json().await?;

        if api_response.success {
            Ok(api_response.data)
        } else {
            Err(ClientError::Api(api_response.error.unwrap_or_else(|| {
                format!("Unknown API error (status {})", status)
            })))
        }
    }

    /// Get the whole tree, starting at the root
    pub async fn get_tree(&self) -> Result<Node, ClientError> {
        let request = self.http_client.get(self.url("/api/tree"));
        self.send(request).await?.ok_or(ClientError::MissingData)
    }

    /// Get the children of a node, or of the root when `id` is `None`
    pub async fn get_children(&self, id: Option<&str>) -> Result<Vec<Node>, ClientError> {
        let mut request = self.http_client.get(self.url("/api/children"));
        if let Some(id) = id {
            request = request.query(&[("id", id)]);
        }
        self.send(request).await?.ok_or(ClientError::MissingData)
    }

    /// Get the parent of a node
    pub async fn get_parent(&self, id: &str) -> Result<Option<Node>, ClientError> {
        let request = self
            .http_client
            .get(self.url("/api/parent"))
            .query(&[("id", id)]);
        self.send(request).await
    }

    /// Get the placeholder display item for a node
    pub async fn get_tree_item(&self, id: &str) -> Result<DisplayItem, ClientError> {
        let request = self
            .http_client
            .get(self.url("/api/item"))
            .query(&[("id", id)]);
        self.send(request).await?.ok_or(ClientError::MissingData)
    }

    /// Resolve a node and get its detailed display item
    pub async fn resolve_tree_item(&self, id: &str) -> Result<DisplayItem, ClientError> {
        let request = self
            .http_client
            .get(self.url("/api/resolve"))
            .query(&[("id", id)]);
        self.send(request).await?.ok_or(ClientError::MissingData)
    }

    /// Refresh one node, or the whole tree when `id` is `None`
    pub async fn refresh(&self, id: Option<&str>) -> Result<(), ClientError> {
        #[derive(Serialize)]
        struct RefreshRequest<'a> {
            id: Option<&'a str>,
        }

        let request = self
            .http_client
            .post(self.url("/api/refresh"))
            .json(&RefreshRequest { id });
        self.send::<()>(request).await?;
        Ok(())
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

//! HTTP client for the external product catalog.

use elitestore_core::Product;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::CatalogConfig;

/// Errors that can occur when fetching the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Catalog returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body was not a product array.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Client for the product catalog REST endpoint.
#[derive(Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl CatalogClient {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.api_url.clone(),
        })
    }

    /// The configured endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetch the full product list.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the catalog answers with a
    /// non-success status, or the body is not a JSON product array.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn fetch_products(&self) -> Result<Vec<Product>, CatalogError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .header("Accept", "application/json")
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<Vec<Product>>(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse catalog response"
            );
            CatalogError::Parse(e.to_string())
        })
    }
}

//! Remote catalog: search shows, list episodes, resolve stream URLs.

mod models;
mod retry;

pub use models::{Category, Episode, Show, StreamUrl};
pub use retry::RetryPolicy;

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::{CatalogConfig, RetryConfig};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("catalog task failed: {0}")]
    TaskFailed(String),
}

/// The three remote operations the session depends on.
///
/// Implementations own their retry behaviour; callers only see the final result.
pub trait Catalog: Send + Sync + 'static {
    fn search(
        &self,
        query: &str,
        category: Category,
    ) -> impl Future<Output = Result<Vec<Show>, CatalogError>> + Send;

    fn list_episodes(
        &self,
        path: &str,
        category: Category,
    ) -> impl Future<Output = Result<Vec<Episode>, CatalogError>> + Send;

    fn resolve_episode(
        &self,
        path: &str,
        category: Category,
    ) -> impl Future<Output = Result<StreamUrl, CatalogError>> + Send;
}

#[derive(Serialize)]
struct SearchInput<'a> {
    text: &'a str,
    #[serde(rename = "type")]
    category: Category,
}

#[derive(Serialize)]
struct PathInput<'a> {
    path: &'a str,
    #[serde(rename = "type")]
    category: Category,
}

#[derive(Deserialize)]
struct Envelope<T> {
    result: EnvelopeResult<T>,
}

#[derive(Deserialize)]
struct EnvelopeResult<T> {
    data: Payload<T>,
}

#[derive(Deserialize)]
struct Payload<T> {
    // Absent or null when the procedure returned `undefined`
    data: Option<T>,
}

/// HTTP client for the catalog backend's RPC procedures
pub struct CatalogClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig, retry: &RetryConfig) -> Result<Self, CatalogError> {
        Self::with_base_url(
            &config.url,
            Duration::from_secs(config.timeout_secs),
            RetryPolicy::from(retry),
        )
    }

    /// Create a client with an explicit base URL and policy (for testing)
    pub fn with_base_url(
        base_url: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, CatalogError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn procedure_url(&self, procedure: &str) -> String {
        format!("{}/api/trpc/fetcher.{}", self.base_url, procedure)
    }

    /// Call a procedure whose payload may legitimately be absent
    async fn call<I, T>(&self, procedure: &str, input: &I) -> Result<Option<T>, CatalogError>
    where
        I: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.procedure_url(procedure);
        let response = self
            .client
            .post(&url)
            .json(input)
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            return Err(CatalogError::InvalidResponse(format!(
                "status: {}",
                response.status()
            )));
        }

        let body = response.text().await.map_err(map_request_error)?;
        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;
        Ok(envelope.result.data.data)
    }

    /// Call a procedure that must return a payload; a missing one is an error,
    /// never an empty result
    async fn call_required<I, T>(&self, procedure: &str, input: &I) -> Result<T, CatalogError>
    where
        I: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(procedure, input).await?.ok_or_else(|| {
            CatalogError::InvalidResponse(format!("{} returned no data", procedure))
        })
    }
}

fn map_request_error(e: reqwest::Error) -> CatalogError {
    if e.is_timeout() {
        CatalogError::Timeout
    } else {
        CatalogError::RequestError(e)
    }
}

impl Catalog for CatalogClient {
    async fn search(&self, query: &str, category: Category) -> Result<Vec<Show>, CatalogError> {
        debug!(query, category = category.as_str(), "searching catalog");
        let input = &SearchInput {
            text: query,
            category,
        };
        self.retry
            .run("search", move || self.call_required::<_, Vec<Show>>("search", input))
            .await
    }

    async fn list_episodes(
        &self,
        path: &str,
        category: Category,
    ) -> Result<Vec<Episode>, CatalogError> {
        debug!(path, category = category.as_str(), "listing episodes");
        let input = &PathInput { path, category };
        self.retry
            .run("episodes", move || {
                self.call_required::<_, Vec<Episode>>("episodes", input)
            })
            .await
    }

    async fn resolve_episode(
        &self,
        path: &str,
        category: Category,
    ) -> Result<StreamUrl, CatalogError> {
        debug!(path, category = category.as_str(), "resolving episode");
        let input = &PathInput { path, category };
        let data = self
            .retry
            .run("episode", move || self.call::<_, String>("episode", input))
            .await?;
        Ok(StreamUrl { data })
    }
}

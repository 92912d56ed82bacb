use crate::{Error, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure body the hosted API returns alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Shared REST plumbing for the document, file, and account clients.
///
/// The wrapped `reqwest::Client` carries a cookie store, so the session
/// established by a login implicitly authorizes every later call made
/// through a clone of the same client. The session is one process-wide
/// credential.
#[derive(Clone)]
pub struct BackendHttpClient {
    client: Client,
    base_url: String,
    project_id: String,
}

impl BackendHttpClient {
    /// Build a client with its own cookie-enabled connection pool.
    pub fn new(endpoint: &str, project_id: &str) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Ok(Self::with_client(endpoint, project_id, client))
    }

    /// Wrap an existing `reqwest::Client`. Clones of one client share a
    /// cookie store, which is how the three capability clients see the
    /// same session.
    pub fn with_client(endpoint: &str, project_id: &str, client: Client) -> Self {
        Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Absolute URL for an API path (no leading slash).
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header("X-Appwrite-Project", &self.project_id)
    }

    /// Turn a non-success reply into a tagged error, preferring the API's
    /// own failure message over the raw body.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .map(|body| body.message)
            .unwrap_or(text);
        tracing::debug!("Backend replied {}: {}", status, message);
        Err(Error::from_status(status.as_u16(), message))
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await.map_err(|e| {
            tracing::error!("Failed to reach backend: {}", e);
            e
        })?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(self.request(reqwest::Method::GET, path)).await
    }

    pub async fn get_json_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.send_json(self.request(reqwest::Method::GET, path).query(query))
            .await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(self.request(reqwest::Method::POST, path).json(body))
            .await
    }

    pub async fn patch_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(self.request(reqwest::Method::PATCH, path).json(body))
            .await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T> {
        self.send_json(self.request(reqwest::Method::POST, path).multipart(form))
            .await
    }

    /// DELETE with no reply body expected (the API answers 204).
    pub async fn delete(&self, path: &str) -> Result<()> {
        let response = self
            .request(reqwest::Method::DELETE, path)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach backend: {}", e);
                e
            })?;
        Self::check(response).await?;
        Ok(())
    }

    /// Status-only GET used to decide whether a public URL actually
    /// resolves. Transport failures count as unreachable.
    pub async fn probe(&self, url: &str) -> bool {
        match self.client.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("Probe of {} failed: {}", url, e);
                false
            }
        }
    }
}

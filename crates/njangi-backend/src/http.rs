//! PostgREST-style HTTP implementation of the backend contract.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::filter::{Filter, Order};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Configuration for the HTTP backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the REST endpoint (without trailing slash).
    pub base_url: String,

    /// API key sent as `apikey` and bearer token, if any.
    pub api_key: Option<String>,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl BackendConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let base_url = std::env::var("NJANGI_BACKEND_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());

        let api_key = std::env::var("NJANGI_BACKEND_KEY").ok().filter(|k| !k.is_empty());

        let timeout_secs = std::env::var("NJANGI_BACKEND_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

/// HTTP backend speaking the PostgREST conventions of the fixed backend.
pub struct HttpBackend {
    client: reqwest::Client,
    config: BackendConfig,
}

/// Error body shape returned by the backend.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Option<String>,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::network(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url)
    }

    fn with_auth(&self, mut request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(key) = &self.config.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }
        request
    }

    /// Translate a non-success response into a typed error.
    async fn read_error(response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(%status, "backend request failed");

        if let Ok(parsed) = serde_json::from_str::<ErrorBody>(&body) {
            if !parsed.code.is_empty() {
                let message = match parsed.details {
                    Some(details) => format!("{} ({details})", parsed.message),
                    None => parsed.message,
                };
                return Error::from_backend_code(&parsed.code, message);
            }
            if !parsed.message.is_empty() {
                return Self::error_from_status(status, parsed.message);
            }
        }

        Self::error_from_status(status, body)
    }

    fn error_from_status(status: reqwest::StatusCode, message: String) -> Error {
        use reqwest::StatusCode;
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::permission_denied(message),
            StatusCode::NOT_FOUND => Error::not_found(message),
            StatusCode::CONFLICT => Error::unique(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Error::check(message),
            _ => Error::other(message),
        }
    }

    /// Representation responses come back as arrays; mutations address a
    /// single row.
    fn single_row(mut rows: Vec<Value>, context: &str) -> Result<Value> {
        if rows.is_empty() {
            return Err(Error::not_found(context.to_string()));
        }
        Ok(rows.remove(0))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn query(&self, table: &str, filter: Filter, order: Option<Order>) -> Result<Vec<Value>> {
        let mut params = filter.to_query();
        if let Some(order) = order {
            params.push(("order".to_string(), order.to_query()));
        }

        let request = self.with_auth(self.client.get(self.url(table)).query(&params));
        let response = request.send().await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::read_error(response).await)
        }
    }

    async fn insert(&self, table: &str, record: Value) -> Result<Value> {
        let request = self
            .with_auth(self.client.post(self.url(table)))
            .header("Prefer", "return=representation")
            .json(&record);
        let response = request.send().await?;

        if response.status().is_success() {
            let rows: Vec<Value> = response.json().await?;
            Self::single_row(rows, table)
        } else {
            Err(Self::read_error(response).await)
        }
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value> {
        let request = self
            .with_auth(self.client.patch(self.url(table)))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&patch);
        let response = request.send().await?;

        if response.status().is_success() {
            let rows: Vec<Value> = response.json().await?;
            Self::single_row(rows, table)
        } else {
            Err(Self::read_error(response).await)
        }
    }

    async fn remove(&self, table: &str, id: &str) -> Result<()> {
        let request = self
            .with_auth(self.client.delete(self.url(table)))
            .query(&[("id", format!("eq.{id}"))]);
        let response = request.send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::read_error(response).await)
        }
    }

    async fn call_procedure(&self, name: &str, args: Value) -> Result<Value> {
        let request = self
            .with_auth(self.client.post(self.url(&format!("rpc/{name}"))))
            .json(&args);
        let response = request.send().await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::read_error(response).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        // No env manipulation here; just exercise the parsing defaults.
        let config = BackendConfig {
            base_url: "http://localhost:8000/".trim_end_matches('/').to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        };
        let backend = HttpBackend::new(config).unwrap();
        assert_eq!(backend.url("membre"), "http://localhost:8000/membre");
        assert_eq!(backend.url("rpc/payer_penalite"), "http://localhost:8000/rpc/payer_penalite");
    }

    #[test]
    fn status_mapping() {
        use reqwest::StatusCode;
        assert!(matches!(
            HttpBackend::error_from_status(StatusCode::FORBIDDEN, "rls".into()),
            Error::PermissionDenied { .. }
        ));
        assert!(matches!(
            HttpBackend::error_from_status(StatusCode::NOT_FOUND, "gone".into()),
            Error::NotFound { .. }
        ));
        assert!(matches!(
            HttpBackend::error_from_status(StatusCode::BAD_REQUEST, "bad".into()),
            Error::Check { .. }
        ));
    }
}

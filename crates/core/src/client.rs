//! HTTP client for remote transform services.
//!
//! [`TransformApi`] is the seam between the discovery/dispatch logic and the
//! network: [`HttpTransformApi`] talks to a real service with `reqwest`, the
//! testing module provides a scripted mock.

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::{multipart, Client, StatusCode};
use thiserror::Error;
use tracing::debug;

use crate::capability::TransformCoreConfig;
use crate::media_type::MediaType;
use crate::provider::{ByteStream, ConversionError, RenditionInput};

pub const HEALTH_PATH: &str = "/actuator/health";
pub const CONFIG_PATH: &str = "/transform/config";
pub const TRANSFORM_PATH: &str = "/transform";
/// Requests the newest configuration format the service knows.
pub const CONFIG_VERSION: &str = "9999";

/// Errors raised by transform service calls.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("connection to {url} failed: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

impl ClientError {
    fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        let url = url.to_string();
        if e.is_timeout() {
            Self::Timeout { url }
        } else if e.is_connect() {
            Self::ConnectionFailed {
                url,
                reason: e.to_string(),
            }
        } else {
            Self::Request {
                url,
                reason: e.to_string(),
            }
        }
    }
}

/// A single conversion call.
#[derive(Debug)]
pub struct TransformRequest {
    pub input: RenditionInput,
    pub source: MediaType,
    pub target: MediaType,
}

/// Operations offered by a remote transform service.
#[async_trait]
pub trait TransformApi: Send + Sync {
    /// Base URL of the service, without trailing slash.
    fn base_url(&self) -> &str;

    /// `GET /actuator/health`; returns the response status.
    async fn health(&self) -> Result<StatusCode, ClientError>;

    /// `GET /transform/config?configVersion=9999`.
    async fn fetch_config(&self) -> Result<TransformCoreConfig, ClientError>;

    /// `POST /transform` with a multipart body; returns the converted content.
    async fn transform(&self, request: TransformRequest) -> Result<ByteStream, ConversionError>;
}

/// `reqwest` implementation of [`TransformApi`].
#[derive(Debug, Clone)]
pub struct HttpTransformApi {
    client: Client,
    base_url: String,
    request_timeout: Option<Duration>,
}

impl HttpTransformApi {
    /// Create a client for the service at `base_url`.
    ///
    /// `request_timeout` applies to health and configuration calls only;
    /// conversions run as long as the service needs.
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Option<Duration>,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .user_agent(concat!("renditions/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;
        Ok(Self::with_client(client, base_url, request_timeout))
    }

    /// Create a client sharing an existing connection pool.
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        request_timeout: Option<Duration>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            request_timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match self.request_timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }
}

#[async_trait]
impl TransformApi for HttpTransformApi {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn health(&self) -> Result<StatusCode, ClientError> {
        let url = self.url(HEALTH_PATH);
        let response = self
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(&url, e))?;
        Ok(response.status())
    }

    async fn fetch_config(&self) -> Result<TransformCoreConfig, ClientError> {
        let url = self.url(CONFIG_PATH);
        let response = self
            .get(&url)
            .query(&[("configVersion", CONFIG_VERSION)])
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let config = response
            .json::<TransformCoreConfig>()
            .await
            .map_err(|e| ClientError::Decode {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        debug!("Retrieved transform config from {}", url);
        Ok(config)
    }

    async fn transform(&self, request: TransformRequest) -> Result<ByteStream, ConversionError> {
        let url = self.url(TRANSFORM_PATH);
        let TransformRequest {
            input,
            source,
            target,
        } = request;

        let file_name = input.file_name_or_default().to_string();
        let length = input.length();
        let body = input.into_body();
        let file_part = match length {
            Some(length) => multipart::Part::stream_with_length(body, length),
            None => multipart::Part::stream(body),
        }
        .file_name(file_name)
        .mime_str(&source.essence())
        .map_err(|e| ConversionError::InvalidRequest(e.to_string()))?;

        let form = multipart::Form::new()
            .part("file", file_part)
            .text("sourceMimetype", source.essence())
            .text("targetMimetype", target.essence());

        debug!("Calling POST {} ({} -> {})", url, source, target);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ConversionError::Transport(ClientError::from_reqwest(&url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConversionError::remote(status.as_u16(), body));
        }
        debug!("POST to {} done", url);

        let stream = response
            .bytes_stream()
            .map_err(|e| ConversionError::Stream(e.to_string()));
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = HttpTransformApi::new("http://localhost:8090/", None).unwrap();
        assert_eq!(api.base_url(), "http://localhost:8090");
        assert_eq!(api.url(HEALTH_PATH), "http://localhost:8090/actuator/health");
        assert_eq!(api.url(CONFIG_PATH), "http://localhost:8090/transform/config");
    }

    #[tokio::test]
    async fn test_health_connection_refused_is_error() {
        // Port 9 (discard) is closed on test machines.
        let api =
            HttpTransformApi::new("http://127.0.0.1:9", Some(Duration::from_secs(2))).unwrap();
        let result = api.health().await;
        assert!(matches!(
            result,
            Err(ClientError::ConnectionFailed { .. })
                | Err(ClientError::Timeout { .. })
                | Err(ClientError::Request { .. })
        ));
    }
}

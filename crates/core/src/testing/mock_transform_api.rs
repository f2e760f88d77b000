//! Mock transform service API for testing.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use reqwest::StatusCode;
use tokio::sync::RwLock;

use crate::capability::TransformCoreConfig;
use crate::client::{ClientError, TransformApi, TransformRequest};
use crate::provider::{ByteStream, ConversionError};

/// A recorded `POST /transform` call.
#[derive(Debug, Clone)]
pub struct RecordedTransform {
    pub file_name: String,
    pub source_mimetype: String,
    pub target_mimetype: String,
    pub content: Bytes,
}

/// Mock implementation of the TransformApi trait.
///
/// Provides controllable behavior for testing:
/// - Script health responses (queued, then a default status)
/// - Serve a configurable configuration document
/// - Record conversions and return canned output or a queued error
#[derive(Debug, Clone)]
pub struct MockTransformApi {
    base_url: String,
    /// Health responses returned in order before falling back to the default.
    health_script: Arc<RwLock<VecDeque<Result<StatusCode, ClientError>>>>,
    default_health: Arc<RwLock<StatusCode>>,
    health_calls: Arc<RwLock<u32>>,
    config: Arc<RwLock<TransformCoreConfig>>,
    next_config_error: Arc<RwLock<Option<ClientError>>>,
    config_calls: Arc<RwLock<u32>>,
    transforms: Arc<RwLock<Vec<RecordedTransform>>>,
    transform_output: Arc<RwLock<Bytes>>,
    next_transform_error: Arc<RwLock<Option<ConversionError>>>,
}

impl Default for MockTransformApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransformApi {
    /// Create a healthy mock with an empty configuration.
    pub fn new() -> Self {
        Self::with_base_url("http://mock-transform")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            health_script: Arc::new(RwLock::new(VecDeque::new())),
            default_health: Arc::new(RwLock::new(StatusCode::OK)),
            health_calls: Arc::new(RwLock::new(0)),
            config: Arc::new(RwLock::new(TransformCoreConfig::default())),
            next_config_error: Arc::new(RwLock::new(None)),
            config_calls: Arc::new(RwLock::new(0)),
            transforms: Arc::new(RwLock::new(Vec::new())),
            transform_output: Arc::new(RwLock::new(Bytes::from_static(b"converted"))),
            next_transform_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Queue a health response.
    pub async fn push_health(&self, response: Result<StatusCode, ClientError>) {
        self.health_script.write().await.push_back(response);
    }

    /// Status returned once the health script is exhausted.
    pub async fn set_default_health(&self, status: StatusCode) {
        *self.default_health.write().await = status;
    }

    pub async fn health_calls(&self) -> u32 {
        *self.health_calls.read().await
    }

    pub async fn set_config(&self, config: TransformCoreConfig) {
        *self.config.write().await = config;
    }

    /// Configure the next config fetch to fail with the given error.
    pub async fn fail_next_config(&self, error: ClientError) {
        *self.next_config_error.write().await = Some(error);
    }

    pub async fn config_calls(&self) -> u32 {
        *self.config_calls.read().await
    }

    pub async fn set_transform_output(&self, output: impl Into<Bytes>) {
        *self.transform_output.write().await = output.into();
    }

    /// Configure the next transform call to fail with the given error.
    pub async fn fail_next_transform(&self, error: ConversionError) {
        *self.next_transform_error.write().await = Some(error);
    }

    /// Get all recorded transform calls.
    pub async fn recorded_transforms(&self) -> Vec<RecordedTransform> {
        self.transforms.read().await.clone()
    }
}

#[async_trait]
impl TransformApi for MockTransformApi {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn health(&self) -> Result<StatusCode, ClientError> {
        *self.health_calls.write().await += 1;
        match self.health_script.write().await.pop_front() {
            Some(response) => response,
            None => Ok(*self.default_health.read().await),
        }
    }

    async fn fetch_config(&self) -> Result<TransformCoreConfig, ClientError> {
        *self.config_calls.write().await += 1;
        if let Some(err) = self.next_config_error.write().await.take() {
            return Err(err);
        }
        Ok(self.config.read().await.clone())
    }

    async fn transform(&self, request: TransformRequest) -> Result<ByteStream, ConversionError> {
        let file_name = request.input.file_name_or_default().to_string();
        let content = request.input.into_bytes().await?;

        self.transforms.write().await.push(RecordedTransform {
            file_name,
            source_mimetype: request.source.essence(),
            target_mimetype: request.target.essence(),
            content,
        });

        if let Some(err) = self.next_transform_error.write().await.take() {
            return Err(err);
        }

        let output = self.transform_output.read().await.clone();
        Ok(Box::pin(stream::iter(vec![Ok(output)])))
    }
}

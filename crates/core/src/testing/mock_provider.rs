//! Mock rendition provider for testing.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use tokio::sync::RwLock;

use crate::media_type::MediaType;
use crate::provider::{ByteStream, ConversionError, RenditionInput, RenditionProvider};

/// In-process provider that echoes a canned output.
#[derive(Debug, Clone)]
pub struct MockRenditionProvider {
    name: String,
    source: MediaType,
    targets: BTreeSet<MediaType>,
    output: Arc<RwLock<Bytes>>,
    next_error: Arc<RwLock<Option<ConversionError>>>,
    conversions: Arc<RwLock<Vec<(Bytes, MediaType)>>>,
}

impl MockRenditionProvider {
    /// Create a provider from raw media type strings.
    ///
    /// # Panics
    ///
    /// Panics if any media type is malformed.
    pub fn new(name: &str, source: &str, targets: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            source: MediaType::parse(source).expect("invalid source media type"),
            targets: targets
                .iter()
                .map(|t| MediaType::parse(t).expect("invalid target media type"))
                .collect(),
            output: Arc::new(RwLock::new(Bytes::from_static(b"rendition"))),
            next_error: Arc::new(RwLock::new(None)),
            conversions: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn set_output(&self, output: impl Into<Bytes>) {
        *self.output.write().await = output.into();
    }

    /// Configure the next conversion to fail with the given error.
    pub async fn set_next_error(&self, error: ConversionError) {
        *self.next_error.write().await = Some(error);
    }

    /// Inputs and targets of all conversions performed.
    pub async fn conversions(&self) -> Vec<(Bytes, MediaType)> {
        self.conversions.read().await.clone()
    }
}

#[async_trait]
impl RenditionProvider for MockRenditionProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn consumes(&self) -> &MediaType {
        &self.source
    }

    fn produces(&self) -> &BTreeSet<MediaType> {
        &self.targets
    }

    async fn convert(
        &self,
        input: RenditionInput,
        target: &MediaType,
    ) -> Result<ByteStream, ConversionError> {
        if !self.can_produce(target) {
            return Err(ConversionError::UnsupportedTarget {
                source_type: self.source.clone(),
                target: target.clone(),
            });
        }

        let content = input.into_bytes().await?;
        self.conversions
            .write()
            .await
            .push((content, target.clone()));

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let output = self.output.read().await.clone();
        Ok(Box::pin(stream::iter(vec![Ok(output)])))
    }
}

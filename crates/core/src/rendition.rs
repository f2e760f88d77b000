//! Request-time access to registered rendition providers.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::media_type::MediaType;
use crate::provider::{ByteStream, ConversionError, RenditionInput, RenditionProvider};
use crate::registry::{ComponentRegistry, HandlerId};

/// Errors returned by [`RenditionService::convert`].
#[derive(Debug, Error)]
pub enum RenditionError {
    #[error("no provider converts {from} to {to}")]
    NoProvider { from: MediaType, to: MediaType },

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// A registered provider as shown to API clients.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSummary {
    pub id: HandlerId,
    pub service: String,
    pub consumes: MediaType,
    pub produces: BTreeSet<MediaType>,
}

/// Finds a provider for a conversion and runs it.
#[derive(Clone)]
pub struct RenditionService {
    registry: Arc<dyn ComponentRegistry>,
}

impl RenditionService {
    pub fn new(registry: Arc<dyn ComponentRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<dyn ComponentRegistry> {
        &self.registry
    }

    /// Every registered provider, ordered by ID.
    pub async fn providers(&self) -> Vec<ProviderSummary> {
        self.registry
            .handlers()
            .await
            .into_iter()
            .map(|(id, provider)| ProviderSummary {
                id,
                service: provider.name().to_string(),
                consumes: provider.consumes().clone(),
                produces: provider.produces().clone(),
            })
            .collect()
    }

    pub async fn can_convert(&self, from: &MediaType, to: &MediaType) -> bool {
        self.find(from, to).await.is_some()
    }

    /// Convert `input` from `from` to `to` with the first matching provider.
    pub async fn convert(
        &self,
        from: &MediaType,
        input: RenditionInput,
        to: &MediaType,
    ) -> Result<ByteStream, RenditionError> {
        let (id, provider) = self
            .find(from, to)
            .await
            .ok_or_else(|| RenditionError::NoProvider {
                from: from.normalized(),
                to: to.normalized(),
            })?;
        debug!(handler = %id, "Converting {} to {}", from, to);
        Ok(provider.convert(input, to).await?)
    }

    async fn find(
        &self,
        from: &MediaType,
        to: &MediaType,
    ) -> Option<(HandlerId, Arc<dyn RenditionProvider>)> {
        self.registry
            .handlers()
            .await
            .into_iter()
            .find(|(_, provider)| provider.consumes() == from && provider.can_produce(to))
    }
}

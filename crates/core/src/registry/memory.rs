//! In-memory component registry.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ComponentRegistry, HandlerId, RegistryError};
use crate::provider::RenditionProvider;

/// Registry backed by a map guarded by an async `RwLock`.
///
/// Removing a provider does not affect conversions already holding it.
#[derive(Default)]
pub struct InMemoryRegistry {
    handlers: RwLock<BTreeMap<HandlerId, Arc<dyn RenditionProvider>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.handlers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.handlers.read().await.is_empty()
    }
}

#[async_trait]
impl ComponentRegistry for InMemoryRegistry {
    async fn list_handler_ids(&self) -> BTreeSet<HandlerId> {
        self.handlers.read().await.keys().cloned().collect()
    }

    async fn register(
        &self,
        id: HandlerId,
        provider: Arc<dyn RenditionProvider>,
    ) -> Result<(), RegistryError> {
        let mut handlers = self.handlers.write().await;
        if handlers.contains_key(&id) {
            return Err(RegistryError::AlreadyRegistered(id));
        }
        handlers.insert(id, provider);
        Ok(())
    }

    async fn unregister(&self, id: &HandlerId) -> bool {
        self.handlers.write().await.remove(id).is_some()
    }

    async fn contains(&self, id: &HandlerId) -> bool {
        self.handlers.read().await.contains_key(id)
    }

    async fn get(&self, id: &HandlerId) -> Option<Arc<dyn RenditionProvider>> {
        self.handlers.read().await.get(id).cloned()
    }

    async fn handlers(&self) -> Vec<(HandlerId, Arc<dyn RenditionProvider>)> {
        self.handlers
            .read()
            .await
            .iter()
            .map(|(id, provider)| (id.clone(), Arc::clone(provider)))
            .collect()
    }
}

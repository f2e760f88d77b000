//! Component registry for rendition providers.
//!
//! The registry holds every live provider keyed by its [`HandlerId`]. Loaders
//! add and remove entries during discovery; request-time code looks providers
//! up through it.

mod memory;

pub use memory::InMemoryRegistry;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::media_type::MediaType;
use crate::provider::RenditionProvider;

/// Errors raised by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("handler already registered: {0}")]
    AlreadyRegistered(HandlerId),
}

/// Identifier of a registered provider: `<service>_<source media type>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct HandlerId(String);

impl HandlerId {
    /// Derive the ID for `service` and (normalized) `source`.
    pub fn derive(service: &str, source: &MediaType) -> Self {
        Self(format!("{}{}", Self::prefix(service), source.essence()))
    }

    /// Prefix shared by every handler of `service`.
    pub fn prefix(service: &str) -> String {
        format!("{}_", service)
    }

    pub fn belongs_to(&self, service: &str) -> bool {
        self.0.starts_with(&Self::prefix(service))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for HandlerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for HandlerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Storage for live rendition providers.
///
/// Implementations must be safe for concurrent use; each call is atomic on
/// its own.
#[async_trait]
pub trait ComponentRegistry: Send + Sync {
    /// IDs of every registered handler.
    async fn list_handler_ids(&self) -> BTreeSet<HandlerId>;

    /// Register a provider under `id`. Fails if the ID is taken.
    async fn register(
        &self,
        id: HandlerId,
        provider: Arc<dyn RenditionProvider>,
    ) -> Result<(), RegistryError>;

    /// Remove the provider registered under `id`. Returns whether it existed.
    async fn unregister(&self, id: &HandlerId) -> bool;

    async fn contains(&self, id: &HandlerId) -> bool;

    async fn get(&self, id: &HandlerId) -> Option<Arc<dyn RenditionProvider>>;

    /// Every registered provider, ordered by ID.
    async fn handlers(&self) -> Vec<(HandlerId, Arc<dyn RenditionProvider>)>;
}

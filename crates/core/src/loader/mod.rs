//! Discovery of rendition providers from remote transform services.
//!
//! A [`ServiceLoader`] runs one discovery cycle for one service: probe its
//! health, fetch its configuration, resolve capabilities and reconcile the
//! registry. The [`LoaderExecutor`] runs every loader, once or periodically,
//! and never lets one service's failure affect another.

mod executor;
mod transform_core;

pub use executor::{LoaderExecutor, LoaderOutcome};
pub use transform_core::TransformCoreLoader;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::client::ClientError;
use crate::registry::{HandlerId, RegistryError};

/// Errors that end a discovery cycle early.
///
/// Handlers registered by earlier cycles stay live whatever the error.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The service never answered its health check with 200 OK, or shutdown
    /// was requested while waiting to retry.
    #[error("transform service {service} is not healthy after {attempts} attempt(s)")]
    Unhealthy { service: String, attempts: u32 },

    /// The configuration document could not be retrieved or decoded.
    #[error("failed to fetch configuration of {service}: {source}")]
    ConfigFetch {
        service: String,
        #[source]
        source: ClientError,
    },

    /// The registry rejected a change. `added` and `removed` list the
    /// changes applied before the failure; they stay in effect.
    #[error("failed to update registry for {service}: {source}")]
    Registry {
        service: String,
        added: Vec<HandlerId>,
        removed: Vec<HandlerId>,
        #[source]
        source: RegistryError,
    },
}

impl LoaderError {
    /// Label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unhealthy { .. } => "unhealthy",
            Self::ConfigFetch { .. } => "config_fetch",
            Self::Registry { .. } => "registry",
        }
    }
}

/// Outcome of a successful discovery cycle.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub service: String,
    pub added: Vec<HandlerId>,
    pub removed: Vec<HandlerId>,
    pub unchanged: Vec<HandlerId>,
    pub timestamp: DateTime<Utc>,
}

impl LoadReport {
    /// Whether the cycle changed the registry.
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// A source of rendition providers.
#[async_trait]
pub trait ServiceLoader: Send + Sync {
    /// Name of the service this loader discovers.
    fn name(&self) -> &str;

    /// Run one discovery cycle.
    async fn load(&self) -> Result<LoadReport, LoaderError>;
}

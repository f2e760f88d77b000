//! Loader for remote transform services.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::{LoadReport, LoaderError, ServiceLoader};
use crate::capability::resolve;
use crate::client::{ClientError, HttpTransformApi, TransformApi};
use crate::config::RemoteServiceDescriptor;
use crate::health::{no_shutdown, HealthGate};
use crate::metrics;
use crate::provider::{RenditionProvider, TransformCoreProvider};
use crate::reconciler::{reconcile, ReconcilePlan};
use crate::registry::ComponentRegistry;

/// Keeps the registry in line with what one transform service offers.
///
/// Every provider created by this loader shares its [`TransformApi`], so all
/// conversions for a service go through one connection pool.
pub struct TransformCoreLoader {
    descriptor: RemoteServiceDescriptor,
    gate: HealthGate,
    api: Arc<dyn TransformApi>,
    registry: Arc<dyn ComponentRegistry>,
    shutdown: watch::Receiver<bool>,
    /// Serializes this service's cycles.
    cycle: Mutex<()>,
}

impl TransformCoreLoader {
    pub fn new(
        descriptor: RemoteServiceDescriptor,
        api: Arc<dyn TransformApi>,
        registry: Arc<dyn ComponentRegistry>,
    ) -> Self {
        let gate = HealthGate::new(
            descriptor.name.clone(),
            descriptor.max_retries,
            descriptor.retry_interval,
        );
        Self {
            descriptor,
            gate,
            api,
            registry,
            shutdown: no_shutdown(),
            cycle: Mutex::new(()),
        }
    }

    /// Create a loader talking HTTP to the descriptor's base URL.
    pub fn from_descriptor(
        descriptor: RemoteServiceDescriptor,
        registry: Arc<dyn ComponentRegistry>,
    ) -> Result<Self, ClientError> {
        let api = HttpTransformApi::new(descriptor.base_url.clone(), descriptor.request_timeout)?;
        Ok(Self::new(descriptor, Arc::new(api), registry))
    }

    /// Abort health probe backoff once `shutdown` turns true.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn descriptor(&self) -> &RemoteServiceDescriptor {
        &self.descriptor
    }

    async fn discover(&self) -> Result<LoadReport, LoaderError> {
        let service = self.descriptor.name.as_str();

        let status = self.gate.check(self.api.as_ref(), &self.shutdown).await;
        if !status.is_healthy() {
            return Err(LoaderError::Unhealthy {
                service: service.to_string(),
                attempts: status.attempts(),
            });
        }

        let config = self
            .api
            .fetch_config()
            .await
            .map_err(|source| LoaderError::ConfigFetch {
                service: service.to_string(),
                source,
            })?;

        let capabilities = resolve(Some(&config));
        debug!(
            service,
            sources = capabilities.len(),
            capabilities = capabilities.capability_count(),
            "Resolved capabilities"
        );

        let live = self.registry.list_handler_ids().await;
        let plan = reconcile(service, &capabilities, &live);
        self.apply(plan).await
    }

    async fn apply(&self, plan: ReconcilePlan) -> Result<LoadReport, LoaderError> {
        let service = self.descriptor.name.as_str();
        let ReconcilePlan {
            to_remove,
            to_add,
            unchanged,
        } = plan;

        let mut removed = Vec::with_capacity(to_remove.len());
        for id in to_remove {
            if self.registry.unregister(&id).await {
                debug!(service, handler = %id, "Removed provider");
                removed.push(id);
            }
        }

        let mut added = Vec::with_capacity(to_add.len());
        for handler in to_add {
            if self.registry.contains(&handler.id).await {
                warn!(
                    service,
                    handler = %handler.id,
                    "Provider was registered concurrently, skipping"
                );
                continue;
            }

            let provider: Arc<dyn RenditionProvider> = Arc::new(TransformCoreProvider::new(
                service,
                Arc::clone(&self.api),
                handler.source,
                handler.targets,
            ));
            if let Err(source) = self.registry.register(handler.id.clone(), provider).await {
                self.update_registered_gauge().await;
                return Err(LoaderError::Registry {
                    service: service.to_string(),
                    added,
                    removed,
                    source,
                });
            }
            debug!(service, handler = %handler.id, "Registered provider");
            added.push(handler.id);
        }

        self.update_registered_gauge().await;

        Ok(LoadReport {
            service: service.to_string(),
            added,
            removed,
            unchanged,
            timestamp: Utc::now(),
        })
    }

    async fn update_registered_gauge(&self) {
        let service = self.descriptor.name.as_str();
        let registered = self
            .registry
            .list_handler_ids()
            .await
            .iter()
            .filter(|id| id.belongs_to(service))
            .count();
        metrics::PROVIDERS_REGISTERED
            .with_label_values(&[service])
            .set(registered as i64);
    }
}

#[async_trait]
impl ServiceLoader for TransformCoreLoader {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    async fn load(&self) -> Result<LoadReport, LoaderError> {
        let _cycle = self.cycle.lock().await;
        let service = self.descriptor.name.as_str();

        let result = self.discover().await;
        match &result {
            Ok(report) => {
                metrics::DISCOVERY_CYCLES
                    .with_label_values(&[service, "success"])
                    .inc();
                info!(
                    added = report.added.len(),
                    removed = report.removed.len(),
                    unchanged = report.unchanged.len(),
                    "Loader {} loaded providers",
                    service
                );
            }
            Err(e) => {
                metrics::DISCOVERY_CYCLES
                    .with_label_values(&[service, e.kind()])
                    .inc();
            }
        }
        result
    }
}

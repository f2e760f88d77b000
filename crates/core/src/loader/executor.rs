//! Runs every configured loader.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{LoadReport, LoaderError, ServiceLoader};
use crate::health::wait_for_shutdown;

/// Result of one loader within an executor run.
#[derive(Debug)]
pub struct LoaderOutcome {
    pub service: String,
    pub result: Result<LoadReport, LoaderError>,
}

impl LoaderOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs all loaders concurrently, isolating their failures.
pub struct LoaderExecutor {
    loaders: Vec<Arc<dyn ServiceLoader>>,
    active: bool,
}

impl LoaderExecutor {
    pub fn new(loaders: Vec<Arc<dyn ServiceLoader>>, active: bool) -> Self {
        Self { loaders, active }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn loader_names(&self) -> Vec<&str> {
        self.loaders.iter().map(|l| l.name()).collect()
    }

    /// Run one discovery cycle for every loader.
    ///
    /// Returns nothing when the executor is inactive. Loader errors are
    /// logged and returned, never propagated.
    pub async fn run_once(&self) -> Vec<LoaderOutcome> {
        if !self.active {
            info!("Loaders are disabled, skipping discovery");
            return Vec::new();
        }

        join_all(self.loaders.iter().map(|loader| async move {
            let result = loader.load().await;
            if let Err(e) = &result {
                warn!(loader = loader.name(), "Discovery failed: {}", e);
            }
            LoaderOutcome {
                service: loader.name().to_string(),
                result,
            }
        }))
        .await
    }

    /// Run discovery now and then every `interval` until `shutdown` is set.
    pub fn spawn_polling(
        self: Arc<Self>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Discovery polling started (every {:?})", interval);
            loop {
                if *shutdown.borrow() {
                    break;
                }
                self.run_once().await;
                tokio::select! {
                    _ = wait_for_shutdown(&mut shutdown) => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            info!("Discovery polling stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::TransformCoreLoader;
    use crate::registry::{ComponentRegistry, HandlerId, InMemoryRegistry};
    use crate::testing::{fixtures, MockTransformApi};
    use async_trait::async_trait;
    use chrono::Utc;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Loader that only counts its cycles.
    struct CountingLoader {
        name: String,
        cycles: AtomicU32,
    }

    impl CountingLoader {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                cycles: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl ServiceLoader for CountingLoader {
        fn name(&self) -> &str {
            &self.name
        }

        async fn load(&self) -> Result<LoadReport, LoaderError> {
            self.cycles.fetch_add(1, Ordering::SeqCst);
            Ok(LoadReport {
                service: self.name.clone(),
                added: Vec::new(),
                removed: Vec::new(),
                unchanged: Vec::new(),
                timestamp: Utc::now(),
            })
        }
    }

    #[tokio::test]
    async fn test_inactive_executor_does_nothing() {
        let loader = CountingLoader::new("alfresco");
        let executor = LoaderExecutor::new(vec![loader.clone()], false);

        assert!(executor.run_once().await.is_empty());
        assert_eq!(loader.cycles.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_loader_does_not_block_others() {
        let registry = Arc::new(InMemoryRegistry::new());

        let down = MockTransformApi::with_base_url("http://down");
        down.set_default_health(StatusCode::SERVICE_UNAVAILABLE).await;
        let up = MockTransformApi::with_base_url("http://up");
        up.set_config(fixtures::config(&[("t1", "text/html", "application/pdf")]))
            .await;

        let loaders: Vec<Arc<dyn ServiceLoader>> = vec![
            Arc::new(TransformCoreLoader::new(
                fixtures::descriptor("down", "http://down"),
                Arc::new(down),
                registry.clone(),
            )),
            Arc::new(TransformCoreLoader::new(
                fixtures::descriptor("up", "http://up"),
                Arc::new(up),
                registry.clone(),
            )),
        ];
        let executor = LoaderExecutor::new(loaders, true);
        assert_eq!(executor.loader_names(), vec!["down", "up"]);

        let outcomes = executor.run_once().await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].service, "down");
        assert!(matches!(
            outcomes[0].result,
            Err(LoaderError::Unhealthy { .. })
        ));
        assert!(outcomes[1].is_success());
        assert!(registry.contains(&HandlerId::from("up_text/html")).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_repeats_until_shutdown() {
        let loader = CountingLoader::new("alfresco");
        let executor = Arc::new(LoaderExecutor::new(vec![loader.clone()], true));
        let (tx, rx) = watch::channel(false);

        let handle = executor.spawn_polling(Duration::from_secs(30), rx);

        tokio::time::sleep(Duration::from_secs(75)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        // t = 0, 30 and 60
        assert_eq!(loader.cycles.load(Ordering::SeqCst), 3);
    }
}

//! Health gate for remote transform services.
//!
//! Discovery only proceeds once the service reports itself healthy. The gate
//! makes a bounded number of attempts and sleeps between them; a shutdown
//! signal received while sleeping ends the probe immediately.

use std::time::Duration;

use reqwest::StatusCode;
use tokio::sync::watch;
use tracing::debug;

use crate::client::TransformApi;
use crate::metrics;

/// Result of a health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// The service answered 200 OK.
    Healthy { attempts: u32 },
    /// Every attempt failed.
    Unreachable { attempts: u32 },
    /// Shutdown was requested while waiting between attempts.
    Cancelled { attempts: u32 },
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy { .. })
    }

    pub fn attempts(&self) -> u32 {
        match *self {
            Self::Healthy { attempts }
            | Self::Unreachable { attempts }
            | Self::Cancelled { attempts } => attempts,
        }
    }
}

/// Bounded-retry health probe.
#[derive(Debug, Clone)]
pub struct HealthGate {
    service: String,
    max_retries: u32,
    retry_interval: Duration,
}

impl HealthGate {
    pub fn new(service: impl Into<String>, max_retries: u32, retry_interval: Duration) -> Self {
        Self {
            service: service.into(),
            max_retries,
            retry_interval,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    /// Returns `true` once the service answers 200 OK.
    pub async fn probe(&self, api: &dyn TransformApi, shutdown: &watch::Receiver<bool>) -> bool {
        self.check(api, shutdown).await.is_healthy()
    }

    /// Probe the service, reporting how many attempts were made.
    ///
    /// Sleeps `retry_interval` between attempts but not after the last one.
    /// Transport errors count as failed attempts.
    pub async fn check(
        &self,
        api: &dyn TransformApi,
        shutdown: &watch::Receiver<bool>,
    ) -> HealthStatus {
        let mut shutdown = shutdown.clone();

        for attempt in 1..=self.max_retries {
            match api.health().await {
                Ok(status) if status == StatusCode::OK => {
                    self.record("up");
                    debug!(service = %self.service, attempt, "Health check succeeded");
                    return HealthStatus::Healthy { attempts: attempt };
                }
                Ok(status) => {
                    self.record("down");
                    debug!(
                        service = %self.service,
                        "Health check attempt {} returned HTTP {}",
                        attempt,
                        status
                    );
                }
                Err(e) => {
                    self.record("error");
                    debug!(
                        service = %self.service,
                        "Health check attempt {} failed: {}",
                        attempt,
                        e
                    );
                }
            }

            if attempt == self.max_retries {
                break;
            }

            tokio::select! {
                _ = wait_for_shutdown(&mut shutdown) => {
                    debug!(service = %self.service, "Health check interrupted by shutdown");
                    return HealthStatus::Cancelled { attempts: attempt };
                }
                _ = tokio::time::sleep(self.retry_interval) => {}
            }
        }

        HealthStatus::Unreachable {
            attempts: self.max_retries,
        }
    }

    fn record(&self, result: &str) {
        metrics::HEALTH_PROBE_ATTEMPTS
            .with_label_values(&[self.service.as_str(), result])
            .inc();
    }
}

/// Resolves once shutdown is requested. Never resolves if the sender is gone.
pub(crate) async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// A shutdown receiver that never fires.
pub fn no_shutdown() -> watch::Receiver<bool> {
    watch::channel(false).1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientError;
    use crate::testing::MockTransformApi;
    use tokio::time::Instant;

    const INTERVAL: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt_after_two_sleeps() {
        let api = MockTransformApi::new();
        api.push_health(Ok(StatusCode::SERVICE_UNAVAILABLE)).await;
        api.push_health(Err(ClientError::ConnectionFailed {
            url: "http://transform".to_string(),
            reason: "connection refused".to_string(),
        }))
        .await;
        api.push_health(Ok(StatusCode::OK)).await;

        let gate = HealthGate::new("alfresco", 3, INTERVAL);
        let started = Instant::now();
        let status = gate.check(&api, &no_shutdown()).await;

        assert_eq!(status, HealthStatus::Healthy { attempts: 3 });
        assert_eq!(api.health_calls().await, 3);
        assert_eq!(started.elapsed(), INTERVAL * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_unavailable_fails_after_max_retries_and_one_sleep() {
        let api = MockTransformApi::new();
        api.set_default_health(StatusCode::SERVICE_UNAVAILABLE).await;

        let gate = HealthGate::new("alfresco", 2, INTERVAL);
        let started = Instant::now();
        let healthy = gate.probe(&api, &no_shutdown()).await;

        assert!(!healthy);
        assert_eq!(api.health_calls().await, 2);
        assert_eq!(started.elapsed(), INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_ok_short_circuits() {
        let api = MockTransformApi::new();
        let gate = HealthGate::new("alfresco", 5, INTERVAL);
        let started = Instant::now();

        assert!(gate.probe(&api, &no_shutdown()).await);
        assert_eq!(api.health_calls().await, 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_ok_success_status_is_not_healthy() {
        let api = MockTransformApi::new();
        api.set_default_health(StatusCode::NO_CONTENT).await;

        let gate = HealthGate::new("alfresco", 2, INTERVAL);
        assert!(!gate.probe(&api, &no_shutdown()).await);
    }

    #[tokio::test]
    async fn test_zero_retries_makes_no_attempt() {
        let api = MockTransformApi::new();
        let gate = HealthGate::new("alfresco", 0, INTERVAL);

        let status = gate.check(&api, &no_shutdown()).await;
        assert_eq!(status, HealthStatus::Unreachable { attempts: 0 });
        assert_eq!(api.health_calls().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_during_sleep_aborts_probe() {
        let api = MockTransformApi::new();
        api.set_default_health(StatusCode::SERVICE_UNAVAILABLE).await;
        let (tx, rx) = watch::channel(false);

        let gate = HealthGate::new("alfresco", 10, Duration::from_secs(60));
        let handle = tokio::spawn({
            let api = api.clone();
            async move { gate.check(&api, &rx).await }
        });

        tokio::time::sleep(Duration::from_secs(90)).await;
        tx.send(true).unwrap();

        let status = handle.await.unwrap();
        assert_eq!(status, HealthStatus::Cancelled { attempts: 2 });
        assert_eq!(api.health_calls().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_already_requested_stops_after_first_attempt() {
        let api = MockTransformApi::new();
        api.set_default_health(StatusCode::SERVICE_UNAVAILABLE).await;
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let gate = HealthGate::new("alfresco", 3, INTERVAL);
        let status = gate.check(&api, &rx).await;
        assert_eq!(status, HealthStatus::Cancelled { attempts: 1 });
    }

    #[test]
    fn test_status_accessors() {
        assert!(HealthStatus::Healthy { attempts: 1 }.is_healthy());
        assert!(!HealthStatus::Cancelled { attempts: 1 }.is_healthy());
        assert_eq!(HealthStatus::Unreachable { attempts: 4 }.attempts(), 4);
    }
}

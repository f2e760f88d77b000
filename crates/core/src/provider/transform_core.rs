//! Provider backed by a remote transform service.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::debug;

use super::error::ConversionError;
use super::traits::RenditionProvider;
use super::types::{ByteStream, RenditionInput};
use crate::client::{TransformApi, TransformRequest};
use crate::media_type::MediaType;
use crate::metrics;

/// Converts one source media type through a remote transform service.
///
/// The source and target set are fixed for the lifetime of the provider;
/// capability changes are applied by replacing the provider.
pub struct TransformCoreProvider {
    service: String,
    api: Arc<dyn TransformApi>,
    source: MediaType,
    targets: BTreeSet<MediaType>,
}

impl TransformCoreProvider {
    pub fn new(
        service: impl Into<String>,
        api: Arc<dyn TransformApi>,
        source: MediaType,
        targets: BTreeSet<MediaType>,
    ) -> Self {
        Self {
            service: service.into(),
            api,
            source: source.normalized(),
            targets: targets.iter().map(MediaType::normalized).collect(),
        }
    }

    pub fn base_url(&self) -> &str {
        self.api.base_url()
    }
}

impl std::fmt::Debug for TransformCoreProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformCoreProvider")
            .field("service", &self.service)
            .field("base_url", &self.api.base_url())
            .field("source", &self.source)
            .field("targets", &self.targets)
            .finish()
    }
}

#[async_trait]
impl RenditionProvider for TransformCoreProvider {
    fn name(&self) -> &str {
        &self.service
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
        let target = target.normalized();
        if !self.targets.contains(&target) {
            metrics::CONVERSIONS
                .with_label_values(&[self.service.as_str(), "unsupported_target"])
                .inc();
            return Err(ConversionError::UnsupportedTarget {
                source_type: self.source.clone(),
                target,
            });
        }

        debug!(
            service = %self.service,
            file_name = input.file_name_or_default(),
            "Converting {} to {}",
            self.source,
            target
        );

        let started = Instant::now();
        let result = self
            .api
            .transform(TransformRequest {
                input,
                source: self.source.clone(),
                target,
            })
            .await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::CONVERSIONS
            .with_label_values(&[self.service.as_str(), outcome])
            .inc();
        metrics::CONVERSION_DURATION
            .with_label_values(&[self.service.as_str()])
            .observe(started.elapsed().as_secs_f64());

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::collect_bytes;
    use crate::testing::MockTransformApi;

    fn mt(s: &str) -> MediaType {
        MediaType::parse(s).unwrap()
    }

    fn provider(api: Arc<MockTransformApi>) -> TransformCoreProvider {
        TransformCoreProvider::new(
            "alfresco",
            api,
            mt("text/html"),
            [mt("application/pdf"), mt("image/png")].into_iter().collect(),
        )
    }

    #[test]
    fn test_consumes_and_produces() {
        let provider = provider(Arc::new(MockTransformApi::new()));
        assert_eq!(provider.name(), "alfresco");
        assert_eq!(provider.consumes(), &mt("text/html"));
        assert_eq!(provider.produces().len(), 2);
        assert!(provider.can_produce(&mt("application/pdf")));
        assert!(!provider.can_produce(&mt("text/plain")));
    }

    #[test]
    fn test_construction_normalizes() {
        let provider = TransformCoreProvider::new(
            "alfresco",
            Arc::new(MockTransformApi::new()),
            mt("text/html;charset=utf-8"),
            [mt("application/pdf;version=2")].into_iter().collect(),
        );
        assert_eq!(provider.consumes().to_string(), "text/html");
        assert_eq!(
            provider.produces().iter().next().unwrap().to_string(),
            "application/pdf"
        );
    }

    #[tokio::test]
    async fn test_convert_success_forwards_request() {
        let api = Arc::new(MockTransformApi::new());
        api.set_transform_output(b"%PDF-1.7".to_vec()).await;
        let provider = provider(Arc::clone(&api));

        let input = RenditionInput::from_bytes("<html></html>").with_file_name("page.html");
        let stream = provider.convert(input, &mt("application/pdf")).await.unwrap();
        assert_eq!(collect_bytes(stream).await.unwrap().as_ref(), b"%PDF-1.7");

        let calls = api.recorded_transforms().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].file_name, "page.html");
        assert_eq!(calls[0].source_mimetype, "text/html");
        assert_eq!(calls[0].target_mimetype, "application/pdf");
        assert_eq!(calls[0].content.as_ref(), b"<html></html>");
    }

    #[tokio::test]
    async fn test_convert_without_name_sends_placeholder() {
        let api = Arc::new(MockTransformApi::new());
        let provider = provider(Arc::clone(&api));

        provider
            .convert(RenditionInput::from_bytes("x"), &mt("image/png"))
            .await
            .unwrap();

        let calls = api.recorded_transforms().await;
        assert!(!calls[0].file_name.is_empty());
    }

    #[tokio::test]
    async fn test_convert_unsupported_target_fails_fast() {
        let api = Arc::new(MockTransformApi::new());
        let provider = provider(Arc::clone(&api));

        let result = provider
            .convert(RenditionInput::from_bytes("x"), &mt("text/plain"))
            .await;

        assert!(matches!(
            result,
            Err(ConversionError::UnsupportedTarget { .. })
        ));
        assert!(api.recorded_transforms().await.is_empty());
    }

    #[tokio::test]
    async fn test_convert_target_matching_ignores_parameters() {
        let api = Arc::new(MockTransformApi::new());
        let provider = provider(Arc::clone(&api));

        let result = provider
            .convert(RenditionInput::from_bytes("x"), &mt("Application/PDF; q=0.9"))
            .await;
        assert!(result.is_ok());
        assert_eq!(
            api.recorded_transforms().await[0].target_mimetype,
            "application/pdf"
        );
    }

    #[tokio::test]
    async fn test_convert_remote_failure_is_surfaced() {
        let api = Arc::new(MockTransformApi::new());
        api.fail_next_transform(ConversionError::remote(500, "engine crashed"))
            .await;
        let provider = provider(Arc::clone(&api));

        let result = provider
            .convert(RenditionInput::from_bytes("x"), &mt("application/pdf"))
            .await;
        match result {
            Err(ConversionError::Remote { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "engine crashed");
            }
            other => panic!("expected remote error, got {:?}", other.map(|_| ())),
        }

        // Not retried
        assert_eq!(api.recorded_transforms().await.len(), 1);
    }
}

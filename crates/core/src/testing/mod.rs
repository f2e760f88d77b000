//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external service traits,
//! allowing discovery and dispatch to be tested without a running transform
//! service.
//!
//! # Example
//!
//! ```rust,ignore
//! use renditions_core::testing::{fixtures, MockTransformApi};
//!
//! let api = MockTransformApi::new();
//! api.set_config(fixtures::config(&[("t1", "text/html", "application/pdf")])).await;
//! api.set_default_health(StatusCode::SERVICE_UNAVAILABLE).await;
//! ```

mod mock_provider;
mod mock_transform_api;

pub use mock_provider::MockRenditionProvider;
pub use mock_transform_api::{MockTransformApi, RecordedTransform};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::time::Duration;

    use crate::capability::{SupportedSourceAndTarget, TransformCoreConfig, Transformer};
    use crate::config::RemoteServiceDescriptor;
    use crate::media_type::MediaType;

    /// Build a configuration document from `(transformer, source, target)` rows.
    ///
    /// Rows sharing a transformer name are grouped into one transformer, in
    /// order of first appearance.
    pub fn config(rows: &[(&str, &str, &str)]) -> TransformCoreConfig {
        let mut transformers: Vec<Transformer> = Vec::new();
        for (name, source, target) in rows {
            let entry = SupportedSourceAndTarget {
                source_media_type: Some(source.to_string()),
                target_media_type: Some(target.to_string()),
                max_source_size_bytes: Some(-1),
                priority: Some(50),
            };
            match transformers
                .iter_mut()
                .find(|t| t.transformer_name.as_deref() == Some(*name))
            {
                Some(transformer) => transformer
                    .supported_source_and_target_list
                    .get_or_insert_with(Vec::new)
                    .push(entry),
                None => transformers.push(Transformer {
                    transformer_name: Some(name.to_string()),
                    supported_source_and_target_list: Some(vec![entry]),
                    ..Default::default()
                }),
            }
        }
        TransformCoreConfig {
            transformers: Some(transformers),
            ..Default::default()
        }
    }

    /// A descriptor with fast retries, suitable for tests.
    pub fn descriptor(name: &str, base_url: &str) -> RemoteServiceDescriptor {
        RemoteServiceDescriptor {
            name: name.to_string(),
            base_url: base_url.to_string(),
            max_retries: 2,
            retry_interval: Duration::from_millis(10),
            request_timeout: Some(Duration::from_secs(5)),
        }
    }

    /// Parse a media type, panicking on invalid input.
    pub fn media_type(raw: &str) -> MediaType {
        MediaType::parse(raw).expect("invalid media type in test fixture")
    }
}

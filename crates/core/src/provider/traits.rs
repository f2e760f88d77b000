//! Trait definitions for rendition providers.

use std::collections::BTreeSet;

use async_trait::async_trait;

use super::error::ConversionError;
use super::types::{ByteStream, RenditionInput};
use crate::media_type::MediaType;

/// Converts content of one source media type into one of several targets.
///
/// Implementations must be safe to call concurrently; each `convert` call is
/// independent.
#[async_trait]
pub trait RenditionProvider: Send + Sync {
    /// Name of the service backing this provider.
    fn name(&self) -> &str;

    /// The single source media type this provider accepts.
    fn consumes(&self) -> &MediaType;

    /// Every target media type reachable from [`consumes`](Self::consumes).
    fn produces(&self) -> &BTreeSet<MediaType>;

    /// Whether `target` is one of the produced media types.
    fn can_produce(&self, target: &MediaType) -> bool {
        self.produces().contains(target)
    }

    /// Converts `input` into `target`.
    ///
    /// The returned stream must be drained or dropped by the caller.
    async fn convert(
        &self,
        input: RenditionInput,
        target: &MediaType,
    ) -> Result<ByteStream, ConversionError>;
}

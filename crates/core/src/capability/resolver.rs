//! Resolution of a transform configuration into a [`CapabilityMap`].

use tracing::debug;

use super::config::{SupportedSourceAndTarget, TransformCoreConfig};
use super::CapabilityMap;
use crate::media_type::{MediaType, MediaTypeError};

/// Build the capability map for a configuration document.
///
/// Entries whose source or target media type does not parse are skipped and
/// logged at debug level; they never abort resolution of the rest. A missing
/// document or transformer list yields an empty map.
pub fn resolve(config: Option<&TransformCoreConfig>) -> CapabilityMap {
    let mut map = CapabilityMap::new();

    let Some(transformers) = config.and_then(|c| c.transformers.as_ref()) else {
        return map;
    };

    for transformer in transformers {
        let Some(entries) = transformer.supported_source_and_target_list.as_ref() else {
            continue;
        };

        for entry in entries {
            match parse_entry(entry) {
                Ok((source, target)) => map.insert(&source, &target),
                Err(e) => debug!(
                    "Skipping entry of transformer {} because source or target media type is not valid: {}",
                    transformer.display_name(),
                    e
                ),
            }
        }
    }

    map
}

fn parse_entry(
    entry: &SupportedSourceAndTarget,
) -> Result<(MediaType, MediaType), MediaTypeError> {
    let source = MediaType::parse(entry.source_media_type.as_deref().unwrap_or_default())?;
    let target = MediaType::parse(entry.target_media_type.as_deref().unwrap_or_default())?;
    Ok((source, target))
}

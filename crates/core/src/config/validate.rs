use std::collections::HashSet;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Service names are non-empty, unique, and made of ASCII letters, digits
///   or '-' (handler IDs use '_' to separate the name from the media type)
/// - Service URLs use http or https
/// - Every service makes at least one health probe attempt
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for descriptor in config.service_descriptors() {
        let name = &descriptor.name;
        if name.is_empty() {
            return Err(ConfigError::ValidationError(
                "transform_core.name cannot be empty".to_string(),
            ));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ConfigError::ValidationError(format!(
                "transform_core.name '{}' may only contain ASCII letters, digits and '-'",
                name
            )));
        }
        if !names.insert(name.clone()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate transform_core.name '{}'",
                name
            )));
        }
        if !(descriptor.base_url.starts_with("http://")
            || descriptor.base_url.starts_with("https://"))
        {
            return Err(ConfigError::ValidationError(format!(
                "transform_core '{}': url must start with http:// or https://",
                name
            )));
        }
        if descriptor.max_retries == 0 {
            return Err(ConfigError::ValidationError(format!(
                "transform_core '{}': max_retries must be at least 1",
                name
            )));
        }
    }

    Ok(())
}

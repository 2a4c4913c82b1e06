use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - origin_host is an http(s) URL prefix
/// - local_dest is not empty
/// - pool size, input buffer and request timeout are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let origin = config.origin_host.trim();
    if origin.is_empty() {
        return Err(ConfigError::ValidationError(
            "origin_host cannot be empty".to_string(),
        ));
    }
    if !origin.starts_with("http://") && !origin.starts_with("https://") {
        return Err(ConfigError::ValidationError(format!(
            "origin_host must start with http:// or https://, got {:?}",
            config.origin_host
        )));
    }

    let mirror = &config.mirror;
    if mirror.local_dest.is_empty() {
        return Err(ConfigError::ValidationError(
            "mirror.local_dest cannot be empty".to_string(),
        ));
    }
    if mirror.pool_size == 0 {
        return Err(ConfigError::ValidationError(
            "mirror.pool_size cannot be 0".to_string(),
        ));
    }
    if mirror.input_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "mirror.input_buffer cannot be 0".to_string(),
        ));
    }
    if mirror.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "mirror.request_timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}

//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.vision.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "vision.max_attempts must be > 0".into(),
            ));
        }
        if self.vision.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "vision.timeout_ms must be > 0".into(),
            ));
        }
        if self.vision.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "vision.max_tokens must be > 0".into(),
            ));
        }
        if self.vision.api_version.trim_matches('/').trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "vision.api_version must not be empty".into(),
            ));
        }
        if self.background.remote_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "background.remote_timeout_ms must be > 0".into(),
            ));
        }
        if self.background.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "background.model must not be empty".into(),
            ));
        }
        if self.background.model_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "background.model_url must not be empty".into(),
            ));
        }
        if self.store.path.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "store.path must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = Config::default();
        config.vision.max_attempts = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.vision.timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_ms"));
    }

    #[test]
    fn test_validate_rejects_blank_api_version() {
        let mut config = Config::default();
        config.vision.api_version = "/".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("api_version"));
    }

    #[test]
    fn test_validate_allows_zero_retry_delay() {
        let mut config = Config::default();
        config.vision.retry_delay_ms = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_model_url() {
        let mut config = Config::default();
        config.background.model_url = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("model_url"));
    }
}

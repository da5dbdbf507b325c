//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.batch.workers == 0 {
            return Err(ConfigError::ValidationError(
                "batch.workers must be > 0".into(),
            ));
        }
        if self.batch.queue_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "batch.queue_capacity must be > 0".into(),
            ));
        }
        if self.batch.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "batch.supported_formats must not be empty".into(),
            ));
        }
        if self.batch.quarantine_dir.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "batch.quarantine_dir must not be empty".into(),
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "api.timeout_secs must be > 0".into(),
            ));
        }
        if self.api.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "api.max_tokens must be > 0".into(),
            ));
        }
        if self.retry.max_retries > 10 {
            return Err(ConfigError::ValidationError(
                "retry.max_retries must be <= 10".into(),
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
    fn test_validate_rejects_zero_workers() {
        let mut config = Config::default();
        config.batch.workers = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("batch.workers"));
    }

    #[test]
    fn test_validate_rejects_zero_queue_capacity() {
        let mut config = Config::default();
        config.batch.queue_capacity = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("queue_capacity"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.api.timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_validate_rejects_empty_formats() {
        let mut config = Config::default();
        config.batch.supported_formats.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("supported_formats"));
    }

    #[test]
    fn test_validate_rejects_excessive_retries() {
        let mut config = Config::default();
        config.retry.max_retries = 11;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_retries"));
    }
}

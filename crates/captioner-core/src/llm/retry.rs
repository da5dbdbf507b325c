//! Retry policy for transient API failures.
//!
//! Provides classification of retryable errors and exponential backoff.

use crate::config::RetryConfig;
use crate::error::ApiError;
use std::time::Duration;

/// Bounded automatic retry with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base backoff delay in milliseconds
    pub backoff_base_ms: u64,
    /// HTTP statuses worth retrying
    pub status_forcelist: Vec<u16>,
    /// HTTP methods that may be retried
    pub allowed_methods: Vec<&'static str>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base_ms: config.backoff_base_ms,
            status_forcelist: config.status_forcelist.clone(),
            allowed_methods: vec!["HEAD", "GET", "OPTIONS", "POST"],
        }
    }

    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Determine whether an error is worth retrying.
    ///
    /// Retryable: timeouts, connection failures, and listed HTTP statuses.
    /// Non-retryable: provider-reported errors, parse errors, file errors.
    pub fn is_retryable(&self, error: &ApiError) -> bool {
        match error {
            ApiError::Timeout { .. } | ApiError::Connect(_) => true,
            ApiError::Http { status, .. } => self.status_forcelist.contains(status),
            _ => false,
        }
    }

    /// Whether requests with `method` are covered by this policy.
    pub fn allows_method(&self, method: &str) -> bool {
        self.allowed_methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case(method))
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        backoff_duration(retry.saturating_sub(1), self.backoff_base_ms)
    }
}

/// Calculate exponential backoff duration for a given attempt.
///
/// Uses `base_delay * 2^attempt` with a cap at 30 seconds.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(30_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> ApiError {
        ApiError::Http {
            status,
            body: String::new(),
        }
    }

    #[test]
    fn test_default_policy_matches_forcelist() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 5);
        for status in [429, 500, 502, 503, 504] {
            assert!(policy.is_retryable(&http(status)), "{status}");
        }
        for status in [400, 401, 403, 404, 501] {
            assert!(!policy.is_retryable(&http(status)), "{status}");
        }
    }

    #[test]
    fn test_transport_errors_are_retryable() {
        let policy = RetryPolicy::default();
        assert!(policy.is_retryable(&ApiError::Timeout { timeout_secs: 10 }));
        assert!(policy.is_retryable(&ApiError::Connect("refused".into())));
    }

    #[test]
    fn test_provider_and_parse_errors_not_retryable() {
        let policy = RetryPolicy::default();
        assert!(!policy.is_retryable(&ApiError::Provider("bad image".into())));
        assert!(!policy.is_retryable(&ApiError::Parse {
            message: "x".into(),
            body: "y".into()
        }));
        assert!(!policy.is_retryable(&ApiError::Request("builder".into())));
    }

    #[test]
    fn test_allowed_methods() {
        let policy = RetryPolicy::default();
        assert!(policy.allows_method("post"));
        assert!(policy.allows_method("GET"));
        assert!(!policy.allows_method("DELETE"));
    }

    #[test]
    fn test_backoff_exponential() {
        assert_eq!(backoff_duration(0, 1000), Duration::from_millis(1000));
        assert_eq!(backoff_duration(1, 1000), Duration::from_millis(2000));
        assert_eq!(backoff_duration(2, 1000), Duration::from_millis(4000));
        assert_eq!(backoff_duration(3, 1000), Duration::from_millis(8000));
    }

    #[test]
    fn test_backoff_capped_at_30s() {
        assert_eq!(backoff_duration(10, 1000), Duration::from_millis(30_000));
    }

    #[test]
    fn test_delay_for_is_one_based() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(4000));
    }
}

//! Retry utilities for vision requests.
//!
//! Classifies retryable failures and keeps one result per attempt so the
//! surfaced error is built from the last failed attempt.

use crate::error::AnalyzeError;
use std::time::Duration;

/// Determine whether a failed attempt is worth retrying.
///
/// Retryable: transport failures and non-2xx statuses. A malformed 2xx body
/// or a configuration problem will not improve on another attempt.
pub fn is_retryable(error: &AnalyzeError) -> bool {
    matches!(
        error,
        AnalyzeError::TransportFailure { .. } | AnalyzeError::NonSuccessStatus { .. }
    )
}

/// Fixed delay between attempts.
pub fn backoff_duration(retry_delay_ms: u64) -> Duration {
    Duration::from_millis(retry_delay_ms)
}

/// Per-attempt outcome log for one request.
#[derive(Debug, Default)]
pub(crate) struct AttemptLog {
    failures: Vec<AnalyzeError>,
}

impl AttemptLog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_failure(&mut self, error: AnalyzeError) {
        self.failures.push(error);
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.failures.len() as u32
    }

    /// Surface the exhausted request, carrying the last attempt's detail.
    pub(crate) fn into_exhausted(mut self) -> AnalyzeError {
        let attempts = self.attempts();
        let last = self
            .failures
            .pop()
            .unwrap_or_else(|| AnalyzeError::TransportFailure {
                message: "no attempts were made".to_string(),
            });
        AnalyzeError::ExhaustedRetries {
            attempts,
            last: Box::new(last),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_failure_is_retryable() {
        let err = AnalyzeError::TransportFailure {
            message: "connection refused".to_string(),
        };
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_any_non_success_status_is_retryable() {
        for status in [400, 401, 429, 500, 503] {
            let err = AnalyzeError::NonSuccessStatus {
                status,
                body: String::new(),
            };
            assert!(is_retryable(&err), "status {status} should be retried");
        }
    }

    #[test]
    fn test_malformed_response_not_retryable() {
        let err = AnalyzeError::MalformedResponse("missing choices".to_string());
        assert!(!is_retryable(&err));
    }

    #[test]
    fn test_backoff_is_fixed() {
        assert_eq!(backoff_duration(5_000), Duration::from_secs(5));
        assert_eq!(backoff_duration(0), Duration::ZERO);
    }

    #[test]
    fn test_attempt_log_keeps_last_failure() {
        let mut log = AttemptLog::new();
        log.record_failure(AnalyzeError::TransportFailure {
            message: "timed out".to_string(),
        });
        log.record_failure(AnalyzeError::NonSuccessStatus {
            status: 503,
            body: "overloaded".to_string(),
        });
        assert_eq!(log.attempts(), 2);

        match log.into_exhausted() {
            AnalyzeError::ExhaustedRetries { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last, AnalyzeError::NonSuccessStatus { status: 503, .. }));
            }
            other => panic!("Expected ExhaustedRetries, got {other:?}"),
        }
    }
}

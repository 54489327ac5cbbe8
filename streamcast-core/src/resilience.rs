//! Bounded timeouts for external calls
//!
//! Every call to the provider, the gateway or the hub goes through
//! [`timeout::with_timeout`], so an unresponsive dependency surfaces as a
//! retryable [`Error::Unavailable`](crate::Error::Unavailable) instead of a hang.

pub mod timeout {
    //! Timeout configuration for external service calls

    use std::future::Future;
    use std::time::Duration;

    use crate::config::TimeoutsConfig;
    use crate::{Error, Result};

    /// Default timeout for availability and readiness probes
    pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

    /// Default timeout for registration, guide and hub calls
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Timeout configuration
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TimeoutConfig {
        pub probe: Duration,
        pub request: Duration,
    }

    impl Default for TimeoutConfig {
        fn default() -> Self {
            Self {
                probe: PROBE_TIMEOUT,
                request: REQUEST_TIMEOUT,
            }
        }
    }

    impl From<&TimeoutsConfig> for TimeoutConfig {
        fn from(config: &TimeoutsConfig) -> Self {
            Self {
                probe: config.probe(),
                request: config.request(),
            }
        }
    }

    impl TimeoutConfig {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Set probe timeout
        #[must_use]
        pub const fn with_probe_timeout(mut self, timeout: Duration) -> Self {
            self.probe = timeout;
            self
        }

        /// Set request timeout
        #[must_use]
        pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
            self.request = timeout;
            self
        }
    }

    /// Run `fut` with an upper bound; elapsing maps to `Unavailable`.
    pub async fn with_timeout<T, F>(limit: Duration, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, timeout_ms = limit.as_millis() as u64, "External call timed out");
                Err(Error::Unavailable(format!(
                    "{operation} timed out after {}ms",
                    limit.as_millis()
                )))
            }
        }
    }
}

//! Configuration for vendor sources, tunnels and the connectivity checker.

use std::time::Duration;

/// Field splitter used when none is configured.
pub const DEFAULT_SPLITTER: &str = "\r\n";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_PROBE_URL: &str = "http://www.baidu.com";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

/// How the fetch loop reacts to failed vendor calls when `exit_on_error` is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Sleep between a failed vendor call and the next attempt.
    pub backoff: Duration,
    /// Maximum consecutive failed calls within one batch.
    ///
    /// `None` retries forever: an unreachable vendor blocks the caller
    /// indefinitely at `backoff` intervals.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Retry forever with the given backoff.
    pub fn unbounded(backoff: Duration) -> Self {
        Self {
            backoff,
            max_attempts: None,
        }
    }

    /// Give up after `max_attempts` consecutive failures.
    pub fn bounded(backoff: Duration, max_attempts: u32) -> Self {
        Self {
            backoff,
            max_attempts: Some(max_attempts.max(1)),
        }
    }

    pub(crate) fn exhausted(&self, failures: u32) -> bool {
        self.max_attempts.is_some_and(|max| failures >= max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded(DEFAULT_BACKOFF)
    }
}

/// Configuration for a vendor-backed proxy source.
#[derive(Debug, Clone)]
pub struct VendorConfig {
    /// Vendor URL, optionally containing the `${num}` count placeholder.
    pub endpoint: String,
    /// Username attached to every proxy (requires `password` too).
    pub username: String,
    /// Password attached to every proxy (requires `username` too).
    pub password: String,
    /// Separator between `ip:port` tokens in vendor bodies.
    pub splitter: String,
    /// Timeout for a single vendor call.
    pub request_timeout: Duration,
    /// Retry behaviour for failed vendor calls.
    pub retry: RetryPolicy,
    /// Whether the vendor client honours `HTTP_PROXY` and friends.
    pub system_proxy: bool,
}

impl VendorConfig {
    /// Create a new configuration builder.
    pub fn builder() -> VendorConfigBuilder {
        VendorConfigBuilder::new()
    }
}

/// Builder for `VendorConfig`.
pub struct VendorConfigBuilder {
    endpoint: String,
    username: String,
    password: String,
    splitter: Option<String>,
    request_timeout: Option<Duration>,
    retry: Option<RetryPolicy>,
    system_proxy: bool,
}

impl VendorConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            endpoint: String::new(),
            username: String::new(),
            password: String::new(),
            splitter: None,
            request_timeout: None,
            retry: None,
            system_proxy: true,
        }
    }

    /// Set the vendor URL template.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the credentials embedded into every proxy.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Set the token separator. An empty splitter falls back to CRLF.
    pub fn splitter(mut self, splitter: impl Into<String>) -> Self {
        self.splitter = Some(splitter.into());
        self
    }

    /// Set the timeout for a single vendor call.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Toggle use of system proxy settings for vendor calls.
    pub fn system_proxy(mut self, enabled: bool) -> Self {
        self.system_proxy = enabled;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> VendorConfig {
        VendorConfig {
            endpoint: self.endpoint,
            username: self.username,
            password: self.password,
            splitter: self
                .splitter
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SPLITTER.to_string()),
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            retry: self.retry.unwrap_or_default(),
            system_proxy: self.system_proxy,
        }
    }
}

impl Default for VendorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the connectivity checker.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// URL fetched through each candidate.
    pub target_url: String,
    /// Timeout for a single probe.
    pub timeout: Duration,
    /// User-Agent sent with each probe.
    pub user_agent: String,
}

impl CheckerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CheckerConfigBuilder {
        CheckerConfigBuilder::default()
    }
}

impl Default for CheckerConfig {
    fn default() -> Self {
        CheckerConfigBuilder::default().build()
    }
}

/// Builder for `CheckerConfig`.
#[derive(Default)]
pub struct CheckerConfigBuilder {
    target_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl CheckerConfigBuilder {
    /// Set the URL fetched through each candidate.
    pub fn target_url(mut self, url: impl Into<String>) -> Self {
        self.target_url = Some(url.into());
        self
    }

    /// Set the probe timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the probe User-Agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> CheckerConfig {
        CheckerConfig {
            target_url: self.target_url.unwrap_or_else(|| DEFAULT_PROBE_URL.to_string()),
            timeout: self.timeout.unwrap_or(DEFAULT_PROBE_TIMEOUT),
            user_agent: self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        }
    }
}

/// Configuration for a fixed-endpoint tunnel source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelConfig {
    /// The endpoint handed out for every request.
    pub url: String,
}

impl TunnelConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_defaults() {
        let config = VendorConfig::builder().endpoint("http://vendor?num=${num}").build();
        assert_eq!(config.splitter, "\r\n");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.retry.backoff, Duration::from_secs(1));
        assert_eq!(config.retry.max_attempts, None);
        assert!(config.system_proxy);
        assert!(config.username.is_empty());
    }

    #[test]
    fn test_empty_splitter_falls_back() {
        let config = VendorConfig::builder().splitter("").build();
        assert_eq!(config.splitter, DEFAULT_SPLITTER);
        let config = VendorConfig::builder().splitter(",").build();
        assert_eq!(config.splitter, ",");
    }

    #[test]
    fn test_retry_policy_exhaustion() {
        assert!(!RetryPolicy::default().exhausted(u32::MAX));
        let bounded = RetryPolicy::bounded(Duration::ZERO, 3);
        assert!(!bounded.exhausted(2));
        assert!(bounded.exhausted(3));
        assert_eq!(RetryPolicy::bounded(Duration::ZERO, 0).max_attempts, Some(1));
    }

    #[test]
    fn test_checker_defaults() {
        let config = CheckerConfig::default();
        assert_eq!(config.target_url, "http://www.baidu.com");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert!(config.user_agent.contains("Chrome/114"));
    }
}

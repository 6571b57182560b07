//! The capability shared by every proxy source.

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::stream::ProxyReceiver;

use async_trait::async_trait;

/// Parameters of one retrieval call.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    count: usize,
    exit_on_error: bool,
    cancel: CancelToken,
}

impl FetchRequest {
    /// Ask for `count` proxies (at least one), retrying vendor failures.
    pub fn new(count: usize) -> Self {
        Self {
            count: count.max(1),
            exit_on_error: false,
            cancel: CancelToken::never(),
        }
    }

    /// Abort on the first vendor or malformed-response failure.
    pub fn exit_on_error(mut self, exit_on_error: bool) -> Self {
        self.exit_on_error = exit_on_error;
        self
    }

    /// Attach a cancellation token observed by every network call.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn exits_on_error(&self) -> bool {
        self.exit_on_error
    }

    pub fn cancel(&self) -> &CancelToken {
        &self.cancel
    }

    pub(crate) fn with_count(&self, count: usize) -> Self {
        Self {
            count,
            ..self.clone()
        }
    }
}

/// A source able to hand out proxies in four retrieval modes.
///
/// Blocking modes return at least `count` proxies or a terminating error;
/// streaming modes return immediately and feed a [`ProxyReceiver`].
#[async_trait]
pub trait ProxySource: Send + Sync {
    /// Collect at least `request.count()` normalized proxies.
    async fn get_proxies(&self, request: &FetchRequest) -> Result<Vec<String>>;

    /// Collect at least `request.count()` proxies that passed a connectivity check.
    async fn get_checked_proxies(&self, request: &FetchRequest) -> Result<Vec<String>>;

    /// Stream exactly `request.count()` normalized proxies.
    fn stream_proxies(&self, request: &FetchRequest) -> ProxyReceiver;

    /// Stream exactly `request.count()` proxies as they pass their checks.
    fn stream_checked_proxies(&self, request: &FetchRequest) -> ProxyReceiver;

    /// Fetch a single unchecked proxy.
    async fn get_proxy(&self, exit_on_error: bool, cancel: &CancelToken) -> Result<String> {
        let request = FetchRequest::new(1)
            .exit_on_error(exit_on_error)
            .with_cancel(cancel.clone());
        self.get_proxies(&request)
            .await?
            .into_iter()
            .next()
            .ok_or(Error::NoProxyAvailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_request_defaults() {
        let request = FetchRequest::new(3);
        assert_eq!(request.count(), 3);
        assert!(!request.exits_on_error());
        assert!(!request.cancel().is_cancelled());
    }

    #[test]
    fn test_fetch_request_count_is_at_least_one() {
        assert_eq!(FetchRequest::new(0).count(), 1);
    }

    #[test]
    fn test_with_count_keeps_policy() {
        let request = FetchRequest::new(5).exit_on_error(true);
        let remaining = request.with_count(2);
        assert_eq!(remaining.count(), 2);
        assert!(remaining.exits_on_error());
        assert_eq!(request.count(), 5);
    }
}

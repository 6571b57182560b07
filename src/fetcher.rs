//! Vendor fetch loop.

use crate::cancel::CancelToken;
use crate::config::VendorConfig;
use crate::error::{Error, Result};
use crate::logger::Logger;
use crate::parse;
use crate::proxy::{self, NormalizedProxy};

use reqwest::StatusCode;
use std::sync::Arc;
use tokio::time;

/// Pulls raw `ip:port` candidates from a vendor endpoint.
#[derive(Clone)]
pub struct VendorFetcher {
    config: VendorConfig,
    client: reqwest::Client,
    logger: Arc<dyn Logger>,
}

impl VendorFetcher {
    /// Build a fetcher and its http client.
    pub fn new(config: VendorConfig, logger: Arc<dyn Logger>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(config.request_timeout);
        if !config.system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(Error::Client)?;
        Ok(Self { config, client, logger })
    }

    /// Replace the logging collaborator.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &VendorConfig {
        &self.config
    }

    /// The vendor URL asking for `count` proxies.
    pub fn request_url(&self, count: usize) -> String {
        parse::fill_count_placeholder(&self.config.endpoint, count)
    }

    /// Accumulate at least `quota` raw candidates.
    ///
    /// Each round asks the vendor for the remaining need. Vendors may return
    /// more than asked, so the result can exceed `quota`. With
    /// `exit_on_error` the first failure aborts the whole call and nothing
    /// accumulated so far is returned.
    pub async fn fetch_proxies(
        &self,
        quota: usize,
        exit_on_error: bool,
        cancel: &CancelToken,
    ) -> Result<Vec<String>> {
        let mut proxies = Vec::new();
        while proxies.len() < quota {
            let batch = self.fetch_batch(quota - proxies.len(), exit_on_error, cancel).await?;
            proxies.extend(batch);
        }
        Ok(proxies)
    }

    /// Like [`fetch_proxies`](Self::fetch_proxies), counting only candidates
    /// that survive normalization with the configured credentials.
    pub async fn fetch_normalized(
        &self,
        quota: usize,
        exit_on_error: bool,
        cancel: &CancelToken,
    ) -> Result<Vec<NormalizedProxy>> {
        let mut proxies = Vec::new();
        while proxies.len() < quota {
            let batch = self
                .fetch_normalized_batch(quota - proxies.len(), exit_on_error, cancel)
                .await?;
            proxies.extend(batch);
        }
        Ok(proxies)
    }

    /// Perform vendor calls until one yields a non-empty, well-formed list.
    ///
    /// Failed calls either abort (`exit_on_error`) or sleep for the retry
    /// backoff and try again. Without `max_attempts` this retries forever.
    pub async fn fetch_batch(
        &self,
        count: usize,
        exit_on_error: bool,
        cancel: &CancelToken,
    ) -> Result<Vec<String>> {
        self.batch_with(count, exit_on_error, cancel, |raw| raw).await
    }

    /// Perform vendor calls until one yields at least one normalized proxy.
    ///
    /// A well-formed list whose every token fails normalization is a failed
    /// attempt: it backs off and counts toward `max_attempts`.
    pub async fn fetch_normalized_batch(
        &self,
        count: usize,
        exit_on_error: bool,
        cancel: &CancelToken,
    ) -> Result<Vec<NormalizedProxy>> {
        self.batch_with(count, exit_on_error, cancel, |raw| self.normalize(&raw))
            .await
    }

    fn normalize(&self, raw: &[String]) -> Vec<NormalizedProxy> {
        let proxies = proxy::normalize_all(raw, &self.config.username, &self.config.password);
        let dropped = raw.len() - proxies.len();
        if dropped > 0 {
            self.logger
                .warn(&format!("Dropped {} malformed proxies from vendor response", dropped));
        }
        proxies
    }

    async fn batch_with<T, F>(
        &self,
        count: usize,
        exit_on_error: bool,
        cancel: &CancelToken,
        convert: F,
    ) -> Result<Vec<T>>
    where
        F: Fn(Vec<String>) -> Vec<T>,
    {
        let url = self.request_url(count);
        let mut failures = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let err = match self.call_api(&url, cancel).await {
                Ok(body) => match self.extract(&body) {
                    Some(raw) => {
                        let listed = raw.len();
                        let proxies = convert(raw);
                        if proxies.is_empty() {
                            Error::NoUsableProxies { listed }
                        } else {
                            self.logger.info(&format!(
                                "Fetched {} proxies from vendor (asked for {})",
                                proxies.len(),
                                count
                            ));
                            return Ok(proxies);
                        }
                    }
                    None => Error::malformed(&body),
                },
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(err) => err,
            };

            self.logger.warn(&format!("Vendor fetch failed: {}", err));
            if exit_on_error {
                return Err(err);
            }

            failures += 1;
            if self.config.retry.exhausted(failures) {
                self.logger
                    .warn(&format!("Giving up on vendor after {} failed attempts", failures));
                return Err(Error::RetriesExhausted {
                    attempts: failures,
                    last: Box::new(err),
                });
            }

            tokio::select! {
                _ = time::sleep(self.config.retry.backoff) => {}
                _ = cancel.cancelled() => return Err(Error::Cancelled),
            }
        }
    }

    /// Validate and split a body; `None` when it is malformed or empty.
    fn extract(&self, body: &str) -> Option<Vec<String>> {
        if !parse::is_proxy_list_only(body, &self.config.splitter) {
            return None;
        }
        let candidates = parse::split_proxy_list(body, &self.config.splitter);
        (!candidates.is_empty()).then_some(candidates)
    }

    async fn call_api(&self, url: &str, cancel: &CancelToken) -> Result<String> {
        let call = async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|source| Error::VendorCall {
                    url: url.to_string(),
                    source,
                })?;
            let status = response.status();
            if status != StatusCode::OK {
                return Err(Error::VendorStatus {
                    url: url.to_string(),
                    status,
                });
            }
            response.text().await.map_err(|source| Error::VendorCall {
                url: url.to_string(),
                source,
            })
        };

        tokio::select! {
            body = call => body,
            _ = cancel.cancelled() => Err(Error::Cancelled),
        }
    }
}

impl std::fmt::Debug for VendorFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorFetcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

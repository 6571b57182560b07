//! Vendor-backed proxy source.

use crate::cancel::CancelToken;
use crate::checker::ConnectivityChecker;
use crate::config::{CheckerConfig, VendorConfig};
use crate::error::{Error, Result};
use crate::fetcher::VendorFetcher;
use crate::logger::{self, Logger};
use crate::proxy::NormalizedProxy;
use crate::source::{FetchRequest, ProxySource};
use crate::stream::{self, ProxyReceiver, ProxySender};

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A source pulling proxies from a vendor HTTP endpoint.
///
/// Dead or malformed candidates are dropped without a signal: a call
/// either reaches its quota or ends with a vendor-level error.
#[derive(Clone)]
pub struct VendorSource {
    fetcher: VendorFetcher,
    checker: ConnectivityChecker,
    logger: Arc<dyn Logger>,
}

impl VendorSource {
    /// Create a source logging through the `log` facade and probing the default target.
    pub fn new(config: VendorConfig) -> Result<Self> {
        let logger = logger::default_logger();
        Ok(Self {
            fetcher: VendorFetcher::new(config, Arc::clone(&logger))?,
            checker: ConnectivityChecker::default(),
            logger,
        })
    }

    /// Replace the connectivity checker configuration.
    pub fn with_checker(mut self, config: CheckerConfig) -> Self {
        self.checker = ConnectivityChecker::new(config);
        self
    }

    /// Replace the logging collaborator.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.fetcher = self.fetcher.with_logger(Arc::clone(&logger));
        self.logger = logger;
        self
    }

    pub fn fetcher(&self) -> &VendorFetcher {
        &self.fetcher
    }

    pub fn checker(&self) -> &ConnectivityChecker {
        &self.checker
    }

    fn spawn_producer(&self, request: &FetchRequest, checked: bool) -> ProxyReceiver {
        let (tx, rx) = stream::channel(request.count());
        let source = self.clone();
        let request = request.clone();
        tokio::spawn(async move { source.produce(tx, request, checked).await });
        rx
    }

    async fn produce(self, tx: ProxySender, request: FetchRequest, checked: bool) {
        let cancel = request.cancel();
        while !tx.is_done() {
            let batch = self
                .fetcher
                .fetch_normalized_batch(tx.remaining(), request.exits_on_error(), cancel);
            let fetched = tokio::select! {
                fetched = batch => fetched,
                _ = tx.closed() => return,
            };
            let proxies = match fetched {
                Ok(proxies) => proxies,
                Err(err) => {
                    self.logger.warn(&format!("Proxy stream stopped: {}", err));
                    tx.fail(err);
                    return;
                }
            };

            let consumer_alive = if checked {
                self.forward_checked(&tx, proxies, cancel).await
            } else {
                forward(&tx, proxies).await
            };
            if !consumer_alive {
                return;
            }
        }
        self.logger
            .info(&format!("Proxy stream delivered {} proxies", request.count()));
    }

    /// Forward proxies as their checks pass. `false` once the consumer left.
    async fn forward_checked(
        &self,
        tx: &ProxySender,
        proxies: Vec<NormalizedProxy>,
        cancel: &CancelToken,
    ) -> bool {
        let (results_tx, mut results_rx) = mpsc::channel(proxies.len().max(1));
        self.checker.check_all_async(proxies, results_tx, cancel);
        while let Some(result) = results_rx.recv().await {
            if !result.success {
                continue;
            }
            if !tx.send(result.proxy.to_string()).await {
                return false;
            }
            if tx.is_done() {
                break;
            }
        }
        true
    }
}

/// Forward proxies until the quota is met. `false` once the consumer left.
async fn forward(tx: &ProxySender, proxies: Vec<NormalizedProxy>) -> bool {
    for proxy in proxies {
        if tx.is_done() {
            break;
        }
        if !tx.send(proxy.to_string()).await {
            return false;
        }
    }
    true
}

#[async_trait]
impl ProxySource for VendorSource {
    async fn get_proxies(&self, request: &FetchRequest) -> Result<Vec<String>> {
        let proxies = self
            .fetcher
            .fetch_normalized(request.count(), request.exits_on_error(), request.cancel())
            .await?;
        Ok(proxies.iter().map(ToString::to_string).collect())
    }

    async fn get_checked_proxies(&self, request: &FetchRequest) -> Result<Vec<String>> {
        let mut verified = Vec::new();
        while verified.len() < request.count() {
            let batch = self
                .fetcher
                .fetch_normalized(
                    request.count() - verified.len(),
                    request.exits_on_error(),
                    request.cancel(),
                )
                .await?;
            let (succeeded, failed) = self.checker.check_all_sync(batch, request.cancel()).await;
            if request.cancel().is_cancelled() {
                return Err(Error::Cancelled);
            }
            self.logger.info(&format!(
                "Connectivity check completed: {} passed, {} failed",
                succeeded.len(),
                failed.len()
            ));
            verified.extend(succeeded.iter().map(ToString::to_string));
        }
        Ok(verified)
    }

    fn stream_proxies(&self, request: &FetchRequest) -> ProxyReceiver {
        self.spawn_producer(request, false)
    }

    fn stream_checked_proxies(&self, request: &FetchRequest) -> ProxyReceiver {
        self.spawn_producer(request, true)
    }
}

impl std::fmt::Debug for VendorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorSource")
            .field("fetcher", &self.fetcher)
            .field("checker", &self.checker)
            .finish_non_exhaustive()
    }
}

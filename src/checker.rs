//! Connectivity checks through candidate proxies.

use crate::cancel::CancelToken;
use crate::config::CheckerConfig;
use crate::error::{Error, Result};
use crate::proxy::NormalizedProxy;

use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use tokio::sync::mpsc;

/// Outcome of one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub proxy: NormalizedProxy,
    pub success: bool,
}

/// Probes a target URL through each candidate acting as an HTTP proxy.
#[derive(Debug, Clone, Default)]
pub struct ConnectivityChecker {
    config: CheckerConfig,
}

impl ConnectivityChecker {
    pub fn new(config: CheckerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Probe a single proxy.
    ///
    /// `Ok(true)` only for an exact 200. Transport failures come back as
    /// `Err`, which batch callers treat as a failed check.
    pub async fn check(&self, proxy: &NormalizedProxy, cancel: &CancelToken) -> Result<bool> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let reqwest_proxy = proxy.to_reqwest_proxy().map_err(Error::Client)?;
        let client = reqwest::Client::builder()
            .timeout(self.config.timeout)
            .proxy(reqwest_proxy)
            .build()
            .map_err(Error::Client)?;

        let request = client
            .get(&self.config.target_url)
            .header(USER_AGENT, &self.config.user_agent)
            .send();

        let response = tokio::select! {
            response = request => response.map_err(|source| Error::Probe {
                proxy: proxy.to_string(),
                source,
            })?,
            _ = cancel.cancelled() => return Err(Error::Cancelled),
        };
        Ok(response.status() == StatusCode::OK)
    }

    /// Check every candidate concurrently and wait for all of them.
    ///
    /// Returns `(succeeded, failed)` in completion order. One task is spawned
    /// per candidate with no concurrency limit, so very large batches open as
    /// many simultaneous connections.
    pub async fn check_all_sync(
        &self,
        candidates: Vec<NormalizedProxy>,
        cancel: &CancelToken,
    ) -> (Vec<NormalizedProxy>, Vec<NormalizedProxy>) {
        let (results_tx, mut results_rx) = mpsc::channel(candidates.len().max(1));
        self.check_all_async(candidates, results_tx, cancel);

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        while let Some(result) = results_rx.recv().await {
            if result.success {
                succeeded.push(result.proxy);
            } else {
                failed.push(result.proxy);
            }
        }
        (succeeded, failed)
    }

    /// Launch one check per candidate and return immediately.
    ///
    /// Each [`CheckResult`] is sent to `sink` as soon as its probe finishes.
    /// The sink closes once every check has reported. Must be called from
    /// within a tokio runtime.
    pub fn check_all_async(
        &self,
        candidates: Vec<NormalizedProxy>,
        sink: mpsc::Sender<CheckResult>,
        cancel: &CancelToken,
    ) {
        for proxy in candidates {
            let checker = self.clone();
            let sink = sink.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let success = checker.check(&proxy, &cancel).await.unwrap_or(false);
                // The receiver may have stopped listening once its quota was met.
                let _ = sink.send(CheckResult { proxy, success }).await;
            });
        }
    }
}

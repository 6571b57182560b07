//! Fixed-endpoint source.

use crate::config::TunnelConfig;
use crate::error::Result;
use crate::source::{FetchRequest, ProxySource};
use crate::stream::{self, ProxyReceiver};

use async_trait::async_trait;

/// A source that always hands out the same endpoint, typically a vendor
/// tunnel that rotates exits on its side.
///
/// Nothing is verified: the checked modes are aliases of the unchecked ones.
/// `exit_on_error` and cancellation have no effect.
#[derive(Debug, Clone)]
pub struct TunnelSource {
    config: TunnelConfig,
}

impl TunnelSource {
    pub fn new(config: TunnelConfig) -> Self {
        Self { config }
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }
}

#[async_trait]
impl ProxySource for TunnelSource {
    async fn get_proxies(&self, request: &FetchRequest) -> Result<Vec<String>> {
        Ok(vec![self.config.url.clone(); request.count()])
    }

    async fn get_checked_proxies(&self, request: &FetchRequest) -> Result<Vec<String>> {
        self.get_proxies(request).await
    }

    fn stream_proxies(&self, request: &FetchRequest) -> ProxyReceiver {
        let (tx, rx) = stream::channel(request.count());
        let url = self.config.url.clone();
        tokio::spawn(async move {
            while !tx.is_done() {
                if !tx.send(url.clone()).await {
                    return;
                }
            }
        });
        rx
    }

    fn stream_checked_proxies(&self, request: &FetchRequest) -> ProxyReceiver {
        self.stream_proxies(request)
    }
}

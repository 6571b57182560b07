//! Streaming delivery of proxies to a consumer.

use crate::error::{Error, Result};

use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};

/// Capacity of the success queue; producers wait once it is full.
const QUEUE_CAPACITY: usize = 16;

/// Consumer side of a streaming retrieval.
///
/// Proxies arrive in completion order. The stream ends after the quota has
/// been delivered, or after a single `Err` when the producer hit a fatal error.
/// On the error path the error is recorded before the proxy queue closes, so
/// polling the stream never misses it.
#[derive(Debug)]
pub struct ProxyReceiver {
    proxies: mpsc::Receiver<String>,
    error: Option<oneshot::Receiver<Error>>,
    delivered: Arc<AtomicUsize>,
}

impl ProxyReceiver {
    /// Next proxy, the terminating error, or `None` once the stream is done.
    pub async fn recv(&mut self) -> Option<Result<String>> {
        futures::StreamExt::next(self).await
    }

    /// Number of proxies the producer has handed over so far.
    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::Acquire)
    }

    /// Split into the raw success queue and error slot for custom `select!` loops.
    pub fn into_parts(self) -> (mpsc::Receiver<String>, Option<oneshot::Receiver<Error>>) {
        (self.proxies, self.error)
    }
}

impl Stream for ProxyReceiver {
    type Item = Result<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.proxies.poll_recv(cx) {
            Poll::Ready(Some(proxy)) => return Poll::Ready(Some(Ok(proxy))),
            Poll::Ready(None) => {}
            Poll::Pending => return Poll::Pending,
        }

        let Some(error) = this.error.as_mut() else {
            return Poll::Ready(None);
        };
        match Pin::new(error).poll(cx) {
            Poll::Ready(result) => {
                this.error = None;
                Poll::Ready(result.ok().map(Err))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Producer side, owned by the task feeding a [`ProxyReceiver`].
pub(crate) struct ProxySender {
    proxies: mpsc::Sender<String>,
    error: oneshot::Sender<Error>,
    delivered: Arc<AtomicUsize>,
    quota: usize,
}

impl ProxySender {
    pub(crate) fn remaining(&self) -> usize {
        self.quota.saturating_sub(self.delivered.load(Ordering::Acquire))
    }

    pub(crate) fn is_done(&self) -> bool {
        self.remaining() == 0
    }

    /// Push one proxy. Returns `false` once the consumer has gone away.
    pub(crate) async fn send(&self, proxy: String) -> bool {
        if self.proxies.send(proxy).await.is_err() {
            return false;
        }
        self.delivered.fetch_add(1, Ordering::AcqRel);
        true
    }

    /// Resolve once the consumer has dropped its receiver.
    pub(crate) async fn closed(&self) {
        self.proxies.closed().await
    }

    /// Record a fatal error and stop producing.
    pub(crate) fn fail(self, err: Error) {
        let _ = self.error.send(err);
    }
}

/// Create a queue that delivers at most `quota` proxies.
pub(crate) fn channel(quota: usize) -> (ProxySender, ProxyReceiver) {
    let (proxies_tx, proxies_rx) = mpsc::channel(QUEUE_CAPACITY);
    let (error_tx, error_rx) = oneshot::channel();
    let delivered = Arc::new(AtomicUsize::new(0));
    (
        ProxySender {
            proxies: proxies_tx,
            error: error_tx,
            delivered: Arc::clone(&delivered),
            quota,
        },
        ProxyReceiver {
            proxies: proxies_rx,
            error: Some(error_rx),
            delivered,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stream_ends_after_quota() {
        let (tx, mut rx) = channel(2);
        tokio::spawn(async move {
            while !tx.is_done() {
                if !tx.send("http://1.1.1.1:80".to_string()).await {
                    return;
                }
            }
        });
        assert_eq!(rx.recv().await.unwrap().unwrap(), "http://1.1.1.1:80");
        assert_eq!(rx.recv().await.unwrap().unwrap(), "http://1.1.1.1:80");
        assert!(rx.recv().await.is_none());
        assert!(rx.recv().await.is_none());
        assert_eq!(rx.delivered(), 2);
    }

    #[tokio::test]
    async fn test_error_follows_buffered_proxies() {
        let (tx, mut rx) = channel(5);
        assert!(tx.send("http://1.1.1.1:80".to_string()).await);
        tx.fail(Error::Cancelled);
        assert!(rx.recv().await.unwrap().is_ok());
        assert!(matches!(rx.recv().await, Some(Err(Error::Cancelled))));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_send_reports_dropped_consumer() {
        let (tx, rx) = channel(1);
        drop(rx);
        assert!(!tx.send("http://1.1.1.1:80".to_string()).await);
        assert_eq!(tx.remaining(), 1);
    }
}

//! Cancellation for in-flight retrievals.

use tokio::sync::watch;

/// Owner side: flips every associated [`CancelToken`].
#[derive(Debug)]
pub struct CancelHandle {
    cancel_tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn new() -> (Self, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (Self { cancel_tx: tx }, CancelToken { cancel_rx: Some(rx) })
    }

    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }
}

/// Observer side, cloned into every network call of a retrieval.
///
/// Dropping the [`CancelHandle`] without cancelling leaves the token
/// permanently uncancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        Self { cancel_rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolve once cancelled; pend forever otherwise.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.cancel_rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }
}

use tokio::sync::watch;

/// Owner side of a cancellation signal scoped to one connection attempt.
///
/// Cancelling, or dropping the handle, releases every [`CancelToken`] it issued.
#[derive(Debug)]
pub(crate) struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Waiter side of a [`CancelHandle`].
#[derive(Debug, Clone)]
pub(crate) struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelHandle {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub(crate) fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    pub(crate) fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl CancelToken {
    /// Resolves once the owning handle is cancelled or dropped.
    pub(crate) async fn cancelled(&mut self) {
        // Err means the handle was dropped, which counts as cancellation.
        let _ = self.rx.wait_for(|cancelled| *cancelled).await;
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }
}

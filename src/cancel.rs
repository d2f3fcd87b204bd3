use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::CatalogError;

/// Shared cancellation flag for one resolution. Clones observe the same flag.
#[derive(Debug, Clone)]
pub struct CancelToken {
    state: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            state: Arc::new(sender),
        }
    }

    pub fn cancel(&self) {
        self.state.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow()
    }

    /// Completes once [`cancel`](Self::cancel) has been called on any clone.
    pub async fn cancelled(&self) {
        let mut receiver = self.state.subscribe();
        // The sender lives in `self`, so `wait_for` cannot observe a closed channel.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }

    /// Runs `work` unless the token fires first.
    pub async fn guard<T, F>(&self, work: F) -> Result<T, CatalogError>
    where
        F: Future<Output = Result<T, CatalogError>>,
    {
        if self.is_cancelled() {
            return Err(CatalogError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(CatalogError::Cancelled),
            result = work => result,
        }
    }
}

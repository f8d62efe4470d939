use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Why a bounded call stopped before its future completed.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum Interrupted {
    #[error("operation timed out after {0:?}")]
    TimedOut(Duration),
    #[error("operation cancelled")]
    Cancelled,
}

/// Per-call deadline and cancellation handle.
///
/// Dropping the bounded future on expiry abandons the in-flight store call;
/// nothing partial is reported back as success.
#[derive(Debug, Clone, Default)]
pub struct CallCtx {
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl CallCtx {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run `fut` under this context's deadline and cancellation token.
    pub async fn bound<F, T, E>(&self, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<Interrupted>,
    {
        let deadline = async {
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, fut)
                    .await
                    .map_err(|_| E::from(Interrupted::TimedOut(limit)))?,
                None => fut.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(E::from(Interrupted::Cancelled)),
            res = deadline => res,
        }
    }
}

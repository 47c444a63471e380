//! Per-request deadline and cancellation for calls to the chain node.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::chain::ChainRpcError;
use crate::config::DEFAULT_RPC_TIMEOUT;

/// Bounds every external call a stage makes.
///
/// A call that outlives `timeout` fails with [`ChainRpcError::Timeout`];
/// one whose token is cancelled fails with [`ChainRpcError::Cancelled`].
/// Both are retriable.
#[derive(Debug, Clone)]
pub struct RequestContext {
    timeout: Duration,
    cancel: CancellationToken,
}

impl RequestContext {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses a token owned by the caller, e.g. one tied to the client
    /// connection or to server shutdown.
    pub fn with_cancellation(timeout: Duration, cancel: CancellationToken) -> Self {
        Self { timeout, cancel }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Runs `call` under this context's deadline and token.
    pub async fn run<T, F>(&self, call: F) -> Result<T, ChainRpcError>
    where
        F: Future<Output = Result<T, ChainRpcError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(ChainRpcError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!("external call cancelled");
                Err(ChainRpcError::Cancelled)
            }
            outcome = tokio::time::timeout(self.timeout, call) => match outcome {
                Ok(result) => result,
                Err(_) => {
                    debug!(timeout = ?self.timeout, "external call timed out");
                    Err(ChainRpcError::Timeout(self.timeout))
                }
            },
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(DEFAULT_RPC_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_result() {
        let ctx = RequestContext::new(Duration::from_secs(1));
        let value = ctx.run(async { Ok::<_, ChainRpcError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        let ctx = RequestContext::new(Duration::from_millis(50));
        let err = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, ChainRpcError>(())
            })
            .await
            .unwrap_err();
        assert_eq!(err, ChainRpcError::Timeout(Duration::from_millis(50)));
        assert!(err.is_retriable());
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = RequestContext::with_cancellation(Duration::from_secs(5), token);
        let err = ctx
            .run(async { Ok::<_, ChainRpcError>(()) })
            .await
            .unwrap_err();
        assert_eq!(err, ChainRpcError::Cancelled);
    }

    #[tokio::test]
    async fn cancellation_interrupts_pending_call() {
        let token = CancellationToken::new();
        let ctx = RequestContext::with_cancellation(Duration::from_secs(30), token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });
        let err = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, ChainRpcError>(())
            })
            .await
            .unwrap_err();
        canceller.await.unwrap();
        assert_eq!(err, ChainRpcError::Cancelled);
    }
}

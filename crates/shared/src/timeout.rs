//! Timeout helpers with cancellation awareness.

use crate::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::future::Future;
use std::time::Duration;

/// Apply a timeout to a future, honoring request cancellation.
///
/// Used around remote configuration fetches so a slow service fails fast
/// instead of stalling the caller.
pub async fn timeout_with_context<T, F>(
    ctx: &RequestContext,
    timeout: Duration,
    operation: &'static str,
    fut: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    ctx.ensure_not_cancelled(operation)?;

    tokio::select! {
        () = ctx.cancelled() => Err(cancelled_error(operation)),
        res = tokio::time::timeout(timeout, fut) => {
            res.unwrap_or_else(|_| Err(timeout_error(operation, timeout)))
        }
    }
}

fn timeout_error(operation: &'static str, timeout: Duration) -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::timeout(),
        format!("operation timed out: {operation}"),
        ErrorClass::Retriable,
    )
    .with_metadata("operation", operation)
    .with_metadata("timeout_ms", timeout.as_millis().to_string())
}

fn cancelled_error(operation: &'static str) -> ErrorEnvelope {
    ErrorEnvelope::cancelled("operation cancelled").with_metadata("operation", operation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Duration;

    #[tokio::test]
    async fn slow_future_times_out() {
        let ctx = RequestContext::new_request();
        let fut = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, ErrorEnvelope>(())
        };

        let result = timeout_with_context(&ctx, Duration::from_millis(10), "remote.fetch", fut).await;
        assert!(matches!(result, Err(ref error) if error.code == ErrorCode::timeout()));
    }

    #[tokio::test]
    async fn fast_future_passes_through() -> Result<()> {
        let ctx = RequestContext::new_request();
        let value = timeout_with_context(&ctx, Duration::from_millis(200), "remote.fetch", async {
            Ok(7)
        })
        .await?;
        assert_eq!(value, 7);
        Ok(())
    }

    #[tokio::test]
    async fn cancellation_wins_over_timeout() {
        let ctx = RequestContext::new_request();
        let token = ctx.cancellation_token();
        let fut = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, ErrorEnvelope>(())
        };

        let task = tokio::spawn(async move {
            timeout_with_context(&ctx, Duration::from_millis(500), "remote.fetch", fut).await
        });

        tokio::task::yield_now().await;
        token.cancel();
        let result = task.await.expect("join");
        assert!(matches!(result, Err(ref error) if error.is_cancelled()));
    }
}

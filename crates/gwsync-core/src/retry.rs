// ── Retry shim ──
//
// Wraps one remote call in a bounded fixed-interval loop. Only errors
// whose `transient_condition` is in the policy's set are retried; every
// other error is returned on the spot.

use std::future::Future;

use tracing::{debug, warn};

use crate::error::ReconcileError;
use crate::options::RetryPolicy;

pub async fn with_retry<T, F, Fut>(
    operation: &str,
    policy: RetryPolicy,
    mut call: F,
) -> Result<T, ReconcileError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, gwsync_api::Error>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt: u32 = 1;

    loop {
        let err = match call().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let Some(condition) = err
            .transient_condition()
            .filter(|condition| policy.retries(*condition))
        else {
            return Err(ReconcileError::RemoteCall {
                operation: operation.to_owned(),
                source: err,
            });
        };

        if attempt >= max_attempts {
            warn!(operation, attempts = attempt, %condition, "giving up");
            return Err(ReconcileError::RetryExhausted {
                operation: operation.to_owned(),
                attempts: attempt,
                condition,
            });
        }

        warn!(operation, attempt, %condition, "gateway not ready, retrying");
        debug!(delay_secs = policy.interval.as_secs(), "waiting before retry");
        tokio::time::sleep(policy.interval).await;
        attempt += 1;
    }
}

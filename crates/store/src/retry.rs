//! Transient-failure retry wrapper for store operations.
//!
//! Connection-level failures (pool exhaustion, network blips) are retried a small
//! bounded number of times with backoff; constraint violations and anything else
//! are returned immediately since retrying them can't help. See §4.1's failure
//! semantics: persistent failure surfaces as `StoreUnavailable` to the caller.

use sentinel_core::{Error, ErrorCode};
use std::future::Future;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY: Duration = Duration::from_millis(50);

fn is_transient(err: &Error) -> bool {
    matches!(
        err.code,
        ErrorCode::DatabaseConnectionError | ErrorCode::ServiceUnavailable | ErrorCode::Timeout
    )
}

pub async fn with_retry<T, F, Fut>(mut op: F) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if is_transient(&e) && attempt < MAX_ATTEMPTS => {
                tokio::time::sleep(BASE_DELAY * attempt).await;
                continue;
            }
            Err(e) if is_transient(&e) => {
                return Err(Error::new(
                    ErrorCode::ServiceUnavailable,
                    format!("store unavailable after {attempt} attempts: {e}"),
                ));
            }
            Err(e) => return Err(e),
        }
    }
}

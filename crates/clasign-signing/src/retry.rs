//! Caller-owned retry for compare-and-swap writes.

use clasign_core::error::ClaResult;
use tracing::debug;

/// Run `op` until it stops failing with `ConcurrentUpdating`, at most
/// `max_attempts` times.
///
/// Each attempt must re-read the aggregate and re-validate against it;
/// `op` is the whole read-validate-write cycle, never only the write.
/// Any other outcome, success or failure, is returned as is.
pub async fn retry_on_conflict<T, F, Fut>(max_attempts: u32, mut op: F) -> ClaResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ClaResult<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(e) if e.is_concurrent_updating() && attempt < max_attempts => {
                debug!(attempt, "Concurrent update, retrying with fresh state");
                attempt += 1;
            }
            outcome => return outcome,
        }
    }
}

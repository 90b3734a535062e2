//! Delayed invocation of a single fallible async operation
//!
//! The aggregator in [`crate::stagger`] schedules one of these units per
//! item. The wait rides the runtime's timer wheel via `tokio::time::sleep`,
//! so no thread blocks while a unit waits for its start slot.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::trace;

/// Waits out `delay`, then applies `op` to `(ctx, item, index)` and awaits it.
///
/// The operation's result is returned unchanged. A zero delay skips timer
/// registration entirely.
pub(crate) async fn invoke_after<C, T, R, E, F, Fut>(
    op: F,
    delay: Duration,
    ctx: C,
    item: T,
    index: usize,
) -> Result<R, E>
where
    F: FnOnce(C, T, usize) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    wait(delay).await;
    trace!(
        index,
        delay_ms = delay.as_millis() as u64,
        "starting staggered operation"
    );
    op(ctx, item, index).await
}

/// Lenient variant of [`invoke_after`]: an absent operation is not an error.
///
/// With `op == None` the unit still waits out its delay, then resolves with
/// `R::default()` instead of failing.
pub(crate) async fn invoke_after_or_default<C, T, R, E, F, Fut>(
    op: Option<F>,
    delay: Duration,
    ctx: C,
    item: T,
    index: usize,
) -> Result<R, E>
where
    R: Default,
    F: FnOnce(C, T, usize) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    match op {
        Some(op) => invoke_after(op, delay, ctx, item, index).await,
        None => {
            wait(delay).await;
            trace!(index, "no operation supplied, resolving with default value");
            Ok(R::default())
        }
    }
}

async fn wait(delay: Duration) {
    if !delay.is_zero() {
        sleep(delay).await;
    }
}

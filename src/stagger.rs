//! Staggered fan-out over a collection of items
//!
//! One delayed unit per item, all spawned up front, awaited all-or-nothing
//! with results kept in input order.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::delay;

/// Applies `op` to every item, starting the unit for index `i` only after
/// `step × i` has elapsed.
///
/// Resolves with the results in input order once every unit has succeeded,
/// or with the first observed operation error. Units still pending when the
/// error is observed are not cancelled; they run to completion on the runtime
/// and their outcomes are discarded.
///
/// Spawns one task per item, so it must be called from within a Tokio
/// runtime. An operation that produces its value synchronously can wrap it
/// with [`std::future::ready`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let doubled = stagger::stagger_all(
///     vec![1u32, 2, 3],
///     |item, _index| async move { Ok::<_, std::convert::Infallible>(item * 2) },
///     Duration::from_millis(5),
/// )
/// .await
/// .unwrap();
///
/// assert_eq!(doubled, [2, 4, 6]);
/// # }
/// ```
pub async fn stagger_all<I, T, R, E, F, Fut>(items: I, op: F, step: Duration) -> Result<Vec<R>, E>
where
    I: IntoIterator<Item = T>,
    T: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    F: Fn(T, usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    stagger_all_with(items, move |_ctx, item, index| op(item, index), step, ()).await
}

/// Like [`stagger_all`], with a caller-supplied context value threaded into
/// every invocation as the operation's first argument.
///
/// The context is cloned once per unit. All units observe it concurrently,
/// so it is shared state, not per-item state.
pub async fn stagger_all_with<C, I, T, R, E, F, Fut>(
    items: I,
    op: F,
    step: Duration,
    ctx: C,
) -> Result<Vec<R>, E>
where
    C: Clone + Send + 'static,
    I: IntoIterator<Item = T>,
    T: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    F: Fn(C, T, usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    let op = Arc::new(op);
    let handles: Vec<JoinHandle<Result<R, E>>> = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let op = Arc::clone(&op);
            let ctx = ctx.clone();
            tokio::spawn(delay::invoke_after(
                move |ctx, item, index| op(ctx, item, index),
                stagger_delay(step, index),
                ctx,
                item,
                index,
            ))
        })
        .collect();

    if handles.is_empty() {
        debug!("no items to stagger");
        return Ok(Vec::new());
    }

    debug!(
        units = handles.len(),
        step_ms = step.as_millis() as u64,
        "staggered fan-out started"
    );
    collect_in_order(handles).await
}

/// Lenient form of [`stagger_all_with`] that tolerates an absent operation.
///
/// With `op == None` every slot resolves to `R::default()` on the same
/// staggered schedule and the call succeeds. A missing callback is treated
/// as a no-op rather than a usage error.
pub async fn stagger_all_or_default<C, I, T, R, E, F, Fut>(
    items: I,
    op: Option<F>,
    step: Duration,
    ctx: C,
) -> Result<Vec<R>, E>
where
    C: Clone + Send + 'static,
    I: IntoIterator<Item = T>,
    T: Send + 'static,
    R: Default + Send + 'static,
    E: Send + 'static,
    F: Fn(C, T, usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    let op = op.map(Arc::new);
    let handles: Vec<JoinHandle<Result<R, E>>> = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let op = op.clone();
            let ctx = ctx.clone();
            tokio::spawn(delay::invoke_after_or_default(
                op.map(|op| move |ctx, item, index| op(ctx, item, index)),
                stagger_delay(step, index),
                ctx,
                item,
                index,
            ))
        })
        .collect();

    if handles.is_empty() {
        debug!("no items to stagger");
        return Ok(Vec::new());
    }

    debug!(
        units = handles.len(),
        step_ms = step.as_millis() as u64,
        "staggered fan-out started"
    );
    collect_in_order(handles).await
}

/// Per-unit start delay. Saturates instead of overflowing on absurd
/// `step × index` products.
fn stagger_delay(step: Duration, index: usize) -> Duration {
    step.saturating_mul(u32::try_from(index).unwrap_or(u32::MAX))
}

/// Awaits every unit, preserving input order and surfacing the first error.
///
/// A unit that panicked has its panic resumed here. A join error cannot
/// otherwise occur: units are never aborted through this API.
async fn collect_in_order<R, E>(handles: Vec<JoinHandle<Result<R, E>>>) -> Result<Vec<R>, E> {
    try_join_all(handles.into_iter().map(|handle| async move {
        match handle.await {
            Ok(result) => result,
            Err(join_err) => match join_err.try_into_panic() {
                Ok(payload) => std::panic::resume_unwind(payload),
                Err(join_err) => unreachable!("staggered unit aborted: {join_err}"),
            },
        }
    }))
    .await
}

//! Bounded-concurrency task execution
//!
//! Product pages within a subcategory are independent, so they run
//! through a fixed-width window: at most `limit` tasks in flight, each
//! completion immediately admitting the next. Results carry the index
//! of the task that produced them, so callers get input order back no
//! matter how completions interleave.

use futures::stream::{self, StreamExt};
use std::future::Future;

/// How many completions between progress reports.
const PROGRESS_INTERVAL: usize = 10;

/// Progress is reported every [`PROGRESS_INTERVAL`] completions and once
/// more when the batch drains. A batch whose size lands on the interval
/// reports the final count a single time.
fn report_due(completed: usize, total: usize) -> bool {
    completed % PROGRESS_INTERVAL == 0 || completed == total
}

/// Runs `worker` over `items` with at most `limit` tasks in flight.
///
/// Returns one slot per input, in input order: `Some` for tasks that
/// succeeded, `None` for tasks that failed. Failures are logged and
/// never abort the batch.
///
/// # Arguments
///
/// * `items` - The inputs, one task each
/// * `limit` - Maximum number of tasks in flight (minimum 1)
/// * `worker` - Async operation applied to each input
pub async fn map_limit<T, R, F, Fut>(items: Vec<T>, limit: usize, worker: F) -> Vec<Option<R>>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = crate::Result<R>>,
{
    let total = items.len();
    let mut slots: Vec<Option<R>> = Vec::with_capacity(total);
    slots.resize_with(total, || None);

    let mut completions = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            let task = worker(item);
            async move { (index, task.await) }
        })
        .buffer_unordered(limit.max(1));

    let mut completed = 0usize;
    while let Some((index, outcome)) = completions.next().await {
        completed += 1;
        match outcome {
            Ok(value) => slots[index] = Some(value),
            Err(e) => tracing::warn!("Task {} failed: {}", index + 1, e),
        }
        if report_due(completed, total) {
            tracing::info!("Progress: {}/{} tasks complete", completed, total);
        }
    }

    slots
}

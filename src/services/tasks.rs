//! Per-URL work: fetch and decode, then count and select.
//!
//! For one URL the steps run strictly in order: claim (done by the
//! controller) → fetch → decode → count → `ResultCache::complete` → output
//! row. Rows from different URLs come out in whatever order they finish.

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, OwnedSemaphorePermit};

use crate::analysis::{top_three, Histogram};
use crate::models::TopThree;
use crate::services::decoder::{decode_blocking, DecodedImage};
use crate::services::output::{format_row, RowSink};
use crate::services::{ImageFetcher, ResultCache};

/// Counts spawned tasks that have not finished yet.
///
/// The count is raised before a task is spawned and lowered when it ends,
/// including by panic, so a fetch task spawning its count task never lets
/// the counter touch zero in between.
#[derive(Clone, Default)]
pub struct TaskTracker {
    inner: Arc<TrackerInner>,
}

#[derive(Default)]
struct TrackerInner {
    outstanding: AtomicUsize,
    idle: Notify,
}

struct TaskGuard(Arc<TrackerInner>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        if self.0.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

impl TaskTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.inner.outstanding.fetch_add(1, Ordering::AcqRel);
        let guard = TaskGuard(self.inner.clone());
        tokio::spawn(async move {
            let _guard = guard;
            task.await;
        });
    }

    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.load(Ordering::Acquire)
    }

    /// Wait until every spawned task has finished.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            // Register before checking so a wakeup between the two is not lost
            notified.as_mut().enable();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Outcome counters updated by tasks.
#[derive(Default)]
pub struct TaskStats {
    pub rows_written: AtomicU64,
    pub fetch_failures: AtomicU64,
    pub decode_failures: AtomicU64,
}

/// Everything a task needs, cloned into each one.
#[derive(Clone)]
pub struct TaskContext {
    pub cache: Arc<ResultCache>,
    pub fetcher: Arc<dyn ImageFetcher>,
    pub sink: Arc<dyn RowSink>,
    pub tracker: TaskTracker,
    pub stats: Arc<TaskStats>,
}

/// Fetch and decode one claimed URL, then hand the pixels to a count task.
///
/// `permit` is the URL's in-flight slot; it travels with the work and is
/// released when the last task for this URL ends.
pub async fn fetch_decode(ctx: TaskContext, url: String, permit: OwnedSemaphorePermit) {
    let bytes = match ctx.fetcher.fetch(&url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Fetch failed");
            ctx.stats.fetch_failures.fetch_add(1, Ordering::Relaxed);
            ctx.cache.fail(&url).await;
            return;
        }
    };

    let image = match decode_blocking(bytes).await {
        Ok(image) => image,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Decode failed");
            ctx.stats.decode_failures.fetch_add(1, Ordering::Relaxed);
            ctx.cache.fail(&url).await;
            return;
        }
    };

    tracing::debug!(
        url = %url,
        format = image.format_name(),
        width = image.pixels.width(),
        height = image.pixels.height(),
        "Decoded image"
    );

    let tracker = ctx.tracker.clone();
    tracker.spawn(count_select(ctx, url, image, permit));
}

/// Count colors, publish the top three, and emit the row.
pub async fn count_select(
    ctx: TaskContext,
    url: String,
    image: DecodedImage,
    permit: OwnedSemaphorePermit,
) {
    let counted = tokio::task::spawn_blocking(move || count_colors(&image)).await;
    let (top, distinct) = match counted {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(url = %url, error = %e, "Count task failed");
            ctx.cache.fail(&url).await;
            return;
        }
    };

    tracing::debug!(url = %url, distinct_colors = distinct, "Counted colors");

    ctx.cache.complete(&url, top).await;

    match ctx.sink.write_row(&format_row(&url, &top)) {
        Ok(()) => {
            ctx.stats.rows_written.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => tracing::error!(url = %url, error = %e, "Failed to emit result row"),
    }

    drop(permit);
}

/// Histogram lives only for the duration of this call.
fn count_colors(image: &DecodedImage) -> (TopThree, usize) {
    let histogram = Histogram::from_rgb(&image.pixels);
    (top_three(&histogram), histogram.len())
}

//! The admission loop: pulls URLs, skips duplicates, throttles dispatch.
//!
//! Phases: `Fetching` reads the next URL and dispatches or skips it,
//! `MemoryCheck` holds further reads while the sampled footprint is over
//! the ceiling, `Draining` waits for every spawned task once input ends,
//! then `Done`.
//!
//! Two limits apply to new work. A semaphore caps the number of URLs in
//! flight, which bounds memory deterministically. On top of that the
//! sampled process footprint is compared with the ceiling after every URL,
//! because a single huge image can still outgrow any fixed slot count.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};

use crate::models::Settings;
use crate::services::memory::{bytes_to_mib, MemoryProbe};
use crate::services::tasks::{fetch_decode, TaskContext, TaskStats, TaskTracker};
use crate::services::url_producer::SourceEvent;
use crate::services::{ImageFetcher, ResultCache, RowSink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionSettings {
    pub memory_ceiling_bytes: u64,
    pub pacing: Duration,
    pub pause: Duration,
    pub max_in_flight: usize,
}

impl Default for AdmissionSettings {
    fn default() -> Self {
        AdmissionSettings::from(&Settings::default())
    }
}

impl From<&Settings> for AdmissionSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            memory_ceiling_bytes: settings.memory_ceiling_bytes(),
            pacing: settings.pacing(),
            pause: settings.pause(),
            max_in_flight: settings.effective_max_in_flight(),
        }
    }
}

/// What a run did, reported once everything has drained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub urls_read: u64,
    pub dispatched: u64,
    pub duplicates_skipped: u64,
    pub rows_written: u64,
    pub fetch_failures: u64,
    pub decode_failures: u64,
    /// Times the memory check slept at least once
    pub memory_pauses: u64,
    /// Reclaim requests issued while over the ceiling
    pub reclaims: u64,
    /// Input ended by a closed queue rather than the end-of-input marker
    pub source_truncated: bool,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Fetching,
    MemoryCheck,
    Draining,
    Done,
}

pub struct AdmissionController {
    settings: AdmissionSettings,
    cache: Arc<ResultCache>,
    fetcher: Arc<dyn ImageFetcher>,
    sink: Arc<dyn RowSink>,
    probe: Arc<dyn MemoryProbe>,
}

impl AdmissionController {
    pub fn new(
        settings: AdmissionSettings,
        cache: Arc<ResultCache>,
        fetcher: Arc<dyn ImageFetcher>,
        sink: Arc<dyn RowSink>,
        probe: Arc<dyn MemoryProbe>,
    ) -> Self {
        Self {
            settings,
            cache,
            fetcher,
            sink,
            probe,
        }
    }

    /// Consume `urls` until end of input, then wait for all dispatched work.
    pub async fn run(&self, mut urls: mpsc::Receiver<SourceEvent>) -> RunSummary {
        let started = Instant::now();
        let tracker = TaskTracker::new();
        let stats = Arc::new(TaskStats::default());
        let slots = Arc::new(Semaphore::new(self.settings.max_in_flight.max(1)));
        let ctx = TaskContext {
            cache: self.cache.clone(),
            fetcher: self.fetcher.clone(),
            sink: self.sink.clone(),
            tracker: tracker.clone(),
            stats: stats.clone(),
        };
        let mut summary = RunSummary::default();

        let mut phase = Phase::Fetching;
        while phase != Phase::Done {
            phase = match phase {
                Phase::Fetching => match urls.recv().await {
                    Some(SourceEvent::Url(url)) => {
                        self.admit(url, &ctx, &slots, &mut summary).await;
                        Phase::MemoryCheck
                    }
                    Some(SourceEvent::Done) => Phase::Draining,
                    None => {
                        tracing::warn!("URL source closed without end-of-input marker");
                        summary.source_truncated = true;
                        Phase::Draining
                    }
                },
                Phase::MemoryCheck => {
                    self.relieve_memory_pressure(&mut summary).await;
                    Phase::Fetching
                }
                Phase::Draining => {
                    tracing::debug!(outstanding = tracker.outstanding(), "Draining");
                    tracker.wait_idle().await;
                    Phase::Done
                }
                Phase::Done => Phase::Done,
            };
        }

        summary.rows_written = stats.rows_written.load(Ordering::Relaxed);
        summary.fetch_failures = stats.fetch_failures.load(Ordering::Relaxed);
        summary.decode_failures = stats.decode_failures.load(Ordering::Relaxed);
        summary.elapsed = started.elapsed();
        summary
    }

    async fn admit(
        &self,
        url: String,
        ctx: &TaskContext,
        slots: &Arc<Semaphore>,
        summary: &mut RunSummary,
    ) {
        let url = url.trim().to_string();
        if url.is_empty() {
            return;
        }
        summary.urls_read += 1;

        // Read-locked check first; most repeats stop here
        if self.cache.contains(&url).await || !self.cache.try_claim(&url).await {
            tracing::debug!(url = %url, "Skipping duplicate URL");
            summary.duplicates_skipped += 1;
            return;
        }

        // The semaphore is never closed, so this only waits for a free slot
        let Ok(permit) = slots.clone().acquire_owned().await else {
            return;
        };

        tracing::debug!(url = %url, "Dispatching");
        summary.dispatched += 1;
        ctx.tracker.spawn(fetch_decode(ctx.clone(), url, permit));

        tokio::time::sleep(self.settings.pacing).await;
    }

    /// Block until the sampled footprint is at or under the ceiling.
    async fn relieve_memory_pressure(&self, summary: &mut RunSummary) {
        let ceiling = self.settings.memory_ceiling_bytes;
        let mut paused = false;

        loop {
            if self.probe.sample() <= ceiling {
                break;
            }

            summary.reclaims += 1;
            self.probe.reclaim().await;
            let used = self.probe.sample();
            if used <= ceiling {
                break;
            }

            if !paused {
                paused = true;
                summary.memory_pauses += 1;
            }
            tracing::warn!(
                used_mib = bytes_to_mib(used),
                ceiling_mib = bytes_to_mib(ceiling),
                "Using too much memory, pausing dispatch"
            );
            tokio::time::sleep(self.settings.pause).await;
        }
    }
}

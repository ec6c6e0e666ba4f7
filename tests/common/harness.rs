//! Runs the admission controller against in-memory collaborators.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use tricolor::services::{
    AdmissionController, AdmissionSettings, ImageFetcher, MemoryProbe, MemorySink, ResultCache,
    RunSummary, SourceEvent,
};

/// Replays scripted samples, then repeats the last one.
pub struct ScriptedProbe {
    samples: Mutex<VecDeque<u64>>,
    last: Mutex<u64>,
    pub reclaims: AtomicU32,
}

impl ScriptedProbe {
    pub fn new(samples: &[u64]) -> Self {
        Self {
            samples: Mutex::new(samples.iter().copied().collect()),
            last: Mutex::new(0),
            reclaims: AtomicU32::new(0),
        }
    }

    pub fn idle() -> Self {
        Self::new(&[0])
    }
}

#[async_trait]
impl MemoryProbe for ScriptedProbe {
    fn sample(&self) -> u64 {
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.samples.lock().unwrap().pop_front() {
            *last = next;
        }
        *last
    }

    async fn reclaim(&self) {
        self.reclaims.fetch_add(1, Ordering::SeqCst);
    }
}

/// Controller wired to a fetcher, a memory sink and a scripted probe.
pub struct Harness {
    pub cache: Arc<ResultCache>,
    pub sink: Arc<MemorySink>,
    pub probe: Arc<ScriptedProbe>,
    pub controller: AdmissionController,
}

impl Harness {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self::with(fetcher, ResultCache::new(), ScriptedProbe::idle())
    }

    pub fn with(fetcher: Arc<dyn ImageFetcher>, cache: ResultCache, probe: ScriptedProbe) -> Self {
        let cache = Arc::new(cache);
        let sink = Arc::new(MemorySink::new());
        let probe = Arc::new(probe);
        let settings = AdmissionSettings {
            memory_ceiling_bytes: 1_000,
            pacing: Duration::from_millis(1),
            pause: Duration::from_millis(5),
            max_in_flight: 4,
        };
        let controller = AdmissionController::new(
            settings,
            cache.clone(),
            fetcher,
            sink.clone(),
            probe.clone(),
        );
        Self {
            cache,
            sink,
            probe,
            controller,
        }
    }

    /// Feed `urls` followed by the end-of-input marker and run to completion.
    pub async fn run(&self, urls: &[&str]) -> RunSummary {
        let (tx, rx) = mpsc::channel(urls.len() + 1);
        for url in urls {
            tx.send(SourceEvent::Url(url.to_string())).await.unwrap();
        }
        tx.send(SourceEvent::Done).await.unwrap();
        drop(tx);

        tokio::time::timeout(Duration::from_secs(10), self.controller.run(rx))
            .await
            .expect("controller did not finish")
    }

    /// Rows sorted, since completion order is not input order
    pub fn sorted_rows(&self) -> Vec<String> {
        let mut rows = self.sink.rows();
        rows.sort();
        rows
    }
}

/// One-shot helper: run `urls` through a fresh harness.
pub async fn run_urls(fetcher: Arc<dyn ImageFetcher>, urls: &[&str]) -> (Harness, RunSummary) {
    let harness = Harness::new(fetcher);
    let summary = harness.run(urls).await;
    (harness, summary)
}

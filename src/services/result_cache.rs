//! Deduplicating result table shared by the controller and all tasks.
//!
//! Lock discipline: lookups take the read lock; `try_claim`, `complete` and
//! `fail` take the write lock. The table is never pruned during a run, except
//! for failed entries when retries are enabled.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::models::TopThree;

/// Where a URL stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlState {
    /// Claimed, fetch/decode/count still running
    InProgress,
    Completed(TopThree),
    /// Fetch or decode failed; the URL is skipped from now on
    Failed,
}

/// URL → result, keyed by the URL exactly as read from the input.
pub struct ResultCache {
    entries: RwLock<HashMap<String, UrlState>>,
    retry_failed: bool,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::with_retry_failed(false)
    }

    /// With `retry_failed`, a failed URL is forgotten instead of marked, so a
    /// later duplicate gets dispatched again.
    pub fn with_retry_failed(retry_failed: bool) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            retry_failed,
        }
    }

    /// Shared-lock presence check for the common duplicate case
    pub async fn contains(&self, url: &str) -> bool {
        self.entries.read().await.contains_key(url)
    }

    /// Atomically reserve `url`. Returns `true` only for the caller that
    /// inserted it; every later call for the same URL gets `false`.
    pub async fn try_claim(&self, url: &str) -> bool {
        let mut entries = self.entries.write().await;
        match entries.entry(url.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(UrlState::InProgress);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Publish the final result for a claimed URL.
    pub async fn complete(&self, url: &str, top: TopThree) {
        let mut entries = self.entries.write().await;
        match entries.get_mut(url) {
            Some(state) if *state == UrlState::InProgress => *state = UrlState::Completed(top),
            Some(state) => {
                tracing::warn!(url = %url, ?state, "Ignoring completion for URL not in progress");
            }
            None => {
                tracing::warn!(url = %url, "Ignoring completion for unclaimed URL");
            }
        }
    }

    /// Record a fetch or decode failure for a claimed URL.
    pub async fn fail(&self, url: &str) {
        let mut entries = self.entries.write().await;
        if self.retry_failed {
            if entries.get(url) == Some(&UrlState::InProgress) {
                entries.remove(url);
            }
        } else if let Some(state) = entries.get_mut(url) {
            if *state == UrlState::InProgress {
                *state = UrlState::Failed;
            }
        }
    }

    pub async fn get(&self, url: &str) -> Option<UrlState> {
        self.entries.read().await.get(url).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

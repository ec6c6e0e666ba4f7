//! Memory sampling for admission backpressure.
//!
//! This is a coarse signal: the process resident set is sampled, not the
//! bytes attributable to in-flight images.

use async_trait::async_trait;
use std::sync::Mutex;
use sysinfo::{Pid, System};

#[async_trait]
pub trait MemoryProbe: Send + Sync {
    /// Bytes currently in use by the process
    fn sample(&self) -> u64;

    /// Give in-flight work a chance to release memory before the next sample.
    async fn reclaim(&self);
}

/// Samples the resident set size of the current process.
pub struct ProcessMemoryProbe {
    pid: Option<Pid>,
    system: Mutex<System>,
}

impl ProcessMemoryProbe {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!(error = %e, "Cannot determine own PID, memory throttle disabled");
                None
            }
        };
        Self {
            pid,
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for ProcessMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryProbe for ProcessMemoryProbe {
    fn sample(&self) -> u64 {
        let Some(pid) = self.pid else {
            return 0;
        };
        let mut system = match self.system.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        system.refresh_process(pid);
        system.process(pid).map(|p| p.memory()).unwrap_or(0)
    }

    /// There is no collector to run; yielding lets finished tasks drop their
    /// pixel buffers and histograms before the re-sample.
    async fn reclaim(&self) {
        tokio::task::yield_now().await;
    }
}

pub fn bytes_to_mib(bytes: u64) -> u64 {
    bytes / 1024 / 1024
}

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const MIB: u64 = 1024 * 1024;

/// Run settings, loaded from an optional YAML file and overridden by CLI flags.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Where the URL list comes from: an http(s) URL, a file path, or `-` for stdin
    pub input: Option<String>,

    /// Sampled memory ceiling before dispatch pauses
    pub max_memory_mib: u64,

    /// Delay after each dispatch
    pub pacing_ms: u64,

    /// Sleep while over the memory ceiling
    pub pause_ms: u64,

    /// Cap on URLs being fetched or counted at once (derived from the ceiling if unset)
    pub max_in_flight: Option<usize>,

    /// Per-image request timeout
    pub fetch_timeout_secs: u64,

    /// Forget failed URLs so a later duplicate is tried again
    pub retry_failed: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input: None,
            max_memory_mib: 128,
            pacing_ms: 10,
            pause_ms: 500,
            max_in_flight: None,
            fetch_timeout_secs: 30,
            retry_failed: false,
        }
    }
}

impl Settings {
    /// Load settings from a YAML file; absent keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_yaml::from_str(&content)?;
        tracing::info!(path = %path.display(), "Loaded settings file");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_memory_mib == 0 {
            return Err(ConfigError::Invalid(
                "max_memory_mib must be positive".to_string(),
            ));
        }
        if self.max_in_flight == Some(0) {
            return Err(ConfigError::Invalid(
                "max_in_flight must be positive".to_string(),
            ));
        }
        match self.input.as_deref().map(str::trim) {
            None | Some("") => Err(ConfigError::Invalid("no input source given".to_string())),
            Some(_) => Ok(()),
        }
    }

    pub fn memory_ceiling_bytes(&self) -> u64 {
        self.max_memory_mib.saturating_mul(MIB)
    }

    /// One in-flight URL per 8 MiB of ceiling unless set explicitly
    pub fn effective_max_in_flight(&self) -> usize {
        self.max_in_flight
            .unwrap_or_else(|| (self.max_memory_mib / 8).max(1) as usize)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tricolor::models::Settings;
use tricolor::services::url_producer::DEFAULT_QUEUE_CAPACITY;
use tricolor::services::{
    spawn_producer, AdmissionController, AdmissionSettings, HttpFetcher, InputSource,
    ProcessMemoryProbe, ResultCache, StdoutSink,
};

#[derive(Parser)]
#[command(name = "tricolor")]
#[command(about = "Report the three most frequent colors of each image in a URL list as CSV")]
struct Cli {
    /// URL list: http(s) URL, file path, or "-" for stdin
    #[arg(short, long)]
    input: Option<String>,

    /// YAML settings file (falls back to TRICOLOR_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pause dispatch while sampled memory is above this many MiB
    #[arg(long)]
    max_memory_mib: Option<u64>,

    /// Delay after each dispatch, in milliseconds
    #[arg(long)]
    pacing_ms: Option<u64>,

    /// Sleep while over the memory ceiling, in milliseconds
    #[arg(long)]
    pause_ms: Option<u64>,

    /// Maximum URLs being fetched or counted at once
    #[arg(long)]
    max_in_flight: Option<usize>,

    /// Per-image request timeout, in seconds
    #[arg(long)]
    fetch_timeout_secs: Option<u64>,

    /// Retry a failed URL if it appears again later in the list
    #[arg(long)]
    retry_failed: bool,
}

impl Cli {
    fn into_settings(self) -> anyhow::Result<Settings> {
        let config_file = self
            .config
            .or_else(|| std::env::var("TRICOLOR_CONFIG").ok().map(PathBuf::from));

        let mut settings = match config_file {
            Some(path) => Settings::load(&path)?,
            None => Settings::default(),
        };

        if let Some(input) = self.input {
            settings.input = Some(input);
        }
        if let Some(mib) = self.max_memory_mib {
            settings.max_memory_mib = mib;
        }
        if let Some(ms) = self.pacing_ms {
            settings.pacing_ms = ms;
        }
        if let Some(ms) = self.pause_ms {
            settings.pause_ms = ms;
        }
        if let Some(n) = self.max_in_flight {
            settings.max_in_flight = Some(n);
        }
        if let Some(secs) = self.fetch_timeout_secs {
            settings.fetch_timeout_secs = secs;
        }
        if self.retry_failed {
            settings.retry_failed = true;
        }

        settings.validate()?;
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the CSV rows, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tricolor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = Cli::parse().into_settings()?;
    let source = InputSource::parse(settings.input.as_deref().unwrap_or_default());
    let admission = AdmissionSettings::from(&settings);

    tracing::info!(
        source = %source,
        max_memory_mib = settings.max_memory_mib,
        max_in_flight = admission.max_in_flight,
        pacing_ms = settings.pacing_ms,
        pause_ms = settings.pause_ms,
        "Starting"
    );

    let fetcher = Arc::new(HttpFetcher::new(settings.fetch_timeout())?);
    // No overall timeout for the list itself: it may stream for the whole run
    let (urls, producer) = spawn_producer(source, reqwest::Client::new(), DEFAULT_QUEUE_CAPACITY);

    let controller = AdmissionController::new(
        admission,
        Arc::new(ResultCache::with_retry_failed(settings.retry_failed)),
        fetcher,
        Arc::new(StdoutSink),
        Arc::new(ProcessMemoryProbe::new()),
    );

    let summary = controller.run(urls).await;
    producer.await?;

    tracing::info!(
        urls_read = summary.urls_read,
        dispatched = summary.dispatched,
        duplicates = summary.duplicates_skipped,
        rows = summary.rows_written,
        fetch_failures = summary.fetch_failures,
        decode_failures = summary.decode_failures,
        memory_pauses = summary.memory_pauses,
        "Finished in {:?}",
        summary.elapsed
    );

    Ok(())
}

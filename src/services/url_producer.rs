//! Streams the URL list into the admission queue.
//!
//! The producer reads the list once, front to back, and sends one
//! [`SourceEvent::Url`] per non-empty line followed by [`SourceEvent::Done`].
//! If the source cannot be opened or breaks mid-stream the sender is dropped
//! without `Done`; the controller treats a closed queue as end of input.

use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::SourceError;

/// Queue depth between producer and controller
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    Url(String),
    /// End-of-input marker
    Done,
}

/// Where the newline-delimited URL list lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Http(String),
    File(PathBuf),
    Stdin,
}

impl InputSource {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input == "-" {
            InputSource::Stdin
        } else if input.starts_with("http://") || input.starts_with("https://") {
            InputSource::Http(input.to_string())
        } else {
            InputSource::File(PathBuf::from(input))
        }
    }
}

impl std::fmt::Display for InputSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputSource::Http(url) => write!(f, "{url}"),
            InputSource::File(path) => write!(f, "{}", path.display()),
            InputSource::Stdin => write!(f, "stdin"),
        }
    }
}

/// Start reading `source` in the background.
pub fn spawn_producer(
    source: InputSource,
    client: reqwest::Client,
    capacity: usize,
) -> (mpsc::Receiver<SourceEvent>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let handle = tokio::spawn(async move {
        match produce(&source, &client, &tx).await {
            Ok(count) => {
                tracing::debug!(source = %source, urls = count, "URL source exhausted");
                // Receiver gone means the controller already stopped; nothing to do
                let _ = tx.send(SourceEvent::Done).await;
            }
            Err(e) => {
                tracing::error!(source = %source, error = %e, "URL source failed");
            }
        }
    });
    (rx, handle)
}

async fn produce(
    source: &InputSource,
    client: &reqwest::Client,
    tx: &mpsc::Sender<SourceEvent>,
) -> Result<usize, SourceError> {
    match source {
        InputSource::Http(url) => produce_from_http(url, client, tx).await,
        InputSource::File(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|e| SourceError::Unavailable(format!("{}: {e}", path.display())))?;
            produce_from_reader(BufReader::new(file), tx).await
        }
        InputSource::Stdin => produce_from_reader(BufReader::new(tokio::io::stdin()), tx).await,
    }
}

async fn produce_from_http(
    url: &str,
    client: &reqwest::Client,
    tx: &mpsc::Sender<SourceEvent>,
) -> Result<usize, SourceError> {
    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SourceError::Unavailable(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Unavailable(format!("HTTP {}", status.as_u16())));
    }

    let mut splitter = LineSplitter::default();
    let mut sent = 0;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| SourceError::Read(e.to_string()))?
    {
        for line in splitter.push(&chunk) {
            if !send_line(tx, line).await {
                return Ok(sent);
            }
            sent += 1;
        }
    }
    if let Some(line) = splitter.finish() {
        if send_line(tx, line).await {
            sent += 1;
        }
    }
    Ok(sent)
}

/// Read lines from any buffered async reader (file, stdin, or test data).
pub async fn produce_from_reader<R>(
    reader: R,
    tx: &mpsc::Sender<SourceEvent>,
) -> Result<usize, SourceError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.split(b'\n');
    let mut sent = 0;
    while let Some(raw) = lines
        .next_segment()
        .await
        .map_err(|e| SourceError::Read(e.to_string()))?
    {
        if let Some(url) = clean_line(&raw) {
            if !send_line(tx, url).await {
                return Ok(sent);
            }
            sent += 1;
        }
    }
    Ok(sent)
}

/// Returns false once the receiver has gone away.
async fn send_line(tx: &mpsc::Sender<SourceEvent>, url: String) -> bool {
    tx.send(SourceEvent::Url(url)).await.is_ok()
}

/// Trimmed line, or `None` for blank lines. Invalid UTF-8 is replaced, not rejected.
fn clean_line(raw: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim();
    (!line.is_empty()).then(|| line.to_string())
}

/// Reassembles lines split across body chunks.
#[derive(Default)]
struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            if let Some(line) = clean_line(&raw) {
                lines.push(line);
            }
        }
        lines
    }

    fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        clean_line(&rest)
    }
}

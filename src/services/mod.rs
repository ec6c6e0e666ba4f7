pub mod admission;
pub mod decoder;
pub mod fetcher;
pub mod memory;
pub mod output;
pub mod result_cache;
pub mod tasks;
pub mod url_producer;

pub use admission::{AdmissionController, AdmissionSettings, RunSummary};
pub use decoder::{decode, DecodedImage};
pub use fetcher::{HttpFetcher, ImageFetcher, StaticFetcher};
pub use memory::{MemoryProbe, ProcessMemoryProbe};
pub use output::{format_row, MemorySink, RowSink, StdoutSink};
pub use result_cache::{ResultCache, UrlState};
pub use tasks::TaskTracker;
pub use url_producer::{spawn_producer, InputSource, SourceEvent};

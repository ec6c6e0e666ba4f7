use thiserror::Error;

/// Failure to acquire the raw bytes of one image.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected HTTP status: {0}")]
    Status(u16),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => FetchError::Status(status.as_u16()),
            None => FetchError::Transport(e.to_string()),
        }
    }
}

/// Failure to turn fetched bytes into a pixel grid.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Malformed image data: {0}")]
    Malformed(String),

    #[error("Decode task failed: {0}")]
    TaskFailed(String),
}

impl From<image::ImageError> for DecodeError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::Unsupported(_) => DecodeError::UnsupportedFormat,
            other => DecodeError::Malformed(other.to_string()),
        }
    }
}

/// Failure to read the list of image URLs.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("URL source unavailable: {0}")]
    Unavailable(String),

    #[error("Failed reading URL source: {0}")]
    Read(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output row: {0}")]
    Io(#[from] std::io::Error),
}

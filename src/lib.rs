//! Tricolor - top three colors per image
//!
//! Streams a list of image URLs, fetches and decodes each unique one, and
//! reports its three most frequent exact RGB colors as a CSV row.
//! This library exposes modules for integration testing.

pub mod analysis;
pub mod error;
pub mod models;
pub mod services;

//! Exact-color histograms.
//!
//! Every distinct RGB triple gets its own bucket: no quantization, no gamma,
//! no merging of near-identical colors. For photographic or noisy images the
//! map can grow to millions of entries and is then the largest allocation a
//! count task holds, which is why it is dropped as soon as the top colors
//! have been extracted.

use std::collections::hash_map;
use std::collections::HashMap;

use image::RgbImage;

use crate::models::ColorKey;

/// Upper bound on the initial bucket reservation.
/// Keeps tiny images cheap and caps the up-front allocation for huge ones.
const MAX_INITIAL_BUCKETS: usize = 1 << 16;

/// Pixel count per distinct color for one image.
#[derive(Debug, Clone, Default)]
pub struct Histogram {
    counts: HashMap<ColorKey, u64>,
    total: u64,
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every pixel of `grid` once, row by row. Alpha has already been
    /// discarded by the RGB conversion.
    pub fn from_rgb(grid: &RgbImage) -> Self {
        let pixels = grid.width() as usize * grid.height() as usize;
        let mut histogram = Self {
            counts: HashMap::with_capacity(pixels.min(MAX_INITIAL_BUCKETS)),
            total: 0,
        };

        for pixel in grid.pixels() {
            histogram.record(ColorKey::from(pixel.0));
        }

        histogram
    }

    pub fn record(&mut self, color: ColorKey) {
        *self.counts.entry(color).or_insert(0) += 1;
        self.total += 1;
    }

    pub fn count(&self, color: &ColorKey) -> u64 {
        self.counts.get(color).copied().unwrap_or(0)
    }

    /// Number of distinct colors
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts, i.e. the number of pixels recorded
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Buckets in unspecified order
    pub fn iter(&self) -> hash_map::Iter<'_, ColorKey, u64> {
        self.counts.iter()
    }
}

impl FromIterator<(ColorKey, u64)> for Histogram {
    fn from_iter<I: IntoIterator<Item = (ColorKey, u64)>>(iter: I) -> Self {
        let mut histogram = Self::new();
        for (color, count) in iter {
            *histogram.counts.entry(color).or_insert(0) += count;
            histogram.total += count;
        }
        histogram
    }
}

//! Color counting and ranking for a single decoded image.

pub mod histogram;
pub mod top_k;

pub use histogram::Histogram;
pub use top_k::top_three;

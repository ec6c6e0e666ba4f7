pub mod color;
pub mod config;

pub use color::{ColorCount, ColorKey, TopThree};
pub use config::Settings;

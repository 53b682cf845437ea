pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod processor;

pub use error::{Result, SegmentError};
pub use pipeline::SegmentationPipeline;

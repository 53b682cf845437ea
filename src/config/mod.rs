pub mod segment_config;

pub use segment_config::*;

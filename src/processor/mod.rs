pub mod classifier;
pub mod goal_evaluator;
pub mod metrics;
pub mod month_column;
pub mod report;
pub mod schema_normalizer;
pub mod segment_filter;
pub mod tables;

pub use classifier::*;
pub use goal_evaluator::*;
pub use metrics::{PurchaseMetrics, Window};
pub use month_column::*;
pub use report::*;
pub use schema_normalizer::*;
pub use segment_filter::*;
pub use tables::*;

//! Evaluation metrics.

pub mod total_blurred_area;

pub use total_blurred_area::{BinaryMask, BlurStatistics, ConfusionCounts, MetricError};

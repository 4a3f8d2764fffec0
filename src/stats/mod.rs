//! Stats module - per-region aggregation

mod aggregate;

pub use aggregate::{aggregate_by_region, Metric, RegionTotals};

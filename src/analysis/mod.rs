//! Aggregation and feature engineering over parsed events.

pub mod aggregator;
pub mod features;

pub use self::aggregator::{aggregate, AggregatedRow};
pub use self::features::{build_features, FeatureVector};

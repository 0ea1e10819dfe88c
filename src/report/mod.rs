//! Triage report -- the boundary consumed by external renderers.

pub mod runner;

pub use self::runner::run_pipeline;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::AggregatedRow;
use crate::detect::Strategy;
use crate::ingest::Event;

/// Everything the rendering side needs: totals, frequency tables, the
/// aggregated series, and one outcome per detection strategy.
#[derive(Debug, Serialize)]
pub struct TrafficReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub total_events: usize,
    pub malformed_lines: usize,
    pub method_counts: BTreeMap<String, u64>,
    pub status_counts: BTreeMap<u16, u64>,
    pub url_counts: BTreeMap<String, u64>,
    pub address_counts: BTreeMap<String, u64>,
    pub rows: Vec<AggregatedRow>,
    pub strategies: Vec<StrategyOutcome>,
}

/// Result of one strategy's detect -> extract -> score path. A failed stage
/// marks the outcome unavailable without touching sibling strategies.
#[derive(Debug, Serialize)]
pub struct StrategyOutcome {
    pub strategy: Strategy,
    /// Recall against the configured ground truth; `None` when unavailable.
    pub accuracy: Option<f64>,
    pub anomaly_timestamps: BTreeSet<NaiveDateTime>,
    /// Explicit marker naming why a stage failed, if one did.
    pub unavailable: Option<String>,
}

impl StrategyOutcome {
    pub(crate) fn failed(strategy: Strategy, reason: String) -> Self {
        Self {
            strategy,
            accuracy: None,
            anomaly_timestamps: BTreeSet::new(),
            unavailable: Some(reason),
        }
    }
}

/// Occurrence counts for one event field, in the shape the renderer tables
/// expect.
pub(crate) fn count_values<K: Ord, F>(events: &[Event], key: F) -> BTreeMap<K, u64>
where
    F: Fn(&Event) -> K,
{
    let mut counts = BTreeMap::new();
    for event in events {
        *counts.entry(key(event)).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TIMESTAMP_FORMAT;

    fn event(method: &str, status: u16) -> Event {
        Event {
            timestamp: NaiveDateTime::parse_from_str("2024-06-12 12:00:00", TIMESTAMP_FORMAT)
                .unwrap(),
            address: "10.0.0.1".to_string(),
            method: method.to_string(),
            url: "/home".to_string(),
            status_code: status,
            user_agent: "test".to_string(),
        }
    }

    #[test]
    fn test_count_values() {
        let events = vec![event("GET", 200), event("GET", 404), event("POST", 200)];

        let methods = count_values(&events, |e| e.method.clone());
        assert_eq!(methods["GET"], 2);
        assert_eq!(methods["POST"], 1);

        let statuses = count_values(&events, |e| e.status_code);
        assert_eq!(statuses[&200], 2);
        assert_eq!(statuses[&404], 1);
    }
}

//! Aggregate events into per-address, per-bucket request counts.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::ingest::Event;

/// One row of the feature substrate: the request count for a single source
/// address within a single time bucket. Recomputed fully on each pipeline
/// run; a row only exists where at least one event landed in the bucket, so
/// `request_count >= 1` always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedRow {
    pub address: String,
    pub bucket_start: NaiveDateTime,
    pub hour: u32,
    pub minute: u32,
    pub request_count: u64,
}

/// Group events by `(address, floor(timestamp, bucket_width))` and emit one
/// row per non-empty group, sorted by `(address, bucket_start)`.
pub fn aggregate(events: &[Event], bucket_width: Duration) -> Vec<AggregatedRow> {
    let mut counts: BTreeMap<(String, NaiveDateTime), u64> = BTreeMap::new();

    for event in events {
        let bucket_start = floor_to_bucket(event.timestamp, bucket_width);
        *counts.entry((event.address.clone(), bucket_start)).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|((address, bucket_start), request_count)| AggregatedRow {
            address,
            hour: bucket_start.hour(),
            minute: bucket_start.minute(),
            bucket_start,
            request_count,
        })
        .collect()
}

/// Floor a timestamp to the start of its bucket.
fn floor_to_bucket(ts: NaiveDateTime, bucket_width: Duration) -> NaiveDateTime {
    let width = bucket_width.as_secs().max(1) as i64;
    let secs = ts.and_utc().timestamp();
    let floored = secs - secs.rem_euclid(width);
    DateTime::from_timestamp(floored, 0)
        .map(|dt| dt.naive_utc())
        .unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TIMESTAMP_FORMAT;

    fn event(ts: &str, address: &str) -> Event {
        Event {
            timestamp: NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).unwrap(),
            address: address.to_string(),
            method: "GET".to_string(),
            url: "/home".to_string(),
            status_code: 200,
            user_agent: "test".to_string(),
        }
    }

    #[test]
    fn test_same_bucket_counts_together() {
        // Events at 12:00:05 and 12:00:45 with 1-minute buckets land in one row.
        let events = vec![
            event("2024-06-12 12:00:05", "192.168.1.1"),
            event("2024-06-12 12:00:45", "192.168.1.1"),
        ];
        let rows = aggregate(&events, Duration::from_secs(60));

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].request_count, 2);
        assert_eq!(
            rows[0].bucket_start,
            NaiveDateTime::parse_from_str("2024-06-12 12:00:00", TIMESTAMP_FORMAT).unwrap()
        );
        assert_eq!(rows[0].hour, 12);
        assert_eq!(rows[0].minute, 0);
    }

    #[test]
    fn test_addresses_get_separate_rows() {
        let events = vec![
            event("2024-06-12 12:00:05", "10.0.0.1"),
            event("2024-06-12 12:00:10", "10.0.0.2"),
        ];
        let rows = aggregate(&events, Duration::from_secs(60));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].address, "10.0.0.1");
        assert_eq!(rows[1].address, "10.0.0.2");
    }

    #[test]
    fn test_counts_round_trip() {
        // Sum of request counts equals the total event count.
        let events = vec![
            event("2024-06-12 12:00:05", "10.0.0.1"),
            event("2024-06-12 12:00:45", "10.0.0.1"),
            event("2024-06-12 12:01:05", "10.0.0.1"),
            event("2024-06-12 12:00:10", "10.0.0.2"),
            event("2024-06-12 12:05:00", "10.0.0.2"),
        ];
        let rows = aggregate(&events, Duration::from_secs(60));

        let total: u64 = rows.iter().map(|r| r.request_count).sum();
        assert_eq!(total, events.len() as u64);
        assert!(rows.iter().all(|r| r.request_count >= 1));
    }

    #[test]
    fn test_wider_bucket_merges_minutes() {
        let events = vec![
            event("2024-06-12 12:00:30", "10.0.0.1"),
            event("2024-06-12 12:03:30", "10.0.0.1"),
        ];

        let per_minute = aggregate(&events, Duration::from_secs(60));
        assert_eq!(per_minute.len(), 2);

        let per_five = aggregate(&events, Duration::from_secs(300));
        assert_eq!(per_five.len(), 1);
        assert_eq!(per_five[0].request_count, 2);
    }

    #[test]
    fn test_row_order_is_deterministic() {
        let events = vec![
            event("2024-06-12 12:02:00", "10.0.0.2"),
            event("2024-06-12 12:01:00", "10.0.0.1"),
            event("2024-06-12 12:00:00", "10.0.0.2"),
        ];
        let a = aggregate(&events, Duration::from_secs(60));
        let b = aggregate(&events, Duration::from_secs(60));
        assert_eq!(a, b);

        // Sorted by (address, bucket_start).
        assert_eq!(a[0].address, "10.0.0.1");
        assert_eq!(a[1].address, "10.0.0.2");
        assert!(a[1].bucket_start < a[2].bucket_start);
    }
}

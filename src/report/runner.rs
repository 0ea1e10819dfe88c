//! Run the full triage pipeline:
//! 1. Parse the log file into events (malformed lines counted, not fatal)
//! 2. Aggregate per-address, per-bucket request counts
//! 3. Build feature vectors
//! 4. Run every detection strategy, extract its anomaly timestamps, and
//!    score it against the configured ground truth
//!
//! A failure inside one strategy's path never aborts the sibling strategies
//! or the already completed parse/aggregate stages.

use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveDateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::{aggregate, build_features, AggregatedRow, FeatureVector};
use crate::config::TriageConfig;
use crate::detect::{self, Strategy};
use crate::ingest::{self, Event};
use crate::report::{count_values, StrategyOutcome, TrafficReport};

/// Run the pipeline over a log file on disk.
pub fn run_pipeline(log_path: &str, config: &TriageConfig) -> Result<TrafficReport> {
    let (events, malformed) = ingest::read_log_file(log_path)?;
    info!(
        events = events.len(),
        malformed,
        %log_path,
        "parsed access log"
    );

    let ground_truth: BTreeSet<NaiveDateTime> = match config.evaluation.resolve() {
        Ok(ts) => ts.into_iter().collect(),
        Err(e) => {
            warn!(error = %e, "ground truth could not be resolved, scoring will be unavailable");
            BTreeSet::new()
        }
    };

    Ok(analyze(&events, malformed, &ground_truth, config))
}

/// Run aggregation, detection, and scoring over already parsed events.
pub fn analyze(
    events: &[Event],
    malformed_lines: usize,
    ground_truth: &BTreeSet<NaiveDateTime>,
    config: &TriageConfig,
) -> TrafficReport {
    let bucket_width = Duration::from_secs(config.pipeline.bucket_width_secs);
    let rows = aggregate(events, bucket_width);
    let (features, _address_codes) = build_features(&rows);

    let strategies = Strategy::ALL
        .iter()
        .map(|&strategy| run_strategy(strategy, &rows, &features, ground_truth, config))
        .collect();

    TrafficReport {
        run_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        total_events: events.len(),
        malformed_lines,
        method_counts: count_values(events, |e| e.method.clone()),
        status_counts: count_values(events, |e| e.status_code),
        url_counts: count_values(events, |e| e.url.clone()),
        address_counts: count_values(events, |e| e.address.clone()),
        rows,
        strategies,
    }
}

fn run_strategy(
    strategy: Strategy,
    rows: &[AggregatedRow],
    features: &[FeatureVector],
    ground_truth: &BTreeSet<NaiveDateTime>,
    config: &TriageConfig,
) -> StrategyOutcome {
    let labels = match detect::detect(
        strategy,
        features,
        config.pipeline.contamination,
        &config.detectors,
    ) {
        Ok(labels) => labels,
        Err(e) => {
            warn!(%strategy, error = %e, "detection unavailable");
            return StrategyOutcome::failed(strategy, e.to_string());
        }
    };

    let anomaly_timestamps = match detect::extract::extract(rows, &labels) {
        Ok(set) => set,
        Err(e) => {
            warn!(%strategy, error = %e, "anomaly extraction failed");
            return StrategyOutcome::failed(strategy, e.to_string());
        }
    };

    let (accuracy, unavailable) = match detect::accuracy::score(ground_truth, &anomaly_timestamps) {
        Ok(s) => (Some(s), None),
        Err(e) => {
            warn!(%strategy, error = %e, "scoring unavailable");
            (None, Some(e.to_string()))
        }
    };

    info!(
        %strategy,
        anomalies = anomaly_timestamps.len(),
        accuracy = ?accuracy,
        "strategy evaluated"
    );

    StrategyOutcome {
        strategy,
        accuracy,
        anomaly_timestamps,
        unavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TIMESTAMP_FORMAT;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
    }

    fn event(t: &str, address: &str) -> Event {
        Event {
            timestamp: ts(t),
            address: address.to_string(),
            method: "GET".to_string(),
            url: "/home".to_string(),
            status_code: 200,
            user_agent: "test".to_string(),
        }
    }

    /// Steady background traffic plus one hammering burst minute.
    fn burst_events() -> Vec<Event> {
        let mut events = Vec::new();
        for minute in 0..30 {
            for addr in ["10.0.0.1", "10.0.0.2"] {
                events.push(event(&format!("2024-06-12 12:{:02}:10", minute), addr));
                events.push(event(&format!("2024-06-12 12:{:02}:40", minute), addr));
            }
        }
        for second in 0..50 {
            events.push(event(&format!("2024-06-12 12:15:{:02}", second), "123.45.67.89"));
        }
        events
    }

    #[test]
    fn test_alignment_invariant_holds() {
        let events = burst_events();
        let config = TriageConfig::default();
        let rows = aggregate(&events, Duration::from_secs(60));
        let (features, _) = build_features(&rows);
        assert_eq!(features.len(), rows.len());

        for strategy in Strategy::ALL {
            let labels =
                detect::detect(strategy, &features, 0.05, &config.detectors).unwrap();
            assert_eq!(labels.len(), rows.len());
        }
    }

    #[test]
    fn test_counts_round_trip_through_report() {
        let events = burst_events();
        let report = analyze(&events, 0, &BTreeSet::new(), &TriageConfig::default());

        let total: u64 = report.rows.iter().map(|r| r.request_count).sum();
        assert_eq!(total, report.total_events as u64);
    }

    #[test]
    fn test_burst_minute_is_detected() {
        let events = burst_events();
        let truth: BTreeSet<NaiveDateTime> = [ts("2024-06-12 12:15:00")].into_iter().collect();
        let report = analyze(&events, 0, &truth, &TriageConfig::default());

        // The 50-requests-in-one-minute burst dominates every strategy's
        // score ranking, so all three should recall it.
        for outcome in &report.strategies {
            assert_eq!(
                outcome.accuracy,
                Some(1.0),
                "{} missed the burst minute",
                outcome.strategy
            );
            assert!(outcome
                .anomaly_timestamps
                .contains(&ts("2024-06-12 12:15:00")));
        }
    }

    #[test]
    fn test_empty_ground_truth_marks_scoring_unavailable() {
        let events = burst_events();
        let report = analyze(&events, 0, &BTreeSet::new(), &TriageConfig::default());

        for outcome in &report.strategies {
            assert!(outcome.accuracy.is_none());
            assert!(outcome.unavailable.is_some());
            // Timestamps are still reported; only scoring is undefined.
            assert!(!outcome.anomaly_timestamps.is_empty());
        }
    }

    #[test]
    fn test_too_few_rows_fails_strategies_not_pipeline() {
        let events = vec![event("2024-06-12 12:00:05", "10.0.0.1")];
        let truth: BTreeSet<NaiveDateTime> = [ts("2024-06-12 12:00:00")].into_iter().collect();
        let report = analyze(&events, 0, &truth, &TriageConfig::default());

        assert_eq!(report.total_events, 1);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.strategies.len(), 3);
        for outcome in &report.strategies {
            assert!(outcome.accuracy.is_none());
            assert!(outcome.unavailable.as_deref().unwrap().contains("insufficient"));
        }
    }

    #[test]
    fn test_malformed_count_surfaces_in_report() {
        let events = burst_events();
        let report = analyze(&events, 7, &BTreeSet::new(), &TriageConfig::default());
        assert_eq!(report.malformed_lines, 7);
    }

    #[test]
    fn test_frequency_tables() {
        let mut events = burst_events();
        events[0].method = "POST".to_string();
        let report = analyze(&events, 0, &BTreeSet::new(), &TriageConfig::default());

        assert_eq!(report.method_counts["POST"], 1);
        assert_eq!(
            report.method_counts["GET"] + 1,
            report.total_events as u64
        );
        assert_eq!(report.address_counts.len(), 3);
        assert_eq!(report.status_counts[&200], report.total_events as u64);
    }
}

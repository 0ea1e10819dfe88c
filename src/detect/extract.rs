//! Map labeled rows back to anomalous bucket timestamps.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;

use crate::analysis::AggregatedRow;
use crate::detect::DetectError;

/// Collect the distinct `bucket_start` values whose rows carry an anomalous
/// label. Anomalies are reported at time granularity: the same timestamp
/// across different addresses collapses to one entry.
///
/// `rows` and `labels` must be index-aligned; a length mismatch is an
/// internal contract violation and is never silently coerced.
pub fn extract(
    rows: &[AggregatedRow],
    labels: &[bool],
) -> Result<BTreeSet<NaiveDateTime>, DetectError> {
    if rows.len() != labels.len() {
        return Err(DetectError::LabelMisalignment {
            rows: rows.len(),
            labels: labels.len(),
        });
    }

    Ok(rows
        .iter()
        .zip(labels.iter())
        .filter(|(_, &anomalous)| anomalous)
        .map(|(row, _)| row.bucket_start)
        .collect())
}

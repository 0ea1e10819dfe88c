//! Score a strategy's anomaly timestamps against ground truth.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;

use crate::detect::DetectError;

/// Recall of the ground-truth set: true positives over true positives plus
/// false negatives. Predicted timestamps outside the ground truth do not
/// penalize the score; the asymmetry is part of the metric's contract.
pub fn score(
    ground_truth: &BTreeSet<NaiveDateTime>,
    predicted: &BTreeSet<NaiveDateTime>,
) -> Result<f64, DetectError> {
    if ground_truth.is_empty() {
        return Err(DetectError::EmptyGroundTruth);
    }

    let true_positives = ground_truth.intersection(predicted).count();
    let false_negatives = ground_truth.difference(predicted).count();

    Ok(true_positives as f64 / (true_positives + false_negatives) as f64)
}

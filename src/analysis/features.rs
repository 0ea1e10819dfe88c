//! Feature vectors for the anomaly detectors.

use std::collections::BTreeMap;

use crate::analysis::AggregatedRow;

/// Fixed-dimension numeric encoding of one aggregated row:
/// `[address_code, hour, minute, request_count]`.
pub type FeatureVector = [f64; 4];

/// Encode rows as feature vectors, positionally aligned 1:1 with the input.
///
/// `address_code` is the lexicographic rank of the address among the distinct
/// addresses present in `rows`. The encoding is recomputed from scratch on
/// every call so detector runs over different row sets cannot drift against a
/// stale registry.
pub fn build_features(rows: &[AggregatedRow]) -> (Vec<FeatureVector>, BTreeMap<String, u64>) {
    let mut codes: BTreeMap<String, u64> = rows
        .iter()
        .map(|r| (r.address.clone(), 0))
        .collect();
    for (rank, code) in codes.values_mut().enumerate() {
        *code = rank as u64;
    }

    let features = rows
        .iter()
        .map(|row| {
            [
                codes[&row.address] as f64,
                row.hour as f64,
                row.minute as f64,
                row.request_count as f64,
            ]
        })
        .collect();

    (features, codes)
}

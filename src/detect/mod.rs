//! Anomaly detection strategies, extraction, and accuracy scoring.

pub mod accuracy;
pub mod boundary;
pub mod extract;
pub mod isolation;
pub mod local_density;

use thiserror::Error;

use crate::analysis::FeatureVector;
use crate::config::DetectorConfig;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("insufficient samples for detection: need {needed}, have {have}")]
    InsufficientSamples { needed: usize, have: usize },

    #[error("row/label misalignment: {rows} rows vs {labels} labels")]
    LabelMisalignment { rows: usize, labels: usize },

    #[error("ground-truth set is empty, accuracy is undefined")]
    EmptyGroundTruth,
}

/// The closed set of detection strategies. Each models "unusual" differently:
/// how strictly `contamination` is honored is strategy-specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Ensemble of random partitioning trees; short isolation paths are anomalous.
    DensityIsolation,
    /// Local outlier factor; sparse relative neighborhoods are anomalous.
    LocalDensity,
    /// Single boundary around the dense region; points beyond the margin are anomalous.
    BoundaryMargin,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::DensityIsolation,
        Strategy::LocalDensity,
        Strategy::BoundaryMargin,
    ];
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::DensityIsolation => write!(f, "density_isolation"),
            Strategy::LocalDensity => write!(f, "local_density"),
            Strategy::BoundaryMargin => write!(f, "boundary_margin"),
        }
    }
}

/// Run one strategy over the feature vectors.
///
/// Returns one label per input vector, index-aligned; `true` means anomalous.
pub fn detect(
    strategy: Strategy,
    features: &[FeatureVector],
    contamination: f64,
    tuning: &DetectorConfig,
) -> Result<Vec<bool>, DetectError> {
    match strategy {
        Strategy::DensityIsolation => isolation::detect(
            features,
            contamination,
            tuning.isolation_trees,
            tuning.isolation_subsample,
            tuning.isolation_seed,
        ),
        Strategy::LocalDensity => local_density::detect(features, contamination, tuning.neighbor_count),
        Strategy::BoundaryMargin => boundary::detect(features, contamination),
    }
}

/// Label the `count` highest-scoring points anomalous.
///
/// Ties and NaN comparisons fall back to index order so the labeling is
/// deterministic for identical inputs.
pub(crate) fn flag_top_scores(scores: &[f64], count: usize) -> Vec<bool> {
    let count = count.min(scores.len());
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut labels = vec![false; scores.len()];
    for &idx in order.iter().take(count) {
        labels[idx] = true;
    }
    labels
}

/// Number of points a contamination fraction flags out of `n`.
pub(crate) fn contamination_count(n: usize, contamination: f64) -> usize {
    ((n as f64) * contamination.clamp(0.0, 1.0)).ceil() as usize
}

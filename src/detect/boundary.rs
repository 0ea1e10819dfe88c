//! Boundary-margin strategy: a one-class decision boundary.
//!
//! Standardizes the feature space, then fits a hypersphere around the
//! centroid whose radius sits at the (1 - nu) quantile of the point
//! distances. Points beyond that boundary are labeled anomalous. Here
//! `contamination` plays the role of the `nu` hyperparameter: it places the
//! boundary rather than fixing an exact flag rate. Fully deterministic.

use crate::analysis::FeatureVector;
use crate::detect::DetectError;

const MIN_SAMPLES: usize = 2;

/// Floor for per-feature standard deviation to keep constant features inert.
const STD_FLOOR: f64 = 1e-10;

/// Label points outside the fitted boundary anomalous.
pub fn detect(features: &[FeatureVector], contamination: f64) -> Result<Vec<bool>, DetectError> {
    let n = features.len();
    if n < MIN_SAMPLES {
        return Err(DetectError::InsufficientSamples {
            needed: MIN_SAMPLES,
            have: n,
        });
    }

    // Per-feature mean and standard deviation.
    let mut means = [0.0f64; 4];
    for f in features {
        for (m, v) in means.iter_mut().zip(f.iter()) {
            *m += v;
        }
    }
    for m in &mut means {
        *m /= n as f64;
    }

    let mut stds = [0.0f64; 4];
    for f in features {
        for ((s, v), m) in stds.iter_mut().zip(f.iter()).zip(means.iter()) {
            *s += (v - m).powi(2);
        }
    }
    for s in &mut stds {
        *s = (*s / n as f64).sqrt().max(STD_FLOOR);
    }

    // Distance from the standardized centroid.
    let distances: Vec<f64> = features
        .iter()
        .map(|f| {
            f.iter()
                .zip(means.iter())
                .zip(stds.iter())
                .map(|((v, m), s)| ((v - m) / s).powi(2))
                .sum::<f64>()
                .sqrt()
        })
        .collect();

    // Radius at the (1 - nu) distance quantile.
    let nu = contamination.clamp(0.0, 1.0);
    let mut sorted = distances.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let quantile_idx = (((n as f64) * (1.0 - nu)).ceil() as usize)
        .clamp(1, n)
        - 1;
    let radius = sorted[quantile_idx];

    Ok(distances.iter().map(|&d| d > radius).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clustered_with_outlier() -> Vec<FeatureVector> {
        let mut features: Vec<FeatureVector> = (0..50)
            .map(|i| [(i % 5) as f64, 12.0, (i % 10) as f64, 5.0 + (i % 3) as f64])
            .collect();
        features.push([2.0, 12.0, 5.0, 400.0]);
        features
    }

    #[test]
    fn test_outlier_is_outside_boundary() {
        let features = clustered_with_outlier();
        let labels = detect(&features, 0.05).unwrap();

        assert_eq!(labels.len(), features.len());
        assert!(labels[features.len() - 1]);
    }

    #[test]
    fn test_deterministic() {
        let features = clustered_with_outlier();
        assert_eq!(detect(&features, 0.05).unwrap(), detect(&features, 0.05).unwrap());
    }

    #[test]
    fn test_identical_points_are_all_normal() {
        let features = vec![[1.0, 12.0, 3.0, 5.0]; 20];
        let labels = detect(&features, 0.05).unwrap();
        assert!(labels.iter().all(|&l| !l));
    }

    #[test]
    fn test_insufficient_samples() {
        let err = detect(&[[0.0, 0.0, 0.0, 1.0]], 0.05).unwrap_err();
        assert!(matches!(
            err,
            DetectError::InsufficientSamples { needed: 2, have: 1 }
        ));
    }

    #[test]
    fn test_zero_nu_flags_nothing() {
        // With nu = 0 the boundary encloses every point.
        let features = clustered_with_outlier();
        let labels = detect(&features, 0.0).unwrap();
        assert!(labels.iter().all(|&l| !l));
    }
}

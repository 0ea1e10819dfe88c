//! Local-density strategy: local outlier factor.
//!
//! Compares each point's local reachability density to that of its k nearest
//! neighbors. A point in a neighborhood much sparser than its neighbors' gets
//! a factor well above 1 and is labeled anomalous. Fully deterministic given
//! the same neighbor count; no ensemble, no RNG.

use crate::analysis::FeatureVector;
use crate::detect::{contamination_count, flag_top_scores, DetectError};

/// At least one neighbor is required per point.
const MIN_SAMPLES: usize = 2;

/// Guard against zero reachability sums from duplicate points.
const DENSITY_FLOOR: f64 = 1e-10;

fn euclidean(a: &FeatureVector, b: &FeatureVector) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Label the top `contamination` fraction of points by LOF score.
pub fn detect(
    features: &[FeatureVector],
    contamination: f64,
    neighbor_count: usize,
) -> Result<Vec<bool>, DetectError> {
    let n = features.len();
    if n < MIN_SAMPLES {
        return Err(DetectError::InsufficientSamples {
            needed: MIN_SAMPLES,
            have: n,
        });
    }

    let k = neighbor_count.max(1).min(n - 1);

    // Sorted neighbor lists (distance, index) per point, self excluded.
    let mut neighbors: Vec<Vec<(f64, usize)>> = Vec::with_capacity(n);
    for i in 0..n {
        let mut dists: Vec<(f64, usize)> = (0..n)
            .filter(|&j| j != i)
            .map(|j| (euclidean(&features[i], &features[j]), j))
            .collect();
        dists.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });
        dists.truncate(k);
        neighbors.push(dists);
    }

    // k-distance of each point: distance to its kth nearest neighbor.
    let k_distance: Vec<f64> = neighbors.iter().map(|nb| nb[nb.len() - 1].0).collect();

    // Local reachability density: inverse of the mean reachability distance
    // to each neighbor, where reach-dist(i, j) = max(k-distance(j), d(i, j)).
    let lrd: Vec<f64> = (0..n)
        .map(|i| {
            let reach_sum: f64 = neighbors[i]
                .iter()
                .map(|&(d, j)| d.max(k_distance[j]))
                .sum();
            neighbors[i].len() as f64 / reach_sum.max(DENSITY_FLOOR)
        })
        .collect();

    // LOF: mean ratio of neighbor density to own density.
    let scores: Vec<f64> = (0..n)
        .map(|i| {
            let ratio_sum: f64 = neighbors[i].iter().map(|&(_, j)| lrd[j] / lrd[i]).sum();
            ratio_sum / neighbors[i].len() as f64
        })
        .collect();

    Ok(flag_top_scores(&scores, contamination_count(n, contamination)))
}

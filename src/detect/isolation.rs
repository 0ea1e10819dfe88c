//! Density-isolation strategy: an isolation forest.
//!
//! An ensemble of randomly built partitioning trees over sub-samples of the
//! feature space. Points isolated in few splits (short average path length)
//! score high and are labeled anomalous. The ensemble is randomized behind a
//! fixed seed so identical inputs always produce identical labels.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::analysis::FeatureVector;
use crate::detect::{contamination_count, flag_top_scores, DetectError};

/// Fewer samples than this cannot be partitioned meaningfully.
const MIN_SAMPLES: usize = 2;

enum Node {
    Internal {
        feature_idx: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

impl Node {
    fn path_length(&self, sample: &FeatureVector, depth: usize) -> f64 {
        match self {
            Node::Internal {
                feature_idx,
                threshold,
                left,
                right,
            } => {
                if sample[*feature_idx] < *threshold {
                    left.path_length(sample, depth + 1)
                } else {
                    right.path_length(sample, depth + 1)
                }
            }
            // Unresolved instances in a leaf contribute the expected extra depth.
            Node::Leaf { size } => depth as f64 + average_path_length(*size),
        }
    }
}

/// Expected path length of an unsuccessful BST search over `n` samples.
fn average_path_length(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    const EULER_GAMMA: f64 = 0.577_215_664_9;
    2.0 * (((n - 1) as f64).ln() + EULER_GAMMA) - 2.0 * (n - 1) as f64 / n as f64
}

fn build_node(samples: &[FeatureVector], depth: usize, max_depth: usize, rng: &mut StdRng) -> Node {
    if depth >= max_depth || samples.len() <= 1 {
        return Node::Leaf { size: samples.len() };
    }

    let feature_idx = rng.gen_range(0..4);

    let mut min_val = f64::INFINITY;
    let mut max_val = f64::NEG_INFINITY;
    for sample in samples {
        let v = sample[feature_idx];
        min_val = min_val.min(v);
        max_val = max_val.max(v);
    }

    // Constant feature in this partition: nothing left to split on.
    if (max_val - min_val).abs() < f64::EPSILON {
        return Node::Leaf { size: samples.len() };
    }

    let threshold = rng.gen_range(min_val..max_val);

    let (left_samples, right_samples): (Vec<FeatureVector>, Vec<FeatureVector>) = samples
        .iter()
        .copied()
        .partition(|sample| sample[feature_idx] < threshold);

    if left_samples.is_empty() || right_samples.is_empty() {
        return Node::Leaf { size: samples.len() };
    }

    Node::Internal {
        feature_idx,
        threshold,
        left: Box::new(build_node(&left_samples, depth + 1, max_depth, rng)),
        right: Box::new(build_node(&right_samples, depth + 1, max_depth, rng)),
    }
}

struct IsolationForest {
    trees: Vec<Node>,
    subsample_size: usize,
}

impl IsolationForest {
    fn fit(features: &[FeatureVector], num_trees: usize, subsample: usize, seed: u64) -> Self {
        let num_trees = num_trees.max(1);
        let mut rng = StdRng::seed_from_u64(seed);
        let subsample_size = subsample.min(features.len()).max(MIN_SAMPLES);
        let max_depth = (subsample_size as f64).log2().ceil() as usize;

        let mut trees = Vec::with_capacity(num_trees);
        for _ in 0..num_trees {
            let mut indices: Vec<usize> = (0..features.len()).collect();
            indices.shuffle(&mut rng);
            let subsamples: Vec<FeatureVector> = indices[..subsample_size]
                .iter()
                .map(|&i| features[i])
                .collect();
            trees.push(build_node(&subsamples, 0, max_depth, &mut rng));
        }

        Self {
            trees,
            subsample_size,
        }
    }

    /// Anomaly score in [0, 1]; values near 1 are anomalous, near 0.5 normal.
    fn score(&self, sample: &FeatureVector) -> f64 {
        let avg_path: f64 = self
            .trees
            .iter()
            .map(|tree| tree.path_length(sample, 0))
            .sum::<f64>()
            / self.trees.len() as f64;

        let c = average_path_length(self.subsample_size);
        if c <= 0.0 {
            return 0.5;
        }
        2f64.powf(-avg_path / c)
    }
}

/// Label the top `contamination` fraction of points by isolation score.
pub fn detect(
    features: &[FeatureVector],
    contamination: f64,
    num_trees: usize,
    subsample: usize,
    seed: u64,
) -> Result<Vec<bool>, DetectError> {
    if features.len() < MIN_SAMPLES {
        return Err(DetectError::InsufficientSamples {
            needed: MIN_SAMPLES,
            have: features.len(),
        });
    }

    let forest = IsolationForest::fit(features, num_trees, subsample, seed);
    let scores: Vec<f64> = features.iter().map(|f| forest.score(f)).collect();

    Ok(flag_top_scores(
        &scores,
        contamination_count(features.len(), contamination),
    ))
}

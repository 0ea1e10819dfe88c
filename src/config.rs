//! TOML configuration for LogTriage.
//!
//! Layered configuration model with sensible defaults, environment variable
//! override for the config file path, and a standard filesystem location.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Timestamp format used in log lines, ground-truth files, and config lists.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for the triage pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    pub pipeline: PipelineConfig,
    pub detectors: DetectorConfig,
    pub evaluation: EvaluationConfig,
    pub logging: LoggingConfig,
}

impl TriageConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded triage configuration");
        Ok(config)
    }

    /// Try to load configuration from, in order:
    /// 1. The path specified by the `LOGTRIAGE_CONFIG` environment variable.
    /// 2. `/etc/logtriage/logtriage.toml`.
    /// 3. Fall back to compiled-in defaults.
    pub fn load_or_default() -> Self {
        if let Ok(env_path) = std::env::var("LOGTRIAGE_CONFIG") {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "LOGTRIAGE_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        let system_path = Path::new("/etc/logtriage/logtriage.toml");
        if system_path.exists() {
            match Self::load(system_path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %system_path.display(),
                        error = %e,
                        "system config file exists but could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Aggregation and detection pipeline tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Time-bucket granularity in seconds, used for aggregation, counting,
    /// and anomaly timestamp resolution.
    pub bucket_width_secs: u64,
    /// Expected anomalous fraction passed to every detection strategy.
    pub contamination: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bucket_width_secs: 60,
            contamination: 0.05,
        }
    }
}

// ---------------------------------------------------------------------------
// Detectors
// ---------------------------------------------------------------------------

/// Strategy-specific hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Number of trees in the density-isolation ensemble.
    pub isolation_trees: usize,
    /// Sub-sample size per tree.
    pub isolation_subsample: usize,
    /// RNG seed for the density-isolation ensemble.
    pub isolation_seed: u64,
    /// Neighbor count for the local-density strategy.
    pub neighbor_count: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            isolation_trees: 100,
            isolation_subsample: 256,
            isolation_seed: 42,
            neighbor_count: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Ground-truth anomaly timestamps used to score each strategy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Inline ground-truth timestamps (`YYYY-MM-DD HH:MM:SS`).
    pub ground_truth: Vec<String>,
    /// Optional path to a file with one ground-truth timestamp per line.
    /// Entries from the file are merged with the inline list.
    pub ground_truth_file: Option<String>,
}

impl EvaluationConfig {
    /// Resolve the configured ground truth into parsed timestamps.
    /// Unparseable entries are skipped with a warning.
    pub fn resolve(&self) -> Result<Vec<NaiveDateTime>> {
        let mut entries: Vec<String> = self.ground_truth.clone();

        if let Some(path) = &self.ground_truth_file {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read ground-truth file: {}", path))?;
            entries.extend(
                content
                    .lines()
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty()),
            );
        }

        let mut timestamps = Vec::with_capacity(entries.len());
        for entry in &entries {
            match NaiveDateTime::parse_from_str(entry, TIMESTAMP_FORMAT) {
                Ok(ts) => timestamps.push(ts),
                Err(e) => {
                    warn!(entry = %entry, error = %e, "skipping unparseable ground-truth timestamp");
                }
            }
        }
        Ok(timestamps)
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum tracing level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

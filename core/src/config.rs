use serde::{Deserialize, Serialize};
use std::path::Path;

/// Isolation forest parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees in the ensemble.
    pub n_estimators: usize,
    /// Expected fraction of anomalies. Only moves the decision offset.
    pub contamination: f64,
    /// Master seed; every tree stream is derived from it.
    pub seed: u64,
    /// Rows per tree. `None` means min(256, n_rows).
    pub max_samples: Option<usize>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            contamination: 0.02,
            seed: 7,
            max_samples: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    pub bins: usize,
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        // 8x5 inches at 150 dpi.
        Self {
            bins: 40,
            width: 1200,
            height: 750,
            title: "Anomaly Score Distribution".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub forest: ForestConfig,
    /// Guards the min/max normalization against a zero range.
    pub epsilon: f64,
    /// Ranked rows that feed the per-user rollup.
    pub top_k: usize,
    pub histogram: HistogramConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            forest: ForestConfig::default(),
            epsilon: 1e-9,
            top_k: 1000,
            histogram: HistogramConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file. Missing keys fall back to the defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.forest.n_estimators == 0 {
            anyhow::bail!("forest.n_estimators must be > 0");
        }
        let contamination = self.forest.contamination;
        if contamination.is_nan() || contamination <= 0.0 || contamination > 0.5 {
            anyhow::bail!(
                "forest.contamination must be in (0, 0.5], got {contamination}"
            );
        }
        if self.forest.max_samples == Some(0) {
            anyhow::bail!("forest.max_samples must be > 0 when set");
        }
        if self.epsilon.is_nan() || self.epsilon <= 0.0 {
            anyhow::bail!("epsilon must be > 0, got {}", self.epsilon);
        }
        if self.histogram.bins == 0 {
            anyhow::bail!("histogram.bins must be > 0");
        }
        if self.histogram.width < 64 || self.histogram.height < 64 {
            anyhow::bail!(
                "histogram must be at least 64x64 px, got {}x{}",
                self.histogram.width,
                self.histogram.height
            );
        }
        Ok(())
    }
}

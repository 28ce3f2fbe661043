//! Anomaly scoring.
//!
//! RULE: The pipeline only sees `UnsupervisedScorer`.
//! Normalization lives here, outside any concrete model, so swapping
//! the model never changes what an anomaly score means.

pub mod isolation_forest;

pub use isolation_forest::IsolationForest;

use crate::{
    config::PipelineConfig,
    error::{TriageError, TriageResult},
    matrix::{FeatureGrid, FeatureMatrix},
    types::{FEATURE_COLUMNS, SCORE_COLUMN},
};

/// An unsupervised model that fits and scores one batch.
pub trait UnsupervisedScorer {
    /// Unique stable name, used in logs.
    fn name(&self) -> &'static str;

    /// Fit on `grid` and return one decision value per row.
    /// Higher = more normal. Must be deterministic for a fixed seed.
    fn decision_function(&self, grid: &FeatureGrid) -> TriageResult<Vec<f64>>;
}

/// Map decision values onto [0, 1], higher = more anomalous.
///
/// `(-d - min(-d)) / (max(-d) - min(-d) + epsilon)`; a constant input
/// scores 0 everywhere instead of dividing by zero.
pub fn normalize_scores(decision: &[f64], epsilon: f64) -> Vec<f64> {
    let (lo, hi) = decision
        .iter()
        .map(|d| -d)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    decision
        .iter()
        .map(|d| (-d - lo) / (hi - lo + epsilon))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSummary {
    pub rows: usize,
    /// Rows with a negative decision value.
    pub flagged: usize,
    pub min_score: f64,
    pub max_score: f64,
}

pub struct AnomalyScorer<S> {
    model: S,
    epsilon: f64,
}

impl AnomalyScorer<IsolationForest> {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(IsolationForest::new(config.forest.clone()), config.epsilon)
    }
}

impl<S: UnsupervisedScorer> AnomalyScorer<S> {
    pub fn new(model: S, epsilon: f64) -> Self {
        Self { model, epsilon }
    }

    /// Score every row of `matrix` and append the `anomaly_score` column.
    pub fn score(&self, matrix: &mut FeatureMatrix) -> TriageResult<ScoreSummary> {
        if matrix.is_empty() {
            return Err(TriageError::EmptyResult);
        }
        let grid = matrix.feature_grid(&FEATURE_COLUMNS)?;
        let decision = self.model.decision_function(&grid)?;
        if decision.len() != grid.n_rows() {
            return Err(anyhow::anyhow!(
                "{} returned {} decision value(s) for {} row(s)",
                self.model.name(),
                decision.len(),
                grid.n_rows()
            )
            .into());
        }

        let scores = normalize_scores(&decision, self.epsilon);
        let summary = ScoreSummary {
            rows: scores.len(),
            flagged: decision.iter().filter(|d| **d < 0.0).count(),
            min_score: scores.iter().copied().fold(f64::INFINITY, f64::min),
            max_score: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        };
        log::info!(
            "{}: scored {} row(s), {} flagged, score range [{:.4}, {:.4}]",
            self.model.name(),
            summary.rows,
            summary.flagged,
            summary.min_score,
            summary.max_score
        );
        matrix.set_numeric_column(SCORE_COLUMN, &scores);
        Ok(summary)
    }
}

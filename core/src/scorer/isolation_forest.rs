//! Isolation forest.
//!
//! Anomalies are few and different, so random axis-aligned splits
//! isolate them in fewer steps than normal points. Each tree is grown
//! on a subsample; a row's path length averaged over the ensemble,
//! normalized by the expected path length of an unsuccessful BST
//! search, gives `score_samples`. The decision value shifts that by
//! the `contamination` percentile so the expected anomaly fraction
//! falls below zero.

use super::UnsupervisedScorer;
use crate::{
    config::ForestConfig,
    error::TriageResult,
    matrix::FeatureGrid,
    rng::{RngBank, TreeRng},
};

const DEFAULT_MAX_SAMPLES: usize = 256;
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Average path length of an unsuccessful search in a BST of `n` nodes.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// One isolation tree, nodes stored in an arena with the root at 0.
#[derive(Debug, Clone)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn grow(grid: &FeatureGrid, sample: &mut [usize], height_limit: usize, rng: &mut TreeRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow_node(grid, sample, 0, height_limit, rng);
        tree
    }

    fn grow_node(
        &mut self,
        grid: &FeatureGrid,
        rows: &mut [usize],
        depth: usize,
        height_limit: usize,
        rng: &mut TreeRng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { size: rows.len() });
        if rows.len() <= 1 || depth >= height_limit {
            return id;
        }

        // Only features that still vary within this node can split it.
        let mut candidates: Vec<(usize, f64, f64)> = Vec::new();
        for feature in 0..grid.n_features() {
            let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                let v = grid.get(r, feature);
                (lo.min(v), hi.max(v))
            });
            if hi > lo {
                candidates.push((feature, lo, hi));
            }
        }
        if candidates.is_empty() {
            return id;
        }

        let (feature, lo, hi) = candidates[rng.next_below(candidates.len())];
        let threshold = rng.uniform(lo, hi);

        let mut mid = 0;
        for i in 0..rows.len() {
            if grid.get(rows[i], feature) <= threshold {
                rows.swap(i, mid);
                mid += 1;
            }
        }
        // Rounding can push the threshold onto `hi`; keep the node a leaf.
        if mid == 0 || mid == rows.len() {
            return id;
        }

        let (left_rows, right_rows) = rows.split_at_mut(mid);
        let left = self.grow_node(grid, left_rows, depth + 1, height_limit, rng);
        let right = self.grow_node(grid, right_rows, depth + 1, height_limit, rng);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    fn path_length(&self, row: &[f64]) -> f64 {
        let mut node = 0;
        let mut depth = 0usize;
        loop {
            match self.nodes[node] {
                Node::Leaf { size } => return depth as f64 + average_path_length(size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[feature] <= threshold { left } else { right };
                    depth += 1;
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IsolationForest {
    config: ForestConfig,
}

impl IsolationForest {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }

    /// Grow the ensemble on `grid` and compute the contamination offset.
    pub fn fit(&self, grid: &FeatureGrid) -> FittedForest {
        let n_rows = grid.n_rows();
        let max_samples = self
            .config
            .max_samples
            .unwrap_or(DEFAULT_MAX_SAMPLES)
            .min(n_rows);
        let height_limit = (max_samples.max(1) as f64).log2().ceil() as usize;

        let bank = RngBank::new(self.config.seed);
        let trees = (0..self.config.n_estimators)
            .map(|t| {
                let mut rng = bank.for_tree(t);
                let mut sample = rng.sample_indices(n_rows, max_samples);
                IsolationTree::grow(grid, &mut sample, height_limit, &mut rng)
            })
            .collect();

        let mut fitted = FittedForest {
            trees,
            max_samples,
            offset: 0.0,
        };
        let scores = fitted.score_samples(grid);
        fitted.offset = percentile(&scores, self.config.contamination);
        log::debug!(
            "isolation forest: {} tree(s), max_samples={max_samples}, height_limit={height_limit}, offset={:.6}",
            self.config.n_estimators,
            fitted.offset
        );
        fitted
    }
}

impl UnsupervisedScorer for IsolationForest {
    fn name(&self) -> &'static str {
        "isolation_forest"
    }

    fn decision_function(&self, grid: &FeatureGrid) -> TriageResult<Vec<f64>> {
        if grid.n_rows() == 0 {
            return Ok(Vec::new());
        }
        Ok(self.fit(grid).decision_function(grid))
    }
}

/// A grown ensemble.
#[derive(Debug, Clone)]
pub struct FittedForest {
    trees: Vec<IsolationTree>,
    max_samples: usize,
    offset: f64,
}

impl FittedForest {
    /// Negated Liu et al. anomaly score: in [-1, 0),
    /// lower = more anomalous.
    pub fn score_samples(&self, grid: &FeatureGrid) -> Vec<f64> {
        let denominator = self.trees.len() as f64 * average_path_length(self.max_samples);
        (0..grid.n_rows())
            .map(|i| {
                let row = grid.row(i);
                let total: f64 = self.trees.iter().map(|t| t.path_length(row)).sum();
                let ratio = if denominator != 0.0 { total / denominator } else { 1.0 };
                -(2f64.powf(-ratio))
            })
            .collect()
    }

    /// `score_samples - offset`: negative for the expected anomaly fraction.
    pub fn decision_function(&self, grid: &FeatureGrid) -> Vec<f64> {
        self.score_samples(grid)
            .into_iter()
            .map(|s| s - self.offset)
            .collect()
    }

    /// Decision threshold: the `contamination` percentile of the
    /// training scores.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

/// Linear-interpolated quantile `q` in [0, 1] of `values`.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

//! The analysis pipeline, end to end.
//!
//! EXECUTION ORDER (fixed):
//!   1. Split the feature script
//!   2. Setup statements, then the final query (one scoped connection)
//!   3. Fit the model and append anomaly_score
//!   4. Rank and roll up
//!   5. Encode every artifact
//!   6. Write every artifact
//!
//! RULES:
//!   - Any failure aborts the run; nothing is retried.
//!   - Nothing is written until step 6, so a failed run leaves no artifacts.
//!   - The renderer is passed in; there is no process-wide plotting state.

use crate::{
    artifacts::{encode_table, write_artifact, HistogramRenderer},
    config::PipelineConfig,
    error::{TriageError, TriageResult},
    rank::{rank, rollup, RankedRow, UserRollup},
    scorer::{AnomalyScorer, ScoreSummary, UnsupervisedScorer},
    script::Script,
    store::materialize_features,
};
use std::path::{Path, PathBuf};

pub const SCORES_FILE: &str = "fraud_scores.csv";
pub const SUMMARY_FILE: &str = "fraud_summary.csv";
pub const CHARTS_DIR: &str = "charts";
pub const HISTOGRAM_FILE: &str = "fraud_distribution.png";

/// The three resolved inputs of a run.
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub db_path: PathBuf,
    pub sql_path: PathBuf,
    pub outdir: PathBuf,
}

/// Everything a run produced, before anything is written.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub ranked: Vec<RankedRow>,
    pub summary: Vec<UserRollup>,
    pub scores: ScoreSummary,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    /// Output directory, canonicalized.
    pub outdir: PathBuf,
    pub transactions: usize,
    pub users: usize,
    pub flagged: usize,
}

/// Steps 1–4: script, store, scorer, ranker. No filesystem writes.
pub fn analyze<S: UnsupervisedScorer>(
    db_path: &Path,
    script: &Script,
    scorer: &AnomalyScorer<S>,
    top_k: usize,
) -> TriageResult<Analysis> {
    let mut matrix = materialize_features(db_path, script)?;
    let scores = scorer.score(&mut matrix)?;
    let ranked = rank(&matrix)?;
    let summary = rollup(&ranked, top_k);
    log::info!(
        "ranked {} transaction(s); rollup covers {} user(s) in the top {}",
        ranked.len(),
        summary.len(),
        top_k.min(ranked.len())
    );
    Ok(Analysis {
        ranked,
        summary,
        scores,
    })
}

/// Run the whole pipeline with the isolation forest from `config`.
pub fn run_analysis(
    inputs: &RunInputs,
    config: &PipelineConfig,
    renderer: &dyn HistogramRenderer,
) -> TriageResult<RunReport> {
    let scorer = AnomalyScorer::from_config(config);
    run_with_scorer(inputs, config, &scorer, renderer)
}

/// Run the whole pipeline with any scorer.
pub fn run_with_scorer<S: UnsupervisedScorer>(
    inputs: &RunInputs,
    config: &PipelineConfig,
    scorer: &AnomalyScorer<S>,
    renderer: &dyn HistogramRenderer,
) -> TriageResult<RunReport> {
    let script = Script::load(&inputs.sql_path)?;
    log::info!(
        "loaded {} statement(s) from {}",
        script.len(),
        inputs.sql_path.display()
    );

    let analysis = analyze(&inputs.db_path, &script, scorer, config.top_k)?;

    let score_values: Vec<f64> = analysis.ranked.iter().map(|r| r.anomaly_score).collect();
    let scores_csv = encode_table(&analysis.ranked)?;
    let summary_csv = encode_table(&analysis.summary)?;
    let chart_png = renderer.encode_histogram(&score_values, &config.histogram.title)?;

    let outdir = &inputs.outdir;
    let scores_path = outdir.join(SCORES_FILE);
    let summary_path = outdir.join(SUMMARY_FILE);
    let chart_path = outdir.join(CHARTS_DIR).join(HISTOGRAM_FILE);
    write_artifact(&scores_path, &scores_csv)?;
    write_artifact(&summary_path, &summary_csv)?;
    write_artifact(&chart_path, &chart_png)?;
    log::info!(
        "wrote {}, {} and {}",
        scores_path.display(),
        summary_path.display(),
        chart_path.display()
    );

    let outdir = outdir
        .canonicalize()
        .map_err(|e| TriageError::io(outdir, e))?;
    Ok(RunReport {
        outdir,
        transactions: analysis.ranked.len(),
        users: analysis.summary.len(),
        flagged: analysis.scores.flagged,
    })
}

//! triage-runner: command-line front end for the fraud triage pipeline.
//!
//! Usage:
//!   triage-runner ingest  --csv transactions.csv --db fraud.db
//!   triage-runner analyze --db fraud.db --sql sql/queries.sql --outdir outputs
//!   triage-runner analyze --config triage.json

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use triage_core::{
    artifacts::PngHistogram,
    config::PipelineConfig,
    ingest::ingest_csv,
    pipeline::{run_analysis, RunInputs},
};

const USAGE: &str = "usage:
  triage-runner ingest  --csv <file> [--db fraud.db]
  triage-runner analyze [--db fraud.db] [--sql sql/queries.sql] [--outdir outputs] [--config <json>]";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("ingest") => ingest(&args),
        Some("analyze") => analyze(&args),
        Some("--help") | Some("-h") => {
            println!("{USAGE}");
            Ok(())
        }
        other => {
            anyhow::bail!("unknown command {:?}\n{USAGE}", other.unwrap_or(""))
        }
    }
}

fn ingest(args: &[String]) -> Result<()> {
    let csv = flag_value(args, "--csv").context("--csv is required for ingest")?;
    let db = flag_value(args, "--db").unwrap_or("fraud.db");

    let loaded = ingest_csv(csv, db).with_context(|| format!("loading {csv} into {db}"))?;
    log::info!("{loaded} row(s) loaded");
    println!("Loaded {csv} -> {db}");
    Ok(())
}

fn analyze(args: &[String]) -> Result<()> {
    let config = match flag_value(args, "--config") {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    let inputs = RunInputs {
        db_path: PathBuf::from(flag_value(args, "--db").unwrap_or("fraud.db")),
        sql_path: PathBuf::from(flag_value(args, "--sql").unwrap_or("sql/queries.sql")),
        outdir: PathBuf::from(flag_value(args, "--outdir").unwrap_or("outputs")),
    };
    log::debug!("inputs: {inputs:?}");

    let renderer = PngHistogram::from_config(&config.histogram);
    let report = run_analysis(&inputs, &config, &renderer).context("analysis failed")?;

    log::info!(
        "{} transaction(s), {} user(s) in rollup, {} flagged",
        report.transactions,
        report.users,
        report.flagged
    );
    println!("Artifacts saved to: {}", report.outdir.display());
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

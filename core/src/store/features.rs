use super::FeatureStore;
use crate::{
    error::{TriageError, TriageResult},
    matrix::{Cell, FeatureMatrix},
    script::Script,
};

impl FeatureStore {
    // ── Feature script ────────────────────────────────────────────

    /// Execute setup statements in order for side effect.
    /// The first failure aborts; earlier statements stay applied.
    pub fn execute_setup(&self, script: &Script) -> TriageResult<()> {
        for (i, statement) in script.setup_statements().iter().enumerate() {
            self.conn
                .execute_batch(statement)
                .map_err(|source| TriageError::SetupExecution {
                    index: i + 1,
                    statement: statement.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Run `sql` and materialize every row and column.
    /// Zero rows is not an error here; see `run_script`.
    pub fn query_features(&self, sql: &str) -> TriageResult<FeatureMatrix> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let width = columns.len();
        let mut matrix = FeatureMatrix::new(columns);

        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let cells = (0..width)
                .map(|i| row.get_ref(i).map(Cell::from_sql))
                .collect::<Result<Vec<_>, _>>()?;
            matrix.push_row(cells);
        }
        Ok(matrix)
    }

    /// Setup statements, then the final query. An empty result set
    /// fails with `EmptyResult`.
    pub fn run_script(&self, script: &Script) -> TriageResult<FeatureMatrix> {
        let setup = script.setup_statements().len();
        if setup > 0 {
            log::info!("executing {setup} setup statement(s)");
            self.execute_setup(script)?;
        }
        let matrix = self.query_features(script.final_query())?;
        if matrix.is_empty() {
            return Err(TriageError::EmptyResult);
        }
        log::info!(
            "final query materialized {} row(s) x {} column(s)",
            matrix.row_count(),
            matrix.columns().len()
        );
        Ok(matrix)
    }
}

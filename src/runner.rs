//! Load a dataset and a plan, execute, and write the results.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::rc::Rc;

use tripleflow_core::{EngineError, QueryExecutor, QueryLimits, QueryResults};

use crate::dataset::load_dataset;
use crate::error::AppResult;
use crate::output::{write_results, ResultFormat};
use crate::plan::QueryPlan;

/// Everything one run needs, after CLI and config resolution.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub dataset: PathBuf,
    pub plan: PathBuf,
    pub format: ResultFormat,
    /// Output file; stdout when unset
    pub output: Option<PathBuf>,
    pub limits: QueryLimits,
    /// Override the plan's column span
    pub start_column: Option<usize>,
    pub end_column: Option<usize>,
}

impl RunOptions {
    pub fn new(dataset: impl Into<PathBuf>, plan: impl Into<PathBuf>) -> Self {
        Self {
            dataset: dataset.into(),
            plan: plan.into(),
            format: ResultFormat::default(),
            output: None,
            limits: QueryLimits::default(),
            start_column: None,
            end_column: None,
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub rows: usize,
    /// Errors recorded by the query while running
    pub errors: Vec<EngineError>,
}

/// Execute the plan against the dataset and collect the rows.
pub fn execute(options: &RunOptions) -> AppResult<QueryResults> {
    let source = load_dataset(&options.dataset)?;
    let plan = QueryPlan::load(&options.plan)?;
    let query = Rc::new(plan.build_query()?);

    let span = match (options.start_column, options.end_column) {
        (None, None) => plan.span(),
        (start, end) => {
            let last = plan.patterns.len().saturating_sub(1);
            Some((
                start.or(plan.start_column).unwrap_or(0),
                end.or(plan.end_column).unwrap_or(last),
            ))
        }
    };

    let mut executor = QueryExecutor::with_limits(source, options.limits);
    if let Some((start, end)) = span {
        tracing::info!("Executing triple pattern columns {}..={}", start, end);
        executor = executor.with_span(start, end);
    }

    let results = executor.execute(query)?;
    tracing::info!("Query returned {} rows", results.len());
    Ok(results)
}

/// Execute and write the results to the configured output.
pub fn run(options: &RunOptions) -> AppResult<RunSummary> {
    let results = execute(options)?;

    match &options.output {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            write_results(&mut out, options.format, &results)?;
            out.flush()?;
            tracing::info!("Wrote {} results to {}", options.format, path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_results(&mut out, options.format, &results)?;
            out.flush()?;
        }
    }

    Ok(RunSummary {
        rows: results.len(),
        errors: results.errors,
    })
}

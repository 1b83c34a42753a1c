//! Query executor.
//!
//! Builds the triple pattern join for a query, drives it through a
//! [`Rowsource`] and collects or streams the resulting rows.

use std::rc::Rc;

use crate::error::{EngineError, EngineResult};
use crate::query::Query;
use crate::row::Row;
use crate::rowsource::{Rowsource, TriplesRowSource};
use crate::source::TripleSource;
use crate::variables::VariablesTable;

/// Execution limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    /// Maximum number of rows one execution may produce (default: 100,000)
    pub max_rows: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self { max_rows: 100_000 }
    }
}

impl QueryLimits {
    pub fn with_max_rows(max_rows: usize) -> Self {
        Self { max_rows }
    }

    /// No practical row limit
    pub fn unlimited() -> Self {
        Self {
            max_rows: usize::MAX,
        }
    }
}

/// Collected result of one execution.
#[derive(Debug)]
pub struct QueryResults {
    /// Output column names, by offset
    pub names: Vec<String>,
    pub rows: Vec<Row>,
    /// Errors the query recorded while running
    pub errors: Vec<EngineError>,
}

impl QueryResults {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Executes queries against a [`TripleSource`].
pub struct QueryExecutor {
    source: Rc<dyn TripleSource>,
    limits: QueryLimits,
    span: Option<(usize, usize)>,
}

impl QueryExecutor {
    /// Create a new executor with the given triple source.
    pub fn new(source: impl TripleSource + 'static) -> Self {
        Self::from_shared(Rc::new(source))
    }

    /// Create a new executor over a source shared with other owners.
    pub fn from_shared(source: Rc<dyn TripleSource>) -> Self {
        Self {
            source,
            limits: QueryLimits::default(),
            span: None,
        }
    }

    /// Create a new executor with custom limits.
    pub fn with_limits(source: impl TripleSource + 'static, limits: QueryLimits) -> Self {
        Self {
            limits,
            ..Self::new(source)
        }
    }

    /// Restrict execution to the patterns in `start..=end`.
    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.span = Some((start, end));
        self
    }

    pub fn limits(&self) -> QueryLimits {
        self.limits
    }

    /// Build and initialize the join row source for `query`.
    pub fn open(&self, query: &Rc<Query>) -> EngineResult<Rowsource> {
        let source = Rc::clone(&self.source);
        let join = match self.span {
            Some((start, end)) => TriplesRowSource::new(Rc::clone(query), source, start, end)?,
            None => TriplesRowSource::for_query(Rc::clone(query), source)?,
        };
        Rowsource::new(Box::new(join))
    }

    /// Execute a query with every variable initially unbound.
    ///
    /// # Returns
    /// All rows, or `LimitExceeded` if the query produces more than
    /// `max_rows`
    pub fn execute(&self, query: Rc<Query>) -> EngineResult<QueryResults> {
        let mut vars = query.new_variables_table();
        self.execute_with_bindings(query, &mut vars)
    }

    /// Execute a query against caller-provided bindings.
    ///
    /// Variables bound in `vars` act as constants, which is how a column
    /// span is fed the values of columns outside it.
    pub fn execute_with_bindings(
        &self,
        query: Rc<Query>,
        vars: &mut VariablesTable,
    ) -> EngineResult<QueryResults> {
        let mut rowsource = self.open(&query)?;
        let mut rows = Vec::new();

        while let Some(row) = rowsource.read_row(vars)? {
            if rows.len() >= self.limits.max_rows {
                rowsource.abandon(vars)?;
                return Err(EngineError::LimitExceeded(self.limits.max_rows));
            }
            rows.push(row);
        }
        rowsource.finish()?;

        tracing::debug!("query produced {} rows", rows.len());
        Ok(QueryResults {
            names: output_names(&query),
            rows,
            errors: query.errors(),
        })
    }

    /// Stream the rows of a query one at a time.
    pub fn rows(&self, query: Rc<Query>) -> EngineResult<RowStream> {
        let rowsource = self.open(&query)?;
        let vars = query.new_variables_table();
        Ok(RowStream {
            rowsource,
            vars,
            names: output_names(&query),
            max_rows: self.limits.max_rows,
            done: false,
        })
    }
}

fn output_names(query: &Query) -> Vec<String> {
    query
        .variable_names()
        .iter()
        .take(query.row_width())
        .cloned()
        .collect()
}

/// Pulling iterator over the rows of one execution.
///
/// Owns the binding table for the execution. Yields `LimitExceeded` once and
/// stops if the query produces more than `max_rows`.
pub struct RowStream {
    rowsource: Rowsource,
    vars: VariablesTable,
    names: Vec<String>,
    max_rows: usize,
    done: bool,
}

impl RowStream {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Current bindings of the execution.
    pub fn variables(&self) -> &VariablesTable {
        &self.vars
    }

    /// Rows read from the join so far.
    pub fn rows_read(&self) -> usize {
        self.rowsource.count()
    }
}

impl Iterator for RowStream {
    type Item = EngineResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = match self.rowsource.read_row(&mut self.vars) {
            Ok(Some(_)) if self.rowsource.count() > self.max_rows => {
                Err(EngineError::LimitExceeded(self.max_rows))
            }
            Ok(Some(row)) => return Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                return self.rowsource.finish().err().map(Err);
            }
            Err(e) => Err(e),
        };
        self.done = true;
        if let Err(e) = self.rowsource.abandon(&mut self.vars) {
            tracing::warn!("failed to finish row source: {}", e);
        }
        Some(result)
    }
}

//! Row sources: pull-model operators producing a lazy sequence of rows.
//!
//! Operators implement [`RowSource`]; the executor drives them through the
//! [`Rowsource`] wrapper, which owns the lifecycle:
//! 1. `init()` - runs once when the wrapper is built
//! 2. `ensure_variables()` - row shape, cached before the first read
//! 3. `read_row()` - pull rows until exhausted (returns `None`)
//! 4. `finish()` - release resources, exactly once

mod triples;

#[cfg(test)]
mod tests;

pub use triples::{ColumnState, TripleMeta, TriplesRowSource};

use std::rc::Rc;

use crate::error::{EngineError, EngineResult};
use crate::query::Query;
use crate::row::Row;
use crate::variables::{Variable, VariablesTable};

/// Width of the rows an operator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowShape {
    /// Number of value columns
    pub size: usize,
    /// Number of ordering-key columns
    pub order_size: usize,
}

/// Query plan operator.
///
/// Single-threaded: the variables table is borrowed exclusively for each
/// `read_row` call, so operators may bind and unbind values in it freely
/// while computing the next row.
pub trait RowSource {
    /// Operator name, for logging.
    fn name(&self) -> &'static str;

    /// One-time setup after construction.
    fn init(&mut self) -> EngineResult<()>;

    /// Release operator resources. Must be safe to call more than once.
    fn finish(&mut self) -> EngineResult<()>;

    /// Stop mid-sequence: undo every binding the operator still holds in
    /// `vars`. Later reads return no row.
    fn release(&mut self, _vars: &mut VariablesTable) -> EngineResult<()> {
        Ok(())
    }

    /// Shape of the rows `read_row` will return.
    fn ensure_variables(&mut self) -> EngineResult<RowShape>;

    /// Pull the next row, or `None` once the sequence is exhausted.
    fn read_row(&mut self, vars: &mut VariablesTable) -> EngineResult<Option<Row>>;

    /// Read every remaining row.
    fn read_all_rows(&mut self, vars: &mut VariablesTable) -> EngineResult<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.read_row(vars)? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// The query this operator executes.
    fn query(&self) -> &Rc<Query>;
}

/// Boxed operator for dynamic dispatch
pub type BoxedRowSource = Box<dyn RowSource>;

/// Lifecycle state of a [`Rowsource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSourceState {
    /// Initialized, nothing read yet
    Created,
    /// Producing rows
    Open,
    /// Exhausted (read_row returned None)
    Exhausted,
    /// Finished, resources released
    Finished,
}

/// Executor-side handle around an operator.
pub struct Rowsource {
    handler: BoxedRowSource,
    state: RowSourceState,
    shape: Option<RowShape>,
    count: usize,
}

impl Rowsource {
    /// Wrap an operator, running its `init`.
    pub fn new(mut handler: BoxedRowSource) -> EngineResult<Self> {
        handler.init()?;
        tracing::debug!("initialized {} row source", handler.name());
        Ok(Self {
            handler,
            state: RowSourceState::Created,
            shape: None,
            count: 0,
        })
    }

    pub fn state(&self) -> RowSourceState {
        self.state
    }

    /// Number of rows read so far.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn query(&self) -> &Rc<Query> {
        self.handler.query()
    }

    /// Row shape, asking the operator only the first time.
    pub fn sizes(&mut self) -> EngineResult<RowShape> {
        if let Some(shape) = self.shape {
            return Ok(shape);
        }
        let shape = self.handler.ensure_variables()?;
        self.shape = Some(shape);
        Ok(shape)
    }

    /// Variable naming output column `offset`.
    pub fn variable_by_offset(&mut self, offset: usize) -> EngineResult<Option<&Variable>> {
        let shape = self.sizes()?;
        if offset >= shape.size {
            return Ok(None);
        }
        Ok(self.handler.query().variables().get(offset))
    }

    pub fn read_row(&mut self, vars: &mut VariablesTable) -> EngineResult<Option<Row>> {
        match self.state {
            RowSourceState::Finished => {
                return Err(EngineError::InvalidState(format!(
                    "read from finished {} row source",
                    self.handler.name()
                )))
            }
            RowSourceState::Exhausted => return Ok(None),
            RowSourceState::Created | RowSourceState::Open => {}
        }

        self.sizes()?;
        self.state = RowSourceState::Open;

        match self.handler.read_row(vars)? {
            Some(row) => {
                self.count += 1;
                Ok(Some(row))
            }
            None => {
                tracing::debug!(
                    "{} row source exhausted after {} rows",
                    self.handler.name(),
                    self.count
                );
                self.state = RowSourceState::Exhausted;
                Ok(None)
            }
        }
    }

    pub fn read_all_rows(&mut self, vars: &mut VariablesTable) -> EngineResult<Vec<Row>> {
        match self.state {
            RowSourceState::Finished => {
                return Err(EngineError::InvalidState(format!(
                    "read from finished {} row source",
                    self.handler.name()
                )))
            }
            RowSourceState::Exhausted => return Ok(Vec::new()),
            RowSourceState::Created | RowSourceState::Open => {}
        }

        self.sizes()?;
        let rows = self.handler.read_all_rows(vars)?;
        self.count += rows.len();
        self.state = RowSourceState::Exhausted;
        Ok(rows)
    }

    /// Pull rows one at a time through an iterator.
    pub fn rows<'a>(&'a mut self, vars: &'a mut VariablesTable) -> Rows<'a> {
        Rows {
            rowsource: self,
            vars,
            done: false,
        }
    }

    /// Stop before exhaustion, leaving `vars` as it was before the first
    /// read, then finish.
    pub fn abandon(&mut self, vars: &mut VariablesTable) -> EngineResult<()> {
        if self.state == RowSourceState::Open {
            self.handler.release(vars)?;
            tracing::debug!(
                "{} row source abandoned after {} rows",
                self.handler.name(),
                self.count
            );
        }
        self.finish()
    }

    /// Finish the operator. Later calls are no-ops.
    pub fn finish(&mut self) -> EngineResult<()> {
        if self.state == RowSourceState::Finished {
            return Ok(());
        }
        self.state = RowSourceState::Finished;
        self.handler.finish()
    }
}

impl Drop for Rowsource {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            tracing::warn!("failed to finish {} row source: {}", self.handler.name(), e);
        }
    }
}

/// Iterator over the rows of a [`Rowsource`].
///
/// Stops after the first error.
pub struct Rows<'a> {
    rowsource: &'a mut Rowsource,
    vars: &'a mut VariablesTable,
    done: bool,
}

impl Iterator for Rows<'_> {
    type Item = EngineResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.rowsource.read_row(self.vars) {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

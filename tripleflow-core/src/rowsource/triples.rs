//! Triple pattern join row source.
//!
//! Enumerates every consistent combination of matches for the triple
//! patterns in `start_column..=end_column` with a left-to-right nested-loop
//! search. Each column keeps its own search state, so the search resumes
//! where the previous `read_row` call stopped:
//! - an exact column (no variables) is a single existence probe
//! - a pattern column walks a match cursor, binding the variables that are
//!   first declared in that column
//!
//! Reaching the last column yields a row; retreating past the first column
//! ends the sequence. Retreating past a pattern column drops its cursor and
//! unbinds exactly the variables it bound.

use std::fmt;
use std::rc::Rc;

use crate::error::{EngineError, EngineResult};
use crate::query::Query;
use crate::row::Row;
use crate::source::{TripleSource, TriplesMatch};
use crate::triple::{TriplePattern, TripleParts};
use crate::variables::VariablesTable;

use super::{RowShape, RowSource};

/// Search state of one column.
pub enum ColumnState {
    /// Not entered since the columns to its left last changed
    Unvisited,
    /// Existence probe, done once per visit
    Exact { executed: bool },
    /// Live match cursor, the parts this visit binds and the parts the
    /// current candidate bound
    Pattern {
        cursor: Box<dyn TriplesMatch>,
        parts: TripleParts,
        bound: TripleParts,
    },
}

impl ColumnState {
    pub fn is_unvisited(&self) -> bool {
        matches!(self, ColumnState::Unvisited)
    }
}

impl fmt::Debug for ColumnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnState::Unvisited => f.write_str("Unvisited"),
            ColumnState::Exact { executed } => f
                .debug_struct("Exact")
                .field("executed", executed)
                .finish(),
            ColumnState::Pattern {
                cursor,
                parts,
                bound,
            } => f
                .debug_struct("Pattern")
                .field("at_end", &cursor.is_end())
                .field("parts", parts)
                .field("bound", bound)
                .finish(),
        }
    }
}

/// Per-column metadata, filled in by `init`.
#[derive(Debug)]
pub struct TripleMeta {
    parts: TripleParts,
    is_exact: bool,
    state: ColumnState,
}

impl TripleMeta {
    fn new() -> Self {
        Self {
            parts: TripleParts::NONE,
            is_exact: false,
            state: ColumnState::Unvisited,
        }
    }

    /// Parts whose variables this column binds.
    pub fn parts(&self) -> TripleParts {
        self.parts
    }

    pub fn is_exact(&self) -> bool {
        self.is_exact
    }

    pub fn state(&self) -> &ColumnState {
        &self.state
    }
}

/// Outcome of one transition at the current column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Column matched, move right (or yield at the last column)
    Advance,
    /// Column has nothing more, move left
    Retreat,
    /// Candidate rejected, try the column's next candidate
    Retry,
    /// Could not build a match cursor
    Fail,
}

/// Nested-loop join over a span of the query's triple patterns.
pub struct TriplesRowSource {
    query: Rc<Query>,
    source: Rc<dyn TripleSource>,
    start_column: usize,
    end_column: usize,
    columns: Vec<TripleMeta>,
    /// Column the next `read_row` resumes from
    column: usize,
    initialized: bool,
    exhausted: bool,
    offset: i64,
    size: usize,
    new_bindings_count: usize,
    names: Rc<Vec<String>>,
}

impl TriplesRowSource {
    pub fn new(
        query: Rc<Query>,
        source: Rc<dyn TripleSource>,
        start_column: usize,
        end_column: usize,
    ) -> EngineResult<Self> {
        let count = query.triples().len();
        if start_column > end_column || end_column >= count {
            return Err(EngineError::InvalidColumnSpan {
                start: start_column,
                end: end_column,
                count,
            });
        }

        let columns = (start_column..=end_column).map(|_| TripleMeta::new()).collect();
        let size = query.row_width();
        let names = query.variable_names();

        Ok(Self {
            query,
            source,
            start_column,
            end_column,
            columns,
            column: start_column,
            initialized: false,
            exhausted: false,
            offset: 0,
            size,
            new_bindings_count: 0,
            names,
        })
    }

    /// Join over every triple pattern of the query.
    pub fn for_query(query: Rc<Query>, source: Rc<dyn TripleSource>) -> EngineResult<Self> {
        let count = query.triples().len();
        if count == 0 {
            return Err(EngineError::InvalidColumnSpan {
                start: 0,
                end: 0,
                count,
            });
        }
        Self::new(query, source, 0, count - 1)
    }

    pub fn start_column(&self) -> usize {
        self.start_column
    }

    pub fn end_column(&self) -> usize {
        self.end_column
    }

    /// Bindings made (net of unbindings) during the latest `read_row`.
    pub fn new_bindings_count(&self) -> usize {
        self.new_bindings_count
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Metadata for a column of the query, if it lies in this span.
    pub fn column_meta(&self, column: usize) -> Option<&TripleMeta> {
        column
            .checked_sub(self.start_column)
            .and_then(|index| self.columns.get(index))
    }

    /// Run one transition at `column`.
    fn step(&mut self, column: usize, vars: &mut VariablesTable) -> Step {
        let Some(meta) = column
            .checked_sub(self.start_column)
            .and_then(|index| self.columns.get_mut(index))
        else {
            // error recovery - no match
            return Step::Retreat;
        };
        let Some(pattern) = self.query.triple(column) else {
            return Step::Retreat;
        };

        if meta.state.is_unvisited() {
            meta.state = if meta.is_exact {
                ColumnState::Exact { executed: false }
            } else {
                match self.source.new_match(&self.query, pattern, vars) {
                    Ok(cursor) => {
                        tracing::debug!("made new triple match for column {}", column);
                        ColumnState::Pattern {
                            cursor,
                            parts: unbound_parts(vars, pattern, meta.parts),
                            bound: TripleParts::NONE,
                        }
                    }
                    Err(e) => {
                        self.query.log_error(EngineError::MatchFailed {
                            column,
                            reason: e.to_string(),
                        });
                        return Step::Fail;
                    }
                }
            };
        }

        let (step, reset) = match &mut meta.state {
            ColumnState::Unvisited => (Step::Retreat, false),

            ColumnState::Exact { executed } => {
                if *executed {
                    (Step::Retreat, true)
                } else {
                    *executed = true;
                    let present = pattern
                        .ground(vars)
                        .map(|triple| self.source.triple_present(&triple))
                        .unwrap_or(false);
                    if present {
                        tracing::debug!("exact match OK for column {}", column);
                        (Step::Advance, false)
                    } else {
                        tracing::debug!("exact match failed for column {}", column);
                        (Step::Retreat, true)
                    }
                }
            }

            ColumnState::Pattern {
                cursor,
                parts,
                bound,
            } => {
                let parts = *parts;
                // forget whatever the previous candidate bound
                let previous = std::mem::replace(bound, TripleParts::NONE);
                unbind_parts(vars, pattern, previous);
                self.new_bindings_count = self.new_bindings_count.saturating_sub(previous.count());

                if cursor.is_end() {
                    tracing::debug!("end of pattern triple match for column {}", column);
                    (Step::Retreat, true)
                } else {
                    let newly = if parts.is_empty() {
                        TripleParts::NONE
                    } else {
                        cursor.bind_match(vars, parts)
                    };
                    tracing::trace!(
                        "bind_match for column {} returned parts {:#06b}",
                        column,
                        newly.bits()
                    );
                    *bound = newly;
                    self.new_bindings_count += newly.count();
                    cursor.next_match();

                    if !parts.is_empty() && newly.is_empty() {
                        (Step::Retry, false)
                    } else {
                        (Step::Advance, false)
                    }
                }
            }
        };

        if reset {
            meta.state = ColumnState::Unvisited;
        }
        step
    }

    /// Drop every cursor and undo every binding made by this span.
    fn reset_columns(&mut self, vars: &mut VariablesTable) {
        for (index, meta) in self.columns.iter_mut().enumerate() {
            if let ColumnState::Pattern { bound, .. } = &meta.state {
                if let Some(pattern) = self.query.triple(self.start_column + index) {
                    unbind_parts(vars, pattern, *bound);
                }
            }
            meta.state = ColumnState::Unvisited;
        }
        self.new_bindings_count = 0;
    }

    /// Copy the current bindings into a new row.
    fn snapshot(&mut self, vars: &VariablesTable) -> EngineResult<Row> {
        let mut row = Row::for_source(self.size, 0, Rc::clone(&self.names));
        for i in 0..self.size {
            row.set_value_at(i, vars.get_value(i).cloned())?;
        }
        row.set_offset(self.offset);
        self.offset += 1;

        tracing::debug!(
            "solution binds {} values",
            row.values().iter().filter(|v| v.is_some()).count()
        );
        Ok(row)
    }
}

/// The subset of `parts` whose variables are not bound in `vars`.
fn unbound_parts(
    vars: &VariablesTable,
    pattern: &TriplePattern,
    parts: TripleParts,
) -> TripleParts {
    let mut unbound = TripleParts::NONE;
    for part in TripleParts::EACH {
        if !parts.contains(part) {
            continue;
        }
        match pattern.part(part).and_then(|slot| slot.as_var()) {
            Some(offset) if vars.is_bound(offset) => {}
            _ => unbound |= part,
        }
    }
    unbound
}

fn unbind_parts(vars: &mut VariablesTable, pattern: &TriplePattern, parts: TripleParts) {
    for part in TripleParts::EACH {
        if !parts.contains(part) {
            continue;
        }
        if let Some(offset) = pattern.part(part).and_then(|slot| slot.as_var()) {
            vars.unset_value(offset);
        }
    }
}

impl RowSource for TriplesRowSource {
    fn name(&self) -> &'static str {
        "triples"
    }

    fn init(&mut self) -> EngineResult<()> {
        for column in self.start_column..=self.end_column {
            let pattern = self.query.triple(column).ok_or_else(|| {
                EngineError::InvalidState(format!("no triple pattern for column {}", column))
            })?;
            let meta = self
                .columns
                .get_mut(column - self.start_column)
                .ok_or_else(|| {
                    EngineError::InvalidState(format!("no match state for column {}", column))
                })?;

            let mut parts = TripleParts::NONE;
            for (part, offset) in pattern.variables() {
                if self.query.declared_in(offset) == Some(column) {
                    parts |= part;
                }
            }
            meta.parts = parts;
            meta.is_exact = pattern.is_exact();
            meta.state = ColumnState::Unvisited;

            tracing::debug!(
                "triple pattern column {} has parts {:#06b}{}",
                column,
                parts.bits(),
                if meta.is_exact { " (exact)" } else { "" }
            );
        }

        self.initialized = true;
        Ok(())
    }

    fn release(&mut self, vars: &mut VariablesTable) -> EngineResult<()> {
        self.reset_columns(vars);
        self.exhausted = true;
        self.column = self.start_column;
        Ok(())
    }

    fn finish(&mut self) -> EngineResult<()> {
        self.columns.clear();
        self.exhausted = true;
        Ok(())
    }

    fn ensure_variables(&mut self) -> EngineResult<RowShape> {
        Ok(RowShape {
            size: self.size,
            order_size: 0,
        })
    }

    fn read_row(&mut self, vars: &mut VariablesTable) -> EngineResult<Option<Row>> {
        if !self.initialized {
            return Err(EngineError::InvalidState(
                "triples row source read before init".to_string(),
            ));
        }
        if self.exhausted {
            return Ok(None);
        }

        self.new_bindings_count = 0;
        let mut column = self.column;

        loop {
            match self.step(column, vars) {
                Step::Retry => continue,
                Step::Advance if column == self.end_column => {
                    // resume here next call to ask this column for its next match
                    self.column = column;
                    return self.snapshot(vars).map(Some);
                }
                Step::Advance => column += 1,
                Step::Retreat if column == self.start_column => {
                    tracing::debug!("triple pattern search exhausted after {} rows", self.offset);
                    self.exhausted = true;
                    self.column = self.start_column;
                    return Ok(None);
                }
                Step::Retreat => column -= 1,
                Step::Fail => {
                    self.reset_columns(vars);
                    self.exhausted = true;
                    return Ok(None);
                }
            }
        }
    }

    fn query(&self) -> &Rc<Query> {
        &self.query
    }
}

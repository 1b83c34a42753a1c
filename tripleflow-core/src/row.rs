//! Query result rows.
//!
//! A [`Row`] is a shared handle: [`Row::clone_shallow`] hands out another
//! reference to the same storage and bumps the usage count, while
//! [`Row::clone_deep`] copies every value into fresh storage. Storage is
//! dropped when the last handle is released. Writes to a row whose storage is
//! shared go to a private copy, so a row already handed to a consumer never
//! changes underneath it.

use std::fmt;
use std::rc::Rc;

use crate::error::{EngineError, EngineResult};
use crate::term::Term;
use crate::variables::VariablesTable;

#[derive(Debug, Clone, PartialEq)]
struct RowData {
    values: Vec<Option<Term>>,
    order_values: Vec<Option<Term>>,
    offset: i64,
    names: Option<Rc<Vec<String>>>,
}

/// One solution: bound values, ordering keys and the result offset.
#[derive(Debug)]
pub struct Row {
    inner: Rc<RowData>,
}

impl Row {
    /// Allocate a row with every slot empty.
    pub fn new(size: usize, order_size: usize) -> Self {
        Self {
            inner: Rc::new(RowData {
                values: vec![None; size],
                order_values: vec![None; order_size],
                offset: 0,
                names: None,
            }),
        }
    }

    /// Allocate a row for a row source, naming columns after its variables.
    pub fn for_source(size: usize, order_size: usize, names: Rc<Vec<String>>) -> Self {
        let mut row = Self::new(size, order_size);
        if let Some(data) = Rc::get_mut(&mut row.inner) {
            data.names = Some(names);
        }
        row
    }

    /// A row as wide as the declared variables, with no ordering slots.
    pub fn new_for_variables(vars: &VariablesTable) -> Self {
        Self::for_source(vars.declared_count(), 0, Rc::new(vars.names()))
    }

    /// Share this row's storage.
    pub fn clone_shallow(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }

    /// Copy this row into independent storage.
    pub fn clone_deep(&self) -> Self {
        Self {
            inner: Rc::new(RowData::clone(&self.inner)),
        }
    }

    /// Store `value` at column `offset`.
    pub fn set_value_at(&mut self, offset: usize, value: impl Into<Option<Term>>) -> EngineResult<()> {
        let size = self.size();
        let slot = Rc::make_mut(&mut self.inner)
            .values
            .get_mut(offset)
            .ok_or(EngineError::OffsetOutOfRange { offset, size })?;
        *slot = value.into();
        Ok(())
    }

    /// Store `value` at ordering key `offset`.
    pub fn set_order_value_at(
        &mut self,
        offset: usize,
        value: impl Into<Option<Term>>,
    ) -> EngineResult<()> {
        let size = self.order_size();
        let slot = Rc::make_mut(&mut self.inner)
            .order_values
            .get_mut(offset)
            .ok_or(EngineError::OffsetOutOfRange { offset, size })?;
        *slot = value.into();
        Ok(())
    }

    pub fn set_offset(&mut self, offset: i64) {
        Rc::make_mut(&mut self.inner).offset = offset;
    }

    /// Release this handle, returning how many handles remain.
    ///
    /// Values and storage are dropped once the count reaches zero.
    pub fn release(self) -> usize {
        Rc::strong_count(&self.inner) - 1
    }

    /// Number of handles sharing this row's storage.
    pub fn usage(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    /// True when both handles share storage.
    pub fn shares_storage_with(&self, other: &Row) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn size(&self) -> usize {
        self.inner.values.len()
    }

    pub fn order_size(&self) -> usize {
        self.inner.order_values.len()
    }

    pub fn values(&self) -> &[Option<Term>] {
        &self.inner.values
    }

    pub fn value(&self, offset: usize) -> Option<&Term> {
        self.inner.values.get(offset).and_then(|v| v.as_ref())
    }

    pub fn order_values(&self) -> &[Option<Term>] {
        &self.inner.order_values
    }

    pub fn offset(&self) -> i64 {
        self.inner.offset
    }

    /// Column name at `offset`, when the row knows its source's variables.
    pub fn name(&self, offset: usize) -> Option<&str> {
        self.inner
            .names
            .as_ref()
            .and_then(|names| names.get(offset))
            .map(|s| s.as_str())
    }

    /// Human readable rendering, e.g.
    /// `result[s=<http://e/a>, o=NULL] with ordering values ["x"] offset 3`.
    pub fn format(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("result[")?;
        for (i, value) in self.values().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if let Some(name) = self.name(i) {
                write!(f, "{}=", name)?;
            }
            write_value(f, value.as_ref())?;
        }
        f.write_str("]")?;

        if self.order_size() > 0 {
            f.write_str(" with ordering values [")?;
            for (i, value) in self.order_values().iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_value(f, value.as_ref())?;
            }
            f.write_str("]")?;
        }

        write!(f, " offset {}", self.offset())
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: Option<&Term>) -> fmt::Result {
    match value {
        Some(term) => write!(f, "{}", term),
        None => f.write_str("NULL"),
    }
}

/// One cell of a [`row_sequence`] table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowCell<'a> {
    Literal(&'a str),
    Uri(&'a str),
}

/// Declare `names` in `vars` and build one row per line of `rows`.
///
/// Every line must have one cell per name and every cell must be present
/// and valid; otherwise no rows are returned.
pub fn row_sequence(
    vars: &mut VariablesTable,
    names: &[&str],
    rows: &[Vec<Option<RowCell<'_>>>],
) -> EngineResult<Vec<Row>> {
    let offsets: Vec<usize> = names.iter().map(|name| vars.add(name)).collect();

    let mut sequence = Vec::with_capacity(rows.len());
    for (line, cells) in rows.iter().enumerate() {
        if cells.len() != offsets.len() {
            return Err(EngineError::ExecutionError(format!(
                "row {} has {} cells, expected {}",
                line,
                cells.len(),
                offsets.len()
            )));
        }

        let mut row = Row::new_for_variables(vars);
        for (cell, &offset) in cells.iter().zip(&offsets) {
            let term = match cell {
                Some(RowCell::Literal(text)) => Term::literal(*text),
                Some(RowCell::Uri(uri)) => match Term::parse(&format!("<{}>", uri))? {
                    term @ Term::Uri { .. } => term,
                    _ => return Err(EngineError::InvalidTerm(uri.to_string())),
                },
                None => {
                    return Err(EngineError::InvalidTerm(format!(
                        "missing value in row {}",
                        line
                    )))
                }
            };
            row.set_value_at(offset, term)?;
        }
        sequence.push(row);
    }

    Ok(sequence)
}

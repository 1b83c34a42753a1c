//! Prepared query: variable declarations, the ordered triple pattern
//! sequence, the "declared in column" map and the query error channel.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{EngineError, EngineResult};
use crate::term::Term;
use crate::triple::{PatternTerm, TriplePattern};
use crate::variables::VariablesTable;

/// A query ready for execution.
///
/// Produced by [`QueryBuilder`]. The triple pattern order is fixed; the
/// engine never reorders patterns.
#[derive(Debug)]
pub struct Query {
    variables: VariablesTable,
    names: Rc<Vec<String>>,
    triples: Vec<TriplePattern>,
    declared_in: Vec<Option<usize>>,
    select_count: usize,
    errors: RefCell<Vec<EngineError>>,
}

impl Query {
    /// The ordered triple pattern sequence.
    pub fn triples(&self) -> &[TriplePattern] {
        &self.triples
    }

    pub fn triple(&self, column: usize) -> Option<&TriplePattern> {
        self.triples.get(column)
    }

    /// Declared variables (no bindings).
    pub fn variables(&self) -> &VariablesTable {
        &self.variables
    }

    /// Names of all declared variables, by offset.
    pub fn variable_names(&self) -> Rc<Vec<String>> {
        Rc::clone(&self.names)
    }

    /// Column where the variable at `offset` first appears.
    pub fn declared_in(&self, offset: usize) -> Option<usize> {
        self.declared_in.get(offset).copied().flatten()
    }

    /// Number of selected variables, 0 when every variable is returned.
    pub fn select_count(&self) -> usize {
        self.select_count
    }

    /// Width of result rows: the selected variables, or every declared one.
    pub fn row_width(&self) -> usize {
        if self.select_count > 0 {
            self.select_count
        } else {
            self.variables.declared_count()
        }
    }

    /// A fresh binding context with every variable unbound.
    pub fn new_variables_table(&self) -> VariablesTable {
        let mut table = self.variables.clone();
        table.clear_values();
        table
    }

    /// Record an error raised while executing this query.
    pub fn log_error(&self, error: EngineError) {
        tracing::error!("{}", error);
        self.errors.borrow_mut().push(error);
    }

    pub fn errors(&self) -> Vec<EngineError> {
        self.errors.borrow().clone()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.borrow().is_empty()
    }
}

/// Builder for [`Query`].
///
/// Pattern slots use term syntax (`<uri>`, `_:b`, `"lit"`) or `?name` /
/// `$name` for variables. The first syntax error is kept and reported by
/// [`QueryBuilder::build`].
#[derive(Debug, Default)]
pub struct QueryBuilder {
    variables: VariablesTable,
    select_count: usize,
    triples: Vec<TriplePattern>,
    error: Option<EngineError>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the projected variables; they take offsets `0..names.len()`.
    pub fn select<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            let name = name.trim_start_matches(['?', '$']);
            if self.variables.offset_of(name).is_none() {
                self.variables.add(name);
                self.select_count += 1;
            }
        }
        self
    }

    pub fn pattern(self, subject: &str, predicate: &str, object: &str) -> Self {
        self.pattern_in(subject, predicate, object, None)
    }

    pub fn pattern_with_origin(
        self,
        subject: &str,
        predicate: &str,
        object: &str,
        origin: &str,
    ) -> Self {
        self.pattern_in(subject, predicate, object, Some(origin))
    }

    fn pattern_in(
        mut self,
        subject: &str,
        predicate: &str,
        object: &str,
        origin: Option<&str>,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }
        let result = self.parse_pattern(subject, predicate, object, origin);
        match result {
            Ok(pattern) => self.triples.push(pattern),
            Err(e) => self.error = Some(e),
        }
        self
    }

    /// Append an already-built pattern; its variable offsets must refer to
    /// variables declared through this builder.
    pub fn triple_pattern(mut self, pattern: TriplePattern) -> Self {
        self.triples.push(pattern);
        self
    }

    fn parse_pattern(
        &mut self,
        subject: &str,
        predicate: &str,
        object: &str,
        origin: Option<&str>,
    ) -> EngineResult<TriplePattern> {
        let subject = self.slot(subject)?;
        let predicate = self.slot(predicate)?;
        let object = self.slot(object)?;
        let mut pattern = TriplePattern::new(subject, predicate, object);
        if let Some(origin) = origin {
            pattern = pattern.with_origin(self.slot(origin)?);
        }
        Ok(pattern)
    }

    fn slot(&mut self, text: &str) -> EngineResult<PatternTerm> {
        let text = text.trim();
        if let Some(name) = text.strip_prefix('?').or_else(|| text.strip_prefix('$')) {
            if name.is_empty() {
                return Err(EngineError::InvalidPattern(format!(
                    "empty variable name in '{}'",
                    text
                )));
            }
            return Ok(PatternTerm::Var(self.variables.add(name)));
        }
        Ok(PatternTerm::Const(Term::parse(text)?))
    }

    pub fn build(self) -> EngineResult<Query> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let declared = self.variables.declared_count();
        let mut declared_in = vec![None; declared];

        for (column, pattern) in self.triples.iter().enumerate() {
            for (_, offset) in pattern.variables() {
                let slot = declared_in.get_mut(offset).ok_or_else(|| {
                    EngineError::InvalidPattern(format!(
                        "column {} uses undeclared variable offset {}",
                        column, offset
                    ))
                })?;
                if slot.is_none() {
                    *slot = Some(column);
                }
            }
        }

        let names = Rc::new(self.variables.names());

        Ok(Query {
            variables: self.variables,
            names,
            triples: self.triples,
            declared_in,
            select_count: self.select_count,
            errors: RefCell::new(Vec::new()),
        })
    }
}

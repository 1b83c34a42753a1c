//! Variables table: declared variables and their current bindings.
//!
//! The join operator binds and unbinds values in place while it searches, so
//! the table is passed to `read_row` as an exclusive borrow for the duration
//! of the call.

use crate::term::Term;

/// A declared query variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub offset: usize,
}

#[derive(Debug, Clone, Default)]
pub struct VariablesTable {
    variables: Vec<Variable>,
    values: Vec<Option<Term>>,
}

impl VariablesTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table declaring `names` in order, all unbound.
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for name in names {
            table.add(name.as_ref());
        }
        table
    }

    /// Declare a variable, returning its offset.
    ///
    /// Declaring an existing name returns the existing offset.
    pub fn add(&mut self, name: &str) -> usize {
        if let Some(offset) = self.offset_of(name) {
            return offset;
        }
        let offset = self.variables.len();
        self.variables.push(Variable {
            name: name.to_string(),
            offset,
        });
        self.values.push(None);
        offset
    }

    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.variables
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.offset)
    }

    pub fn get(&self, offset: usize) -> Option<&Variable> {
        self.variables.get(offset)
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.name.clone()).collect()
    }

    /// Number of declared variables.
    pub fn declared_count(&self) -> usize {
        self.variables.len()
    }

    pub fn get_value(&self, offset: usize) -> Option<&Term> {
        self.values.get(offset).and_then(|v| v.as_ref())
    }

    pub fn is_bound(&self, offset: usize) -> bool {
        self.get_value(offset).is_some()
    }

    /// Bind a value; offsets beyond the declared count are ignored.
    pub fn set_value(&mut self, offset: usize, value: Term) {
        if let Some(slot) = self.values.get_mut(offset) {
            *slot = Some(value);
        }
    }

    /// Remove a binding, returning whether one was present.
    pub fn unset_value(&mut self, offset: usize) -> bool {
        self.values
            .get_mut(offset)
            .map(|slot| slot.take().is_some())
            .unwrap_or(false)
    }

    /// Number of currently bound variables.
    pub fn bound_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Unbind every variable.
    pub fn clear_values(&mut self) {
        for value in &mut self.values {
            *value = None;
        }
    }
}

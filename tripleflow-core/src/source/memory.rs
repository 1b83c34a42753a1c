//! In-memory triple source.
//!
//! Triples are kept in insertion order, which is also the order match
//! cursors yield candidates in.

use std::rc::Rc;

use crate::error::EngineResult;
use crate::query::Query;
use crate::term::Term;
use crate::triple::{PatternTerm, Triple, TriplePattern, TripleParts};
use crate::variables::VariablesTable;

use super::{TripleSource, TriplesMatch};

/// In-memory triple source for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct InMemoryTripleSource {
    triples: Rc<Vec<Triple>>,
}

impl InMemoryTripleSource {
    /// Create a new empty source
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_triples(triples: Vec<Triple>) -> Self {
        Self {
            triples: Rc::new(triples),
        }
    }

    /// Append a triple; duplicates are ignored.
    pub fn insert(&mut self, triple: Triple) {
        if !self.triples.contains(&triple) {
            Rc::make_mut(&mut self.triples).push(triple);
        }
    }

    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }
}

impl TripleSource for InMemoryTripleSource {
    fn triple_present(&self, triple: &Triple) -> bool {
        self.triples.iter().any(|t| {
            t.subject == triple.subject
                && t.predicate == triple.predicate
                && t.object == triple.object
                && (triple.origin.is_none() || t.origin == triple.origin)
        })
    }

    fn new_match(
        &self,
        _query: &Query,
        pattern: &TriplePattern,
        vars: &VariablesTable,
    ) -> EngineResult<Box<dyn TriplesMatch>> {
        let slots = TripleParts::EACH.map(|part| match pattern.part(part) {
            None => Slot::Any,
            Some(PatternTerm::Const(term)) => Slot::Fixed(term.clone()),
            Some(PatternTerm::Var(offset)) => match vars.get_value(*offset) {
                Some(value) => Slot::Fixed(value.clone()),
                None => Slot::Var(*offset),
            },
        });

        let mut cursor = InMemoryMatch {
            triples: Rc::clone(&self.triples),
            slots,
            position: 0,
        };
        cursor.seek();
        Ok(Box::new(cursor))
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Any,
    Fixed(Term),
    Var(usize),
}

struct InMemoryMatch {
    triples: Rc<Vec<Triple>>,
    slots: [Slot; 4],
    position: usize,
}

impl InMemoryMatch {
    fn matches(&self, triple: &Triple) -> bool {
        for (i, part) in TripleParts::EACH.into_iter().enumerate() {
            let value = triple.part(part);
            match &self.slots[i] {
                Slot::Any => {}
                Slot::Fixed(term) => {
                    if value != Some(term) {
                        return false;
                    }
                }
                Slot::Var(offset) => {
                    let Some(value) = value else {
                        return false;
                    };
                    // a variable repeated inside the pattern must see one value
                    for (j, earlier) in TripleParts::EACH[..i].iter().enumerate() {
                        if matches!(&self.slots[j], Slot::Var(o) if o == offset)
                            && triple.part(*earlier) != Some(value)
                        {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }

    /// Move forward to the first matching triple at or after `position`.
    fn seek(&mut self) {
        while let Some(triple) = self.triples.get(self.position) {
            if self.matches(triple) {
                break;
            }
            self.position += 1;
        }
    }
}

impl TriplesMatch for InMemoryMatch {
    fn is_end(&self) -> bool {
        self.position >= self.triples.len()
    }

    fn bind_match(&self, vars: &mut VariablesTable, parts: TripleParts) -> TripleParts {
        let Some(triple) = self.triples.get(self.position) else {
            return TripleParts::NONE;
        };

        let mut bound = TripleParts::NONE;
        for (i, part) in TripleParts::EACH.into_iter().enumerate() {
            if !parts.contains(part) {
                continue;
            }
            if let (Slot::Var(offset), Some(value)) = (&self.slots[i], triple.part(part)) {
                tracing::trace!("binding variable {} to {}", offset, value);
                vars.set_value(*offset, value.clone());
                bound |= part;
            }
        }
        bound
    }

    fn next_match(&mut self) {
        if !self.is_end() {
            self.position += 1;
            self.seek();
        }
    }
}

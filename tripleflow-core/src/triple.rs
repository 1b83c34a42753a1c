//! Triples, triple patterns and the part bit-set used by column bindings.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::term::Term;
use crate::variables::VariablesTable;

/// A set of triple parts (subject, predicate, object, origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TripleParts(u8);

impl TripleParts {
    pub const NONE: TripleParts = TripleParts(0);
    pub const SUBJECT: TripleParts = TripleParts(1);
    pub const PREDICATE: TripleParts = TripleParts(2);
    pub const OBJECT: TripleParts = TripleParts(4);
    pub const ORIGIN: TripleParts = TripleParts(8);
    pub const ALL: TripleParts = TripleParts(15);

    /// Single parts in subject, predicate, object, origin order.
    pub const EACH: [TripleParts; 4] = [
        TripleParts::SUBJECT,
        TripleParts::PREDICATE,
        TripleParts::OBJECT,
        TripleParts::ORIGIN,
    ];

    pub fn contains(self, other: TripleParts) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of parts in the set.
    pub fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for TripleParts {
    type Output = TripleParts;

    fn bitor(self, rhs: TripleParts) -> TripleParts {
        TripleParts(self.0 | rhs.0)
    }
}

impl BitOrAssign for TripleParts {
    fn bitor_assign(&mut self, rhs: TripleParts) {
        self.0 |= rhs.0;
    }
}

/// One slot of a triple pattern: a fixed term or a variable offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternTerm {
    Var(usize),
    Const(Term),
}

impl PatternTerm {
    pub fn as_var(&self) -> Option<usize> {
        match self {
            PatternTerm::Var(offset) => Some(*offset),
            PatternTerm::Const(_) => None,
        }
    }

    pub fn is_var(&self) -> bool {
        matches!(self, PatternTerm::Var(_))
    }

    /// Resolve against current bindings; unbound variables give `None`.
    pub fn resolve(&self, vars: &VariablesTable) -> Option<Term> {
        match self {
            PatternTerm::Const(term) => Some(term.clone()),
            PatternTerm::Var(offset) => vars.get_value(*offset).cloned(),
        }
    }
}

impl From<Term> for PatternTerm {
    fn from(term: Term) -> Self {
        PatternTerm::Const(term)
    }
}

/// A concrete triple, optionally in a named graph (its origin).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    pub origin: Option<Term>,
}

impl Triple {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: Term) -> Self {
        self.origin = Some(origin);
        self
    }

    /// The term at a single part, if present.
    pub fn part(&self, part: TripleParts) -> Option<&Term> {
        match part {
            TripleParts::SUBJECT => Some(&self.subject),
            TripleParts::PREDICATE => Some(&self.predicate),
            TripleParts::OBJECT => Some(&self.object),
            TripleParts::ORIGIN => self.origin.as_ref(),
            _ => None,
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        if let Some(origin) = &self.origin {
            write!(f, " {}", origin)?;
        }
        Ok(())
    }
}

/// A subject/predicate/object(/origin) template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriplePattern {
    pub subject: PatternTerm,
    pub predicate: PatternTerm,
    pub object: PatternTerm,
    pub origin: Option<PatternTerm>,
}

impl TriplePattern {
    pub fn new(
        subject: impl Into<PatternTerm>,
        predicate: impl Into<PatternTerm>,
        object: impl Into<PatternTerm>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<PatternTerm>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// The slot at a single part, if present.
    pub fn part(&self, part: TripleParts) -> Option<&PatternTerm> {
        match part {
            TripleParts::SUBJECT => Some(&self.subject),
            TripleParts::PREDICATE => Some(&self.predicate),
            TripleParts::OBJECT => Some(&self.object),
            TripleParts::ORIGIN => self.origin.as_ref(),
            _ => None,
        }
    }

    /// True when subject, predicate and object hold no variable.
    ///
    /// The origin is not considered: an exact pattern is an existence test.
    pub fn is_exact(&self) -> bool {
        !(self.subject.is_var() || self.predicate.is_var() || self.object.is_var())
    }

    /// Variable offsets in part order, with the part each appears in.
    pub fn variables(&self) -> impl Iterator<Item = (TripleParts, usize)> + '_ {
        TripleParts::EACH
            .into_iter()
            .filter_map(|part| self.part(part).and_then(|slot| slot.as_var()).map(|v| (part, v)))
    }

    /// Ground the pattern against the current bindings.
    ///
    /// Returns `None` if subject, predicate or object is still unbound. An
    /// unbound origin variable grounds to "any graph".
    pub fn ground(&self, vars: &VariablesTable) -> Option<Triple> {
        Some(Triple {
            subject: self.subject.resolve(vars)?,
            predicate: self.predicate.resolve(vars)?,
            object: self.object.resolve(vars)?,
            origin: self.origin.as_ref().and_then(|o| o.resolve(vars)),
        })
    }
}

impl From<Triple> for TriplePattern {
    fn from(triple: Triple) -> Self {
        Self {
            subject: triple.subject.into(),
            predicate: triple.predicate.into(),
            object: triple.object.into(),
            origin: triple.origin.map(PatternTerm::from),
        }
    }
}

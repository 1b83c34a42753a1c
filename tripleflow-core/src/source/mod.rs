//! Triple sources.
//!
//! The join operator never looks at a graph directly. It asks a
//! [`TripleSource`] whether a ground triple exists, or for a
//! [`TriplesMatch`] cursor enumerating the triples that fit a pattern.

mod memory;

pub use memory::InMemoryTripleSource;

use crate::error::EngineResult;
use crate::query::Query;
use crate::triple::{Triple, TriplePattern, TripleParts};
use crate::variables::VariablesTable;

/// Trait for graphs the join operator can match triple patterns against.
///
/// Implement this trait to run queries against your triple store.
pub trait TripleSource {
    /// Check whether a fully ground triple exists.
    ///
    /// A triple without an origin matches in any graph.
    fn triple_present(&self, triple: &Triple) -> bool;

    /// Start enumerating the triples matching `pattern`.
    ///
    /// Variables already bound in `vars` act as fixed terms for the whole
    /// life of the cursor.
    ///
    /// # Returns
    /// A cursor positioned on the first match, or at its end if none exist
    fn new_match(
        &self,
        query: &Query,
        pattern: &TriplePattern,
        vars: &VariablesTable,
    ) -> EngineResult<Box<dyn TriplesMatch>>;
}

/// Cursor over the triples matching one pattern.
pub trait TriplesMatch {
    /// True once every candidate has been visited.
    fn is_end(&self) -> bool;

    /// Bind the requested `parts` of the current candidate into `vars`.
    ///
    /// # Returns
    /// The parts actually bound; empty when the candidate cannot be bound
    fn bind_match(&self, vars: &mut VariablesTable, parts: TripleParts) -> TripleParts;

    /// Move to the next candidate.
    fn next_match(&mut self);
}

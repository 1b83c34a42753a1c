//! Tripleflow Core - row-based pull execution engine for RDF triple pattern queries.
//!
//! This crate provides the query execution machinery without any I/O
//! dependencies. Queries are evaluated by pulling rows from row sources; the
//! central operator joins a sequence of triple patterns with a resumable
//! nested-loop search over any `TripleSource` implementation.
//!
//! # Main Components
//!
//! - **Row**: one solution, shared by reference count
//! - **RowSource**: pull-model operator trait and its lifecycle wrapper
//! - **TriplesRowSource**: the triple pattern join
//! - **QueryExecutor**: runs a prepared query against a `TripleSource`
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use tripleflow_core::{InMemoryTripleSource, QueryBuilder, QueryExecutor, Term, Triple};
//!
//! let ex = |s: &str| Term::uri(format!("http://example.org/{}", s));
//!
//! let mut ds = InMemoryTripleSource::new();
//! ds.insert(Triple::new(ex("a"), ex("p"), ex("b")));
//! ds.insert(Triple::new(ex("a"), ex("p"), ex("c")));
//! ds.insert(Triple::new(ex("x"), ex("q"), ex("y")));
//!
//! let query = QueryBuilder::new()
//!     .pattern("?s", "<http://example.org/p>", "?o")
//!     .build()
//!     .unwrap();
//!
//! let executor = QueryExecutor::new(ds);
//! let results = executor.execute(Rc::new(query)).unwrap();
//! assert_eq!(results.len(), 2);
//! assert_eq!(results.rows[1].value(1), Some(&ex("c")));
//! ```

pub mod error;
pub mod executor;
pub mod query;
pub mod row;
pub mod rowsource;
pub mod source;
pub mod term;
pub mod triple;
pub mod variables;

// Re-export main types for convenience
pub use error::{EngineError, EngineResult};
pub use executor::{QueryExecutor, QueryLimits, QueryResults, RowStream};
pub use query::{Query, QueryBuilder};
pub use row::{row_sequence, Row, RowCell};
pub use rowsource::{
    BoxedRowSource, RowShape, RowSource, RowSourceState, Rows, Rowsource, TriplesRowSource,
};
pub use source::{InMemoryTripleSource, TripleSource, TriplesMatch};
pub use term::Term;
pub use triple::{PatternTerm, Triple, TriplePattern, TripleParts};
pub use variables::{Variable, VariablesTable};

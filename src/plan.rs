//! JSON query plans.
//!
//! ```json
//! {
//!   "select": ["s", "o"],
//!   "patterns": [["?s", "<http://example.org/p>", "?o"]],
//!   "start_column": 0,
//!   "end_column": 0
//! }
//! ```
//!
//! Pattern slots are `?name` / `$name` variables or terms in N-Triples
//! syntax. An optional fourth slot is the origin graph.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tripleflow_core::{Query, QueryBuilder};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryPlan {
    /// Projected variables; empty returns every variable
    #[serde(default)]
    pub select: Vec<String>,
    pub patterns: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_column: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<usize>,
}

impl QueryPlan {
    pub fn from_json(text: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Build the prepared query.
    pub fn build_query(&self) -> AppResult<Query> {
        if self.patterns.is_empty() {
            return Err(AppError::InvalidPlan("no triple patterns".to_string()));
        }

        let mut builder = QueryBuilder::new().select(&self.select);
        for (index, slots) in self.patterns.iter().enumerate() {
            builder = match slots.as_slice() {
                [s, p, o] => builder.pattern(s, p, o),
                [s, p, o, g] => builder.pattern_with_origin(s, p, o, g),
                _ => {
                    return Err(AppError::InvalidPlan(format!(
                        "pattern {} has {} slots, expected 3 or 4",
                        index,
                        slots.len()
                    )))
                }
            };
        }
        Ok(builder.build()?)
    }

    /// Column span to execute, when the plan restricts it.
    ///
    /// A missing bound defaults to the first or last pattern.
    pub fn span(&self) -> Option<(usize, usize)> {
        if self.start_column.is_none() && self.end_column.is_none() {
            return None;
        }
        let last = self.patterns.len().saturating_sub(1);
        Some((self.start_column.unwrap_or(0), self.end_column.unwrap_or(last)))
    }
}

//! Common test utilities for pipeline tests
//!
//! Provides shared helper functions for:
//! - Writing dataset and plan files into a temp directory
//! - Building run options pointing at them

#![allow(dead_code)]

use std::path::PathBuf;

use tempfile::TempDir;
use tripleflow::RunOptions;

pub const PEOPLE: &str = r#"# people and who they know
<http://e/alice> <http://e/knows> <http://e/bob> .
<http://e/alice> <http://e/knows> <http://e/carol> .
<http://e/bob> <http://e/knows> <http://e/carol> .
<http://e/carol> <http://e/knows> <http://e/dave> .
<http://e/alice> <http://e/name> "Alice"@en .
<http://e/bob> <http://e/name> "Bob" .
<http://e/carol> <http://e/name> "Carol" .
<http://e/dave> <http://e/age> "41"^^<http://www.w3.org/2001/XMLSchema#integer> <http://e/census> .
"#;

pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).expect("Failed to write test file");
        path
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Options for the people dataset and the given plan.
    pub fn options(&self, plan: &str) -> RunOptions {
        let dataset = self.write("people.nt", PEOPLE);
        let plan = self.write("plan.json", plan);
        RunOptions::new(dataset, plan)
    }
}

//! Line-based dataset loading.
//!
//! One statement per line, N-Triples / N-Quads style:
//!
//! ```text
//! # comment
//! <http://example.org/a> <http://example.org/p> "text"@en .
//! _:b0 <http://example.org/p> <http://example.org/c> <http://example.org/graph> .
//! ```

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tripleflow_core::{InMemoryTripleSource, Term, Triple};

use crate::error::{AppError, AppResult};

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^\s*(<[^<>\s]*>|_:[A-Za-z0-9_][A-Za-z0-9_\-]*|"(?:[^"\\]|\\.)*"(?:@[A-Za-z]+(?:-[A-Za-z0-9]+)*|\^\^<[^<>\s]*>)?|\.)"#,
    )
    .expect("valid token regex")
});

/// Read a dataset file into an in-memory triple source.
pub fn load_dataset(path: &Path) -> AppResult<InMemoryTripleSource> {
    let text = std::fs::read_to_string(path)?;
    let source = parse_dataset(&text)?;
    tracing::info!("Loaded {} triples from {}", source.len(), path.display());
    Ok(source)
}

/// Parse dataset text. Duplicate statements are kept once.
pub fn parse_dataset(text: &str) -> AppResult<InMemoryTripleSource> {
    let mut source = InMemoryTripleSource::new();
    for (index, line) in text.lines().enumerate() {
        if let Some(triple) = parse_line(line, index + 1)? {
            source.insert(triple);
        }
    }
    Ok(source)
}

fn parse_line(line: &str, number: usize) -> AppResult<Option<Triple>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let mut rest = trimmed;
    let mut terms = Vec::with_capacity(4);
    let mut terminated = false;

    while let Some(caps) = TOKEN_RE.captures(rest) {
        let token = &caps[1];
        rest = &rest[caps[0].len()..];
        if token == "." {
            terminated = true;
            break;
        }
        let term = Term::parse(token).map_err(|e| AppError::dataset(number, e.to_string()))?;
        terms.push(term);
    }

    let rest = rest.trim();
    if !terminated {
        return Err(AppError::dataset(
            number,
            if rest.is_empty() {
                "statement must end with '.'".to_string()
            } else {
                format!("unexpected input '{}'", rest)
            },
        ));
    }
    if !rest.is_empty() && !rest.starts_with('#') {
        return Err(AppError::dataset(
            number,
            format!("trailing input '{}' after '.'", rest),
        ));
    }

    let mut terms = terms.into_iter();
    let (Some(subject), Some(predicate), Some(object)) = (terms.next(), terms.next(), terms.next())
    else {
        return Err(AppError::dataset(number, "expected at least 3 terms"));
    };
    let origin = terms.next();
    if terms.next().is_some() {
        return Err(AppError::dataset(number, "expected at most 4 terms"));
    }

    if subject.is_literal() {
        return Err(AppError::dataset(number, "subject cannot be a literal"));
    }
    if !predicate.is_uri() {
        return Err(AppError::dataset(number, "predicate must be a URI"));
    }

    if origin.as_ref().is_some_and(Term::is_literal) {
        return Err(AppError::dataset(number, "graph cannot be a literal"));
    }

    let mut triple = Triple::new(subject, predicate, object);
    if let Some(graph) = origin {
        triple = triple.with_origin(graph);
    }
    Ok(Some(triple))
}

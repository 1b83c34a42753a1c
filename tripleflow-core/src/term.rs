//! RDF terms bound to variables and stored in rows.
//!
//! Terms use an N-Triples style string syntax:
//! - `<http://example.org/a>` for URIs
//! - `_:b0` for blank nodes
//! - `"text"`, `"text"@en` or `"text"^^<http://...#integer>` for literals

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{EngineError, EngineResult};

static URI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^<([^<>"{}|^`\\\s]*)>$"#).expect("valid URI regex"));

static BLANK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^_:([A-Za-z0-9_][A-Za-z0-9_.\-]*)$").expect("valid blank regex"));

static LITERAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^"((?:[^"\\]|\\.)*)"(?:@([A-Za-z]+(?:-[A-Za-z0-9]+)*)|\^\^<([^<>"\s]*)>)?$"#)
        .expect("valid literal regex")
});

/// An RDF term: URI, blank node or literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Term {
    Uri {
        value: String,
    },
    Blank {
        value: String,
    },
    Literal {
        value: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
    },
}

impl Term {
    pub fn uri(value: impl Into<String>) -> Self {
        Term::Uri {
            value: value.into(),
        }
    }

    pub fn blank(value: impl Into<String>) -> Self {
        Term::Blank {
            value: value.into(),
        }
    }

    /// Plain string literal with no language tag or datatype.
    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            language: None,
            datatype: None,
        }
    }

    pub fn lang_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            language: Some(language.into()),
            datatype: None,
        }
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            language: None,
            datatype: Some(datatype.into()),
        }
    }

    /// Parse a term from its N-Triples style syntax.
    pub fn parse(input: &str) -> EngineResult<Self> {
        let input = input.trim();

        if let Some(caps) = URI_RE.captures(input) {
            return Ok(Term::uri(&caps[1]));
        }

        if let Some(caps) = BLANK_RE.captures(input) {
            return Ok(Term::blank(&caps[1]));
        }

        if let Some(caps) = LITERAL_RE.captures(input) {
            return Ok(Term::Literal {
                value: unescape(&caps[1])?,
                language: caps.get(2).map(|m| m.as_str().to_string()),
                datatype: caps.get(3).map(|m| m.as_str().to_string()),
            });
        }

        Err(EngineError::InvalidTerm(input.to_string()))
    }

    /// The lexical string of the term (URI string, blank id or literal text).
    pub fn value(&self) -> &str {
        match self {
            Term::Uri { value } | Term::Blank { value } | Term::Literal { value, .. } => value,
        }
    }

    pub fn is_uri(&self) -> bool {
        matches!(self, Term::Uri { .. })
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Term::Blank { .. })
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal { .. })
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Uri { value } => write!(f, "<{}>", escape_ntriples(value, '>')),
            Term::Blank { value } => write!(f, "_:{}", value),
            Term::Literal {
                value,
                language,
                datatype,
            } => {
                write!(f, "\"{}\"", escape_ntriples(value, '"'))?;
                if let Some(lang) = language {
                    write!(f, "@{}", lang)?;
                }
                if let Some(dt) = datatype {
                    write!(f, "^^<{}>", escape_ntriples(dt, '>'))?;
                }
                Ok(())
            }
        }
    }
}

/// Escape a string N-Triples style, additionally escaping `delim`.
pub fn escape_ntriples(input: &str, delim: char) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\u{:04X}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}

fn unescape(input: &str) -> EngineResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(kind @ ('u' | 'U')) => {
                let width = if kind == 'u' { 4 } else { 8 };
                let hex: String = chars.by_ref().take(width).collect();
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == width)
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        EngineError::InvalidTerm(format!("bad escape \\{}{}", kind, hex))
                    })?;
                out.push(decoded);
            }
            Some(other) => {
                return Err(EngineError::InvalidTerm(format!("bad escape \\{}", other)));
            }
            None => return Err(EngineError::InvalidTerm("dangling escape".to_string())),
        }
    }

    Ok(out)
}

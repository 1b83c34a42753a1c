//! Result writers.
//!
//! - `csv` / `tsv`: `Result` header plus binding names, then one line per
//!   row led by its 1-based counter
//! - `json`: array of `{name: term}` objects, `null` for unbound
//! - `text`: one formatted row per line

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tripleflow_core::term::escape_ntriples;
use tripleflow_core::{QueryResults, Term};

use crate::error::{AppError, AppResult};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
    Csv,
    Tsv,
    Json,
    #[default]
    Text,
}

impl fmt::Display for ResultFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResultFormat::Csv => "csv",
            ResultFormat::Tsv => "tsv",
            ResultFormat::Json => "json",
            ResultFormat::Text => "text",
        };
        f.write_str(name)
    }
}

impl FromStr for ResultFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ResultFormat::Csv),
            "tsv" => Ok(ResultFormat::Tsv),
            "json" => Ok(ResultFormat::Json),
            "text" => Ok(ResultFormat::Text),
            other => Err(AppError::InvalidConfig(format!(
                "unknown result format '{}'",
                other
            ))),
        }
    }
}

/// Write `results` to `out` in the given format.
pub fn write_results<W: Write>(
    out: W,
    format: ResultFormat,
    results: &QueryResults,
) -> AppResult<()> {
    match format {
        ResultFormat::Csv => write_delimited(out, b',', results),
        ResultFormat::Tsv => write_delimited(out, b'\t', results),
        ResultFormat::Json => write_json(out, results),
        ResultFormat::Text => write_text(out, results),
    }
}

fn write_delimited<W: Write>(out: W, delimiter: u8, results: &QueryResults) -> AppResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(out);

    let mut header = vec!["Result".to_string()];
    header.extend(results.names.iter().cloned());
    writer.write_record(&header)?;

    for (index, row) in results.rows.iter().enumerate() {
        let mut record = Vec::with_capacity(results.names.len() + 1);
        record.push((index + 1).to_string());
        for offset in 0..results.names.len() {
            record.push(delimited_value(row.value(offset)));
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// One cell of delimited output.
pub fn delimited_value(term: Option<&Term>) -> String {
    match term {
        None => "\"null\"".to_string(),
        Some(Term::Uri { value }) => format!("uri({})", escape_ntriples(value, '"')),
        Some(Term::Blank { value }) => format!("blank({})", escape_ntriples(value, '"')),
        Some(Term::Literal {
            value,
            language,
            datatype,
        }) => {
            let mut cell = format!("\"{}\"", escape_ntriples(value, '"'));
            if let Some(language) = language {
                cell.push('@');
                cell.push_str(language);
            }
            if let Some(datatype) = datatype {
                cell.push_str(&format!("^^uri({})", escape_ntriples(datatype, '"')));
            }
            cell
        }
    }
}

fn write_json<W: Write>(mut out: W, results: &QueryResults) -> AppResult<()> {
    let rows: Vec<Value> = results
        .rows
        .iter()
        .map(|row| -> Result<Value, serde_json::Error> {
            let mut object = Map::new();
            for (offset, name) in results.names.iter().enumerate() {
                let value = match row.value(offset) {
                    Some(term) => serde_json::to_value(term)?,
                    None => Value::Null,
                };
                object.insert(name.clone(), value);
            }
            Ok(Value::Object(object))
        })
        .collect::<Result<_, _>>()?;

    serde_json::to_writer_pretty(&mut out, &rows)?;
    writeln!(out)?;
    Ok(())
}

fn write_text<W: Write>(mut out: W, results: &QueryResults) -> AppResult<()> {
    for row in &results.rows {
        writeln!(out, "{}", row.format())?;
    }
    Ok(())
}

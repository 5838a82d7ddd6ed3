//! Output Rendering Module for dbreak
//!
//! This module writes command outputs to the terminal. Tables are drawn as
//! simple reStructuredText-style tables, messages are printed as they are and
//! errors go to the error stream. A JSON mode prints one document per output
//! for scripting.

use crate::core::{Output, TableOutput, Value};
use serde::Deserialize;
use std::io::{self, Write};

/// Gap between two table columns.
const COLUMN_GAP: &str = "  ";
/// Extra room given to every header.
const HEADER_PADDING: usize = 2;

/// How outputs are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Writes outputs in a fixed format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    pub format: OutputFormat,
}

impl Renderer {
    pub fn new(format: OutputFormat) -> Self {
        Renderer { format }
    }

    /// Writes every output: tables and messages to `out`, errors to `err`.
    /// In table format consecutive outputs on `out` are separated by a blank
    /// line.
    pub fn render<O: Write, E: Write>(&self, outputs: &[Output], out: &mut O, err: &mut E) -> io::Result<()> {
        let mut wrote_out = false;
        for output in outputs {
            let to_out = !matches!(output, Output::Error { .. });
            if to_out && wrote_out && self.format == OutputFormat::Table {
                writeln!(out)?;
            }
            wrote_out |= to_out;
            self.render_one(output, out, err)?;
        }
        out.flush()?;
        err.flush()
    }

    fn render_one<O: Write, E: Write>(&self, output: &Output, out: &mut O, err: &mut E) -> io::Result<()> {
        match (self.format, output) {
            (OutputFormat::Json, Output::Error { .. }) => writeln!(err, "{}", to_json(output)?),
            (OutputFormat::Json, _) => writeln!(out, "{}", to_json(output)?),
            (OutputFormat::Table, Output::Table(table)) => out.write_all(render_table(table).as_bytes()),
            (OutputFormat::Table, Output::Message { text }) => writeln!(out, "{text}"),
            (OutputFormat::Table, Output::Error { kind, text }) => writeln!(err, "Error: {kind}\n{text}"),
        }
    }
}

fn to_json(output: &Output) -> io::Result<String> {
    serde_json::to_string(output).map_err(io::Error::from)
}

/// Renders a table, surrounded by a blank line and a row count.
///
/// Column width is the widest cell or the header plus padding, whichever is
/// larger. Columns holding only numbers (and NULLs) are right-aligned.
pub fn render_table(table: &TableOutput) -> String {
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(Value::to_string).collect())
        .collect();

    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let widest_cell = cells.iter().filter_map(|row| row.get(i)).map(|c| width(c.as_str())).max().unwrap_or(0);
            widest_cell.max(width(header) + HEADER_PADDING)
        })
        .collect();

    let numeric: Vec<bool> = (0..table.columns.len())
        .map(|i| {
            let mut values = table.rows.iter().filter_map(|row| row.get(i)).filter(|v| **v != Value::Null).peekable();
            values.peek().is_some() && values.all(Value::is_numeric)
        })
        .collect();

    let border = widths.iter().map(|w| "=".repeat(*w)).collect::<Vec<_>>().join(COLUMN_GAP);
    let line = |row: &[String]| {
        let padded: Vec<String> = row
            .iter()
            .zip(&widths)
            .zip(&numeric)
            .map(|((cell, w), right)| {
                if *right {
                    format!("{cell:>w$}", w = *w)
                } else {
                    format!("{cell:<w$}", w = *w)
                }
            })
            .collect();
        padded.join(COLUMN_GAP).trim_end().to_string()
    };

    let mut lines = vec![String::new(), border.clone(), line(&table.columns[..]), border.clone()];
    lines.extend(cells.iter().map(|row| line(&row[..])));
    lines.push(border);
    lines.push(format!("({} row(s) returned)", table.rows.len()));
    lines.push(String::new());
    lines.join("\n")
}

fn width(text: &str) -> usize {
    text.chars().count()
}

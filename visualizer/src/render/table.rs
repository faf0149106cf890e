//! Generic record table: columns in caller order, one body row per record.

use std::fmt;
use std::io::Write;

use serde_json::{Map, Value};

use crate::error::Result;

/// One table row: column name → value of any JSON type.
pub type Record = Map<String, Value>;

/// Shown for `null` values, which is how undefined metrics arrive.
pub const NOT_AVAILABLE: &str = "N/A";

/// Columns and rows to render. Not retained after rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSpec {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl TableSpec {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>, rows: Vec<Record>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows,
        }
    }
}

/// How string cell values reach the HTML output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CellMode {
    /// Every cell is HTML-escaped.
    #[default]
    Escaped,
    /// String values are inserted as markup. The caller vouches that they are
    /// safe; nothing here sanitizes them.
    TrustedMarkup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// Column missing from the record.
    Empty,
    Text(String),
    Markup(String),
}

impl Cell {
    fn from_value(value: Option<&Value>, mode: CellMode) -> Self {
        match value {
            None => Cell::Empty,
            Some(Value::Null) => Cell::Text(NOT_AVAILABLE.to_string()),
            Some(Value::String(s)) => match mode {
                CellMode::Escaped => Cell::Text(s.clone()),
                CellMode::TrustedMarkup => Cell::Markup(s.clone()),
            },
            Some(other) => Cell::Text(other.to_string()),
        }
    }

    /// Raw content, unescaped.
    pub fn as_str(&self) -> &str {
        match self {
            Cell::Empty => "",
            Cell::Text(s) | Cell::Markup(s) => s,
        }
    }

    fn to_html(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => html_escape(s),
            Cell::Markup(s) => s.clone(),
        }
    }
}

/// Rendered table: header cells plus a `rows × columns` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    header: Vec<String>,
    body: Vec<Vec<Cell>>,
}

/// Look up `record[column]` for every row and column, in the given order.
/// Missing keys render as empty cells.
pub fn render_table(spec: &TableSpec, mode: CellMode) -> Table {
    let body = spec
        .rows
        .iter()
        .map(|record| {
            spec.columns
                .iter()
                .map(|column| Cell::from_value(record.get(column), mode))
                .collect()
        })
        .collect();

    Table {
        header: spec.columns.clone(),
        body,
    }
}

impl Table {
    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.body
    }

    pub fn cell_count(&self) -> usize {
        self.body.iter().map(Vec::len).sum()
    }

    /// `<table>` with a `thead` row and one `tbody` row per record. Header
    /// cells are always escaped.
    pub fn to_html(&self, margin_left: f64) -> String {
        let mut out = String::new();
        out.push_str(&format!("<table style=\"margin-left: {margin_left}px\">\n"));
        out.push_str("<thead><tr>");
        for column in &self.header {
            out.push_str(&format!("<th>{}</th>", html_escape(column)));
        }
        out.push_str("</tr></thead>\n<tbody>\n");
        for row in &self.body {
            out.push_str("<tr>");
            for cell in row {
                let content = cell.to_html();
                out.push_str(&format!("<td style=\"font-family: Courier\">{content}</td>"));
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</tbody>\n</table>\n");
        out
    }

    /// Header line plus one line per record, raw cell content.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(&self.header)?;
        for row in &self.body {
            csv.write_record(row.iter().map(Cell::as_str))?;
        }
        csv.flush()?;
        Ok(())
    }
}

/// Column-aligned plain text, for logs and terminals.
impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths: Vec<usize> = self
            .header
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.body
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|c| c.as_str().chars().count())
                    .fold(h.chars().count(), usize::max)
            })
            .collect();

        for (h, w) in self.header.iter().zip(widths.iter().copied()) {
            write!(f, "{h:>w$} ")?;
        }
        writeln!(f)?;
        for row in &self.body {
            for (cell, w) in row.iter().zip(widths.iter().copied()) {
                write!(f, "{:>w$} ", cell.as_str())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

//! Tabular values - the common shape of parser output and reference data.
//!
//! A `Table` is a header row plus string cells. Both sides of a comparison
//! arrive as CSV (the reference file, and the harness's stdout), so cells
//! stay as text and numeric interpretation happens at comparison time.

pub mod compare;

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use compare::{CellDiff, MismatchKind, MismatchReport, compare};

/// Date formats recognized when inferring column kinds
const DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"];

/// A rectangular table of string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Inferred kind of a column's values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Every cell is empty
    Empty,
    Integer,
    Float,
    Date,
    Text,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Empty => "empty",
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Date => "date",
            ColumnKind::Text => "text",
        }
    }

    fn of_cell(cell: &str) -> Self {
        let cell = cell.trim();
        if cell.is_empty() {
            ColumnKind::Empty
        } else if cell.parse::<i64>().is_ok() {
            ColumnKind::Integer
        } else if cell.parse::<f64>().is_ok() {
            ColumnKind::Float
        } else if DATE_FORMATS
            .iter()
            .any(|fmt| NaiveDate::parse_from_str(cell, fmt).is_ok())
        {
            ColumnKind::Date
        } else {
            ColumnKind::Text
        }
    }

    /// Smallest kind that covers both
    fn widen(self, other: ColumnKind) -> ColumnKind {
        use ColumnKind::*;
        match (self, other) {
            (Empty, k) | (k, Empty) => k,
            (a, b) if a == b => a,
            (Integer, Float) | (Float, Integer) => Float,
            _ => Text,
        }
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Name and inferred kind of one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub kind: ColumnKind,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Build a table from string slices, handy for literals
    pub fn from_rows(columns: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Parse CSV with a header row. Ragged records are an error.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let columns = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        Ok(Self { columns, rows })
    }

    pub fn from_csv_str(text: &str) -> Result<Self> {
        Self::from_csv_reader(text.as_bytes())
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Column names with the kind inferred from their values
    pub fn schema(&self) -> Vec<ColumnSchema> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let kind = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| ColumnKind::of_cell(cell))
                    .fold(ColumnKind::Empty, ColumnKind::widen);
                ColumnSchema {
                    name: name.clone(),
                    kind,
                }
            })
            .collect()
    }

    /// Markdown rendering of the first `max_rows` rows
    pub fn preview_markdown(&self, max_rows: usize) -> String {
        if self.columns.is_empty() {
            return "(no columns)".to_string();
        }

        let mut out = String::new();
        out.push_str(&format!("| {} |\n", self.columns.join(" | ")));
        out.push_str(&format!(
            "|{}|\n",
            self.columns.iter().map(|_| "---").collect::<Vec<_>>().join("|")
        ));
        for row in self.rows.iter().take(max_rows) {
            out.push_str(&format!("| {} |\n", row.join(" | ")));
        }
        if self.rows.len() > max_rows {
            out.push_str(&format!("... ({} more rows)\n", self.rows.len() - max_rows));
        }
        out.trim_end().to_string()
    }
}

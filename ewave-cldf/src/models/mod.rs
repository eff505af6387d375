//! Domain models for the eWAVE conversion pipeline.
//!
//! - [`Cell`] - a typed table cell as written to CSV
//! - [`TableRecord`] - a row that knows its table and how to render columns
//! - [`NumericId`] - an integer identifier that keeps its raw spelling
//! - [`cldf`] - records of the output CLDF tables
//! - [`raw`] - records of the auxiliary eWAVE export tables

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde_json::{json, Value as JsonValue};

pub mod cldf;
pub mod raw;

pub use cldf::{
    Code, Contributor, Example, FeatureCategory, HistoryEntry, Language, Parameter, Region, Value,
    VarietyType,
};
pub use raw::{
    ChangeRecord, ContributionRecord, ContributorAssignment, ExampleSourceRecord, FeatureRecord,
    ValueExampleRecord, VarietyRecord,
};

// =============================================================================
// Cells
// =============================================================================

/// A single typed cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    List(Vec<String>),
    Float(f64),
    Null,
}

impl Cell {
    /// Text cell, or `Null` for an empty string.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Cell::Null
        } else {
            Cell::Text(value)
        }
    }

    pub fn opt_text(value: Option<&String>) -> Self {
        value.map_or(Cell::Null, |v| Cell::text(v.as_str()))
    }

    pub fn opt_float(value: Option<f64>) -> Self {
        value.map_or(Cell::Null, Cell::Float)
    }

    pub fn list(values: &[String]) -> Self {
        Cell::List(values.to_vec())
    }

    /// The individual values of the cell, for reference checks.
    pub fn values(&self) -> Vec<String> {
        match self {
            Cell::Text(s) => vec![s.clone()],
            Cell::List(items) => items.clone(),
            Cell::Float(f) => vec![format_float(*f)],
            Cell::Null => Vec::new(),
        }
    }

    /// Serialize for a CSV field. Lists are joined with `separator`.
    pub fn render(&self, separator: Option<&str>) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::List(items) => items.join(separator.unwrap_or(" ")),
            Cell::Float(f) => format_float(*f),
            Cell::Null => String::new(),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Cell::Text(s) => json!(s),
            Cell::List(items) => json!(items),
            Cell::Float(f) => json!(f),
            Cell::Null => JsonValue::Null,
        }
    }
}

/// Shortest representation that round-trips.
pub fn format_float(value: f64) -> String {
    format!("{}", value)
}

/// A row keyed by column name, used for validation and read-back.
pub type Row = BTreeMap<String, Cell>;

// =============================================================================
// Records
// =============================================================================

/// A record of an output table.
pub trait TableRecord {
    /// URL or CLDF component of the table the record belongs to.
    fn table(&self) -> &'static str;

    /// Value of the named column; `Null` when the record has no such column.
    fn cell(&self, column: &str) -> Cell;
}

/// Columns of the base dataset that the typed records don't model.
pub type ExtraColumns = BTreeMap<String, Cell>;

pub(crate) fn extra_cell(extra: &ExtraColumns, column: &str) -> Cell {
    extra.get(column).cloned().unwrap_or(Cell::Null)
}

// =============================================================================
// Numeric identifiers
// =============================================================================

/// An integer ID as found in the auxiliary tables.
///
/// Sorts numerically but displays (and joins) with its raw text, so `"007"`
/// still matches a CLDF row whose ID is `"007"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericId {
    raw: String,
    value: u64,
}

impl NumericId {
    pub fn parse(raw: &str) -> Result<Self, std::num::ParseIntError> {
        let value = raw.trim().parse::<u64>()?;
        Ok(Self {
            raw: raw.to_string(),
            value,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Ord for NumericId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .cmp(&other.value)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for NumericId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NumericId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ============================================================
// TABULAR DATASET
// ============================================================
// Column-oriented table loaded from an upload. Immutable once built;
// every transformation returns a new dataset.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// A single scalar value in a dataset.
///
/// Serializes to the matching JSON scalar (`Empty` is `null`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Infer a typed cell from raw text, the way the CSV loader does.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }

        if let Ok(value) = trimmed.parse::<i64>() {
            return Cell::Int(value);
        }

        if let Ok(value) = trimmed.parse::<f64>() {
            if value.is_finite() {
                return Cell::Float(value);
            }
        }

        if trimmed.eq_ignore_ascii_case("true") {
            return Cell::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Cell::Bool(false);
        }

        Cell::Text(raw.to_string())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Bool(true) => write!(f, "True"),
            Cell::Bool(false) => write!(f, "False"),
            Cell::Int(value) => write!(f, "{}", value),
            // Whole floats keep their decimal point so they re-load as floats
            Cell::Float(value) if value.fract() == 0.0 && value.abs() < 1e16 => {
                write!(f, "{:.1}", value)
            }
            Cell::Float(value) => write!(f, "{}", value),
            Cell::Text(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

/// Structural violations rejected when a dataset is built.
#[derive(Debug, Error, PartialEq)]
pub enum DatasetError {
    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),
    #[error("row {row} has {found} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// An ordered set of uniquely named, equal-length columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DatasetWire", into = "DatasetWire")]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::empty()
    }
}

impl Dataset {
    /// A dataset with no columns and no rows.
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            row_count: 0,
        }
    }

    /// Build a dataset from a header and row-major values.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, DatasetError> {
        ensure_unique(&headers)?;

        let width = headers.len();
        let row_count = rows.len();
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(row_count)))
            .collect();

        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(DatasetError::RaggedRow {
                    row: row_idx,
                    expected: width,
                    found: row.len(),
                });
            }
            for (column, cell) in columns.iter_mut().zip(row) {
                column.values.push(cell);
            }
        }

        Ok(Self { columns, row_count })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Cell at a row/column position.
    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.columns.get(column).and_then(|c| c.values.get(row))
    }

    pub fn first_column_name(&self) -> Option<&str> {
        self.columns.first().map(|c| c.name.as_str())
    }

    /// First row's value in the first column.
    pub fn first_value(&self) -> Option<&Cell> {
        self.cell(0, 0)
    }

    /// Iterate rows in order; each row borrows its cells.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&Cell>> + '_ {
        (0..self.row_count).map(move |row| {
            self.columns
                .iter()
                .map(|column| &column.values[row])
                .collect()
        })
    }

    /// The first `min(limit, row_count)` rows.
    pub fn head(&self, limit: usize) -> Dataset {
        let row_count = self.row_count.min(limit);
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), c.values[..row_count].to_vec()))
            .collect();

        Dataset { columns, row_count }
    }

    /// Append a column holding `value` in every row. A colliding name gets a
    /// numeric suffix so the column count always grows by one.
    pub fn with_constant_column(mut self, name: &str, value: Cell) -> Dataset {
        let existing: HashSet<&str> = self.column_names().collect();
        let name = unique_name(&existing, name);
        let values = vec![value; self.row_count];
        self.columns.push(Column::new(name, values));
        self
    }
}

/// Normalize raw header cells: blank headers become `Unnamed: {index}` and
/// repeated names are suffixed `name.1`, `name.2`, ...
pub fn normalize_headers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut headers = Vec::new();

    for (idx, header) in raw.into_iter().enumerate() {
        let trimmed = header.as_ref().trim();
        let base = if trimmed.is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            trimmed.to_string()
        };

        let mut name = base.clone();
        while seen.contains(&name) {
            let counter = counters.entry(base.clone()).or_insert(0);
            *counter += 1;
            name = format!("{}.{}", base, counter);
        }

        seen.insert(name.clone());
        headers.push(name);
    }

    headers
}

fn unique_name(existing: &HashSet<&str>, base: &str) -> String {
    if !existing.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{}.{}", base, n))
        .find(|candidate| !existing.contains(candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}

fn ensure_unique(names: &[String]) -> Result<(), DatasetError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(DatasetError::DuplicateColumn(name.clone()));
        }
    }
    Ok(())
}

/// JSON form: `{"columns": [...], "data": [[...], ...]}`.
#[derive(Serialize, Deserialize)]
struct DatasetWire {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<Vec<Cell>>,
}

impl TryFrom<DatasetWire> for Dataset {
    type Error = DatasetError;

    fn try_from(wire: DatasetWire) -> Result<Self, Self::Error> {
        Dataset::from_rows(wire.columns, wire.data)
    }
}

impl From<Dataset> for DatasetWire {
    fn from(dataset: Dataset) -> Self {
        let data = dataset
            .rows()
            .map(|row| row.into_iter().cloned().collect())
            .collect();
        let columns = dataset.columns.into_iter().map(|c| c.name).collect();
        DatasetWire { columns, data }
    }
}

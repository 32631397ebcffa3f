use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

//==============================================================================
// Cell values
//==============================================================================

/// A single spreadsheet cell.
///
/// Raw sheets mix text, numbers and dates inside one column, so every cell
/// carries its own tag. `Number(NaN)` is treated as missing, the same as
/// `Empty`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Integer(i64),
    Number(f64),
    Date(NaiveDate),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// Missing in the pandas sense: empty cell or NaN.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, CellValue::Text(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Number(n) if n.is_nan() => Ok(()),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

//==============================================================================
// Tables
//==============================================================================

/// A labelled column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub label: String,
    pub cells: Vec<CellValue>,
}

impl Column {
    pub fn new(label: impl Into<String>, cells: Vec<CellValue>) -> Self {
        Self {
            label: label.into(),
            cells,
        }
    }

    /// Column of `len` copies of `value`.
    pub fn filled(label: impl Into<String>, value: CellValue, len: usize) -> Self {
        Self::new(label, vec![value; len])
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Column-oriented table. Raw tables may repeat a label; normalized tables
/// never do.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn with_columns(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn add_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    /// Number of rows (length of the first column, all should be the same)
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.label.as_str()).collect()
    }

    /// Indices of every column with this label, left to right.
    pub fn positions(&self, label: &str) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.label == label)
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn column(&self, label: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.label == label)
    }

    pub fn column_mut(&mut self, label: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.label == label)
    }

    pub fn remove_column(&mut self, index: usize) -> Column {
        self.columns.remove(index)
    }

    /// Cell at `row` in the first column labelled `label`.
    pub fn value(&self, row: usize, label: &str) -> Option<&CellValue> {
        self.column(label).and_then(|c| c.cells.get(row))
    }

    /// Keep the rows whose flag is `true`.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        for column in &mut self.columns {
            let mut flags = keep.iter();
            column
                .cells
                .retain(|_| flags.next().copied().unwrap_or(false));
        }
    }

    /// First column whose length differs from the first column's.
    pub fn ragged_column(&self) -> Option<&Column> {
        let rows = self.row_count();
        self.columns.iter().find(|c| c.len() != rows)
    }
}

//==============================================================================
// Raw workbooks
//==============================================================================

/// A sheet as read from disk: a grid of cells addressed by absolute row.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Widest row in the sheet.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Column labels as they would read if `row` were the header.
    /// `None` when the row does not exist.
    pub fn labels_at(&self, row: usize) -> Option<Vec<String>> {
        let cells = self.rows.get(row)?;
        Some(
            (0..self.width())
                .map(|col| header_label(cells.get(col), col))
                .collect(),
        )
    }

    /// Build a table using `header_row` as labels and every later non-blank
    /// row as data.
    pub fn table_from(&self, header_row: usize) -> Table {
        let Some(labels) = self.labels_at(header_row) else {
            return Table::new(self.name.clone());
        };

        let data_rows: Vec<&Vec<CellValue>> = self
            .rows
            .iter()
            .skip(header_row + 1)
            .filter(|row| row.iter().any(|cell| !cell.is_missing()))
            .collect();

        let columns = labels
            .into_iter()
            .enumerate()
            .map(|(col, label)| {
                let cells = data_rows
                    .iter()
                    .map(|row| row.get(col).cloned().unwrap_or_default())
                    .collect();
                Column::new(label, cells)
            })
            .collect();

        Table::with_columns(self.name.clone(), columns)
    }
}

/// Header text for a cell; blank headers get a positional placeholder.
fn header_label(cell: Option<&CellValue>, col: usize) -> String {
    match cell {
        Some(CellValue::Text(s)) if !s.trim().is_empty() => s.clone(),
        Some(value) if !value.is_missing() && !value.is_text() => value.to_string(),
        _ => format!("Unnamed: {}", col),
    }
}

/// All sheets of one workbook, in workbook order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

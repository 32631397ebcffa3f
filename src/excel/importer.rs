//! Excel importer implementation - .xlsx/.xls → in-memory workbook

use crate::core::sanitize::{excel_serial_to_date, parse_date};
use crate::error::{EtlError, EtlResult};
use crate::types::{CellValue, Sheet, Workbook};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads every sheet of a workbook into memory.
pub struct ExcelImporter {
    path: PathBuf,
}

impl ExcelImporter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Import all sheets, in workbook order. Sheets calamine cannot read are
    /// skipped with a warning.
    pub fn import(&self) -> EtlResult<Workbook> {
        let mut workbook = open_workbook_auto(&self.path).map_err(|e| {
            EtlError::Import(format!(
                "Failed to open Excel file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let mut result = Workbook::new();
        let sheet_names = workbook.sheet_names().to_vec();

        for sheet_name in sheet_names {
            match workbook.worksheet_range(&sheet_name) {
                Ok(range) => result.add_sheet(self.read_sheet(&sheet_name, &range)),
                Err(e) => warn!(sheet = %sheet_name, "Skipping unreadable sheet: {}", e),
            }
        }

        Ok(result)
    }

    /// Copy a calamine range into a grid addressed by absolute sheet row and
    /// column (calamine ranges start at the first used cell).
    fn read_sheet(&self, sheet_name: &str, range: &Range<Data>) -> Sheet {
        let Some((start_row, start_col)) = range.start() else {
            return Sheet::new(sheet_name, Vec::new());
        };

        let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); start_row as usize];
        for row in range.rows() {
            let mut cells = vec![CellValue::Empty; start_col as usize];
            cells.extend(row.iter().map(convert_cell));
            rows.push(cells);
        }

        debug!(sheet = sheet_name, rows = rows.len(), "sheet loaded");
        Sheet::new(sheet_name, rows)
    }
}

/// Convert a calamine cell to a `CellValue`.
pub fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::text(if *b { "TRUE" } else { "FALSE" }),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            match excel_serial_to_date(serial) {
                Some(date) if dt.is_datetime() => CellValue::Date(date),
                _ => CellValue::Number(serial),
            }
        }
        Data::DateTimeIso(s) => {
            let text = CellValue::Text(s.clone());
            parse_date(&text).map(CellValue::Date).unwrap_or(text)
        }
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) => CellValue::Empty,
    }
}

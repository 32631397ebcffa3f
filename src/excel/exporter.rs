//! Excel exporter implementation - normalized tables → .xlsx

use crate::core::processor::SheetSink;
use crate::error::{EtlError, EtlResult};
use crate::types::{CellValue, Table};
use chrono::Datelike;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet};
use std::path::Path;
use tracing::debug;

/// Writes one worksheet per table, header in the first row.
pub struct ExcelExporter {
    workbook: Workbook,
    date_format: Format,
}

impl Default for ExcelExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExcelExporter {
    /// Create a new Excel exporter
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            date_format: Format::new().set_num_format("dd/mm/yyyy"),
        }
    }

    /// Add `table` as a worksheet called `name`
    pub fn export_table(&mut self, name: &str, table: &Table) -> EtlResult<()> {
        if let Some(column) = table.ragged_column() {
            return Err(EtlError::Export(format!(
                "Sheet '{}': column '{}' has {} rows, expected {}",
                name,
                column.label,
                column.len(),
                table.row_count()
            )));
        }

        let worksheet = self.workbook.add_worksheet();
        worksheet
            .set_name(name)
            .map_err(|e| EtlError::Export(format!("Failed to set worksheet name: {}", e)))?;

        for (col_idx, column) in table.columns.iter().enumerate() {
            let col = col_idx as u16;
            worksheet
                .write_string(0, col, &column.label)
                .map_err(|e| EtlError::Export(format!("Failed to write header: {}", e)))?;

            for (row_idx, cell) in column.cells.iter().enumerate() {
                // Row 0 is the header
                let row = (row_idx + 1) as u32;
                write_cell(worksheet, row, col, cell, &self.date_format)?;
            }
        }

        debug!(sheet = name, rows = table.row_count(), "worksheet written");
        Ok(())
    }

    /// Save the workbook to an .xlsx file
    pub fn save(&mut self, output_path: &Path) -> EtlResult<()> {
        self.workbook.save(output_path).map_err(|e| {
            EtlError::Export(format!(
                "Failed to save Excel file {}: {}",
                output_path.display(),
                e
            ))
        })
    }
}

impl SheetSink for ExcelExporter {
    fn write_sheet(&mut self, name: &str, table: &Table) -> EtlResult<()> {
        self.export_table(name, table)
    }
}

/// Empty strings and NaN are left as blank cells.
fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
    date_format: &Format,
) -> EtlResult<()> {
    match cell {
        CellValue::Empty => {}
        CellValue::Text(s) if s.is_empty() => {}
        CellValue::Text(s) => {
            worksheet
                .write_string(row, col, s)
                .map_err(|e| EtlError::Export(format!("Failed to write text: {}", e)))?;
        }
        CellValue::Integer(i) => {
            worksheet
                .write_number(row, col, *i as f64)
                .map_err(|e| EtlError::Export(format!("Failed to write number: {}", e)))?;
        }
        CellValue::Number(n) if n.is_nan() => {}
        CellValue::Number(n) => {
            worksheet
                .write_number(row, col, *n)
                .map_err(|e| EtlError::Export(format!("Failed to write number: {}", e)))?;
        }
        CellValue::Date(date) => {
            let datetime =
                ExcelDateTime::from_ymd(date.year() as u16, date.month() as u8, date.day() as u8)
                    .map_err(|e| EtlError::Export(format!("Invalid date {}: {}", date, e)))?;
            worksheet
                .write_datetime_with_format(row, col, &datetime, date_format)
                .map_err(|e| EtlError::Export(format!("Failed to write date: {}", e)))?;
        }
    }
    Ok(())
}

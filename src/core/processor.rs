//! Workbook orchestration
//!
//! For every sheet, in workbook order: resolve the schema, find the header
//! row, load the table, map and filter it, then hand it to the sink.

use crate::core::filter::{FilterReport, RowColumnFilter};
use crate::core::header::{HeaderLocator, HeaderRow, HeaderScan};
use crate::core::mapper::ColumnMapper;
use crate::core::registry::{SchemaRegistry, SheetKind};
use crate::error::{EtlError, EtlResult};
use crate::excel::{ExcelExporter, ExcelImporter};
use crate::types::{Table, Workbook};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::info;

/// Read access to the sheets of a workbook.
pub trait SheetSource {
    fn sheet_names(&self) -> Vec<String>;

    /// Labels of `row` read as a header row.
    fn header_labels(&mut self, sheet: &str, row: usize) -> EtlResult<Vec<String>>;

    /// Table whose labels come from `header_row` and whose data is every
    /// later row.
    fn read_table(&mut self, sheet: &str, header_row: usize) -> EtlResult<Table>;
}

/// Destination of normalized sheets, called once per sheet in order.
pub trait SheetSink {
    fn write_sheet(&mut self, name: &str, table: &Table) -> EtlResult<()>;
}

impl SheetSource for Workbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn header_labels(&mut self, sheet: &str, row: usize) -> EtlResult<Vec<String>> {
        let found = self
            .sheet(sheet)
            .ok_or_else(|| EtlError::sheet_read(sheet, "no such sheet"))?;
        found.labels_at(row).ok_or_else(|| {
            EtlError::sheet_read(
                sheet,
                format!("row {} is past the end of the sheet ({} rows)", row, found.rows.len()),
            )
        })
    }

    fn read_table(&mut self, sheet: &str, header_row: usize) -> EtlResult<Table> {
        self.sheet(sheet)
            .map(|s| s.table_from(header_row))
            .ok_or_else(|| EtlError::sheet_read(sheet, "no such sheet"))
    }
}

/// Collects tables in memory.
impl SheetSink for Vec<Table> {
    fn write_sheet(&mut self, name: &str, table: &Table) -> EtlResult<()> {
        let mut table = table.clone();
        table.name = name.to_string();
        self.push(table);
        Ok(())
    }
}

/// Processing settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EtlConfig {
    pub header_scan: HeaderScan,
}

/// Per-sheet outcome, for reporting
#[derive(Debug, Clone, PartialEq)]
pub struct SheetReport {
    pub kind: Option<SheetKind>,
    pub header_row: usize,
    pub original_rows: usize,
    pub removed_rows: usize,
    pub removed_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedSheet {
    pub name: String,
    pub table: Table,
    pub report: SheetReport,
}

/// Every sheet of a workbook after normalization, in workbook order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessedWorkbook {
    pub sheets: Vec<ProcessedSheet>,
}

impl ProcessedWorkbook {
    pub fn get(&self, name: &str) -> Option<&ProcessedSheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// The sheet processed with the schema of `kind`, if any.
    pub fn by_kind(&self, kind: SheetKind) -> Option<&ProcessedSheet> {
        self.sheets.iter().find(|s| s.report.kind == Some(kind))
    }

    /// `{ sheet: [ { field: value } ] }`, empty cells as null.
    pub fn to_json(&self) -> EtlResult<String> {
        let mut sheets = Map::new();
        for sheet in &self.sheets {
            let table = &sheet.table;
            let records: Vec<Value> = (0..table.row_count())
                .map(|row| -> EtlResult<Value> {
                    let mut record = Map::new();
                    for column in &table.columns {
                        let value = serde_json::to_value(&column.cells[row])?;
                        record.insert(column.label.clone(), value);
                    }
                    Ok(Value::Object(record))
                })
                .collect::<EtlResult<_>>()?;
            sheets.insert(sheet.name.clone(), Value::Array(records));
        }
        Ok(serde_json::to_string_pretty(&Value::Object(sheets))?)
    }
}

/// Runs the normalization pipeline over a workbook.
pub struct WorkbookProcessor<'a> {
    registry: &'a SchemaRegistry,
    locator: HeaderLocator,
}

impl<'a> WorkbookProcessor<'a> {
    pub fn new(registry: &'a SchemaRegistry, config: EtlConfig) -> Self {
        Self {
            registry,
            locator: HeaderLocator::new(config.header_scan),
        }
    }

    pub fn process<S, W>(&self, source: &mut S, sink: &mut W) -> EtlResult<ProcessedWorkbook>
    where
        S: SheetSource + ?Sized,
        W: SheetSink + ?Sized,
    {
        let mut result = ProcessedWorkbook::default();
        for name in source.sheet_names() {
            let sheet = self.process_sheet(source, &name)?;
            sink.write_sheet(&sheet.name, &sheet.table)?;
            result.sheets.push(sheet);
        }
        Ok(result)
    }

    /// Normalize one sheet. Sheets without a schema pass through unchanged.
    pub fn process_sheet<S>(&self, source: &mut S, name: &str) -> EtlResult<ProcessedSheet>
    where
        S: SheetSource + ?Sized,
    {
        let schema = self.registry.lookup(name);
        let header: HeaderRow = self.locator.locate(source, name, schema);
        let header_row = header.index();

        let table = source.read_table(name, header_row)?;
        let original_rows = table.row_count();

        let Some(schema) = schema else {
            return Ok(ProcessedSheet {
                name: name.to_string(),
                table,
                report: SheetReport {
                    kind: None,
                    header_row,
                    original_rows,
                    removed_rows: 0,
                    removed_columns: Vec::new(),
                },
            });
        };

        info!("Processing sheet '{}' ({} rows, header at row {})", name, original_rows, header_row);

        let mapped = ColumnMapper::new(schema).apply(table);
        let (table, FilterReport { removed_rows, removed_columns }) =
            RowColumnFilter::new(&schema.required).filter(mapped);

        if table.row_count() < original_rows {
            info!("Result: {} valid row(s)", table.row_count());
        }

        Ok(ProcessedSheet {
            name: name.to_string(),
            table,
            report: SheetReport {
                kind: Some(schema.kind),
                header_row,
                original_rows,
                removed_rows,
                removed_columns,
            },
        })
    }
}

/// Read `source`, normalize every sheet and write the result to
/// `destination` as a new .xlsx file.
pub fn process_workbook(
    source: &Path,
    destination: &Path,
    registry: &SchemaRegistry,
    config: EtlConfig,
) -> EtlResult<ProcessedWorkbook> {
    let mut workbook = ExcelImporter::new(source).import()?;
    let mut exporter = ExcelExporter::new();

    let result = WorkbookProcessor::new(registry, config).process(&mut workbook, &mut exporter)?;
    exporter.save(destination)?;

    Ok(result)
}

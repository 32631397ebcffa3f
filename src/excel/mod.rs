//! Excel reading and writing
//!
//! - Import: .xlsx/.xls → in-memory grid of cells per sheet
//! - Export: normalized tables → .xlsx, one worksheet per table

mod exporter;
mod importer;

pub use exporter::ExcelExporter;
pub use importer::{convert_cell, ExcelImporter};

//! Inventory ETL - Excel inventory workbook normalization
//!
//! Reads inventory workbooks (Stock, Entradas, Salidas sheets), finds the real
//! header row of each sheet, maps column labels to canonical field names,
//! cleans cell values and prunes incomplete rows and empty columns.
//!
//! # Features
//!
//! - Header detection within the first rows of a sheet
//! - Accent, case and whitespace insensitive label matching
//! - Date, number and text cleanup per field
//! - Rule sets loaded from JSON or the built-in defaults
//! - PostgreSQL INSERT script generation from normalized sheets
//!
//! # Example
//!
//! ```no_run
//! use inventory_etl::core::{process_workbook, EtlConfig, SchemaRegistry};
//! use std::path::Path;
//!
//! let registry = SchemaRegistry::builtin();
//! let result = process_workbook(
//!     Path::new("inventario.xlsx"),
//!     Path::new("inventario_procesado.xlsx"),
//!     &registry,
//!     EtlConfig::default(),
//! )?;
//!
//! for sheet in &result.sheets {
//!     println!("{}: {} rows", sheet.name, sheet.table.row_count());
//! }
//! # Ok::<(), inventory_etl::error::EtlError>(())
//! ```

pub mod cli;
pub mod collect;
pub mod core;
pub mod error;
pub mod excel;
pub mod sql;
pub mod types;

// Re-export commonly used types
pub use error::{EtlError, EtlResult};
pub use types::{CellValue, Column, Sheet, Table, Workbook};

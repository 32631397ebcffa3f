//! Header detection and schema normalization engine

pub mod filter;
pub mod header;
pub mod mapper;
pub mod normalize;
pub mod processor;
pub mod registry;
pub mod sanitize;

pub use filter::{FilterReport, RowColumnFilter};
pub use header::{HeaderLocator, HeaderRow, HeaderScan};
pub use mapper::ColumnMapper;
pub use normalize::normalize;
pub use processor::{
    process_workbook, EtlConfig, ProcessedSheet, ProcessedWorkbook, SheetReport, SheetSink,
    SheetSource, WorkbookProcessor,
};
pub use registry::{SchemaRegistry, SheetKind, SheetSchema};

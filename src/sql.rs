//! PostgreSQL INSERT script generation from normalized sheets
//!
//! Targets the inventory database tables: `products` (from the stock sheet),
//! `movement_entries` (entradas) and `movement_exits` (salidas). Every row
//! becomes one `INSERT ... VALUES (...)` statement with `NOW()` timestamps.

use crate::core::processor::ProcessedWorkbook;
use crate::core::registry::{SchemaRegistry, SheetKind};
use crate::core::sanitize::DATE_FORMAT;
use crate::error::EtlResult;
use crate::excel::ExcelImporter;
use crate::types::{CellValue, Table, Workbook};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const RULE: &str = "-- ============================================";

const BANNER: [&str; 6] = [
    RULE,
    "-- SCRIPT DE INSERCIÓN DE DATOS",
    "-- Sistema de Inventario AYNI",
    RULE,
    "-- IMPORTANTE: Ejecutar en el orden mostrado",
    "-- ============================================\n",
];

const PROVIDER_NOTE: [&str; 5] = [
    "-- NOTA: Asegúrate de que existe al menos un proveedor con ID=1",
    "-- antes de ejecutar estos inserts.\n",
    "-- Puedes crear uno con:",
    "-- INSERT INTO providers (name, email, address, phones, \"createdAt\", \"updatedAt\")",
    "-- VALUES ('Proveedor General', 'general@proveedor.com', 'Sin dirección', ARRAY[]::text[], NOW(), NOW());",
];

/// Value used when the sheet has no column for a field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fallback {
    Null,
    Number(i64),
    Text(&'static str),
}

impl Fallback {
    fn literal(self) -> String {
        match self {
            Fallback::Null => "NULL".to_string(),
            Fallback::Number(n) => n.to_string(),
            Fallback::Text(s) => quote(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetColumn {
    pub field: &'static str,
    pub fallback: Fallback,
}

const fn col(field: &'static str, fallback: Fallback) -> TargetColumn {
    TargetColumn { field, fallback }
}

/// A database table fed by one kind of sheet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetTable {
    pub kind: SheetKind,
    pub name: &'static str,
    pub title: &'static str,
    pub columns: &'static [TargetColumn],
}

pub const PRODUCTS: TargetTable = TargetTable {
    kind: SheetKind::Stock,
    name: "products",
    title: "PRODUCTOS",
    columns: &[
        col("codigo", Fallback::Null),
        col("nombre", Fallback::Null),
        col("costoUnitario", Fallback::Number(0)),
        col("ubicacion", Fallback::Text("ALMACEN PRINCIPAL")),
        col("salidas", Fallback::Number(0)),
        col("stockActual", Fallback::Number(0)),
        col("stockMinimo", Fallback::Number(0)),
        col("unidadMedida", Fallback::Text("UND")),
        col("providerId", Fallback::Number(1)),
        col("costoTotal", Fallback::Number(0)),
    ],
};

pub const MOVEMENT_ENTRIES: TargetTable = TargetTable {
    kind: SheetKind::Entradas,
    name: "movement_entries",
    title: "ENTRADAS",
    columns: &[
        col("fecha", Fallback::Null),
        col("codigoProducto", Fallback::Null),
        col("descripcion", Fallback::Null),
        col("precioUnitario", Fallback::Number(0)),
        col("cantidad", Fallback::Number(0)),
    ],
};

pub const MOVEMENT_EXITS: TargetTable = TargetTable {
    kind: SheetKind::Salidas,
    name: "movement_exits",
    title: "SALIDAS",
    columns: &[
        col("fecha", Fallback::Null),
        col("codigoProducto", Fallback::Null),
        col("descripcion", Fallback::Null),
        col("precioUnitario", Fallback::Number(0)),
        col("cantidad", Fallback::Number(0)),
        col("responsable", Fallback::Null),
        col("area", Fallback::Null),
        col("proyecto", Fallback::Null),
    ],
};

/// Script order: products must exist before movements reference them.
pub const TARGETS: [TargetTable; 3] = [PRODUCTS, MOVEMENT_ENTRIES, MOVEMENT_EXITS];

/// SQL literal for a cell. Missing values and empty text are `NULL`.
pub fn sql_literal(value: &CellValue) -> String {
    match value {
        CellValue::Empty => "NULL".to_string(),
        CellValue::Text(s) if s.is_empty() => "NULL".to_string(),
        CellValue::Text(s) => quote(s),
        CellValue::Integer(i) => i.to_string(),
        CellValue::Number(n) if !n.is_finite() => "NULL".to_string(),
        CellValue::Number(n) => n.to_string(),
        CellValue::Date(d) => quote(&d.format(DATE_FORMAT).to_string()),
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// camelCase identifiers need quoting in PostgreSQL.
fn column_identifier(field: &str) -> String {
    if field.chars().any(|c| c.is_ascii_uppercase()) {
        format!("\"{}\"", field)
    } else {
        field.to_string()
    }
}

impl TargetTable {
    fn column_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| column_identifier(c.field))
            .chain(["\"createdAt\"".to_string(), "\"updatedAt\"".to_string()])
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// One INSERT per row of `table`.
    pub fn statements(&self, table: &Table) -> Vec<String> {
        let columns = self.column_list();
        (0..table.row_count())
            .map(|row| {
                let values: Vec<String> = self
                    .columns
                    .iter()
                    .map(|c| match table.value(row, c.field) {
                        Some(value) => sql_literal(value),
                        None => c.fallback.literal(),
                    })
                    .collect();
                format!(
                    "INSERT INTO {} ({})\nVALUES ({}, NOW(), NOW());",
                    self.name,
                    columns,
                    values.join(", ")
                )
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlSection {
    pub target: TargetTable,
    pub statements: Vec<String>,
}

impl SqlSection {
    fn render(&self, first: bool) -> String {
        let lead = if first { "" } else { "\n\n" };
        let mut parts = vec![
            format!("{}{}", lead, RULE),
            format!("-- INSERCIÓN DE {} ({})", self.target.title, self.target.name),
            format!("{}\n", RULE),
        ];
        parts.extend(self.statements.iter().cloned());
        parts.join("\n\n")
    }
}

/// Complete insertion script, one section per target table
#[derive(Debug, Clone, PartialEq)]
pub struct SqlScript {
    pub sections: Vec<SqlSection>,
}

impl SqlScript {
    /// Build from the table matching each target kind; missing tables give
    /// empty sections.
    pub fn from_tables<'t, F>(mut table_for: F) -> Self
    where
        F: FnMut(SheetKind) -> Option<&'t Table>,
    {
        let sections = TARGETS
            .iter()
            .map(|target| SqlSection {
                target: *target,
                statements: table_for(target.kind)
                    .map(|table| target.statements(table))
                    .unwrap_or_default(),
            })
            .collect();
        Self { sections }
    }

    pub fn from_processed(processed: &ProcessedWorkbook) -> Self {
        Self::from_tables(|kind| processed.by_kind(kind).map(|s| &s.table))
    }

    /// Read a normalized workbook (header in the first row of each sheet).
    /// Sheets are matched to targets by their normalized name.
    pub fn from_workbook(path: &Path, registry: &SchemaRegistry) -> EtlResult<Self> {
        let workbook = ExcelImporter::new(path).import()?;
        let tables = tables_by_kind(&workbook, registry);
        for (kind, table) in &tables {
            info!("Loaded sheet for {}: {} row(s)", kind, table.row_count());
        }
        Ok(Self::from_tables(|kind| {
            tables.iter().find(|(k, _)| *k == kind).map(|(_, t)| t)
        }))
    }

    /// Number of INSERT statements per target table name
    pub fn counts(&self) -> Vec<(&'static str, usize)> {
        self.sections
            .iter()
            .map(|s| (s.target.name, s.statements.len()))
            .collect()
    }

    pub fn render(&self) -> String {
        let mut parts: Vec<String> = BANNER.iter().map(|s| s.to_string()).collect();
        parts.extend(PROVIDER_NOTE.iter().map(|s| s.to_string()));
        parts.push("\n".to_string());
        parts.extend(
            self.sections
                .iter()
                .enumerate()
                .map(|(idx, section)| section.render(idx == 0)),
        );
        parts.join("\n")
    }

    pub fn write(&self, path: &Path) -> EtlResult<()> {
        fs::write(path, self.render())?;
        debug!(path = %path.display(), "SQL script written");
        Ok(())
    }
}

/// First sheet of each kind, with its header in row 0.
fn tables_by_kind(workbook: &Workbook, registry: &SchemaRegistry) -> Vec<(SheetKind, Table)> {
    let mut tables: Vec<(SheetKind, Table)> = Vec::new();
    for sheet in &workbook.sheets {
        let Some(schema) = registry.lookup(&sheet.name) else {
            continue;
        };
        if tables.iter().any(|(kind, _)| *kind == schema.kind) {
            continue;
        }
        tables.push((schema.kind, sheet.table_from(0)));
    }
    tables
}

/// `inventario_procesado.xlsx` → `inventario_procesado.sql`
pub fn default_sql_path(source: &Path) -> PathBuf {
    source.with_extension("sql")
}

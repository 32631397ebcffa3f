//! Per-sheet transformation rules
//!
//! The three sheet kinds of the inventory export (`stock`, `entradas`,
//! `salidas`) each carry a rename table, a column order, default values and
//! the fields a row cannot lack. Canonical field names are the column names
//! of the target database and must not change.

use crate::core::normalize::normalize;
use crate::error::{EtlError, EtlResult};
use crate::types::CellValue;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

/// Sheet kinds with a known schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetKind {
    Stock,
    Entradas,
    Salidas,
}

impl SheetKind {
    pub const ALL: [SheetKind; 3] = [SheetKind::Stock, SheetKind::Entradas, SheetKind::Salidas];

    /// Normalized sheet name this kind answers to
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetKind::Stock => "stock",
            SheetKind::Entradas => "entradas",
            SheetKind::Salidas => "salidas",
        }
    }
}

impl fmt::Display for SheetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transformation rules for one sheet kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSchema {
    pub kind: SheetKind,
    /// `(raw label variant, canonical field)`, many-to-one, applied in order
    pub rename: Vec<(String, String)>,
    /// Output column order; empty means "keep whatever is there"
    #[serde(default)]
    pub order: Vec<String>,
    #[serde(default)]
    pub defaults: Vec<(String, CellValue)>,
    #[serde(default)]
    pub required: Vec<String>,
    /// Fields whose all-caps source columns are junk duplicates
    #[serde(default)]
    pub drop_if_uppercase: Vec<String>,
    /// Fields forced to empty text
    #[serde(default)]
    pub blank: Vec<String>,
}

impl SheetSchema {
    fn new(kind: SheetKind) -> Self {
        Self {
            kind,
            rename: Vec::new(),
            order: Vec::new(),
            defaults: Vec::new(),
            required: Vec::new(),
            drop_if_uppercase: Vec::new(),
            blank: Vec::new(),
        }
    }

    fn rename(mut self, pairs: &[(&str, &str)]) -> Self {
        self.rename = pairs
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        self
    }

    fn order(mut self, fields: &[&str]) -> Self {
        self.order = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    fn defaults(mut self, values: Vec<(&str, CellValue)>) -> Self {
        self.defaults = values
            .into_iter()
            .map(|(field, value)| (field.to_string(), value))
            .collect();
        self
    }

    fn required(mut self, fields: &[&str]) -> Self {
        self.required = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    fn drop_if_uppercase(mut self, fields: &[&str]) -> Self {
        self.drop_if_uppercase = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Normalized rename keys and canonical names, used to recognise a
    /// header row.
    pub fn expected_labels(&self) -> HashSet<String> {
        self.rename
            .iter()
            .flat_map(|(from, to)| [normalize(from), normalize(to)])
            .collect()
    }

    /// Normalized labels that identify source columns of `field`: the field
    /// name itself plus every rename variant pointing at it.
    pub fn labels_for(&self, field: &str) -> HashSet<String> {
        let mut labels: HashSet<String> = self
            .rename
            .iter()
            .filter(|(_, to)| to == field)
            .map(|(from, _)| normalize(from))
            .collect();
        labels.insert(normalize(field));
        labels
    }

    fn validate(&self) -> EtlResult<()> {
        if let Some((from, to)) = self
            .rename
            .iter()
            .find(|(from, to)| normalize(from).is_empty() || to.trim().is_empty())
        {
            return Err(EtlError::Rules(format!(
                "{}: empty rename entry '{}' -> '{}'",
                self.kind, from, to
            )));
        }

        if !self.order.is_empty() {
            if let Some(missing) = self.required.iter().find(|f| !self.order.contains(f)) {
                return Err(EtlError::Rules(format!(
                    "{}: required field '{}' is not in the column order",
                    self.kind, missing
                )));
            }
        }

        Ok(())
    }
}

/// Immutable set of sheet schemas, looked up by normalized sheet name.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaRegistry {
    schemas: Vec<SheetSchema>,
}

impl SchemaRegistry {
    /// Build a registry, rejecting duplicate kinds and inconsistent rules.
    pub fn new(schemas: Vec<SheetSchema>) -> EtlResult<Self> {
        let mut seen = HashSet::new();
        for schema in &schemas {
            if !seen.insert(schema.kind) {
                return Err(EtlError::Rules(format!(
                    "sheet kind '{}' is defined more than once",
                    schema.kind
                )));
            }
            schema.validate()?;
        }
        Ok(Self { schemas })
    }

    /// The rule tables of the inventory system
    pub fn builtin() -> Self {
        let stock = SheetSchema::new(SheetKind::Stock)
            .rename(&[
                ("Codigo Producto", "codigo"),
                ("Código Producto", "codigo"),
                ("Descripción", "nombre"),
                ("Descripcion", "nombre"),
                ("Und. de Medida", "unidadMedida"),
                ("UND. DE MEDIDA", "unidadMedida"),
                ("Unidad", "unidadMedida"),
                ("Costo U", "costoUnitario"),
                ("Costo U.", "costoUnitario"),
                ("Stock Actual", "stockActual"),
                ("Salidas", "salidas"),
                ("Ubicación", "ubicacion"),
                ("Proveedor", "proveedor"),
                ("Marca", "marca"),
                ("Categoría", "categoria"),
            ])
            .order(&[
                "codigo",
                "nombre",
                "ubicacion",
                "salidas",
                "stockActual",
                "unidadMedida",
                "proveedor",
                "marca",
                "categoria",
                "costoUnitario",
            ])
            .defaults(vec![
                ("ubicacion", CellValue::from("ALMACEN PRINCIPAL")),
                ("salidas", CellValue::Integer(0)),
                ("stockActual", CellValue::Integer(0)),
                ("stockMinimo", CellValue::Integer(0)),
                ("unidadMedida", CellValue::from("UND")),
                // default provider id
                ("providerId", CellValue::Integer(1)),
                ("costoTotal", CellValue::Integer(0)),
            ])
            .required(&["codigo", "nombre"]);

        let entradas = SheetSchema::new(SheetKind::Entradas)
            .rename(&[
                ("Codigo Producto", "codigoProducto"),
                ("Código Producto", "codigoProducto"),
                ("Descripción", "descripcion"),
                ("Descripcion", "descripcion"),
                ("Costo U", "precioUnitario"),
                ("Costo U.", "precioUnitario"),
                ("Precio unitario", "precioUnitario"),
                ("Precio Unitario", "precioUnitario"),
                ("PRECIO UNITARIO", "precioUnitario"),
                ("Cantidad", "cantidad"),
                ("Área", "area"),
                ("Area", "area"),
                ("Responsable", "responsable"),
                ("Fecha", "fecha"),
            ])
            .order(&[
                "fecha",
                "codigoProducto",
                "descripcion",
                "cantidad",
                "area",
                "precioUnitario",
                "responsable",
            ])
            .defaults(vec![("precioUnitario", CellValue::Number(0.0))])
            .required(&["fecha", "codigoProducto", "descripcion", "cantidad"]);

        let salidas = SheetSchema::new(SheetKind::Salidas)
            .rename(&[
                ("Fecha2", "fecha"),
                ("Fecha", "fecha"),
                ("Codigo de producto2", "codigoProducto"),
                ("Código de producto2", "codigoProducto"),
                ("Codigo de producto", "codigoProducto"),
                ("Código de producto", "codigoProducto"),
                ("Código producto", "codigoProducto"),
                ("CODIGO DE PRODUCTO", "codigoProducto"),
                ("Recisbio", "responsable"),
                ("Recibio", "responsable"),
                ("Recibió", "responsable"),
                ("Responsable", "responsable"),
                ("Descripción", "descripcion"),
                ("Descripcion", "descripcion"),
                ("Area", "area"),
                ("Área", "area"),
                ("AREA", "area"),
                ("Proyecto", "proyecto"),
                ("Cantidad", "cantidad"),
                ("Costo U", "precioUnitario"),
                ("Costo U.", "precioUnitario"),
                ("Precio unitario", "precioUnitario"),
                ("Precio Unitario", "precioUnitario"),
                ("Precio untitario2", "precioUnitario"),
                ("Precio untitario", "precioUnitario"),
            ])
            .drop_if_uppercase(&["descripcion"])
            .order(&[
                "fecha",
                "codigoProducto",
                "descripcion",
                "area",
                "proyecto",
                "responsable",
                "cantidad",
                "precioUnitario",
            ])
            .defaults(vec![("precioUnitario", CellValue::Number(0.0))])
            .required(&["fecha", "codigoProducto", "descripcion", "cantidad"]);

        Self {
            schemas: vec![stock, entradas, salidas],
        }
    }

    /// Schema for a sheet, matched on the normalized sheet name.
    pub fn lookup(&self, sheet_name: &str) -> Option<&SheetSchema> {
        let key = normalize(sheet_name);
        self.schemas.iter().find(|s| s.kind.as_str() == key)
    }

    pub fn get(&self, kind: SheetKind) -> Option<&SheetSchema> {
        self.schemas.iter().find(|s| s.kind == kind)
    }

    pub fn schemas(&self) -> &[SheetSchema] {
        &self.schemas
    }

    /// Parse a JSON array of schemas.
    pub fn from_json_str(json: &str) -> EtlResult<Self> {
        let schemas: Vec<SheetSchema> = serde_json::from_str(json)?;
        Self::new(schemas)
    }

    pub fn from_json_file(path: &Path) -> EtlResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn to_json(&self) -> EtlResult<String> {
        Ok(serde_json::to_string_pretty(&self.schemas)?)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

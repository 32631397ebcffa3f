//! Column mapping: raw labels → canonical fields
//!
//! Steps run in a fixed order because later ones read what earlier ones
//! produced:
//!
//! 1. drop all-caps duplicates of flagged fields
//! 2. fuzzy rename (accent/case insensitive)
//! 3. collapse same-named columns (back-fill), sanitize text fields
//! 4. format `fecha`
//! 5. coerce `cantidad`
//! 6. fill defaults
//! 7. blank forced-empty fields
//! 8. restrict and reorder to the schema's column order

use crate::core::normalize::normalize;
use crate::core::registry::SheetSchema;
use crate::core::sanitize::{extract_number, format_date, sanitize_text};
use crate::types::{CellValue, Column, Table};
use std::collections::HashMap;
use tracing::debug;

/// Free-text fields that are merged and sanitized
pub const TEXT_FIELDS: [&str; 2] = ["nombre", "descripcion"];
pub const DATE_FIELD: &str = "fecha";
pub const QUANTITY_FIELD: &str = "cantidad";

/// Applies a sheet schema's column rules to a raw table.
pub struct ColumnMapper<'a> {
    schema: &'a SheetSchema,
}

impl<'a> ColumnMapper<'a> {
    pub fn new(schema: &'a SheetSchema) -> Self {
        Self { schema }
    }

    pub fn apply(&self, mut table: Table) -> Table {
        self.drop_uppercase_duplicates(&mut table);
        self.rename_columns(&mut table);
        self.collapse_duplicates(&mut table);
        for field in TEXT_FIELDS {
            map_cells(&mut table, field, |v| CellValue::Text(sanitize_text(v)));
        }
        map_cells(&mut table, DATE_FIELD, |v| CellValue::Text(format_date(v)));
        map_cells(&mut table, QUANTITY_FIELD, |v| {
            CellValue::Integer(extract_number(v))
        });
        self.fill_defaults(&mut table);
        self.blank_fields(&mut table);
        self.reorder(&mut table);
        table
    }

    /// Drop columns labelled in all caps that stand for a flagged field.
    fn drop_uppercase_duplicates(&self, table: &mut Table) {
        for field in &self.schema.drop_if_uppercase {
            let labels = self.schema.labels_for(field);
            table.columns.retain(|column| {
                let drop = labels.contains(&normalize(&column.label)) && is_all_caps(&column.label);
                if drop {
                    debug!(column = %column.label, field = %field, "dropping upper-case duplicate");
                }
                !drop
            });
        }
    }

    /// Rename the columns a variant points at.
    ///
    /// The index maps each normalized label to the raw label of the last
    /// column carrying it, so when "Descripción" and "DESCRIPCION" both
    /// survive, only the rightmost is renamed (along with any column with the
    /// exact same raw label). The index is built once, before any renaming,
    /// and a column is renamed at most once.
    fn rename_columns(&self, table: &mut Table) {
        let original: Vec<String> = table.columns.iter().map(|c| c.label.clone()).collect();
        let index: HashMap<String, &str> = original
            .iter()
            .map(|label| (normalize(label), label.as_str()))
            .collect();
        let mut renamed = vec![false; original.len()];

        for (variant, canonical) in &self.schema.rename {
            let Some(&target) = index.get(&normalize(variant)) else {
                continue;
            };
            for (idx, label) in original.iter().enumerate() {
                if renamed[idx] || label != target {
                    continue;
                }
                debug!(from = %label, to = %canonical, "rename");
                table.columns[idx].label = canonical.clone();
                renamed[idx] = true;
            }
        }
    }

    /// Merge columns that ended up with the same canonical name, left to
    /// right, keeping the first non-empty value of each row. The merged
    /// column takes the place of the leftmost one.
    fn collapse_duplicates(&self, table: &mut Table) {
        let mut fields: Vec<&str> = Vec::new();
        for (_, canonical) in &self.schema.rename {
            if !fields.contains(&canonical.as_str()) {
                fields.push(canonical);
            }
        }

        for field in fields {
            let positions = table.positions(field);
            if positions.len() < 2 {
                continue;
            }

            let mut merged = table.columns[positions[0]].cells.clone();
            for &idx in &positions[1..] {
                for (target, candidate) in merged.iter_mut().zip(&table.columns[idx].cells) {
                    if is_empty_cell(target) && !is_empty_cell(candidate) {
                        *target = candidate.clone();
                    }
                }
            }
            debug!(field, count = positions.len(), "merged duplicate columns");

            for &idx in positions[1..].iter().rev() {
                table.remove_column(idx);
            }
            table.columns[positions[0]].cells = merged;
        }
    }

    fn fill_defaults(&self, table: &mut Table) {
        let rows = table.row_count();
        for (field, default) in &self.schema.defaults {
            let positions = table.positions(field);
            if positions.is_empty() {
                table.add_column(Column::filled(field.clone(), default.clone(), rows));
                continue;
            }

            for idx in positions {
                for cell in &mut table.columns[idx].cells {
                    let replace = cell.is_missing() || (default.is_text() && cell.as_text() == Some(""));
                    if replace {
                        *cell = default.clone();
                    }
                }
            }
        }
    }

    fn blank_fields(&self, table: &mut Table) {
        let rows = table.row_count();
        for field in &self.schema.blank {
            match table.column_mut(field) {
                Some(column) => column.cells = vec![CellValue::text(""); rows],
                None => table.add_column(Column::filled(field.clone(), CellValue::text(""), rows)),
            }
        }
    }

    /// Restrict to the schema order, creating missing fields as "".
    /// An empty order leaves the table as it is.
    fn reorder(&self, table: &mut Table) {
        if self.schema.order.is_empty() {
            return;
        }

        let rows = table.row_count();
        let mut remaining = std::mem::take(&mut table.columns);
        for field in &self.schema.order {
            let column = match remaining.iter().position(|c| &c.label == field) {
                Some(idx) => remaining.remove(idx),
                None => Column::filled(field.clone(), CellValue::text(""), rows),
            };
            table.columns.push(column);
        }

        if !remaining.is_empty() {
            debug!(
                dropped = ?remaining.iter().map(|c| c.label.as_str()).collect::<Vec<_>>(),
                "columns outside the schema order"
            );
        }
    }
}

/// Replace every cell of every column labelled `field`.
fn map_cells(table: &mut Table, field: &str, f: impl Fn(&CellValue) -> CellValue) {
    for column in table.columns.iter_mut().filter(|c| c.label == field) {
        for cell in &mut column.cells {
            *cell = f(cell);
        }
    }
}

fn is_all_caps(label: &str) -> bool {
    label.to_uppercase() == label
}

fn is_empty_cell(value: &CellValue) -> bool {
    value.is_missing() || value.as_text().is_some_and(|s| s.trim().is_empty())
}

//! Row and column pruning

use crate::core::sanitize::is_valid;
use crate::types::Table;
use tracing::info;

/// What the filter removed from a table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub removed_rows: usize,
    pub removed_columns: Vec<String>,
}

/// Drops rows that lack a required field, then columns with no valid cell.
pub struct RowColumnFilter<'a> {
    required: &'a [String],
}

impl<'a> RowColumnFilter<'a> {
    pub fn new(required: &'a [String]) -> Self {
        Self { required }
    }

    pub fn filter(&self, mut table: Table) -> (Table, FilterReport) {
        let removed_rows = self.remove_invalid_rows(&mut table);
        let removed_columns = remove_empty_columns(&mut table);
        (
            table,
            FilterReport {
                removed_rows,
                removed_columns,
            },
        )
    }

    /// Required fields missing from the table do not disqualify any row.
    fn remove_invalid_rows(&self, table: &mut Table) -> usize {
        if self.required.is_empty() {
            return 0;
        }

        let mut keep = vec![true; table.row_count()];
        for field in self.required {
            if let Some(column) = table.column(field) {
                for (flag, cell) in keep.iter_mut().zip(&column.cells) {
                    *flag = *flag && is_valid(cell);
                }
            }
        }

        let removed = keep.iter().filter(|k| !**k).count();
        if removed > 0 {
            info!("Removed {} row(s) with missing or invalid data", removed);
            table.retain_rows(&keep);
        }
        removed
    }
}

fn remove_empty_columns(table: &mut Table) -> Vec<String> {
    let mut removed = Vec::new();
    table.columns.retain(|column| {
        let has_valid = column.cells.iter().any(is_valid);
        if !has_valid {
            removed.push(column.label.clone());
        }
        has_valid
    });

    if !removed.is_empty() {
        info!(
            "Removed {} column(s) without valid data: {}",
            removed.len(),
            removed.join(", ")
        );
    }
    removed
}

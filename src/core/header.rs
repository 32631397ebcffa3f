//! Header row detection
//!
//! Exports often carry a title banner or merged cells above the real column
//! labels. The header is the first row, within a short window, whose labels
//! overlap the schema's known labels at least `min_matches` times.

use crate::core::normalize::normalize;
use crate::core::processor::SheetSource;
use crate::core::registry::SheetSchema;
use std::collections::HashSet;
use tracing::debug;

/// Header scanning limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderScan {
    /// Rows `0..max_rows` are candidates
    pub max_rows: usize,
    /// Known labels a row must contain to count as the header
    pub min_matches: usize,
}

impl Default for HeaderScan {
    fn default() -> Self {
        Self {
            max_rows: 10,
            min_matches: 2,
        }
    }
}

/// Outcome of a header scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderRow {
    Found(usize),
    NotFound,
}

impl HeaderRow {
    /// Row to read the table from; the first row when nothing matched.
    pub fn index(self) -> usize {
        match self {
            HeaderRow::Found(row) => row,
            HeaderRow::NotFound => 0,
        }
    }
}

/// Finds the header row of a sheet.
pub struct HeaderLocator {
    scan: HeaderScan,
}

impl HeaderLocator {
    pub fn new(scan: HeaderScan) -> Self {
        Self { scan }
    }

    pub fn locate<S: SheetSource + ?Sized>(
        &self,
        source: &mut S,
        sheet_name: &str,
        schema: Option<&SheetSchema>,
    ) -> HeaderRow {
        let Some(schema) = schema else {
            return HeaderRow::NotFound;
        };

        let expected = schema.expected_labels();

        for row in 0..self.scan.max_rows {
            let labels = match source.header_labels(sheet_name, row) {
                Ok(labels) => labels,
                Err(e) => {
                    debug!(sheet = sheet_name, row, "header candidate unreadable: {}", e);
                    continue;
                }
            };

            let found: HashSet<String> = labels.iter().map(|l| normalize(l)).collect();
            let matches = found.intersection(&expected).count();
            if matches >= self.scan.min_matches {
                debug!(sheet = sheet_name, row, matches, "header row found");
                return HeaderRow::Found(row);
            }
        }

        debug!(sheet = sheet_name, "no header row found, using first row");
        HeaderRow::NotFound
    }
}

impl Default for HeaderLocator {
    fn default() -> Self {
        Self::new(HeaderScan::default())
    }
}

//! Table regions.

use super::BoundingBox;
use serde::{Deserialize, Serialize};

/// Row-major cell values; `None` marks a cell the extractor left empty.
pub type Grid = Vec<Vec<Option<String>>>;

/// A detected table: its extent plus the extracted cell grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRegion {
    /// Extent of the table on the page
    pub bbox: BoundingBox,
    /// Cell values, row 0 being the header
    pub grid: Grid,
}

impl TableRegion {
    /// Create a table region.
    pub fn new(bbox: BoundingBox, grid: Grid) -> Self {
        Self { bbox, grid }
    }

    /// Create a region from fully populated string rows.
    pub fn from_rows<R, S>(bbox: BoundingBox, rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let grid = rows
            .into_iter()
            .map(|row| row.into_iter().map(|c| Some(c.into())).collect())
            .collect();
        Self { bbox, grid }
    }

    /// Number of rows, header included.
    pub fn row_count(&self) -> usize {
        self.grid.len()
    }

    /// Number of header columns.
    pub fn column_count(&self) -> usize {
        self.grid.first().map(|r| r.len()).unwrap_or(0)
    }

    /// Whether the grid has a renderable header row.
    pub fn has_header(&self) -> bool {
        self.column_count() > 0
    }
}

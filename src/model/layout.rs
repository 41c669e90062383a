//! Layout items: the unit of per-page ordering.

use super::{BoundingBox, TableRegion, TextBlock};
use serde::{Deserialize, Serialize};

/// One positioned element of a page, text or table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayoutItem {
    /// A block of prose, headings or list items
    Text(TextBlock),
    /// A detected table
    Table(TableRegion),
}

impl LayoutItem {
    /// The originating bounding box.
    pub fn bbox(&self) -> &BoundingBox {
        match self {
            LayoutItem::Text(block) => &block.bbox,
            LayoutItem::Table(table) => &table.bbox,
        }
    }

    /// Top coordinate, the sort key for reading order.
    pub fn top(&self) -> f32 {
        self.bbox().top
    }

    /// Check if this item is text.
    pub fn is_text(&self) -> bool {
        matches!(self, LayoutItem::Text(_))
    }

    /// Check if this item is a table.
    pub fn is_table(&self) -> bool {
        matches!(self, LayoutItem::Table(_))
    }
}

/// The ordered, table-filtered items of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    /// Page number (1-indexed)
    pub number: u32,
    /// Items in reading order
    pub items: Vec<LayoutItem>,
}

impl PageLayout {
    /// Number of text items.
    pub fn text_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_text()).count()
    }

    /// Number of table items.
    pub fn table_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_table()).count()
    }
}

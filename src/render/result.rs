//! Rendering result with statistics.

use serde::{Deserialize, Serialize};

use super::rules::Classification;

/// Markdown output together with what went into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResult {
    /// The rendered Markdown
    pub content: String,

    /// Conversion statistics
    pub stats: ConversionStats,
}

impl RenderResult {
    /// Create a new render result.
    pub fn new(content: String, stats: ConversionStats) -> Self {
        Self { content, stats }
    }

    /// Get the content length in bytes.
    pub fn content_len(&self) -> usize {
        self.content.len()
    }
}

/// Statistics gathered while composing pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Number of pages rendered
    pub page_count: u32,

    /// Text blocks emitted as prose
    pub text_block_count: u32,

    /// Text blocks dropped for overlapping a table
    pub excluded_block_count: u32,

    /// Tables emitted
    pub table_count: u32,

    /// Runs rendered as headings
    pub heading_count: u32,

    /// Runs rendered as list items
    pub list_item_count: u32,
}

impl ConversionStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one rendered run.
    pub fn record(&mut self, class: Classification) {
        match class {
            Classification::Heading(_) => self.heading_count += 1,
            class if class.is_list_item() => self.list_item_count += 1,
            _ => {}
        }
    }

    /// Add another page's counts to these.
    pub fn merge(&mut self, other: &ConversionStats) {
        self.page_count += other.page_count;
        self.text_block_count += other.text_block_count;
        self.excluded_block_count += other.excluded_block_count;
        self.table_count += other.table_count;
        self.heading_count += other.heading_count;
        self.list_item_count += other.list_item_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record() {
        let mut stats = ConversionStats::new();
        stats.record(Classification::Heading(2));
        stats.record(Classification::Bullet);
        stats.record(Classification::Numbered);
        stats.record(Classification::Body);

        assert_eq!(stats.heading_count, 1);
        assert_eq!(stats.list_item_count, 2);
    }

    #[test]
    fn test_merge() {
        let mut total = ConversionStats {
            page_count: 1,
            table_count: 2,
            ..Default::default()
        };
        total.merge(&ConversionStats {
            page_count: 1,
            excluded_block_count: 3,
            ..Default::default()
        });

        assert_eq!(total.page_count, 2);
        assert_eq!(total.table_count, 2);
        assert_eq!(total.excluded_block_count, 3);
    }

    #[test]
    fn test_serialize() {
        let result = RenderResult::new("# Hi\n".into(), ConversionStats::new());
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"heading_count\":0"));
        assert_eq!(result.content_len(), 5);
    }
}

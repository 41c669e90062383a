//! Table detection using text position analysis (Stream mode algorithm).
//!
//! Tables are found from alignment alone: rows of spans whose left edges
//! line up on shared column positions. Ruling lines are never consulted.

use std::collections::{HashMap, HashSet};

use crate::model::{BoundingBox, Grid, TableRegion};

use super::layout::TextSpan;

/// Width of the buckets used to vote on column left edges (points).
const BUCKET_SIZE: f32 = 5.0;
/// Distance within which a span counts as aligned to a column edge (points).
const ALIGN_TOLERANCE: f32 = 5.0;

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Y tolerance for grouping spans into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum column alignment ratio (0.0-1.0)
    pub min_alignment_ratio: f32,
    /// Minimum gap between columns (points)
    pub min_column_gap: f32,
    /// Average cell length above which aligned text reads as prose columns
    pub max_avg_cell_chars: usize,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 6,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
            max_avg_cell_chars: 60,
        }
    }
}

/// A row of spans sharing a baseline.
#[derive(Debug, Clone)]
struct SpanRow {
    baseline: f32,
    /// Sorted by X
    spans: Vec<TextSpan>,
}

/// Detects tables in a page's text spans.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect table regions among the given spans.
    pub fn detect(&self, spans: &[TextSpan]) -> Vec<TableRegion> {
        let min_spans = self.config.min_rows * self.config.min_columns;
        if spans.len() < min_spans {
            log::trace!("TableDetector: not enough spans ({} < {})", spans.len(), min_spans);
            return vec![];
        }

        let rows = self.group_into_rows(spans);
        if rows.len() < self.config.min_rows {
            return vec![];
        }

        let columns = self.detect_columns(&rows);
        log::debug!("TableDetector: {} rows, page columns at {:?}", rows.len(), columns);
        if columns.len() < self.config.min_columns {
            return vec![];
        }

        let mut tables = Vec::new();
        for (start, end) in self.find_table_regions(&rows, &columns) {
            let region_rows = &rows[start..=end];

            // Column edges specific to this region
            let region_columns = self.detect_columns(region_rows);
            if region_columns.len() < self.config.min_columns {
                continue;
            }
            if region_columns.len() > self.config.max_columns {
                log::debug!(
                    "TableDetector: skipping region, too many columns ({} > {})",
                    region_columns.len(),
                    self.config.max_columns
                );
                continue;
            }
            if self.is_list_pattern(region_rows, &region_columns) {
                log::debug!("TableDetector: skipping region, detected as list pattern");
                continue;
            }

            let table = self.build_region(region_rows, &region_columns);
            if self.is_prose(&table) {
                log::debug!("TableDetector: skipping region, cells read as prose");
                continue;
            }
            tables.push(table);
        }

        log::debug!("TableDetector: found {} tables", tables.len());
        tables
    }

    /// Group spans into rows by baseline, top to bottom.
    fn group_into_rows(&self, spans: &[TextSpan]) -> Vec<SpanRow> {
        let mut sorted = spans.to_vec();
        sorted.sort_by(super::layout::reading_order);

        let mut rows: Vec<SpanRow> = Vec::new();
        let mut anchor: Option<f32> = None;

        for span in sorted {
            let tolerance = span.font_size * self.config.y_tolerance_factor;
            match (anchor, rows.last_mut()) {
                (Some(y), Some(row)) if (span.baseline - y).abs() <= tolerance => {
                    row.spans.push(span);
                }
                _ => {
                    anchor = Some(span.baseline);
                    rows.push(SpanRow {
                        baseline: span.baseline,
                        spans: vec![span],
                    });
                }
            }
        }

        for row in &mut rows {
            row.spans.sort_by(|a, b| a.x.total_cmp(&b.x));
            row.baseline = row.spans.iter().map(|s| s.baseline).sum::<f32>() / row.spans.len() as f32;
        }

        rows
    }

    /// Detect column left edges by voting across rows.
    ///
    /// Rows with two or more spans vote when there are enough of them;
    /// otherwise every span votes.
    fn detect_columns(&self, rows: &[SpanRow]) -> Vec<f32> {
        let multi_span_rows: Vec<&SpanRow> = rows.iter().filter(|r| r.spans.len() >= 2).collect();
        let use_multi = multi_span_rows.len() >= self.config.min_rows;

        let mut votes: HashMap<i32, usize> = HashMap::new();
        let voters: Vec<&SpanRow> = if use_multi {
            multi_span_rows
        } else {
            rows.iter().collect()
        };

        for row in &voters {
            let buckets = row.spans.iter().map(|s| (s.x / BUCKET_SIZE).round() as i32);
            if use_multi {
                // Each bucket counted once per row
                for bucket in buckets.collect::<HashSet<_>>() {
                    *votes.entry(bucket).or_insert(0) += 1;
                }
            } else {
                for bucket in buckets {
                    *votes.entry(bucket).or_insert(0) += 1;
                }
            }
        }

        let min_votes = ((voters.len() as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut edges: Vec<f32> = votes
            .into_iter()
            .filter(|(_, count)| *count >= min_votes)
            .map(|(bucket, _)| bucket as f32 * BUCKET_SIZE)
            .collect();
        edges.sort_by(|a, b| a.total_cmp(b));

        // Drop edges closer than the minimum gap to the previous kept one
        let mut merged: Vec<f32> = Vec::with_capacity(edges.len());
        for edge in edges {
            match merged.last() {
                Some(&last) if edge - last < self.config.min_column_gap => {}
                _ => merged.push(edge),
            }
        }
        merged
    }

    /// Find runs of consecutive aligned rows.
    fn find_table_regions(&self, rows: &[SpanRow], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            // A single span never continues a table
            let is_table_row = row.spans.len() >= 2
                && self.alignment_score(row, columns) >= self.config.min_alignment_ratio;

            match (is_table_row, start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    if i - s >= self.config.min_rows {
                        regions.push((s, i - 1));
                    }
                    start = None;
                }
                _ => {}
            }
        }

        if let Some(s) = start {
            if rows.len() - s >= self.config.min_rows {
                regions.push((s, rows.len() - 1));
            }
        }

        regions
    }

    /// Share of a row's spans that start on a column edge.
    fn alignment_score(&self, row: &SpanRow, columns: &[f32]) -> f32 {
        if row.spans.is_empty() || columns.is_empty() {
            return 0.0;
        }

        let aligned = row
            .spans
            .iter()
            .filter(|span| columns.iter().any(|col| (span.x - col).abs() <= ALIGN_TOLERANCE))
            .count();

        aligned as f32 / row.spans.len() as f32
    }

    /// Assign each span to a column and collect the cell grid.
    fn build_region(&self, rows: &[SpanRow], columns: &[f32]) -> TableRegion {
        let bbox = rows
            .iter()
            .flat_map(|r| r.spans.iter())
            .map(TextSpan::bbox)
            .reduce(|a, b| a.union(&b))
            .unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0));

        let grid: Grid = rows
            .iter()
            .map(|row| {
                let mut cells: Vec<Vec<&str>> = vec![Vec::new(); columns.len()];
                for span in &row.spans {
                    let col = find_column_for_span(span.x, columns, bbox.right);
                    let text = span.text.trim();
                    if !text.is_empty() {
                        cells[col].push(text);
                    }
                }
                cells
                    .into_iter()
                    .map(|parts| (!parts.is_empty()).then(|| parts.join(" ")))
                    .collect()
            })
            .collect();

        TableRegion::new(bbox, grid)
    }

    /// Aligned columns of long running text are a multi-column layout.
    fn is_prose(&self, table: &TableRegion) -> bool {
        let lengths: Vec<usize> = table
            .grid
            .iter()
            .flatten()
            .flatten()
            .map(|cell| cell.chars().count())
            .collect();
        if lengths.is_empty() {
            return false;
        }
        lengths.iter().sum::<usize>() / lengths.len() > self.config.max_avg_cell_chars
    }

    /// Check if detected rows actually represent a numbered or bulleted list.
    ///
    /// "1. Item" often arrives as two spans at different X positions, which
    /// looks like a two-column table.
    fn is_list_pattern(&self, rows: &[SpanRow], columns: &[f32]) -> bool {
        if columns.len() < 2 || rows.is_empty() {
            return false;
        }

        let mut bullets = 0;
        let mut numbers = 0;
        for row in rows {
            // Spans are sorted, the first is leftmost
            if let Some(first) = row.spans.first() {
                let text = first.text.trim();
                if is_bullet_marker(text) {
                    bullets += 1;
                } else if is_number_marker(text) {
                    numbers += 1;
                }
            }
        }

        let bullet_ratio = bullets as f32 / rows.len() as f32;
        let marker_ratio = (bullets + numbers) as f32 / rows.len() as f32;
        log::trace!(
            "TableDetector: bullets={}, numbers={}, rows={}",
            bullets,
            numbers,
            rows.len()
        );

        // Bullets are almost never table data; numbered first columns can be
        if bullet_ratio >= 0.5 {
            return true;
        }
        columns.len() == 2 && marker_ratio >= 0.5
    }
}

/// Find which column a span belongs to from its left edge.
fn find_column_for_span(span_x: f32, columns: &[f32], right_x: f32) -> usize {
    // Spans may start up to 10pt before their column
    for (i, &col_start) in columns.iter().enumerate() {
        let col_end = columns.get(i + 1).copied().unwrap_or(right_x + 100.0);
        if span_x >= col_start - 10.0 && span_x < col_end - 10.0 {
            return i;
        }
    }

    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (span_x - **a).abs().total_cmp(&(span_x - **b).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Check if text is a bullet marker (•, -, etc.).
fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "►" | "■" | "●" | "□" | "◆" | "▶" | "➤"
    )
}

/// Check if text is a number-style list marker (1., 2), a., etc.).
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }

    if cleaned.parse::<u32>().is_ok() {
        return true;
    }

    if let Some(pos) = cleaned.find(|c: char| !c.is_ascii_digit()) {
        if pos > 0 && matches!(&cleaned[pos..], "." | ")") {
            return true;
        }
    }

    let mut chars = cleaned.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(c), Some('.' | ')'), None) if c.is_alphabetic()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, x: f32, baseline: f32) -> TextSpan {
        TextSpan::new(text, x, baseline, 10.0)
    }

    fn grid_row(cells: &[Option<&str>]) -> Vec<Option<String>> {
        cells.iter().map(|c| c.map(str::to_string)).collect()
    }

    #[test]
    fn test_group_into_rows() {
        let detector = TableDetector::new();
        let spans = vec![
            span("B2", 150.0, 115.0),
            span("A1", 50.0, 100.0),
            span("A2", 50.0, 115.0),
            span("B1", 150.0, 101.0),
        ];

        let rows = detector.group_into_rows(&spans);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].spans[0].text, "A1");
        assert_eq!(rows[0].spans[1].text, "B1");
        assert_eq!(rows[1].spans[0].text, "A2");
    }

    #[test]
    fn test_detect_simple_table() {
        let detector = TableDetector::new();
        let spans = vec![
            span("Name", 50.0, 100.0),
            span("Age", 200.0, 100.0),
            span("Alice", 50.0, 115.0),
            span("30", 200.0, 115.0),
            span("Bob", 50.0, 130.0),
            span("25", 200.0, 130.0),
        ];

        let tables = detector.detect(&spans);
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.grid[0], grid_row(&[Some("Name"), Some("Age")]));
        assert_eq!(table.grid[2], grid_row(&[Some("Bob"), Some("25")]));
        assert_eq!(table.bbox.left, 50.0);
        assert_eq!(table.bbox.top, 92.0);
    }

    #[test]
    fn test_missing_cell_is_none() {
        let detector = TableDetector::new();
        let spans = vec![
            span("Item", 50.0, 100.0),
            span("Qty", 150.0, 100.0),
            span("Note", 250.0, 100.0),
            span("Pen", 50.0, 115.0),
            span("2", 150.0, 115.0),
            span("Cup", 50.0, 130.0),
            span("1", 150.0, 130.0),
            span("fragile", 250.0, 130.0),
        ];

        let tables = detector.detect(&spans);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].grid[1], grid_row(&[Some("Pen"), Some("2"), None]));
    }

    #[test]
    fn test_prose_not_detected() {
        let detector = TableDetector::new();
        let spans = vec![
            span("This is a paragraph of ordinary text", 72.0, 100.0),
            span("that continues on the next line", 72.0, 112.0),
            span("and ends here.", 72.0, 124.0),
        ];

        assert!(detector.detect(&spans).is_empty());
    }

    #[test]
    fn test_list_pattern_rejected() {
        let detector = TableDetector::new();
        let spans = vec![
            span("•", 50.0, 100.0),
            span("First item", 70.0, 100.0),
            span("•", 50.0, 115.0),
            span("Second item", 70.0, 115.0),
            span("•", 50.0, 130.0),
            span("Third item", 70.0, 130.0),
        ];

        assert!(detector.detect(&spans).is_empty());
    }

    #[test]
    fn test_two_column_prose_rejected() {
        let detector = TableDetector::new();
        let left = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do";
        let right = "Ut enim ad minim veniam, quis nostrud exercitation ullamco labo";
        let spans = vec![
            span(left, 50.0, 100.0),
            span(right, 330.0, 100.0),
            span(left, 50.0, 112.0),
            span(right, 330.0, 112.0),
        ];

        assert!(detector.detect(&spans).is_empty());
    }

    #[test]
    fn test_number_markers() {
        assert!(is_number_marker("1."));
        assert!(is_number_marker("12)"));
        assert!(is_number_marker("3"));
        assert!(is_number_marker("a."));
        assert!(!is_number_marker("Alice"));
        assert!(!is_number_marker(""));
    }

    #[test]
    fn test_bullet_markers() {
        assert!(is_bullet_marker("•"));
        assert!(is_bullet_marker(" - "));
        assert!(!is_bullet_marker("text"));
    }

    #[test]
    fn test_find_column_for_span() {
        let columns = [50.0, 150.0, 250.0];
        assert_eq!(find_column_for_span(52.0, &columns, 300.0), 0);
        assert_eq!(find_column_for_span(145.0, &columns, 300.0), 1);
        assert_eq!(find_column_for_span(260.0, &columns, 300.0), 2);
    }
}

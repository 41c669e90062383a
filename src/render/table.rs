//! Markdown rendering for table grids.

use crate::model::Grid;

/// Render a grid as a Markdown table, row 0 being the header.
///
/// Returns an empty string when there is no header row. Data rows are
/// emitted as they are, even when their width differs from the header.
pub fn format_table(grid: &Grid) -> String {
    let header = match grid.first() {
        Some(header) if !header.is_empty() => header,
        _ => return String::new(),
    };

    let mut output = String::new();
    push_row(&mut output, header);

    output.push_str("| ");
    output.push_str(&vec!["---"; header.len()].join(" | "));
    output.push_str(" |\n");

    for row in &grid[1..] {
        push_row(&mut output, row);
    }

    output.push('\n');
    output
}

fn push_row(output: &mut String, row: &[Option<String>]) {
    let cells: Vec<&str> = row.iter().map(|c| c.as_deref().unwrap_or("")).collect();
    output.push_str("| ");
    output.push_str(&cells.join(" | "));
    output.push_str(" |\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[Option<&str>]]) -> Grid {
        rows.iter()
            .map(|r| r.iter().map(|c| c.map(str::to_string)).collect())
            .collect()
    }

    #[test]
    fn test_simple_table() {
        let g = grid(&[&[Some("A"), Some("B")], &[Some("1"), Some("2")]]);
        assert_eq!(format_table(&g), "| A | B |\n| --- | --- |\n| 1 | 2 |\n\n");
    }

    #[test]
    fn test_empty_grids() {
        assert_eq!(format_table(&vec![]), "");
        assert_eq!(format_table(&vec![vec![]]), "");
    }

    #[test]
    fn test_missing_cells_render_empty() {
        let g = grid(&[&[Some("Name"), None], &[None, Some("x")]]);
        assert_eq!(format_table(&g), "| Name |  |\n| --- | --- |\n|  | x |\n\n");
    }

    #[test]
    fn test_header_only() {
        let g = grid(&[&[Some("Only")]]);
        assert_eq!(format_table(&g), "| Only |\n| --- |\n\n");
    }

    #[test]
    fn test_ragged_rows_not_padded() {
        let g = grid(&[&[Some("A"), Some("B"), Some("C")], &[Some("1")]]);
        let out = format_table(&g);
        assert!(out.contains("| --- | --- | --- |\n| 1 |\n"));
    }

    #[test]
    fn test_empty_data_row() {
        let g = grid(&[&[Some("A")], &[]]);
        assert_eq!(format_table(&g), "| A |\n| --- |\n|  |\n\n");
    }
}

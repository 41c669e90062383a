//! Page composition: table exclusion, reading order, rendering.

use crate::error::Result;
use crate::model::{LayoutItem, TableRegion, TextBlock};
use crate::parser::{TableExtractor, TextExtractor};

use super::block::BlockFormatter;
use super::result::ConversionStats;
use super::table::format_table;
use super::RenderOptions;

/// Text blocks and located tables of a page.
///
/// Tables keep the extractor's detection order.
pub fn locate_tables<S>(source: &S, page: u32) -> Result<(Vec<TextBlock>, Vec<TableRegion>)>
where
    S: TextExtractor + TableExtractor + ?Sized,
{
    let (blocks, tables) = source.page_items(page)?;
    log::debug!(
        "page {}: {} blocks, {} tables located",
        page,
        blocks.len(),
        tables.len()
    );
    Ok((blocks, tables))
}

/// Order a page's blocks and tables top to bottom.
///
/// Blocks overlapping any table are dropped. The sort is stable and blocks
/// are inserted first, so a block wins a tie with a table.
pub fn layout_page(blocks: Vec<TextBlock>, tables: Vec<TableRegion>) -> Vec<LayoutItem> {
    layout_page_counted(blocks, tables).0
}

/// [`layout_page`] plus the number of excluded blocks.
pub(crate) fn layout_page_counted(
    blocks: Vec<TextBlock>,
    tables: Vec<TableRegion>,
) -> (Vec<LayoutItem>, usize) {
    let total = blocks.len();
    let mut items: Vec<LayoutItem> = blocks
        .into_iter()
        .filter(|block| !tables.iter().any(|t| block.bbox.intersects(&t.bbox)))
        .map(LayoutItem::Text)
        .collect();
    let excluded = total - items.len();
    if excluded > 0 {
        log::trace!("excluded {} blocks overlapping tables", excluded);
    }

    items.extend(tables.into_iter().map(LayoutItem::Table));
    items.sort_by(|a, b| a.top().total_cmp(&b.top()));
    (items, excluded)
}

/// Render ordered items to a page's Markdown fragment.
pub fn render_page(items: &[LayoutItem], options: &RenderOptions) -> String {
    let mut stats = ConversionStats::new();
    render_page_counted(items, options, &mut stats)
}

pub(crate) fn render_page_counted(
    items: &[LayoutItem],
    options: &RenderOptions,
    stats: &mut ConversionStats,
) -> String {
    let formatter = BlockFormatter::new(&options.rules);
    let mut output = String::new();

    for item in items {
        match item {
            LayoutItem::Text(block) => {
                stats.text_block_count += 1;
                formatter.render(&mut output, block, |class| stats.record(class));
            }
            LayoutItem::Table(table) => {
                stats.table_count += 1;
                output.push_str("\n**");
                output.push_str(&options.table_label);
                output.push_str("**\n\n");
                output.push_str(&format_table(&table.grid));
            }
        }
    }

    output
}

/// Compose one page: exclude, order, render.
pub fn compose_page(
    blocks: Vec<TextBlock>,
    tables: Vec<TableRegion>,
    options: &RenderOptions,
) -> String {
    render_page(&layout_page(blocks, tables), options)
}

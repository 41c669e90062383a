//! Rendering: text blocks and tables to Markdown, pages to documents.

mod block;
mod html;
mod markdown;
mod options;
mod page;
mod result;
mod rules;
mod table;

pub use block::{format_block, BlockFormatter};
pub use html::{to_html, wrap_pages};
pub use markdown::{inspect, page_separator, to_markdown, to_markdown_with_stats};
pub use options::{PageSelection, RenderOptions};
pub use page::{compose_page, layout_page, locate_tables, render_page};
pub use result::{ConversionStats, RenderResult};
pub use rules::{default_rules, BlockRules, Classification, HeadingRule, ListAction, ListRule};
pub use table::format_table;

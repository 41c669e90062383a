//! # pagemark
//!
//! Rebuilds readable Markdown from the visual layout of PDF pages.
//!
//! Text blocks and detected tables are placed in top-to-bottom order per
//! page. Headings and list items are recognized from font size and leading
//! glyphs, and text lying under a table is dropped so it is not emitted
//! twice. Pages are joined under `## Page N` separators.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pagemark::{convert, PdfDocument, RenderOptions};
//!
//! fn main() -> pagemark::Result<()> {
//!     let doc = PdfDocument::open("document.pdf")?;
//!     let markdown = convert(&doc, &RenderOptions::default())?;
//!     println!("{}", markdown);
//!     Ok(())
//! }
//! ```
//!
//! Any type implementing [`TextExtractor`] and [`TableExtractor`] can be
//! converted; [`PdfDocument`] is the lopdf-backed implementation.

pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;

pub use detect::{is_pdf_bytes, sniff_bytes, sniff_file, PdfHeader};
pub use error::{Error, Result};
pub use model::{
    BoundingBox, Grid, LayoutItem, PageLayout, Run, TableRegion, TextBlock, TextLine,
};
pub use parser::{
    PageSource, ParseOptions, PdfDocument, TableDetectorConfig, TableExtractor, TextExtractor,
};
pub use render::{
    format_block, format_table, BlockRules, ConversionStats, PageSelection, RenderOptions,
    RenderResult,
};

use std::path::Path;
use std::time::{Duration, Instant};

/// Convert a document to Markdown.
///
/// Pages are emitted in order, each under a separator heading. Any
/// extractor failure aborts the conversion with an error naming the page.
pub fn convert<S>(source: &S, options: &RenderOptions) -> Result<String>
where
    S: TextExtractor + TableExtractor + Sync + ?Sized,
{
    render::to_markdown(source, options)
}

/// Convert a document to Markdown with statistics.
pub fn convert_with_stats<S>(source: &S, options: &RenderOptions) -> Result<RenderResult>
where
    S: TextExtractor + TableExtractor + Sync + ?Sized,
{
    render::to_markdown_with_stats(source, options)
}

/// Convert a document to HTML using the extractor's per-page HTML.
pub fn convert_to_html<S>(source: &S, options: &RenderOptions) -> Result<String>
where
    S: TextExtractor + Sync + ?Sized,
{
    render::to_html(source, options)
}

/// Ordered, table-filtered layout items of each page.
pub fn inspect<S>(source: &S, options: &RenderOptions) -> Result<Vec<PageLayout>>
where
    S: TextExtractor + TableExtractor + Sync + ?Sized,
{
    render::inspect(source, options)
}

/// Convert a PDF file to Markdown.
///
/// # Example
///
/// ```no_run
/// let markdown = pagemark::to_markdown("document.pdf").unwrap();
/// std::fs::write("output.md", markdown).unwrap();
/// ```
pub fn to_markdown<P: AsRef<Path>>(path: P) -> Result<String> {
    to_markdown_with_options(path, &RenderOptions::default())
}

/// Convert a PDF file to Markdown with custom render options.
pub fn to_markdown_with_options<P: AsRef<Path>>(path: P, options: &RenderOptions) -> Result<String> {
    let doc = PdfDocument::open(path)?;
    convert(&doc, options)
}

/// Convert in-memory PDF bytes to Markdown.
pub fn bytes_to_markdown(data: &[u8]) -> Result<String> {
    let doc = PdfDocument::from_bytes(data)?;
    convert(&doc, &RenderOptions::default())
}

/// Convert a PDF file to HTML.
pub fn to_html<P: AsRef<Path>>(path: P) -> Result<String> {
    let doc = PdfDocument::open(path)?;
    convert_to_html(&doc, &RenderOptions::default())
}

/// Builder for opening and converting PDF documents.
///
/// # Example
///
/// ```no_run
/// use pagemark::Pagemark;
///
/// let markdown = Pagemark::new()
///     .without_tables()
///     .with_page_label("Strona")
///     .open("document.pdf")?
///     .to_markdown()?;
/// # Ok::<(), pagemark::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pagemark {
    parse_options: ParseOptions,
    render_options: RenderOptions,
}

impl Pagemark {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the parse options.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    /// Replace the render options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Skip table detection.
    pub fn without_tables(mut self) -> Self {
        self.parse_options = self.parse_options.without_tables();
        self
    }

    /// Compose pages one at a time.
    pub fn sequential(mut self) -> Self {
        self.render_options = self.render_options.sequential();
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.render_options = self.render_options.with_pages(pages);
        self
    }

    /// Set the page separator label.
    pub fn with_page_label(mut self, label: impl Into<String>) -> Self {
        self.render_options = self.render_options.with_page_label(label);
        self
    }

    /// Set the table label.
    pub fn with_table_label(mut self, label: impl Into<String>) -> Self {
        self.render_options = self.render_options.with_table_label(label);
        self
    }

    /// Set the classification rules.
    pub fn with_rules(mut self, rules: BlockRules) -> Self {
        self.render_options = self.render_options.with_rules(rules);
        self
    }

    /// Set a deadline for the conversion.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.render_options = self.render_options.with_deadline(deadline);
        self
    }

    /// Set a deadline relative to now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.render_options = self.render_options.with_timeout(timeout);
        self
    }

    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<PagemarkDocument> {
        let document = PdfDocument::open_with_options(path, self.parse_options)?;
        Ok(PagemarkDocument {
            document,
            render_options: self.render_options,
        })
    }

    /// Open a PDF from bytes.
    pub fn open_bytes(self, data: &[u8]) -> Result<PagemarkDocument> {
        let document = PdfDocument::from_bytes_with_options(data, self.parse_options)?;
        Ok(PagemarkDocument {
            document,
            render_options: self.render_options,
        })
    }
}

/// An open document paired with its render options.
#[derive(Debug)]
pub struct PagemarkDocument {
    document: PdfDocument,
    render_options: RenderOptions,
}

impl PagemarkDocument {
    /// Convert to Markdown.
    pub fn to_markdown(&self) -> Result<String> {
        convert(&self.document, &self.render_options)
    }

    /// Convert to Markdown with statistics.
    pub fn to_markdown_with_stats(&self) -> Result<RenderResult> {
        convert_with_stats(&self.document, &self.render_options)
    }

    /// Convert to HTML.
    pub fn to_html(&self) -> Result<String> {
        convert_to_html(&self.document, &self.render_options)
    }

    /// Layout items of each selected page.
    pub fn inspect(&self) -> Result<Vec<PageLayout>> {
        inspect(&self.document, &self.render_options)
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.document.page_count()
    }

    /// Get the underlying document.
    pub fn document(&self) -> &PdfDocument {
        &self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagemark_builder() {
        let builder = Pagemark::new()
            .without_tables()
            .sequential()
            .with_page_label("Strona")
            .with_pages(PageSelection::Range(1..=2));

        assert!(!builder.parse_options.detect_tables);
        assert!(!builder.render_options.parallel);
        assert_eq!(builder.render_options.page_label, "Strona");
        assert!(builder.render_options.page_selection.includes(2));
    }

    #[test]
    fn test_bytes_empty_data() {
        assert!(bytes_to_markdown(&[]).is_err());
    }

    #[test]
    fn test_bytes_too_short() {
        assert!(bytes_to_markdown(b"%PDF").is_err());
    }

    #[test]
    fn test_bytes_unknown_magic() {
        let data = [0xFF, 0xFE, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        assert!(matches!(bytes_to_markdown(&data), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_open_missing_file() {
        let result = Pagemark::new().open("/nonexistent/file.pdf");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}

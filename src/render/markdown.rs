//! Document assembly: per-page composition joined in page order.

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::model::PageLayout;
use crate::parser::{PageSource, TableExtractor, TextExtractor};

use super::page::{layout_page_counted, locate_tables, render_page_counted};
use super::{ConversionStats, RenderOptions, RenderResult};

/// Convert a document to Markdown.
pub fn to_markdown<S>(source: &S, options: &RenderOptions) -> Result<String>
where
    S: TextExtractor + TableExtractor + Sync + ?Sized,
{
    to_markdown_with_stats(source, options).map(|result| result.content)
}

/// Convert a document to Markdown with statistics.
pub fn to_markdown_with_stats<S>(source: &S, options: &RenderOptions) -> Result<RenderResult>
where
    S: TextExtractor + TableExtractor + Sync + ?Sized,
{
    let pages = for_each_page(source, options, |page| {
        let (blocks, tables) = locate_tables(source, page)?;
        let (items, excluded) = layout_page_counted(blocks, tables);

        let mut stats = ConversionStats {
            page_count: 1,
            excluded_block_count: excluded as u32,
            ..Default::default()
        };
        let mut fragment = page_separator(page, &options.page_label);
        fragment.push_str(&render_page_counted(&items, options, &mut stats));
        Ok((fragment, stats))
    })?;

    let mut content = String::new();
    let mut stats = ConversionStats::new();
    for (fragment, page_stats) in pages {
        content.push_str(&fragment);
        stats.merge(&page_stats);
    }

    log::debug!(
        "rendered {} pages, {} tables, {} blocks excluded",
        stats.page_count,
        stats.table_count,
        stats.excluded_block_count
    );
    Ok(RenderResult::new(content, stats))
}

/// Ordered, table-filtered layout of each selected page, without rendering.
pub fn inspect<S>(source: &S, options: &RenderOptions) -> Result<Vec<PageLayout>>
where
    S: TextExtractor + TableExtractor + Sync + ?Sized,
{
    for_each_page(source, options, |page| {
        let (blocks, tables) = locate_tables(source, page)?;
        let (items, _) = layout_page_counted(blocks, tables);
        Ok(PageLayout {
            number: page,
            items,
        })
    })
}

/// The rule and heading placed before a page's fragment.
pub fn page_separator(page: u32, label: &str) -> String {
    format!("\n\n---\n\n## {} {}\n\n", label, page)
}

/// Run `work` on every selected page and collect results in page order.
///
/// The deadline is checked before a page starts, never mid-page. Errors
/// are attributed to the page that raised them.
pub(crate) fn for_each_page<S, T, F>(source: &S, options: &RenderOptions, work: F) -> Result<Vec<T>>
where
    S: PageSource + ?Sized,
    T: Send,
    F: Fn(u32) -> Result<T> + Sync,
{
    let pages = options.page_selection.resolve(source.page_count())?;

    let run = |page: u32| -> Result<T> {
        if options.deadline_passed() {
            return Err(Error::DeadlineExceeded { page });
        }
        work(page).map_err(|e| e.on_page(page))
    };

    if options.parallel && pages.len() > 1 {
        log::debug!("composing {} pages in parallel", pages.len());
        pages.par_iter().map(|&page| run(page)).collect()
    } else {
        pages.iter().map(|&page| run(page)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, TableRegion, TextBlock, TextLine};
    use std::time::Instant;

    struct Pages(Vec<Vec<TextBlock>>);

    impl PageSource for Pages {
        fn page_count(&self) -> u32 {
            self.0.len() as u32
        }
    }

    impl TextExtractor for Pages {
        fn text_blocks(&self, page: u32) -> Result<Vec<TextBlock>> {
            Ok(self.0[page as usize - 1].clone())
        }

        fn page_html(&self, page: u32) -> Result<String> {
            Ok(format!("<p>{}</p>", page))
        }
    }

    impl TableExtractor for Pages {
        fn find_tables(&self, _page: u32) -> Result<Vec<TableRegion>> {
            Ok(vec![])
        }
    }

    /// Serves a page only through the combined call.
    struct SinglePass;

    impl PageSource for SinglePass {
        fn page_count(&self) -> u32 {
            1
        }
    }

    impl TextExtractor for SinglePass {
        fn text_blocks(&self, _page: u32) -> Result<Vec<TextBlock>> {
            Err(Error::TextExtract("second pass".to_string()))
        }

        fn page_html(&self, _page: u32) -> Result<String> {
            Ok(String::new())
        }
    }

    impl TableExtractor for SinglePass {
        fn find_tables(&self, _page: u32) -> Result<Vec<TableRegion>> {
            Err(Error::TableExtract("second pass".to_string()))
        }

        fn page_items(&self, _page: u32) -> Result<(Vec<TextBlock>, Vec<TableRegion>)> {
            Ok((one_liner("once"), vec![]))
        }
    }

    fn one_liner(text: &str) -> Vec<TextBlock> {
        vec![TextBlock::new(
            BoundingBox::new(0.0, 0.0, 100.0, 10.0),
            vec![TextLine::single(text, 10.0)],
        )]
    }

    #[test]
    fn test_page_separator() {
        assert_eq!(page_separator(3, "Page"), "\n\n---\n\n## Page 3\n\n");
    }

    #[test]
    fn test_two_pages() {
        let source = Pages(vec![one_liner("one"), one_liner("two")]);
        let md = to_markdown(&source, &RenderOptions::default()).unwrap();
        assert_eq!(
            md,
            "\n\n---\n\n## Page 1\n\none \n\n\n---\n\n## Page 2\n\ntwo \n"
        );
    }

    #[test]
    fn test_page_selection_keeps_numbers() {
        let source = Pages(vec![one_liner("one"), one_liner("two"), one_liner("three")]);
        let options = RenderOptions::new().with_page_list(vec![3]);
        let md = to_markdown(&source, &options).unwrap();
        assert_eq!(md, "\n\n---\n\n## Page 3\n\nthree \n");
    }

    #[test]
    fn test_page_extracted_in_one_pass() {
        let md = to_markdown(&SinglePass, &RenderOptions::default()).unwrap();
        assert_eq!(md, "\n\n---\n\n## Page 1\n\nonce \n");

        let layouts = inspect(&SinglePass, &RenderOptions::default()).unwrap();
        assert_eq!(layouts[0].text_count(), 1);
    }

    #[test]
    fn test_empty_document() {
        let source = Pages(vec![]);
        assert_eq!(to_markdown(&source, &RenderOptions::default()).unwrap(), "");
    }

    #[test]
    fn test_deadline_exceeded_before_first_page() {
        let source = Pages(vec![one_liner("one")]);
        let options = RenderOptions::new().with_deadline(Instant::now());
        let err = to_markdown(&source, &options).unwrap_err();
        assert!(matches!(err, Error::DeadlineExceeded { page: 1 }));
    }

    #[test]
    fn test_inspect() {
        let source = Pages(vec![one_liner("one"), vec![]]);
        let layouts = inspect(&source, &RenderOptions::default()).unwrap();
        assert_eq!(layouts.len(), 2);
        assert_eq!(layouts[0].number, 1);
        assert_eq!(layouts[0].text_count(), 1);
        assert!(layouts[1].items.is_empty());
    }

    #[test]
    fn test_stats() {
        let source = Pages(vec![one_liner("one"), one_liner("two")]);
        let result = to_markdown_with_stats(&source, &RenderOptions::default()).unwrap();
        assert_eq!(result.stats.page_count, 2);
        assert_eq!(result.stats.text_block_count, 2);
    }
}

//! HTML export: each page's extractor HTML in a minimal envelope.

use crate::error::Result;
use crate::parser::TextExtractor;

use super::markdown::for_each_page;
use super::RenderOptions;

const HTML_HEAD: &str = "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n</head>\n<body>\n";
const HTML_TAIL: &str = "\n</body>\n</html>\n";
const PAGE_RULE: &str = "\n<hr/>\n";

/// Convert a document to HTML.
///
/// Page fragments come verbatim from the text extractor; only the page
/// selection, parallelism and deadline options apply.
pub fn to_html<S>(source: &S, options: &RenderOptions) -> Result<String>
where
    S: TextExtractor + Sync + ?Sized,
{
    let fragments = for_each_page(source, options, |page| source.page_html(page))?;
    Ok(wrap_pages(&fragments))
}

/// Join page fragments inside the document envelope.
pub fn wrap_pages(fragments: &[String]) -> String {
    let mut html = String::from(HTML_HEAD);
    html.push_str(&fragments.join(PAGE_RULE));
    html.push_str(HTML_TAIL);
    html
}
